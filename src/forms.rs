//! Declarative form validation.
//!
//! A [`FormSchema`] lists named fields and the rules each must satisfy.
//! Validating raw submitted data yields either the cleaned (trimmed) values
//! or a map of field name to error messages. [`FormView`] carries submitted
//! values and errors back into templates for redisplay.

use std::collections::{BTreeMap, HashMap};

use validator::ValidateEmail;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    Email,
    MaxLength(usize),
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub rules: &'static [Rule],
}

#[derive(Debug, Clone, Copy)]
pub struct FormSchema {
    pub fields: &'static [Field],
}

pub type FieldErrors = BTreeMap<&'static str, Vec<String>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanedData(HashMap<&'static str, String>);

impl CleanedData {
    /// Empty string for optional fields left blank.
    pub fn get(&self, name: &str) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or("")
    }
}

pub const SHARE_FORM: FormSchema = FormSchema {
    fields: &[
        Field {
            name: "name",
            rules: &[Rule::Required, Rule::MaxLength(25)],
        },
        Field {
            name: "email",
            rules: &[Rule::Required, Rule::Email],
        },
        Field {
            name: "to",
            rules: &[Rule::Required, Rule::Email],
        },
        Field {
            name: "comments",
            rules: &[],
        },
    ],
};

pub const COMMENT_FORM: FormSchema = FormSchema {
    fields: &[
        Field {
            name: "name",
            rules: &[Rule::Required, Rule::MaxLength(80)],
        },
        Field {
            name: "email",
            rules: &[Rule::Required, Rule::Email],
        },
        Field {
            name: "body",
            rules: &[Rule::Required],
        },
    ],
};

pub const SEARCH_FORM: FormSchema = FormSchema {
    fields: &[Field {
        name: "query",
        rules: &[Rule::Required],
    }],
};

impl Rule {
    /// `value` is already trimmed.
    fn check(self, value: &str) -> Option<String> {
        match self {
            Rule::Required if value.is_empty() => Some("This field is required.".to_string()),
            Rule::Email if !value.is_empty() && !value.validate_email() => {
                Some("Enter a valid email address.".to_string())
            }
            Rule::MaxLength(max) if value.chars().count() > max => Some(format!(
                "Ensure this value has at most {} characters (it has {}).",
                max,
                value.chars().count()
            )),
            _ => None,
        }
    }
}

impl FormSchema {
    pub fn validate(&self, raw: &HashMap<String, String>) -> Result<CleanedData, FieldErrors> {
        let mut cleaned = HashMap::new();
        let mut errors = FieldErrors::new();

        for field in self.fields {
            let value = raw.get(field.name).map(|v| v.trim()).unwrap_or("");
            // Stop at the first failing rule, so "required" is not followed
            // by a format complaint about the same empty value.
            if let Some(message) = field.rules.iter().find_map(|rule| rule.check(value)) {
                errors.entry(field.name).or_default().push(message);
            } else {
                cleaned.insert(field.name, value.to_string());
            }
        }

        if errors.is_empty() {
            Ok(CleanedData(cleaned))
        } else {
            Err(errors)
        }
    }

    /// Validates and packages the outcome for redisplay.
    pub fn bind(&self, raw: HashMap<String, String>) -> (FormView, Option<CleanedData>) {
        match self.validate(&raw) {
            Ok(cleaned) => (
                FormView {
                    values: raw,
                    errors: FieldErrors::new(),
                },
                Some(cleaned),
            ),
            Err(errors) => (FormView { values: raw, errors }, None),
        }
    }
}

/// Submitted values and validation errors, as seen by templates.
#[derive(Debug, Clone, Default)]
pub struct FormView {
    values: HashMap<String, String>,
    errors: FieldErrors,
}

impl FormView {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn value(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn errors_for(&self, name: &str) -> &[String] {
        self.errors.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn valid_share_form_is_cleaned() {
        let cleaned = SHARE_FORM
            .validate(&data(&[
                ("name", "  Ana "),
                ("email", "ana@example.com"),
                ("to", "bo@example.com"),
            ]))
            .unwrap();
        assert_eq!(cleaned.get("name"), "Ana");
        assert_eq!(cleaned.get("to"), "bo@example.com");
        assert_eq!(cleaned.get("comments"), "");
    }

    #[test]
    fn missing_required_fields_are_reported() {
        let errors = SHARE_FORM.validate(&data(&[("comments", "hi")])).unwrap_err();
        assert_eq!(
            errors.keys().copied().collect::<Vec<_>>(),
            vec!["email", "name", "to"]
        );
        assert_eq!(errors["name"], vec!["This field is required.".to_string()]);
    }

    #[test]
    fn malformed_email_is_rejected() {
        let errors = COMMENT_FORM
            .validate(&data(&[
                ("name", "Ana"),
                ("email", "not-an-address"),
                ("body", "Nice post"),
            ]))
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors["email"], vec!["Enter a valid email address.".to_string()]);
    }

    #[test]
    fn whitespace_only_counts_as_empty() {
        let errors = SEARCH_FORM.validate(&data(&[("query", "   ")])).unwrap_err();
        assert!(errors.contains_key("query"));
    }

    #[test]
    fn max_length_counts_characters() {
        let long_name = "é".repeat(26);
        let errors = SHARE_FORM
            .validate(&data(&[
                ("name", &long_name),
                ("email", "a@example.com"),
                ("to", "b@example.com"),
            ]))
            .unwrap_err();
        assert!(errors["name"][0].contains("at most 25"));

        let ok_name = "é".repeat(25);
        assert!(SHARE_FORM
            .validate(&data(&[
                ("name", &ok_name),
                ("email", "a@example.com"),
                ("to", "b@example.com"),
            ]))
            .is_ok());
    }

    #[test]
    fn bound_form_keeps_values_for_redisplay() {
        let (view, cleaned) = COMMENT_FORM.bind(data(&[("name", "Ana"), ("email", "x")]));
        assert!(cleaned.is_none());
        assert!(view.has_errors());
        assert_eq!(view.value("name"), "Ana");
        assert!(view.errors_for("name").is_empty());
        assert_eq!(view.errors_for("body").len(), 1);
    }

    #[test]
    fn empty_view_has_no_errors() {
        let view = FormView::empty();
        assert!(!view.has_errors());
        assert_eq!(view.value("anything"), "");
    }
}
