//! Page resolution for listings.
//!
//! A requested page token either resolves to a concrete [`Page`] or to a
//! corrected page number the caller should redirect to. Following the
//! redirect always resolves to a page, never to another redirect.

use std::num::IntErrorKind;

use url::form_urlencoded;

pub const POSTS_PER_PAGE: u64 = 3;
pub const PAGE_PARAM: &str = "page";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: u64,
    per_page: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub per_page: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageResolution {
    Page(Page),
    Redirect(u64),
}

impl Paginator {
    pub fn new(count: u64, per_page: u64) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    /// Never zero: an empty listing still has an (empty) first page.
    pub fn num_pages(&self) -> u64 {
        self.count.div_ceil(self.per_page).max(1)
    }

    pub fn resolve(&self, token: Option<&str>) -> PageResolution {
        let num_pages = self.num_pages();
        let number = match token {
            None => 1,
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(n) if n >= 1 => n as u64,
                // Still a positive integer, just past every possible page.
                Err(e) if *e.kind() == IntErrorKind::PosOverflow => u64::MAX,
                _ => return PageResolution::Redirect(1),
            },
        };

        if number > num_pages {
            return PageResolution::Redirect(num_pages);
        }

        PageResolution::Page(Page {
            number,
            num_pages,
            count: self.count,
            per_page: self.per_page,
        })
    }
}

impl Page {
    pub fn offset(&self) -> u64 {
        (self.number - 1) * self.per_page
    }

    pub fn limit(&self) -> u64 {
        self.per_page
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn previous_page_number(&self) -> Option<u64> {
        self.has_previous().then(|| self.number - 1)
    }

    pub fn next_page_number(&self) -> Option<u64> {
        self.has_next().then(|| self.number + 1)
    }
}

/// Rebuilds `query` with `key` set to `value`. Other parameters keep their
/// order and values; a missing `key` is appended, repeated ones collapse to
/// the first position.
pub fn replace_query_param(query: Option<&str>, key: &str, value: &str) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut written = false;

    for (k, v) in form_urlencoded::parse(query.unwrap_or("").as_bytes()) {
        if k == key {
            if !written {
                serializer.append_pair(key, value);
                written = true;
            }
        } else {
            serializer.append_pair(&k, &v);
        }
    }
    if !written {
        serializer.append_pair(key, value);
    }

    serializer.finish()
}

/// `path?query` with the page parameter rewritten.
pub fn page_url(path: &str, query: Option<&str>, page: u64) -> String {
    format!(
        "{}?{}",
        path,
        replace_query_param(query, PAGE_PARAM, &page.to_string())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paginator(count: u64) -> Paginator {
        Paginator::new(count, POSTS_PER_PAGE)
    }

    fn page_number(resolution: PageResolution) -> u64 {
        match resolution {
            PageResolution::Page(page) => page.number,
            PageResolution::Redirect(n) => panic!("expected a page, got redirect to {n}"),
        }
    }

    #[test]
    fn num_pages_rounds_up() {
        assert_eq!(paginator(0).num_pages(), 1);
        assert_eq!(paginator(3).num_pages(), 1);
        assert_eq!(paginator(4).num_pages(), 2);
        assert_eq!(paginator(9).num_pages(), 3);
    }

    #[test]
    fn absent_token_is_first_page() {
        assert_eq!(page_number(paginator(10).resolve(None)), 1);
    }

    #[test]
    fn empty_listing_renders_first_page() {
        let resolution = paginator(0).resolve(Some("1"));
        assert_eq!(page_number(resolution), 1);
    }

    #[test]
    fn non_numeric_tokens_redirect_to_first_page() {
        for token in ["abc", "", "1.5", "0", "-3", "2abc"] {
            assert_eq!(
                paginator(10).resolve(Some(token)),
                PageResolution::Redirect(1),
                "token {token:?}"
            );
        }
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        assert_eq!(page_number(paginator(10).resolve(Some(" 2 "))), 2);
    }

    #[test]
    fn past_the_end_redirects_to_last_page() {
        assert_eq!(
            paginator(10).resolve(Some("99")),
            PageResolution::Redirect(4)
        );
    }

    #[test]
    fn huge_page_number_redirects_to_last_page() {
        for token in ["99999999999999999999", "+99999999999999999999"] {
            assert_eq!(
                paginator(10).resolve(Some(token)),
                PageResolution::Redirect(4),
                "token {token:?}"
            );
        }
        assert_eq!(
            paginator(10).resolve(Some("-99999999999999999999")),
            PageResolution::Redirect(1)
        );
    }

    #[test]
    fn corrections_are_idempotent() {
        let paginator = paginator(7);
        for token in ["x", "0", "3", "100"] {
            if let PageResolution::Redirect(n) = paginator.resolve(Some(token)) {
                let again = paginator.resolve(Some(&n.to_string()));
                assert!(matches!(again, PageResolution::Page(_)), "token {token:?}");
            }
        }
    }

    #[test]
    fn page_slices_and_neighbours() {
        let page = match paginator(7).resolve(Some("2")) {
            PageResolution::Page(page) => page,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(page.offset(), 3);
        assert_eq!(page.limit(), 3);
        assert_eq!(page.previous_page_number(), Some(1));
        assert_eq!(page.next_page_number(), Some(3));

        let last = match paginator(7).resolve(Some("3")) {
            PageResolution::Page(page) => page,
            other => panic!("unexpected {other:?}"),
        };
        assert!(!last.has_next());
        assert_eq!(last.next_page_number(), None);
    }

    #[test]
    fn replace_keeps_other_params_in_order() {
        assert_eq!(
            replace_query_param(Some("sort=new&page=abc&lang=en"), "page", "1"),
            "sort=new&page=1&lang=en"
        );
    }

    #[test]
    fn replace_appends_missing_param() {
        assert_eq!(replace_query_param(Some("q=rust"), "page", "2"), "q=rust&page=2");
        assert_eq!(replace_query_param(None, "page", "2"), "page=2");
    }

    #[test]
    fn replace_collapses_repeated_param() {
        assert_eq!(
            replace_query_param(Some("page=9&x=1&page=8"), "page", "3"),
            "page=3&x=1"
        );
    }

    #[test]
    fn replace_preserves_encoded_values() {
        assert_eq!(
            replace_query_param(Some("q=hello+world&page=x"), "page", "1"),
            "q=hello+world&page=1"
        );
    }

    #[test]
    fn page_url_joins_path_and_query() {
        assert_eq!(page_url("/tag/rust/", Some("page=0"), 1), "/tag/rust/?page=1");
    }
}
