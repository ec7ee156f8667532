use chrono::{Datelike, NaiveDateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostStatus {
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "DF",
            PostStatus::Published => "PB",
        }
    }
}

impl ToSql for PostStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PostStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "DF" => Ok(PostStatus::Draft),
            "PB" => Ok(PostStatus::Published),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

impl Tag {
    pub fn url(&self) -> String {
        format!("/tag/{}/", self.slug)
    }
}

#[derive(Debug, Clone)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub author: String,
    pub body: String,
    pub publish: NaiveDateTime,
    pub status: PostStatus,
    pub tags: Vec<Tag>,
}

impl Post {
    /// Canonical detail URL: `/{year}/{month}/{day}/{slug}/`, unpadded.
    pub fn url(&self) -> String {
        format!(
            "/{}/{}/{}/{}/",
            self.publish.year(),
            self.publish.month(),
            self.publish.day(),
            self.slug
        )
    }

    pub fn share_url(&self) -> String {
        format!("/{}/share/", self.id)
    }

    pub fn comment_url(&self) -> String {
        format!("/{}/comment/", self.id)
    }

    pub fn publish_display(&self) -> String {
        self.publish.format("%b %-d, %Y").to_string()
    }

    pub fn excerpt(&self, words: usize) -> String {
        let mut parts = self.body.split_whitespace();
        let head: Vec<&str> = parts.by_ref().take(words).collect();
        if parts.next().is_some() {
            format!("{} …", head.join(" "))
        } else {
            head.join(" ")
        }
    }
}

/// Fields needed to insert a post; tags are given as display names.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub slug: String,
    pub author: String,
    pub body: String,
    pub publish: NaiveDateTime,
    pub status: PostStatus,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub name: String,
    pub email: String,
    pub body: String,
    pub created: NaiveDateTime,
    pub active: bool,
}

impl Comment {
    pub fn created_display(&self) -> String {
        format_relative_time(&self.created)
    }
}

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub post: Post,
    pub score: f64,
}

pub fn format_relative_time(dt: &NaiveDateTime) -> String {
    let now = Utc::now().naive_utc();
    let diff = now.signed_duration_since(*dt);

    let seconds = diff.num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }

    let minutes = diff.num_minutes();
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }

    let hours = diff.num_hours();
    if hours < 24 {
        return format!("{}h ago", hours);
    }

    let days = diff.num_days();
    if days < 7 {
        return format!("{}d ago", days);
    }

    dt.format("%b %-d, %Y").to_string()
}

/// Lowercase slug of the alphanumeric characters in any script; runs of
/// other characters collapse to one hyphen. May be empty.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}
