//! Ranking functions used by post search.
//!
//! Both functions are registered as SQLite scalar functions on every pooled
//! connection (see [`crate::db::register_functions`]) so the ranking runs
//! inside the query that filters published posts.

use std::collections::HashSet;

use serde::Deserialize;

pub const TITLE_WEIGHT: f64 = 1.0;
pub const BODY_WEIGHT: f64 = 0.4;

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategy {
    /// Fuzzy match of the query against post titles.
    #[default]
    Trigram,
    /// Term matches across title and body, title weighted higher.
    Weighted,
}

impl SearchStrategy {
    pub fn default_threshold(self) -> f64 {
        match self {
            SearchStrategy::Trigram => 0.1,
            SearchStrategy::Weighted => 0.3,
        }
    }
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
}

/// Distinct trigrams of `text`, with each word padded by two leading
/// spaces and one trailing space.
pub fn trigrams(text: &str) -> HashSet<String> {
    let mut set = HashSet::new();
    for word in words(text) {
        let padded: Vec<char> = "  ".chars().chain(word.chars()).chain(" ".chars()).collect();
        for window in padded.windows(3) {
            set.insert(window.iter().collect());
        }
    }
    set
}

/// Shared trigrams over the union of both trigram sets, in `[0, 1]`.
pub fn trigram_similarity(a: &str, b: &str) -> f64 {
    let left = trigrams(a);
    let right = trigrams(b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let shared = left.intersection(&right).count();
    let union = left.len() + right.len() - shared;
    shared as f64 / union as f64
}

/// Fraction of query terms present in the title, plus the fraction present
/// in the body scaled by [`BODY_WEIGHT`].
pub fn weighted_rank(title: &str, body: &str, query: &str) -> f64 {
    let terms: HashSet<String> = words(query).collect();
    if terms.is_empty() {
        return 0.0;
    }
    let title_words: HashSet<String> = words(title).collect();
    let body_words: HashSet<String> = words(body).collect();

    let total = terms.len() as f64;
    let in_title = terms.iter().filter(|t| title_words.contains(*t)).count() as f64;
    let in_body = terms.iter().filter(|t| body_words.contains(*t)).count() as f64;

    TITLE_WEIGHT * (in_title / total) + BODY_WEIGHT * (in_body / total)
}
