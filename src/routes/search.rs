use std::collections::HashMap;

use askama::Template;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::config::SearchConfig;
use crate::db::models::SearchHit;
use crate::db::posts;
use crate::error::AppResult;
use crate::forms::{FormView, SEARCH_FORM};
use crate::routes::Html;
use crate::state::{AppState, DbPool};

#[derive(Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/search.html")]
pub struct SearchTemplate {
    pub site_title: String,
    pub form: FormView,
    pub query: Option<String>,
    pub results: Vec<SearchHit>,
}

pub struct SearchOutcome {
    pub form: FormView,
    /// The cleaned query when one was run.
    pub query: Option<String>,
    pub results: Vec<SearchHit>,
}

/// Absent, empty and whitespace-only queries return before a connection
/// is taken from the pool.
pub fn run_search(
    pool: &DbPool,
    config: &SearchConfig,
    raw_query: Option<String>,
) -> AppResult<SearchOutcome> {
    let raw_query = match raw_query {
        Some(q) if !q.is_empty() => q,
        _ => {
            return Ok(SearchOutcome {
                form: FormView::empty(),
                query: None,
                results: Vec::new(),
            })
        }
    };

    let (form, cleaned) = SEARCH_FORM.bind(HashMap::from([("query".to_string(), raw_query)]));
    let Some(cleaned) = cleaned else {
        return Ok(SearchOutcome {
            form,
            query: None,
            results: Vec::new(),
        });
    };

    let query = cleaned.get("query").to_string();
    let conn = pool.get()?;
    let results = posts::search_published(
        &conn,
        config.strategy,
        &query,
        config.effective_threshold(),
    )?;
    tracing::debug!(%query, hits = results.len(), "Search");

    Ok(SearchOutcome {
        form,
        query: Some(query),
        results,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/search/", get(post_search))
}

pub async fn post_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Response> {
    let outcome = run_search(&state.db, &state.config.search, params.query)?;

    Ok(Html(SearchTemplate {
        site_title: state.config.site.title.clone(),
        form: outcome.form,
        query: outcome.query,
        results: outcome.results,
    })
    .into_response())
}
