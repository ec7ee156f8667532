use askama::Template;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use chrono::NaiveDate;

use crate::db::comments;
use crate::db::models::{Comment, Post, Tag};
use crate::db::posts::{self, SIMILAR_POSTS_LIMIT};
use crate::error::{AppError, AppResult, OptionalRow};
use crate::extractors::RequestUrl;
use crate::forms::FormView;
use crate::pagination::{page_url, Page, PageResolution, Paginator, PAGE_PARAM, POSTS_PER_PAGE};
use crate::routes::{found, Html};
use crate::state::AppState;

// --- View structs ---

pub struct PaginationLinks {
    pub number: u64,
    pub num_pages: u64,
    pub previous_url: Option<String>,
    pub next_url: Option<String>,
}

impl PaginationLinks {
    fn new(page: &Page, url: &RequestUrl) -> Self {
        let link = |n: u64| page_url(&url.path, url.query.as_deref(), n);
        Self {
            number: page.number,
            num_pages: page.num_pages,
            previous_url: page.previous_page_number().map(link),
            next_url: page.next_page_number().map(link),
        }
    }
}

// --- Templates ---

#[derive(Template)]
#[template(path = "pages/post_list.html")]
pub struct PostListTemplate {
    pub site_title: String,
    pub posts: Vec<Post>,
    pub tag: Option<Tag>,
    pub pagination: PaginationLinks,
}

#[derive(Template)]
#[template(path = "pages/post_detail.html")]
pub struct PostDetailTemplate {
    pub site_title: String,
    pub post: Post,
    pub comments: Vec<Comment>,
    pub form: FormView,
    pub similar_posts: Vec<Post>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(post_list))
        .route("/tag/{tag_slug}/", get(post_list_by_tag))
        .route("/{key}/{month}/{day}/{slug}/", get(post_detail))
}

// --- Handlers ---

pub async fn post_list(State(state): State<AppState>, url: RequestUrl) -> AppResult<Response> {
    render_list(&state, None, &url)
}

pub async fn post_list_by_tag(
    State(state): State<AppState>,
    Path(tag_slug): Path<String>,
    url: RequestUrl,
) -> AppResult<Response> {
    render_list(&state, Some(&tag_slug), &url)
}

fn render_list(state: &AppState, tag_slug: Option<&str>, url: &RequestUrl) -> AppResult<Response> {
    let conn = state.db.get()?;

    let tag = match tag_slug {
        Some(slug) => Some(posts::find_tag_by_slug(&conn, slug).or_not_found()?),
        None => None,
    };

    let count = posts::count_published(&conn, tag.as_ref())?;
    let paginator = Paginator::new(count, POSTS_PER_PAGE);
    let page = match paginator.resolve(url.query_param(PAGE_PARAM).as_deref()) {
        PageResolution::Page(page) => page,
        PageResolution::Redirect(corrected) => {
            tracing::debug!(path = %url.path, corrected, "Correcting page parameter");
            return Ok(found(&page_url(&url.path, url.query.as_deref(), corrected)));
        }
    };

    let posts = posts::list_published(&conn, tag.as_ref(), page.limit(), page.offset())?;

    Ok(Html(PostListTemplate {
        site_title: state.config.site.title.clone(),
        posts,
        tag,
        pagination: PaginationLinks::new(&page, url),
    })
    .into_response())
}

/// Year, month and day must form a real calendar date.
pub fn parse_publish_date(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

pub async fn post_detail(
    State(state): State<AppState>,
    Path((year, month, day, slug)): Path<(String, String, String, String)>,
) -> AppResult<Response> {
    let date = parse_publish_date(&year, &month, &day).ok_or(AppError::NotFound)?;

    let conn = state.db.get()?;
    let post = posts::find_published_by_date(&conn, date, &slug).or_not_found()?;
    let comments = comments::active_for_post(&conn, post.id)?;
    let similar_posts = posts::similar_posts(&conn, post.id, SIMILAR_POSTS_LIMIT)?;

    Ok(Html(PostDetailTemplate {
        site_title: state.config.site.title.clone(),
        post,
        comments,
        form: FormView::empty(),
        similar_posts,
    })
    .into_response())
}

/// Post ids in URLs are positive integers; anything else cannot match.
pub fn parse_post_id(raw: &str) -> AppResult<i64> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or(AppError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_date_rejects_impossible_dates() {
        assert_eq!(
            parse_publish_date("2024", "2", "29"),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(parse_publish_date("2023", "2", "29"), None);
        assert_eq!(parse_publish_date("2024", "13", "1"), None);
        assert_eq!(parse_publish_date("twenty", "1", "1"), None);
    }

    #[test]
    fn post_id_must_be_positive_integer() {
        assert_eq!(parse_post_id("12").unwrap(), 12);
        assert!(matches!(parse_post_id("0"), Err(AppError::NotFound)));
        assert!(matches!(parse_post_id("abc"), Err(AppError::NotFound)));
    }

    #[test]
    fn pagination_links_preserve_other_params() {
        let url = RequestUrl {
            path: "/".into(),
            query: Some("page=2&lang=en".into()),
            host: None,
        };
        let page = match Paginator::new(9, POSTS_PER_PAGE).resolve(Some("2")) {
            PageResolution::Page(page) => page,
            other => panic!("unexpected {other:?}"),
        };
        let links = PaginationLinks::new(&page, &url);
        assert_eq!(links.previous_url.as_deref(), Some("/?page=1&lang=en"));
        assert_eq!(links.next_url.as_deref(), Some("/?page=3&lang=en"));
    }
}
