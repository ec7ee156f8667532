use std::collections::HashMap;

use askama::Template;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Form, Router};

use crate::db::comments;
use crate::db::models::{Comment, Post};
use crate::db::posts;
use crate::error::{AppResult, OptionalRow};
use crate::forms::{FormView, COMMENT_FORM};
use crate::routes::posts::parse_post_id;
use crate::routes::Html;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/comment.html")]
pub struct CommentTemplate {
    pub site_title: String,
    pub post: Post,
    pub form: FormView,
    pub comment: Option<Comment>,
}

// POST only: the method router answers anything else with 405.
pub fn router() -> Router<AppState> {
    Router::new().route("/{key}/comment/", post(post_comment))
}

async fn post_comment(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Form(data): Form<HashMap<String, String>>,
) -> AppResult<Response> {
    let id = parse_post_id(&raw_id)?;
    let conn = state.db.get()?;
    let post = posts::find_published_by_id(&conn, id).or_not_found()?;

    let (form, cleaned) = COMMENT_FORM.bind(data);
    let comment = match cleaned {
        Some(cleaned) => {
            let comment = comments::insert_comment(
                &conn,
                post.id,
                cleaned.get("name"),
                cleaned.get("email"),
                cleaned.get("body"),
            )?;
            tracing::info!(post_id = post.id, comment_id = comment.id, "Comment added");
            Some(comment)
        }
        None => None,
    };

    Ok(Html(CommentTemplate {
        site_title: state.config.site.title.clone(),
        post,
        form,
        comment,
    })
    .into_response())
}
