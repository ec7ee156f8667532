use std::collections::HashMap;

use askama::Template;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Router};

use crate::db::models::Post;
use crate::db::posts;
use crate::error::{AppResult, OptionalRow};
use crate::extractors::RequestUrl;
use crate::forms::{CleanedData, FormView, SHARE_FORM};
use crate::mail::OutgoingMail;
use crate::routes::posts::parse_post_id;
use crate::routes::Html;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/share.html")]
pub struct ShareTemplate {
    pub site_title: String,
    pub post: Post,
    pub form: FormView,
    pub sent: bool,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{key}/share/", get(share_form).post(share_submit))
}

/// Subject and body of the recommendation sent for `post`.
pub fn compose_share_mail(post: &Post, post_url: &str, cleaned: &CleanedData) -> OutgoingMail {
    let name = cleaned.get("name");
    OutgoingMail {
        subject: format!(
            "{} {} recommends you to read {}",
            name,
            cleaned.get("email"),
            post.title
        ),
        body: format!(
            "Read {} at {}\n\n{}'s comments: {}",
            post.title,
            post_url,
            name,
            cleaned.get("comments")
        ),
        recipients: vec![cleaned.get("to").to_string()],
    }
}

fn load_post(state: &AppState, raw_id: &str) -> AppResult<Post> {
    let id = parse_post_id(raw_id)?;
    let conn = state.db.get()?;
    posts::find_published_by_id(&conn, id).or_not_found()
}

pub async fn share_form(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<Response> {
    let post = load_post(&state, &raw_id)?;

    Ok(Html(ShareTemplate {
        site_title: state.config.site.title.clone(),
        post,
        form: FormView::empty(),
        sent: false,
    })
    .into_response())
}

pub async fn share_submit(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    url: RequestUrl,
    Form(data): Form<HashMap<String, String>>,
) -> AppResult<Response> {
    let post = load_post(&state, &raw_id)?;

    let (form, cleaned) = SHARE_FORM.bind(data);
    let sent = match cleaned {
        Some(cleaned) => {
            let post_url = url.absolute(state.config.site.base_url.as_deref(), &post.url());
            let mail = compose_share_mail(&post, &post_url, &cleaned);
            state.mailer.send(mail).await?;
            tracing::info!(post_id = post.id, "Shared post by email");
            true
        }
        None => false,
    };

    Ok(Html(ShareTemplate {
        site_title: state.config.site.title.clone(),
        post,
        form,
        sent,
    })
    .into_response())
}
