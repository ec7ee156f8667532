pub mod assets;
pub mod comments;
pub mod posts;
pub mod search;
pub mod share;

use askama::Template;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

/// 302 to `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

// The router allows one parameter name per position, so the leading
// segment is `key` in every module: a publish year for detail pages, a
// post id for share and comment. Handlers extract it positionally.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(posts::router())
        .merge(share::router())
        .merge(comments::router())
        .merge(search::router())
        .merge(assets::router())
}

/// The full application with tracing, ready to serve.
pub fn app(state: AppState) -> Router {
    router().layer(TraceLayer::new_for_http()).with_state(state)
}
