use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

/// Path, raw query string and Host header of the current request.
#[derive(Debug, Clone)]
pub struct RequestUrl {
    pub path: String,
    pub query: Option<String>,
    pub host: Option<String>,
}

impl<S> FromRequestParts<S> for RequestUrl
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string)
            .or_else(|| parts.uri.authority().map(|a| a.to_string()));

        Ok(RequestUrl {
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            host,
        })
    }
}

impl RequestUrl {
    /// First value of `key` in the query string, decoded.
    pub fn query_param(&self, key: &str) -> Option<String> {
        url::form_urlencoded::parse(self.query.as_deref().unwrap_or("").as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    /// `base_url` when configured, otherwise `http://{host}`.
    pub fn absolute(&self, base_url: Option<&str>, path: &str) -> String {
        match base_url {
            Some(base) => format!("{}{}", base.trim_end_matches('/'), path),
            None => format!(
                "http://{}{}",
                self.host.as_deref().unwrap_or("localhost"),
                path
            ),
        }
    }
}
