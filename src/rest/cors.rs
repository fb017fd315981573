//! CORS and Private Network Access
//!
//! The frontend is hosted on a public origin and calls into this service on the
//! local network, so every response must opt in to both CORS and Private
//! Network Access. The stage runs around the whole router:
//!
//! - before the handler: any `OPTIONS` request is answered with an empty 204
//! - after the handler: the same headers are added to every response
//!
//! By default the request `Origin` is reflected for any caller. Configuring
//! `server.cors_origins` restricts reflection to that list.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension,
};

use super::AppState;

pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type";

pub static ALLOW_PRIVATE_NETWORK: HeaderName =
    HeaderName::from_static("access-control-allow-private-network");

/// Which origins get reflected in `Access-Control-Allow-Origin`.
#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
}

impl CorsPolicy {
    /// Reflect only the listed origins. An empty list reflects every origin.
    pub fn with_origins(origins: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            allowed_origins: origins.into_iter().map(Into::into).collect(),
        }
    }

    /// Value for `Access-Control-Allow-Origin`, or `None` when the origin is refused.
    pub fn allow_origin(&self, origin: Option<&HeaderValue>) -> Option<HeaderValue> {
        let origin = match origin.filter(|o| !o.is_empty()) {
            Some(origin) => origin,
            None => return Some(HeaderValue::from_static("*")),
        };

        if self.allowed_origins.is_empty() {
            return Some(origin.clone());
        }

        let origin_str = origin.to_str().ok()?;
        self.allowed_origins
            .iter()
            .any(|allowed| allowed == origin_str)
            .then(|| origin.clone())
    }

    /// Add the CORS and Private Network Access headers to `headers`.
    pub fn apply(&self, headers: &mut HeaderMap, origin: Option<&HeaderValue>) {
        if let Some(allow_origin) = self.allow_origin(origin) {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
        }
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        headers.insert(
            ALLOW_PRIVATE_NETWORK.clone(),
            HeaderValue::from_static("true"),
        );
    }
}

/// Middleware: preflight short-circuit plus CORS headers on every response.
pub async fn cors_middleware(
    Extension(state): Extension<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let origin = req.headers().get(header::ORIGIN).cloned();

    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };

    state.cors.apply(response.headers_mut(), origin.as_ref());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_origin_is_wildcard() {
        let policy = CorsPolicy::default();
        assert_eq!(
            policy.allow_origin(None),
            Some(HeaderValue::from_static("*"))
        );
        assert_eq!(
            policy.allow_origin(Some(&HeaderValue::from_static(""))),
            Some(HeaderValue::from_static("*"))
        );
    }

    #[test]
    fn test_default_reflects_any_origin() {
        let policy = CorsPolicy::default();
        let origin = HeaderValue::from_static("https://example.github.io");
        assert_eq!(policy.allow_origin(Some(&origin)), Some(origin));
    }

    #[test]
    fn test_allow_list_reflects_listed_origin_only() {
        let policy = CorsPolicy::with_origins(["https://wizyta.github.io"]);

        let listed = HeaderValue::from_static("https://wizyta.github.io");
        assert_eq!(policy.allow_origin(Some(&listed)), Some(listed));

        let other = HeaderValue::from_static("https://evil.example");
        assert_eq!(policy.allow_origin(Some(&other)), None);
    }

    #[test]
    fn test_apply_sets_all_headers() {
        let policy = CorsPolicy::default();
        let mut headers = HeaderMap::new();
        let origin = HeaderValue::from_static("http://localhost:5173");
        policy.apply(&mut headers, Some(&origin));

        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:5173");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], ALLOW_METHODS);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], ALLOW_HEADERS);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[&ALLOW_PRIVATE_NETWORK], "true");
    }

    #[test]
    fn test_apply_refused_origin_omits_allow_origin() {
        let policy = CorsPolicy::with_origins(["https://wizyta.github.io"]);
        let mut headers = HeaderMap::new();
        let origin = HeaderValue::from_static("https://evil.example");
        policy.apply(&mut headers, Some(&origin));

        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert_eq!(headers[&ALLOW_PRIVATE_NETWORK], "true");
    }
}
