//! HTTP API Module
//!
//! Route table of the local control plane. Every request passes through the
//! CORS stage in [`cors`] before reaching a handler.
//!
//! | Route | Handler |
//! |-------|---------|
//! | `GET /` | [`handlers::frontend::index`] |
//! | `GET /assets/*` | [`handlers::frontend::assets_router`] |
//! | `GET /api/health` | [`handlers::health::health`] |
//! | `GET /api/debug/logs` | [`handlers::debug::debug_logs`] |
//! | `POST /api/session-key` | [`handlers::session::session_key`] |

pub mod cors;
pub mod dto;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Extension, Router,
};

use crate::config::{Config, PathsConfig};
use crate::logging::LogPaths;
use crate::store::ConfigStore;

use self::cors::CorsPolicy;
use self::handlers::{debug, frontend, health, session};

/// State shared by every handler.
#[derive(Debug)]
pub struct AppState {
    pub store: ConfigStore,
    pub paths: PathsConfig,
    pub logs: LogPaths,
    /// Port reported by the health endpoint
    pub port: u16,
    pub cors: CorsPolicy,
}

impl AppState {
    /// Open the configuration document under the install directory.
    pub fn from_config(config: &Config) -> Self {
        let paths = config.paths.clone();
        Self {
            store: ConfigStore::open(paths.config_file()),
            logs: LogPaths::in_dir(&paths.log_dir()),
            paths,
            port: config.server.port,
            cors: CorsPolicy::with_origins(config.server.cors_origins.iter().cloned()),
        }
    }
}

/// Creates the Axum router
pub fn create_router(state: Arc<AppState>) -> Router {
    let assets_dir = state.paths.assets_dir();

    // Extension must be the OUTER layer so the CORS middleware can extract it.
    Router::new()
        .route("/", get(frontend::index))
        .route("/api/health", get(health::health))
        .route("/api/debug/logs", get(debug::debug_logs))
        .route("/api/session-key", post(session::session_key))
        .merge(frontend::assets_router(assets_dir))
        .layer(middleware::from_fn(cors::cors_middleware))
        .layer(Extension(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use tower::ServiceExt;

    fn make_app() -> (Router, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.paths.base_dir = tmp.path().to_path_buf();
        (create_router(Arc::new(AppState::from_config(&config))), tmp)
    }

    // In Axum, .layer(A).layer(B) means B wraps A (B runs first).
    // The CORS middleware extracts Extension<Arc<AppState>>, so a wrong order
    // turns every request into a 500.
    #[tokio::test]
    async fn test_router_health_with_middleware_does_not_500() {
        let (app, _tmp) = make_app();
        let req = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_preflight_short_circuits_with_204() {
        let (app, _tmp) = make_app();
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/session-key")
            .header(header::ORIGIN, "https://wizyta.github.io")
            .header("access-control-request-method", "POST")
            .header("access-control-request-private-network", "true")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        let headers = resp.headers();
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://wizyta.github.io"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET, POST, OPTIONS");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers["access-control-allow-private-network"], "true");

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_preflight_on_get_only_route() {
        let (app, _tmp) = make_app();
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn test_allow_list_from_config() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.paths.base_dir = tmp.path().to_path_buf();
        config.server.cors_origins = vec!["https://wizyta.github.io".to_string()];
        let app = create_router(Arc::new(AppState::from_config(&config)));

        let req = Request::builder()
            .uri("/api/health")
            .header(header::ORIGIN, "https://other.example")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn test_health_reports_configured_port() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.paths.base_dir = tmp.path().to_path_buf();
        config.server.port = 9123;
        let app = create_router(Arc::new(AppState::from_config(&config)));

        let req = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["port"], 9123);
    }
}
