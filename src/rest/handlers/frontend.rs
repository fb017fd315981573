//! Static frontend serving: `index.html` at `/` and files under `/assets`.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::handler::HandlerWithoutStateExt;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use axum::Extension;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

use crate::rest::AppState;

pub const FRONTEND_MISSING: &str = "Frontend not found. Run the installer again.";
pub const ASSET_MISSING: &str = "Asset not found";

/// `GET /`
pub async fn index(Extension(state): Extension<Arc<AppState>>, req: Request<Body>) -> Response {
    let index = state.paths.index_file();
    if !index.is_file() {
        return (StatusCode::NOT_FOUND, FRONTEND_MISSING).into_response();
    }

    match ServeFile::new(index).oneshot(req).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

async fn asset_not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, ASSET_MISSING)
}

/// Router serving `assets_dir`, answering 404 with a plain-text message when
/// the directory or file is missing.
pub fn assets_router(assets_dir: PathBuf) -> Router {
    let serve_dir = ServeDir::new(assets_dir).not_found_service(asset_not_found.into_service());
    Router::new().nest_service("/assets", serve_dir)
}
