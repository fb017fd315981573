//! Session key hand-off from the browser extension.

use std::sync::Arc;

use axum::body::Bytes;
use axum::{Extension, Json};
use serde_json::Value;
use tracing::info;

use crate::rest::dto::SessionKeyAccepted;
use crate::rest::error::RestError;
use crate::rest::AppState;
use crate::store::keys;

/// `POST /api/session-key` with `{"sessionKey": "<non-empty string>"}`.
///
/// A body that is not JSON is a 500 carrying the parser message; a missing or
/// empty `sessionKey` is a 400. A failed save is logged by the store and the
/// key is still accepted for this process.
pub async fn session_key(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SessionKeyAccepted>, RestError> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| RestError::internal(format!("Invalid JSON body: {e}")))?;

    let key = payload
        .get("sessionKey")
        .and_then(Value::as_str)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| RestError::bad_request("Missing sessionKey"))?;

    let key = key.to_string();
    // Save errors are already logged by the store.
    let _ = tokio::task::spawn_blocking(move || state.store.set(keys::SESSION_KEY, key)).await?;
    info!("Session key received from browser extension");

    Ok(Json(SessionKeyAccepted {
        success: true,
        message: "Session key saved".to_string(),
    }))
}
