//! Health check endpoint polled by the frontend to discover the backend.

use std::sync::Arc;

use axum::{Extension, Json};
use serde_json::Value;

use crate::rest::dto::{iso_timestamp, HealthDto};
use crate::rest::AppState;
use crate::store::keys;

pub const DEFAULT_BACKEND: &str = "openvino_whisper";
pub const DEFAULT_MODEL: &str = "small";
pub const DEFAULT_DEVICE: &str = "auto";

/// Always 200; missing configuration values fall back to the defaults.
pub async fn health(Extension(state): Extension<Arc<AppState>>) -> Json<HealthDto> {
    let port = state.port;
    let (backend, model, device) = tokio::task::spawn_blocking(move || {
        let store = &state.store;
        (
            store.get_or(keys::TRANSCRIBER_BACKEND, DEFAULT_BACKEND),
            store.get_or(keys::TRANSCRIBER_MODEL, DEFAULT_MODEL),
            store.get_or(keys::SELECTED_DEVICE, DEFAULT_DEVICE),
        )
    })
    .await
    .unwrap_or_else(|_| {
        (
            Value::from(DEFAULT_BACKEND),
            Value::from(DEFAULT_MODEL),
            Value::from(DEFAULT_DEVICE),
        )
    });

    Json(HealthDto {
        ok: true,
        message: "Powiernik is responding".to_string(),
        backend,
        model,
        device,
        port,
        timestamp: iso_timestamp(),
    })
}
