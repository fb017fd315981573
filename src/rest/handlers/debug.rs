//! Debug Handlers
//!
//! Exposes the tail of both log files so the frontend can show what the
//! backend has been doing.

use std::collections::HashMap;
use std::num::IntErrorKind;
use std::sync::Arc;

use axum::extract::Query;
use axum::{Extension, Json};

use crate::logging::{read_tail, DEFAULT_TAIL_LINES};
use crate::rest::dto::{iso_timestamp, LogsDto};
use crate::rest::error::RestError;
use crate::rest::AppState;

pub const MIN_TAIL_LINES: usize = 10;
pub const MAX_TAIL_LINES: usize = 2000;

/// Interpret the `tail` query parameter.
///
/// Unparsable input falls back to the default; numbers are clamped to
/// `[MIN_TAIL_LINES, MAX_TAIL_LINES]`, including ones too large for `i64`.
pub fn parse_tail(raw: Option<&str>) -> usize {
    let requested: i64 = match raw.map(|s| s.trim().parse::<i64>()) {
        None => DEFAULT_TAIL_LINES as i64,
        Some(Ok(n)) => n,
        Some(Err(e)) => match e.kind() {
            IntErrorKind::PosOverflow => i64::MAX,
            IntErrorKind::NegOverflow => i64::MIN,
            _ => DEFAULT_TAIL_LINES as i64,
        },
    };
    requested.clamp(MIN_TAIL_LINES as i64, MAX_TAIL_LINES as i64) as usize
}

/// `GET /api/debug/logs?tail=N`
pub async fn debug_logs(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<LogsDto>, RestError> {
    let tail = parse_tail(params.get("tail").map(String::as_str));
    let logs = state.logs.clone();

    let (lines, stdout_lines) = tokio::task::spawn_blocking(move || {
        (
            read_tail(&logs.app_log, tail),
            read_tail(&logs.stdout_log, tail),
        )
    })
    .await?;

    Ok(Json(LogsDto {
        lines,
        stdout_lines,
        timestamp: iso_timestamp(),
    }))
}
