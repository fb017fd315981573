//! REST API Data Transfer Objects
//!
//! Request/response bodies of the `/api/*` endpoints.

use chrono::Local;
use serde::Serialize;
use serde_json::Value;

/// Local time in ISO 8601 form without an offset, e.g. `2024-03-09T07:05:01.123456`.
pub fn iso_timestamp() -> String {
    Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// `GET /api/health`
#[derive(Debug, Serialize)]
pub struct HealthDto {
    pub ok: bool,
    pub message: String,
    /// Transcriber backend selected in the configuration document
    pub backend: Value,
    pub model: Value,
    pub device: Value,
    pub port: u16,
    pub timestamp: String,
}

/// `GET /api/debug/logs`
#[derive(Debug, Serialize)]
pub struct LogsDto {
    /// Tail of app.log
    pub lines: Vec<String>,
    /// Tail of stdout.log
    pub stdout_lines: Vec<String>,
    pub timestamp: String,
}

/// Successful `POST /api/session-key`
#[derive(Debug, Serialize)]
pub struct SessionKeyAccepted {
    pub success: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_timestamp_shape() {
        let ts = iso_timestamp();
        // 2024-03-09T07:05:01.123456
        assert_eq!(ts.len(), 26);
        assert_eq!(&ts[10..11], "T");
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, "%Y-%m-%dT%H:%M:%S%.f").is_ok());
    }

    #[test]
    fn test_session_key_accepted_serialization() {
        let dto = SessionKeyAccepted {
            success: true,
            message: "Session key saved".to_string(),
        };
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Session key saved");
    }
}
