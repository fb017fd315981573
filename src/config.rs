//! Configuration System
//!
//! Process settings (bind address, install directory, TLS, logging) loaded from:
//! - powiernik.toml (default configuration)
//! - powiernik.local.toml (git-ignored local overrides)
//! - Environment variables (POWIERNIK_* prefix)
//!
//! These settings are separate from the JSON configuration document managed by
//! [`crate::store::ConfigStore`], which holds user-facing values such as the
//! selected transcriber and the session key.
//!
//! ## Example
//!
//! ```toml
//! # powiernik.toml
//! [server]
//! host = "0.0.0.0"
//! port = 8089
//!
//! [paths]
//! base_dir = "/opt/powiernik"
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! POWIERNIK_SERVER__PORT=9000
//! POWIERNIK_TLS__ENABLED=false
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration struct
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub tls: TlsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (all interfaces by default)
    #[serde(default = "default_host")]
    pub host: String,

    /// Fixed listening port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins. Empty means the request `Origin` is echoed back
    /// for every caller.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Install directory layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding index.html, assets/, config.json, logs/ and ssl/
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
}

/// Self-signed TLS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Try to bootstrap a certificate and serve HTTPS
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level for this crate (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log level applied to the HTTP framework crates (hyper, axum, tower_http)
    #[serde(default = "default_framework_level")]
    pub framework_level: String,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8089
}
fn default_base_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_framework_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Merges in order:
    /// 1. powiernik.toml (base configuration)
    /// 2. powiernik.local.toml (local overrides, git-ignored)
    /// 3. Environment variables (POWIERNIK_* prefix)
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("powiernik.toml"))
            .merge(Toml::file("powiernik.local.toml"))
            .merge(Env::prefixed("POWIERNIK_").split("__"))
            .extract()
    }

    /// Load configuration from specific file path
    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("POWIERNIK_").split("__"))
            .extract()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig::default(),
            paths: PathsConfig::default(),
            tls: TlsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            base_dir: default_base_dir(),
        }
    }
}

impl Default for TlsConfig {
    fn default() -> Self {
        TlsConfig {
            enabled: default_true(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            framework_level: default_framework_level(),
        }
    }
}

impl PathsConfig {
    /// Frontend entry page
    pub fn index_file(&self) -> PathBuf {
        self.base_dir.join("index.html")
    }

    /// Static frontend assets (CSS, JS, images)
    pub fn assets_dir(&self) -> PathBuf {
        self.base_dir.join("assets")
    }

    /// JSON configuration document
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Directory holding app.log and stdout.log
    pub fn log_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Directory holding cert.pem and key.pem
    pub fn cert_dir(&self) -> PathBuf {
        self.base_dir.join("ssl")
    }
}
