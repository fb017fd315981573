//! # Powiernik
//!
//! Local backend bridging the Wizyta web frontend and its browser extension.
//!
//! ## Architecture
//!
//! ```text
//! process start
//!     ↓
//! [config]     → process settings (powiernik.toml, env, CLI)
//!     ↓
//! [logging]    → stdout + logs/app.log
//!     ↓
//! [tls]        → ssl/cert.pem + ssl/key.pem (generated if missing)
//!     ↓
//! [server]     → HTTPS if a certificate is available, else HTTP
//!     ↓
//! [rest::cors] → preflight + CORS / Private Network Access headers
//!     ↓
//! [rest::handlers] ↔ [store] (config.json), [logging::read_tail]
//! ```
//!
//! ## Module Organization
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `config` | Process settings (bind address, install dir, TLS, logging) |
//! | `store` | JSON configuration document with get/set |
//! | `logging` | Line-formatted log sink and bounded tail reader |
//! | `tls` | Self-signed localhost certificate bootstrap |
//! | `rest` | Router, CORS stage, handlers |
//! | `server` | Startup sequence and listeners |

pub mod config;
pub mod logging;
pub mod rest;
pub mod server;
pub mod store;
pub mod tls;

pub use crate::config::Config;
pub use crate::store::{ConfigStore, StoreError};
