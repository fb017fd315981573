//! REST API Handlers
//!
//! HTTP endpoint handlers organized by concern.

pub mod debug;
pub mod frontend;
pub mod health;
pub mod session;
