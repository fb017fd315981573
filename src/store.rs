//! JSON Configuration Document
//!
//! A flat key-value JSON object persisted next to the frontend. Unknown keys are
//! kept as-is; every `set` rewrites the whole document.
//!
//! The file is read again on every access, so values written by other tools
//! are picked up without a restart. A missing or corrupt file reads as an empty
//! document. When a save fails, the document that could not be written is kept
//! in memory and served instead of the file until a later save succeeds.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, warn};

/// Keys read by the HTTP service.
pub mod keys {
    pub const TRANSCRIBER_BACKEND: &str = "transcriber_backend";
    pub const TRANSCRIBER_MODEL: &str = "transcriber_model";
    pub const SELECTED_DEVICE: &str = "selected_device";
    pub const SESSION_KEY: &str = "session_key";
}

/// Configuration document errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cannot read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("cannot write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{path} does not contain a JSON object")]
    NotAnObject { path: PathBuf },

    #[error("cannot serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// File-backed configuration document shared by all request handlers.
///
/// The lock orders this process's reads and load-modify-save sequences against
/// each other. Other processes editing the file are not coordinated with; the
/// last writer wins.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    /// Document whose last save failed. Takes precedence over the file.
    unsaved: RwLock<Option<Map<String, Value>>>,
}

impl ConfigStore {
    /// Store backed by `path`. The file does not need to exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if let Err(e) = Self::load_document(&path) {
            warn!("{e}; the configuration reads as empty until it is rewritten");
        }
        Self {
            path,
            unsaved: RwLock::new(None),
        }
    }

    /// Read and parse the document. A missing file is an empty document.
    pub fn load_document(path: &Path) -> Result<Map<String, Value>, StoreError> {
        let raw = match fs::read(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let value: Value = serde_json::from_slice(&raw).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        match value {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::NotAnObject {
                path: path.to_path_buf(),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let unsaved = self.unsaved.read();
        match unsaved.as_ref() {
            Some(document) => document.get(key).cloned(),
            None => self.load_or_empty().get(key).cloned(),
        }
    }

    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> Value {
        self.get(key).unwrap_or_else(|| default.into())
    }

    /// Reload the document, update `key` and persist the whole document.
    ///
    /// When the write fails the updated document stays in memory and is
    /// served by [`get`](Self::get) until a later `set` saves it.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<(), StoreError> {
        let mut unsaved = self.unsaved.write();
        let mut document = match unsaved.take() {
            Some(document) => document,
            None => self.load_or_empty(),
        };
        document.insert(key.to_string(), value.into());

        match self.save(&document) {
            Ok(()) => Ok(()),
            Err(e) => {
                error!("Failed to save configuration: {e}");
                *unsaved = Some(document);
                Err(e)
            }
        }
    }

    fn load_or_empty(&self) -> Map<String, Value> {
        Self::load_document(&self.path).unwrap_or_else(|e| {
            warn!("{e}; using an empty configuration");
            Map::new()
        })
    }

    fn save(&self, document: &Map<String, Value>) -> Result<(), StoreError> {
        let rendered = to_pretty_json(document)?;
        fs::write(&self.path, rendered).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// Two-space indented JSON. serde_json leaves non-ASCII characters unescaped.
fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"  ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut ser)?;
    Ok(out)
}
