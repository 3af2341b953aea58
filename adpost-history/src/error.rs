// src/error.rs
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the history store.
///
/// Only writes and configuration loading fail loudly. Reads of a collection
/// never produce an error: a missing or malformed file decodes as an empty
/// collection (see `services::collection`). Config values that would disable
/// a check are rejected at load time.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to create storage directory {path:?}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write collection file {path:?}")]
    WriteCollection {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode {collection} collection")]
    EncodeCollection {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("reading config file {path:?}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config file {path:?}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config value {key} = {value}: {reason}")]
    InvalidConfig {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, HistoryError>;
