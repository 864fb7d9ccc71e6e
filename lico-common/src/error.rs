//! Error type shared by lico-common and the service crate

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Storage, configuration and encoding failures
///
/// Request-level outcomes (not found, validation) are decided by the API
/// layer; this type only reports what went wrong underneath.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unreadable TOML file or malformed setting value
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON column or payload that could not be encoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored value that does not decode, e.g. a non-UUID guid
    #[error("Corrupt value in column {column}: {detail}")]
    CorruptRow { column: String, detail: String },
}
