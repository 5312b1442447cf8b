//! Domain error types

use thiserror::Error;

/// Error when parsing a duration string
#[derive(Debug, Clone, Error)]
#[error("Invalid duration format: \"{input}\". Expected format: <number>s, <number>m, or <number>m<number>s (e.g., 10s, 1m, 2m30s)")]
pub struct DurationParseError {
    pub input: String,
}

/// Error when a MIME type string is malformed
#[derive(Debug, Clone, Error)]
#[error("Invalid MIME type: \"{input}\". Expected <type>/<subtype> (e.g., text/plain)")]
pub struct MimeTypeError {
    pub input: String,
}

/// Error when a decoded record violates the one-content-per-record invariant
#[derive(Debug, Clone, Error)]
pub enum RecordError {
    #[error("MIME type {mime_type} does not match {content} content")]
    MimeMismatch { mime_type: String, content: String },

    #[error("Custom records cannot use the built-in MIME type {0}")]
    ReservedMimeType(String),

    #[error(transparent)]
    InvalidMimeType(#[from] MimeTypeError),
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}
