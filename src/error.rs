//! Error types for the Slack chat resource.

use std::path::PathBuf;

/// Top-level error type for a resource invocation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("No match: {0}")]
    NoMatch(#[from] NoMatchError),

    #[error("Interpolation error: {0}")]
    Interpolation(#[from] InterpolationError),

    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Request validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing {section} field: {key}.")]
    MissingRequired { section: String, key: String },

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse request: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub fn missing(section: &str, key: &str) -> Self {
        Self::MissingRequired {
            section: section.into(),
            key: key.into(),
        }
    }
}

/// Failures talking to the chat API.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request to {method} failed: {reason}")]
    Http { method: String, reason: String },

    #[error("{method} returned error: {error}")]
    Api { method: String, error: String },

    #[error("Invalid response from {method}: {reason}")]
    InvalidResponse { method: String, reason: String },

    #[error("Failed to encode {method} request: {reason}")]
    Encode { method: String, reason: String },
}

/// A requested message could not be located or parsed.
#[derive(Debug, thiserror::Error)]
pub enum NoMatchError {
    #[error("Message {timestamp} could not be found.")]
    MessageNotFound { timestamp: String },

    #[error("Failed to parse message {timestamp}: text does not match pattern.")]
    PatternMismatch { timestamp: String },
}

/// Placeholder expansion and message-template errors.
#[derive(Debug, thiserror::Error)]
pub enum InterpolationError {
    #[error("Failed to read {}: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid message file {}: {reason}", .path.display())]
    InvalidMessageFile { path: PathBuf, reason: String },
}

/// Result alias for resource operations.
pub type Result<T> = std::result::Result<T, Error>;
