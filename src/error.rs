//! Error types for text-relay.

use std::path::PathBuf;

/// Top-level error type for the relay.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

/// Source channel errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Channel {name} could not read {path}: {source}")]
    Read {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Channel {name} I/O error: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Pipeline closed, channel {name} cannot deliver")]
    PipelineClosed { name: String },
}

/// A mail part claimed a content type but its content could not be read.
///
/// Extraction never recovers from these: the partially accumulated text is
/// discarded and the whole message fails.
#[derive(Debug, thiserror::Error)]
pub enum ContentReadError {
    #[error("Content of {content_type} part is unavailable: {reason}")]
    Unavailable {
        content_type: String,
        reason: String,
    },

    #[error("Content of {content_type} part is not valid UTF-8")]
    InvalidUtf8 {
        content_type: String,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("Part declares {content_type} but holds {shape} content")]
    ShapeMismatch {
        content_type: String,
        shape: &'static str,
    },

    #[error("Malformed multipart structure: {0}")]
    Malformed(String),
}

/// Errors converting a raw payload into text.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("Failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unparsable mail message")]
    MalformedMail,

    #[error(transparent)]
    Content(#[from] ContentReadError),
}

/// Errors raised by pipeline handlers.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Handler {name} failed: {reason}")]
    Handler { name: String, reason: String },
}

/// Result type alias for the relay.
pub type Result<T> = std::result::Result<T, Error>;
