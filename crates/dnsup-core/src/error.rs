//! Error types for dnsup
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for dnsup operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for dnsup
#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure, timeout or non-2xx response from either endpoint
    #[error("Network error: {0}")]
    Network(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Settings store errors
    #[error("Settings error: {0}")]
    Settings(String),

    /// Interval label outside the supported set
    #[error("Unknown update interval: '{0}'")]
    InvalidInterval(String),

    /// Start requested while automatic updates are already running
    #[error("Automatic updates are already running")]
    AlreadyRunning,

    /// The worker task running an update did not complete
    #[error("Update worker failed: {0}")]
    Worker(String),

    /// Local I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a network error
    pub fn network(cause: impl Into<String>) -> Self {
        Self::Network(cause.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a settings store error
    pub fn settings(msg: impl Into<String>) -> Self {
        Self::Settings(msg.into())
    }

    /// Create an unknown-interval error
    pub fn invalid_interval(label: impl Into<String>) -> Self {
        Self::InvalidInterval(label.into())
    }

    /// Create a worker error
    pub fn worker(msg: impl Into<String>) -> Self {
        Self::Worker(msg.into())
    }

    /// The bare cause string, without the variant prefix.
    ///
    /// Event Sink lines already name the failing step, so they carry only
    /// the underlying cause.
    pub fn cause(&self) -> String {
        match self {
            Self::Network(cause)
            | Self::Config(cause)
            | Self::Settings(cause)
            | Self::Worker(cause)
            | Self::Other(cause) => cause.clone(),
            other => other.to_string(),
        }
    }
}

/// Render an error followed by each of its sources, separated by `": "`
///
/// A source whose text is already part of the message is skipped.
pub fn chain_message(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !text.is_empty() && !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
