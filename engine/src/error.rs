use std::time::Duration;
use thiserror::Error;

// Failures at the snapshot store boundary. The caller keeps its prior series on any of these.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Storage unreachable while reading '{key}': {message}")]
    Unreachable { key: String, message: String },

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Malformed CSV in '{key}': {message}")]
    MalformedCsv { key: String, message: String },

    #[error("Storage call for '{key}' timed out after {after:?}")]
    Timeout { key: String, after: Duration },
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    // Index or digest computed over an empty window.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Indicator calculation error: {0}")]
    IndicatorError(String),

    #[error("Notification send error: {0}")]
    NotificationSendError(String),

    #[error("Internal processing error: {0}")]
    ProcessingError(String),

    #[error(transparent)]
    AnyhowError(#[from] anyhow::Error),
}

impl EngineError {
    // Outcomes the scheduler treats as "nothing to do" rather than a failure.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, EngineError::InsufficientData(_))
    }
}
