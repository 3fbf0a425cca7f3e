//! Error types for brain operations.

use thiserror::Error;

/// Errors that can occur while talking to a generative backend.
///
/// Messages carry the backend's own error text where there is one, so that
/// callers can classify failures by what the provider reported.
#[derive(Debug, Error)]
pub enum BrainError {
    /// The brain was built with missing or invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The backend could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// A media file could not be uploaded.
    #[error("upload failed: {0}")]
    Upload(String),

    /// The backend rejected or failed the request.
    #[error("processing failed: {0}")]
    ProcessingFailed(String),

    /// The backend answered with no text.
    #[error("empty response")]
    EmptyResponse,

    /// The brain is temporarily unavailable.
    #[error("brain unavailable: {0}")]
    Unavailable(String),

    /// The brain has been shut down.
    #[error("brain shut down")]
    ShutDown,

    /// A timeout occurred during processing.
    #[error("processing timed out")]
    Timeout,
}
