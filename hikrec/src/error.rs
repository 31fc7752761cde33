//! Error types for starting a recognition stream
//!
//! Once a stream is running it never yields an error; every failure after
//! the initial subscription is absorbed by resubscribing.

use onvif_events::ApiError;

/// Errors that can prevent a recognition stream from starting
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The initial subscription could not be created
    #[error("Failed to create initial subscription: {0}")]
    Subscribe(ApiError),

    /// The worker thread could not be spawned
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(String),

    /// The device endpoint was rejected before anything was sent
    #[error("Invalid device: {0}")]
    InvalidDevice(String),

    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<ApiError> for StreamError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::InvalidParameter(msg) => StreamError::InvalidDevice(msg),
            other => StreamError::Subscribe(other),
        }
    }
}

/// Type alias for results that can return a StreamError
pub type Result<T> = std::result::Result<T, StreamError>;
