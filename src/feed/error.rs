//! Feed-side error types: frame decoding, transport, and signing.

use thiserror::Error;

/// Failures at the venue I/O boundary. All of these are contained by
/// the core task: frames are dropped, fetches retried, nothing escapes
/// to crash the process.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FeedError {
    /// Malformed frame or response body.
    #[error("decode error: {message}")]
    Decode {
        /// Underlying parser message.
        message: String,
    },

    /// Websocket or HTTP transport failure.
    #[error("transport error: {message}")]
    Transport {
        /// Underlying transport message.
        message: String,
    },

    /// The snapshot endpoint returned a non-success status.
    #[error("snapshot request failed with HTTP status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// A snapshot fetch exceeded its deadline.
    #[error("snapshot request timed out after {seconds} s")]
    Timeout {
        /// The deadline that expired, in seconds.
        seconds: u64,
    },

    /// Credential material could not be used for signing.
    #[error("auth error: {message}")]
    Auth {
        /// What went wrong with the credentials.
        message: String,
    },
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::Decode {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        FeedError::Transport {
            message: err.to_string(),
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for FeedError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        FeedError::Transport {
            message: err.to_string(),
        }
    }
}
