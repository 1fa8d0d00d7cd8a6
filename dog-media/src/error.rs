use thiserror::Error;

use crate::MediaIssues;

/// Result type for media operations
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while storing media or writing media-bearing documents
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Document not found: {id}")]
    NotFound { id: String },

    #[error("Concurrency token mismatch for document {id}")]
    Conflict { id: String },

    #[error("Invalid request: {message}")]
    Invalid { message: String },

    #[error("Media payload of {size} bytes exceeds maximum of {max} bytes")]
    TooLarge { size: u64, max: u64 },

    #[error("Stored media {id} is corrupt: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("Validation failed: {0}")]
    Validation(MediaIssues),

    #[error("Malformed base64 payload: {source}")]
    Decode {
        #[from]
        source: base64::DecodeError,
    },

    #[error("Storage backend error: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl MediaError {
    /// Create a backend error from any error type
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(error),
        }
    }

    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    pub fn not_found<S: Into<String>>(id: S) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn conflict<S: Into<String>>(id: S) -> Self {
        Self::Conflict { id: id.into() }
    }

    /// True for failures caused by the request rather than the backends.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::Conflict { .. }
                | Self::Invalid { .. }
                | Self::TooLarge { .. }
                | Self::Validation(_)
                | Self::Decode { .. }
        )
    }
}
