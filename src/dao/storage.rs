//! Backend-neutral persistence errors.

use std::error::Error;

use thiserror::Error;

/// Result of a match store operation.
pub type StorageResult<T> = Result<T, StorageError>;

type BoxError = Box<dyn Error + Send + Sync>;

/// Failure of a match store, whatever medium backs it.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or refused the operation.
    #[error("storage unavailable: {context}")]
    Unavailable {
        /// What was attempted.
        context: String,
        /// Backend error.
        #[source]
        source: BoxError,
    },
    /// A record could not be encoded for the backend.
    #[error("match record `{location}` cannot be encoded")]
    Corrupted {
        /// Record id or path.
        location: String,
        /// Encoding error.
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    /// Wrap a backend failure, `context` saying what was attempted.
    pub fn unavailable(
        context: impl Into<String>,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        StorageError::Unavailable {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
