use reqwest::StatusCode;
use thiserror::Error;

/// Result of a CouchDB call.
pub type CouchResult<T> = Result<T, CouchDaoError>;

/// Failures of the CouchDB match archive.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    /// Required configuration is missing.
    #[error("environment variable `{0}` is not set")]
    MissingEnv(&'static str),
    /// The HTTP client could not be built.
    #[error("cannot build the CouchDB HTTP client")]
    Client(#[source] reqwest::Error),
    /// The request never got an answer (connection refused, DNS, TLS...).
    #[error("CouchDB request to `{path}` failed")]
    Transport {
        /// Request path.
        path: String,
        /// Client error.
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB answered with an unexpected status.
    #[error("CouchDB answered {status} for `{path}`")]
    Status {
        /// Request path.
        path: String,
        /// Status received.
        status: StatusCode,
    },
    /// The response body is not the expected JSON.
    #[error("CouchDB response for `{path}` is not valid JSON")]
    Decode {
        /// Request path.
        path: String,
        /// Decoding error.
        #[source]
        source: reqwest::Error,
    },
    /// A stored document is not a saved match.
    #[error("document listed by `{path}` is not a saved match")]
    Document {
        /// Listing path.
        path: String,
        /// Decoding error.
        #[source]
        source: serde_json::Error,
    },
}
