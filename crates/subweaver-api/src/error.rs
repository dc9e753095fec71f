use thiserror::Error;

/// Top-level error type for the `subweaver-api` crate.
///
/// Whether a variant is fatal depends on what was being fetched: the server
/// treats any template fetch error as a 500, while source fetch errors are
/// logged and the offending source is skipped.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The remote answered with a non-success status.
    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// JSON deserialization failed, with a body excerpt for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl FetchError {
    /// Build a `Deserialization` error, truncating the body excerpt.
    pub(crate) fn deserialization(err: &serde_json::Error, body: &str) -> Self {
        let excerpt: String = body.chars().take(512).collect();
        Self::Deserialization {
            message: err.to_string(),
            body: excerpt,
        }
    }
}
