//! Error taxonomy shared by the platform fetchers.
use pulse_http::HttpError;
use thiserror::Error;

/// Failure modes of a single logical fetch.
///
/// No variant is retried internally; the only deliberate delay in the
/// clients is the rate-limit wait, which is a pause, not a retry.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection/DNS/TLS failure or a non-2xx status from the platform.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body was not the structured data we expected.
    #[error("parse error: {0}")]
    Parse(String),

    /// Quota headers or status fields were absent where the platform
    /// normally reports them.
    #[error("rate-limit telemetry missing from response")]
    RateLimitTelemetryMissing,

    /// A rate-limit wait was aborted through the client's cancellation
    /// token before the quota window reset.
    #[error("fetch cancelled while waiting for rate-limit reset")]
    Cancelled,
}

impl From<HttpError> for FetchError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Decode(msg, snippet) => {
                FetchError::Parse(format!("{msg}; body: {snippet}"))
            }
            other => FetchError::Transport(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
