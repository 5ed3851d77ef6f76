use std::time::Duration;

use thiserror::Error;

/// Errors raised while talking to the model server.
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    /// Connection refused, reset, DNS failure or a broken body stream
    #[error("HTTP error: {0}")]
    HttpError(String),
    /// The server answered with a non-2xx status
    #[error("server returned status {status}: {body}")]
    Status { status: u16, body: String },
    /// No bytes arrived within the configured read timeout
    #[error("no data received for {0:?}")]
    Timeout(Duration),
    /// A response body could not be decoded
    #[error("JSON parse error: {0}")]
    JsonError(String),
    /// `start` was called while a previous stream is still running
    #[error("a completion stream is already active")]
    StreamActive,
}

/// Converts reqwest HTTP errors into CompletionErrors
impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return CompletionError::HttpError(format!("timed out: {err}"));
        }
        CompletionError::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for CompletionError {
    fn from(err: serde_json::Error) -> Self {
        CompletionError::JsonError(format!(
            "{} at line {} column {}",
            err,
            err.line(),
            err.column()
        ))
    }
}
