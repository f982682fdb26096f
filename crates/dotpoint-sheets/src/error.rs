//! Spreadsheet API error types.

use thiserror::Error;

/// Errors that can occur when talking to the spreadsheet API.
#[derive(Debug, Error)]
pub enum SheetsError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// The credential was rejected or lacks access to the spreadsheet.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The spreadsheet or range does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The service-account credential file is unusable.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),
}

impl SheetsError {
    /// Map a non-success HTTP status and its body to an error.
    pub fn from_status(status: u16, retry_after_secs: Option<u64>, body: String) -> Self {
        match status {
            429 => SheetsError::RateLimited {
                retry_after_ms: retry_after_secs.unwrap_or(5) * 1000,
            },
            401 | 403 => SheetsError::AuthenticationFailed(body),
            404 => SheetsError::NotFound(body),
            _ => SheetsError::ApiError {
                status,
                message: body,
            },
        }
    }

    /// Map a transport error.
    pub fn from_transport(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            SheetsError::Timeout(timeout_secs)
        } else {
            SheetsError::NetworkError(err.to_string())
        }
    }
}
