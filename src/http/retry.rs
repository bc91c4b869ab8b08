//! Retry policy for network operations and classification of HTTP failures.

use reqwest::StatusCode;
use thiserror::Error;

/// Maximum number of attempts for a network operation.
pub const MAX_RETRIES: usize = 3;

/// Delay between retry attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// HTTP failures that will not succeed on a second attempt.
#[derive(Debug, Error)]
pub enum NonRetryableError {
    #[error("Rate limit exceeded: {0}. Try again later.")]
    RateLimitExceeded(String),
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Access forbidden: {0}")]
    Forbidden(String),
    #[error("Request error: {0}")]
    ClientError(String),
}

/// Classifies an error as retryable or non-retryable.
/// Returns Ok(()) if the error is retryable, Err with a user-friendly message if not.
pub fn classify_error(error: &reqwest::Error) -> Result<(), NonRetryableError> {
    let url = error
        .url()
        .map(|u| u.to_string())
        .unwrap_or_else(|| "request".to_string());

    if let Some(status) = error.status() {
        return match status {
            StatusCode::UNAUTHORIZED => Err(NonRetryableError::AuthenticationFailed(url)),
            StatusCode::FORBIDDEN => Err(NonRetryableError::Forbidden(url)),
            StatusCode::TOO_MANY_REQUESTS => Err(NonRetryableError::RateLimitExceeded(url)),
            StatusCode::NOT_FOUND => Err(NonRetryableError::NotFound(url)),
            s if s.is_client_error() => Err(NonRetryableError::ClientError(format!(
                "HTTP {} from {}",
                s.as_u16(),
                url
            ))),
            // 5xx server errors are retryable
            _ => Ok(()),
        };
    }

    // Connection errors, timeouts, etc. are retryable
    Ok(())
}

/// Converts an error from `error_for_status()` into an `anyhow::Error`,
/// wrapping it as [`NonRetryableError`] when retrying cannot help.
pub fn check_retryable(error: reqwest::Error) -> anyhow::Error {
    match classify_error(&error) {
        Ok(()) => anyhow::Error::from(error),
        Err(non_retryable) => anyhow::Error::from(non_retryable),
    }
}
