pub mod anthropic;
pub mod openai;

use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::domain::error::DomainError;

/// HTTP client with a hard request timeout.
pub(crate) fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Map a non-success response to a domain error; 429 is a rate limit.
pub(crate) fn status_error(provider: &str, status: StatusCode, body: &str) -> DomainError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        DomainError::RateLimited(provider.to_string())
    } else {
        DomainError::Provider(format!("{provider} API {status}: {body}"))
    }
}

pub(crate) fn transport_error(provider: &str, e: reqwest::Error) -> DomainError {
    if e.is_timeout() {
        DomainError::Provider(format!("{provider} request timed out"))
    } else {
        DomainError::Provider(format!("{provider} API error: {e}"))
    }
}
