use std::time::Duration;

use crate::domain::error::DomainError;

#[derive(Debug, Clone, PartialEq)]
pub struct AiRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AiCompletion {
    pub content: String,
    /// Model that actually answered, as reported by the provider.
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// A chat-style model endpoint. Rate limiting should surface as
/// [`DomainError::RateLimited`] so callers can keep it out of error logs.
#[async_trait::async_trait]
pub trait AiProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Model requests are sent to; part of the response cache key.
    fn model(&self) -> &str;

    async fn complete(&self, request: &AiRequest) -> Result<AiCompletion, DomainError>;
}
