//! Access to the external language model used for column mapping and the
//! trading assistant.

pub mod client;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use client::ChatCompletionsClient;

#[derive(Debug, Error)]
pub enum ReasoningError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("completion contained no message")]
    EmptyResponse,
}

/// One chat-completion exchange: a system role, a user prompt and sampling
/// parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            temperature: 1.0,
            top_p: 1.0,
            max_tokens: 1000,
        }
    }
}

/// A text-completion backend. Implementations must be fail-fast: one
/// attempt, bounded by a timeout, no retries.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &'static str;

    /// Send the request and return the raw completion text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ReasoningError>;
}
