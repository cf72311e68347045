use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{CompletionRequest, ReasoningError, ReasoningService};

pub const DEFAULT_ENDPOINT: &str = "https://models.github.ai/inference";
pub const DEFAULT_MODEL: &str = "deepseek/DeepSeek-V3-0324";

/// Client for OpenAI-compatible `/chat/completions` endpoints.
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl ChatCompletionsClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ReasoningError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, request: &CompletionRequest) -> Result<String, ReasoningError> {
        let body = ChatRequest {
            model: &self.model,
            temperature: request.temperature,
            top_p: request.top_p,
            max_tokens: request.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
        };

        let url = format!("{}/chat/completions", self.base_url);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ReasoningError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = resp.json().await.map_err(|e| self.classify(e))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ReasoningError::EmptyResponse)
    }

    fn classify(&self, e: reqwest::Error) -> ReasoningError {
        if e.is_timeout() {
            ReasoningError::Timeout(self.timeout)
        } else {
            ReasoningError::Http(e)
        }
    }
}

#[async_trait]
impl ReasoningService for ChatCompletionsClient {
    fn name(&self) -> &'static str {
        "chat-completions"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ReasoningError> {
        counter!("reasoning_requests_total").increment(1);
        let started = Instant::now();

        let result = self.send(request).await;

        let elapsed = started.elapsed();
        histogram!("reasoning_latency_seconds").record(elapsed.as_secs_f64());

        match &result {
            Ok(text) => tracing::debug!(
                model = %self.model,
                elapsed_ms = elapsed.as_millis() as u64,
                chars = text.len(),
                "Reasoning completion received"
            ),
            Err(e) => {
                counter!("reasoning_failures_total").increment(1);
                tracing::warn!(
                    model = %self.model,
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "Reasoning request failed"
                );
            }
        }

        result
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f64,
    top_p: f64,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
