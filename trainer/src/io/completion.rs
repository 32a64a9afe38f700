//! Completion abstraction for the upstream text-generation API.
//!
//! The [`Completion`] trait decouples generation from the HTTP backend
//! (currently an OpenAI-compatible chat-completions endpoint). Tests use
//! scripted completions that return predetermined text without network access.

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// One system + user instruction pair sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Failure of the upstream call itself. Never retried by the generation layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("unreadable completion response: {0}")]
    Envelope(String),
}

/// Opaque text-in/text-out oracle.
pub trait Completion {
    /// Send one request and return the raw response text.
    fn complete(&self, request: &CompletionRequest) -> Result<String, TransportError>;
}

impl<C: Completion + ?Sized> Completion for &C {
    fn complete(&self, request: &CompletionRequest) -> Result<String, TransportError> {
        (**self).complete(request)
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Completion backed by an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatCompletionsClient {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatCompletionsClient {
    pub fn new(api_base: &str, api_key: String, model: String) -> Self {
        Self {
            http: Client::new(),
            endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
            api_key,
            model,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl std::fmt::Debug for ChatCompletionsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl Completion for ChatCompletionsClient {
    #[instrument(skip_all, fields(model = %self.model, max_tokens = request.max_tokens))]
    fn complete(&self, request: &CompletionRequest) -> Result<String, TransportError> {
        info!(endpoint = %self.endpoint, "requesting completion");

        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|err| TransportError::Network(err.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|err| TransportError::Network(format!("read body: {err}")))?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "completion request rejected");
            return Err(TransportError::Status {
                status: status.as_u16(),
                message: describe_status(status, &text),
            });
        }

        let content = completion_text(&text)?;
        debug!(bytes = content.len(), "completion received");
        Ok(content)
    }
}

/// Pull `choices[0].message.content` out of a chat-completions body.
fn completion_text(body: &str) -> Result<String, TransportError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|err| TransportError::Envelope(err.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| TransportError::Envelope("response has no message content".to_string()))
}

fn describe_status(status: StatusCode, body: &str) -> String {
    match status.as_u16() {
        401 => "Invalid API key. Check the configured credential.".to_string(),
        402 => "Insufficient credits on the API account.".to_string(),
        429 => "Rate limited. Please wait a moment and try again.".to_string(),
        404 | 400 if body.contains("model_not_found") || body.contains("does not exist") => {
            "Model not found. Check the configured model id.".to_string()
        }
        500 | 502 | 503 => "The completion API is temporarily unavailable.".to_string(),
        _ => format!("API error ({status}): {}", body.trim()),
    }
}
