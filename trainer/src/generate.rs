//! Structured generation: instructions + schema in, typed value out.
//!
//! [`StructuredClient::generate`] sends one completion per attempt, extracts
//! the first JSON value of the expected shape from the response, validates it
//! against the schema and deserializes it. Parse and validation failures are
//! retried until the attempt budget is spent; transport failures are returned
//! at once.

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::core::extract::extract_json;
use crate::io::completion::{Completion, CompletionRequest, TransportError};
use crate::io::prompt::{Prompt, PromptEngine};
use crate::schema::OutputSchema;

/// Instruction pair plus sampling budget for one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: Prompt,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Why a single response could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptFailure {
    #[error("{0}")]
    Parse(String),
    #[error("schema violations: {}", .0.join("; "))]
    Validation(Vec<String>),
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(
        "{schema}: no valid response after {attempts} attempt(s): {failure}\nlast raw response:\n{raw}"
    )]
    Exhausted {
        schema: &'static str,
        attempts: u32,
        failure: AttemptFailure,
        raw: String,
    },
    #[error("render prompt: {0}")]
    Prompt(#[from] minijinja::Error),
}

impl GenerationError {
    /// The last text the model returned, when there was one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            GenerationError::Exhausted { raw, .. } => Some(raw),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, GenerationError::Transport(_))
    }
}

/// Generation client wrapping a [`Completion`] backend.
pub struct StructuredClient<C> {
    completion: C,
    prompts: PromptEngine,
    retry_with_feedback: bool,
}

impl<C: Completion> StructuredClient<C> {
    pub fn new(completion: C) -> Result<Self, minijinja::Error> {
        Ok(Self {
            completion,
            prompts: PromptEngine::new()?,
            retry_with_feedback: false,
        })
    }

    /// Quote the previous invalid answer back to the model on retries.
    pub fn with_retry_feedback(mut self, enabled: bool) -> Self {
        self.retry_with_feedback = enabled;
        self
    }

    pub fn prompts(&self) -> &PromptEngine {
        &self.prompts
    }

    /// Generate a value conforming to `schema`.
    ///
    /// Makes at most `max_attempts` upstream calls (at least one). On
    /// exhaustion the error carries the last raw response verbatim.
    #[instrument(skip_all, fields(schema = schema.name(), max_attempts = max_attempts))]
    pub fn generate<T: DeserializeOwned>(
        &self,
        request: &GenerationRequest,
        schema: &OutputSchema,
        max_attempts: u32,
    ) -> Result<T, GenerationError> {
        let max_attempts = max_attempts.max(1);
        let mut previous: Option<(AttemptFailure, String)> = None;
        let mut attempt = 1;

        loop {
            let user = match &previous {
                Some((failure, raw)) if self.retry_with_feedback => {
                    let schema_text = serde_json::to_string_pretty(schema.document())
                        .unwrap_or_else(|_| schema.name().to_string());
                    let feedback =
                        self.prompts
                            .retry_feedback(&failure.to_string(), raw, &schema_text)?;
                    format!("{}\n\n{}", request.prompt.user, feedback)
                }
                _ => request.prompt.user.clone(),
            };

            let raw = self.completion.complete(&CompletionRequest {
                system: request.prompt.system.clone(),
                user,
                max_tokens: request.max_tokens,
                temperature: request.temperature,
            })?;

            match parse_response::<T>(&raw, schema) {
                Ok(value) => {
                    debug!(attempt, "generation succeeded");
                    return Ok(value);
                }
                Err(failure) if attempt >= max_attempts => {
                    warn!(attempt, max_attempts, %failure, raw = %raw, "final attempt failed");
                    return Err(GenerationError::Exhausted {
                        schema: schema.name(),
                        attempts: attempt,
                        failure,
                        raw,
                    });
                }
                Err(failure) => {
                    warn!(attempt, max_attempts, %failure, raw = %raw, "attempt failed, retrying");
                    previous = Some((failure, raw));
                    attempt += 1;
                }
            }
        }
    }
}

/// Extract, validate and deserialize one raw response.
pub fn parse_response<T: DeserializeOwned>(
    raw: &str,
    schema: &OutputSchema,
) -> Result<T, AttemptFailure> {
    let value = extract_json(raw, schema.shape()).ok_or_else(|| {
        AttemptFailure::Parse(format!(
            "no JSON {} found in response",
            schema.shape().as_str()
        ))
    })?;
    let violations = schema.violations(&value);
    if !violations.is_empty() {
        return Err(AttemptFailure::Validation(violations));
    }
    serde_json::from_value(value).map_err(|err| AttemptFailure::Validation(vec![err.to_string()]))
}
