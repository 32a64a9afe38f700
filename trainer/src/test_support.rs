//! Test-only helpers: a scripted completion backend and canned responses.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::io::completion::{Completion, CompletionRequest, TransportError};

/// Completion that replays queued responses and records every request.
///
/// Once the script runs out, further calls fail with a network error so a
/// test never silently makes more calls than it scripted.
#[derive(Debug, Default)]
pub struct ScriptedCompletion {
    script: RefCell<VecDeque<Result<String, TransportError>>>,
    requests: RefCell<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    /// Script successful responses, returned in order.
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_results(responses.into_iter().map(|r| Ok(r.into())))
    }

    /// Script responses and transport failures, returned in order.
    pub fn with_results(results: impl IntoIterator<Item = Result<String, TransportError>>) -> Self {
        Self {
            script: RefCell::new(results.into_iter().collect()),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Queue more responses after construction.
    pub fn push(&self, response: impl Into<String>) {
        self.script.borrow_mut().push_back(Ok(response.into()));
    }

    /// Number of upstream calls made so far.
    pub fn calls(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.borrow().clone()
    }

    /// Responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.borrow().len()
    }
}

impl Completion for ScriptedCompletion {
    fn complete(&self, request: &CompletionRequest) -> Result<String, TransportError> {
        self.requests.borrow_mut().push(request.clone());
        self.script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("script exhausted".to_string())))
    }
}

/// A valid single-argument response.
pub fn argument_json(label: &str) -> String {
    serde_json::json!({
        "title": format!("{label} title"),
        "argument": format!("{label} argument."),
        "evidence_hint": format!("{label} evidence"),
        "evidence_source": format!("{label} source"),
        "famous_quote": format!("{label} quote"),
    })
    .to_string()
}

/// A valid opponents response with one argument per label.
pub fn opponents_json(labels: &[&str]) -> String {
    let items: Vec<serde_json::Value> = labels
        .iter()
        .map(|label| serde_json::from_str(&argument_json(label)).unwrap_or_default())
        .collect();
    serde_json::Value::Array(items).to_string()
}

/// A valid rebuttal response.
pub fn rebuttal_json(answer: &str) -> String {
    serde_json::json!({
        "original_argument": "echo",
        "answer": answer,
        "evidence_hint": "counter evidence",
        "evidence_source": "counter source",
    })
    .to_string()
}

/// A valid score response.
pub fn score_json(logic: u8, evidence: u8, relevance: u8, style: u8) -> String {
    serde_json::json!({
        "Logic": logic,
        "Evidence": evidence,
        "Relevance": relevance,
        "Style": style,
        "Suggestion": "Name a concrete example.",
    })
    .to_string()
}
