//! Locate a JSON value inside free-form model text.
//!
//! Models are told to answer with bare JSON but routinely wrap it in prose or
//! code fences. Extraction tries, in order: the whole text, the body of each
//! fenced code block, then every balanced `{..}` / `[..]` span that opens with
//! the expected bracket. The first candidate that parses wins, so array
//! elements keep the order the model produced.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n?(.*?)```").unwrap());

/// Expected top-level JSON shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Object,
    Array,
}

impl Shape {
    fn opener(self) -> u8 {
        match self {
            Shape::Object => b'{',
            Shape::Array => b'[',
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Shape::Object => value.is_object(),
            Shape::Array => value.is_array(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Shape::Object => "object",
            Shape::Array => "array",
        }
    }
}

/// Extract the first JSON value of `shape` embedded in `text`.
pub fn extract_json(text: &str, shape: Shape) -> Option<Value> {
    if let Some(value) = parse_as(text.trim(), shape) {
        return Some(value);
    }

    for caps in FENCE_RE.captures_iter(text) {
        if let Some(value) = caps.get(1).and_then(|body| parse_as(body.as_str().trim(), shape)) {
            return Some(value);
        }
    }

    let bytes = text.as_bytes();
    let opener = shape.opener();
    for start in 0..bytes.len() {
        if bytes[start] != opener {
            continue;
        }
        if let Some(end) = balanced_end(bytes, start) {
            if let Some(value) = parse_as(&text[start..=end], shape) {
                return Some(value);
            }
        }
    }
    None
}

fn parse_as(candidate: &str, shape: Shape) -> Option<Value> {
    if candidate.is_empty() {
        return None;
    }
    serde_json::from_str::<Value>(candidate)
        .ok()
        .filter(|value| shape.matches(value))
}

/// Byte index of the bracket closing the one at `start`, skipping string
/// literals and escapes. Bracket kinds are not paired here; the JSON parser
/// rejects mismatches afterwards.
fn balanced_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}
