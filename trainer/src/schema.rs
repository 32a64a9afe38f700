//! Output schemas for every model response shape.
//!
//! Each schema is a JSON Schema (Draft 2020-12) embedded at compile time plus
//! the serde record it deserializes into. Validation reports every violation
//! so a failed attempt shows the model exactly what was wrong.

use anyhow::{Context, Result};
use jsonschema::{Draft, Validator};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::core::extract::Shape;
use crate::core::types::{Argument, Evidence, Rebuttal, Score, non_blank};

const ARGUMENT_SCHEMA: &str = include_str!("../schemas/argument.schema.json");
const OPPONENTS_SCHEMA: &str = include_str!("../schemas/opponents.schema.json");
const REBUTTAL_SCHEMA: &str = include_str!("../schemas/rebuttal.schema.json");
const SCORE_SCHEMA: &str = include_str!("../schemas/score.schema.json");

/// A compiled schema with the top-level shape it expects.
pub struct OutputSchema {
    name: &'static str,
    shape: Shape,
    raw: Value,
    validator: Validator,
}

impl std::fmt::Debug for OutputSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputSchema")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

impl OutputSchema {
    pub fn compile(name: &'static str, raw: &str) -> Result<Self> {
        let raw: Value =
            serde_json::from_str(raw).with_context(|| format!("parse {name} schema json"))?;
        let shape = match raw.get("type").and_then(Value::as_str) {
            Some("array") => Shape::Array,
            _ => Shape::Object,
        };
        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(&raw)
            .with_context(|| format!("compile {name} json schema"))?;
        Ok(Self {
            name,
            shape,
            raw,
            validator,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Schema document as sent to the model in retry feedback.
    pub fn document(&self) -> &Value {
        &self.raw
    }

    /// Validate an instance, returning one message per violation.
    pub fn violations(&self, instance: &Value) -> Vec<String> {
        self.validator
            .iter_errors(instance)
            .map(|err| err.to_string())
            .collect()
    }
}

/// The schemas for the four debate operations, compiled once per coach.
#[derive(Debug)]
pub struct Schemas {
    pub argument: OutputSchema,
    pub opponents: OutputSchema,
    pub rebuttal: OutputSchema,
    pub score: OutputSchema,
}

impl Schemas {
    pub fn builtin() -> Result<Self> {
        Ok(Self {
            argument: OutputSchema::compile("argument", ARGUMENT_SCHEMA)?,
            opponents: OutputSchema::compile("opponents", OPPONENTS_SCHEMA)?,
            rebuttal: OutputSchema::compile("rebuttal", REBUTTAL_SCHEMA)?,
            score: OutputSchema::compile("score", SCORE_SCHEMA)?,
        })
    }
}

/// Argument as emitted by the model.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArgumentWire {
    #[serde(default)]
    pub title: Option<String>,
    pub argument: String,
    pub evidence_hint: String,
    #[serde(default)]
    pub evidence_source: Option<String>,
    pub famous_quote: String,
}

impl From<ArgumentWire> for Argument {
    fn from(wire: ArgumentWire) -> Self {
        Argument {
            title: non_blank(wire.title),
            description: wire.argument.trim().to_string(),
            evidence: vec![Evidence {
                description: wire.evidence_hint.trim().to_string(),
                source: non_blank(wire.evidence_source),
            }],
            quote: non_blank(Some(wire.famous_quote)),
        }
    }
}

/// Rebuttal as emitted by the model.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RebuttalWire {
    pub original_argument: String,
    pub answer: String,
    pub evidence_hint: String,
    #[serde(default)]
    pub evidence_source: Option<String>,
}

impl RebuttalWire {
    /// The countered argument is always the one that was asked about; the
    /// model's echo of it is ignored.
    pub fn into_rebuttal(self, target: &Argument) -> Rebuttal {
        Rebuttal {
            target: target.headline(),
            counter: self.answer.trim().to_string(),
            evidence: Evidence {
                description: self.evidence_hint.trim().to_string(),
                source: non_blank(self.evidence_source),
            },
        }
    }
}

/// Score as emitted by the model. Ranges are enforced by the schema.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScoreWire {
    #[serde(rename = "Logic", deserialize_with = "rating")]
    pub logic: u8,
    #[serde(rename = "Evidence", deserialize_with = "rating")]
    pub evidence: u8,
    #[serde(rename = "Relevance", deserialize_with = "rating")]
    pub relevance: u8,
    #[serde(rename = "Style", deserialize_with = "rating")]
    pub style: u8,
    #[serde(rename = "Suggestion")]
    pub suggestion: String,
}

/// A 1..=10 rating. Integral floats such as `7.0` count as integers, as they
/// do for the schema's `"type": "integer"`.
fn rating<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if value.fract() == 0.0 && (1.0..=10.0).contains(&value) {
        Ok(value as u8)
    } else {
        Err(D::Error::custom(format!("rating {value} is not an integer within 1..=10")))
    }
}

impl From<ScoreWire> for Score {
    fn from(wire: ScoreWire) -> Self {
        Score {
            logic: wire.logic,
            evidence: wire.evidence,
            relevance: wire.relevance,
            style: wire.style,
            suggestion: wire.suggestion.trim().to_string(),
        }
    }
}
