//! Instruction builder for every debate operation.
//!
//! Each template renders both halves of the instruction pair, separated by
//! `<!-- section:system -->` and `<!-- section:user -->` markers.

use std::sync::LazyLock;

use minijinja::{Environment, Error, ErrorKind, context};
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::core::types::{Angle, Argument, Stance, Style};

const FAVOUR_TEMPLATE: &str = include_str!("prompts/favour.md");
const OPPONENTS_TEMPLATE: &str = include_str!("prompts/opponents.md");
const REBUTTAL_TEMPLATE: &str = include_str!("prompts/rebuttal.md");
const SCORE_TEMPLATE: &str = include_str!("prompts/score.md");
const RETRY_TEMPLATE: &str = include_str!("prompts/retry.md");

/// Longest previous answer quoted back to the model on retry.
const RETRY_RAW_LIMIT: usize = 2_000;

static SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!--\s*section:(\w+)\s*-->").unwrap());

/// A rendered system + user instruction pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Opponent argument as seen by the templates.
#[derive(Debug, Clone, Serialize)]
struct ArgumentContext {
    headline: String,
    description: String,
    evidence: Vec<String>,
}

impl ArgumentContext {
    fn from_argument(argument: &Argument) -> Self {
        Self {
            headline: argument.headline(),
            description: argument.description.clone(),
            evidence: argument
                .evidence
                .iter()
                .map(|item| match &item.source {
                    Some(source) => format!("{} ({})", item.description, source),
                    None => item.description.clone(),
                })
                .collect(),
        }
    }
}

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    pub fn new() -> Result<Self, Error> {
        let mut env = Environment::new();
        env.add_template("favour", FAVOUR_TEMPLATE)?;
        env.add_template("opponents", OPPONENTS_TEMPLATE)?;
        env.add_template("rebuttal", REBUTTAL_TEMPLATE)?;
        env.add_template("score", SCORE_TEMPLATE)?;
        env.add_template("retry", RETRY_TEMPLATE)?;
        Ok(Self { env })
    }

    /// One argument in favour of the motion from a single rhetorical angle.
    pub fn favour(&self, motion: &str, style: Style, angle: Angle) -> Result<Prompt, Error> {
        self.render_pair(
            "favour",
            context! {
                motion => motion.trim(),
                stance => Stance::InFavour.as_str(),
                persona => style.persona(),
                angle => angle.as_str(),
                focus => angle.focus(),
            },
        )
    }

    /// Three arguments against the motion in one response.
    pub fn opponents(&self, motion: &str, style: Style) -> Result<Prompt, Error> {
        self.render_pair(
            "opponents",
            context! {
                motion => motion.trim(),
                persona => style.persona(),
            },
        )
    }

    pub fn rebuttal(&self, motion: &str, style: Style, opponent: &Argument) -> Result<Prompt, Error> {
        self.render_pair(
            "rebuttal",
            context! {
                motion => motion.trim(),
                persona => style.persona(),
                opponent => ArgumentContext::from_argument(opponent),
            },
        )
    }

    pub fn score(&self, motion: &str, opponent: &Argument, rebuttal: &str) -> Result<Prompt, Error> {
        self.render_pair(
            "score",
            context! {
                motion => motion.trim(),
                opponent => ArgumentContext::from_argument(opponent),
                rebuttal => rebuttal.trim(),
            },
        )
    }

    /// Feedback appended to the user instruction after an invalid answer.
    pub fn retry_feedback(&self, failure: &str, raw: &str, schema: &str) -> Result<String, Error> {
        let quoted = if raw.len() > RETRY_RAW_LIMIT {
            let mut end = RETRY_RAW_LIMIT;
            while !raw.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}\n[truncated]", &raw[..end])
        } else {
            raw.to_string()
        };
        let template = self.env.get_template("retry")?;
        template.render(context! {
            failure => failure,
            raw => quoted.trim(),
            schema => schema,
        })
    }

    fn render_pair(&self, name: &str, ctx: minijinja::Value) -> Result<Prompt, Error> {
        let rendered = self.env.get_template(name)?.render(ctx)?;
        let mut system = None;
        let mut user = None;
        for (key, content) in parse_sections(&rendered) {
            match key {
                "system" => system = Some(content),
                "user" => user = Some(content),
                other => debug!(template = name, section = other, "ignoring unknown section"),
            }
        }
        match (system, user) {
            (Some(system), Some(user)) => Ok(Prompt { system, user }),
            _ => Err(Error::new(
                ErrorKind::InvalidOperation,
                format!("template '{name}' must define system and user sections"),
            )),
        }
    }
}

/// Split rendered output on section markers, returning `(key, trimmed content)`.
fn parse_sections(rendered: &str) -> Vec<(&str, String)> {
    let markers: Vec<_> = SECTION_RE.captures_iter(rendered).collect();
    markers
        .iter()
        .enumerate()
        .filter_map(|(i, caps)| {
            let key = caps.get(1)?.as_str();
            let start = caps.get(0)?.end();
            let end = markers
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(rendered.len(), |m| m.start());
            Some((key, rendered[start..end].trim().to_string()))
        })
        .collect()
}
