//! Debate records materialized from model responses.
//!
//! Every value here is built once from a validated response and never mutated
//! afterwards. None of them outlive the session that requested them.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Longest headline derived from a description when no title is present.
const HEADLINE_MAX_CHARS: usize = 80;

/// Which side of the motion a set of arguments argues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    InFavour,
    Against,
}

impl Stance {
    pub fn as_str(self) -> &'static str {
        match self {
            Stance::InFavour => "in favour",
            Stance::Against => "against",
        }
    }
}

/// Persona preset applied to every instruction sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    #[default]
    Wsdc,
    Aggressive,
    Policy,
    Rhetorical,
}

impl Style {
    pub const ALL: [Style; 4] = [
        Style::Wsdc,
        Style::Aggressive,
        Style::Policy,
        Style::Rhetorical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Style::Wsdc => "wsdc",
            Style::Aggressive => "aggressive",
            Style::Policy => "policy",
            Style::Rhetorical => "rhetorical",
        }
    }

    /// Tone instruction rendered into prompts.
    pub fn persona(self) -> &'static str {
        match self {
            Style::Wsdc => {
                "World Schools style: structured and principled, signpost each point and weigh the clash explicitly."
            }
            Style::Aggressive => {
                "Aggressive style: direct and confrontational, press hard on the weakest link of the other side."
            }
            Style::Policy => {
                "Policy style: focus on mechanisms, implementation, costs and measurable outcomes."
            }
            Style::Rhetorical => {
                "Rhetorical style: persuasive and vivid, appeal to shared values and use memorable phrasing."
            }
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Style::ALL
            .into_iter()
            .find(|style| style.as_str() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Style::ALL.iter().map(|style| style.as_str()).collect();
                format!("unknown style '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

/// Rhetorical angle for one independently generated favour argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Angle {
    Moral,
    Economic,
    Societal,
}

impl Angle {
    pub const ALL: [Angle; 3] = [Angle::Moral, Angle::Economic, Angle::Societal];

    pub fn as_str(self) -> &'static str {
        match self {
            Angle::Moral => "moral",
            Angle::Economic => "economic",
            Angle::Societal => "societal",
        }
    }

    pub fn focus(self) -> &'static str {
        match self {
            Angle::Moral => "rights, fairness, duties and the ethical principles at stake",
            Angle::Economic => "costs, incentives, markets, jobs and public budgets",
            Angle::Societal => "communities, culture, public health and long-term social trends",
        }
    }
}

/// Supporting material for an argument or rebuttal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evidence {
    pub description: String,
    /// Named source or concrete instance (a study, policy or event).
    pub source: Option<String>,
}

/// One debate argument produced by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Argument {
    pub title: Option<String>,
    pub description: String,
    pub evidence: Vec<Evidence>,
    pub quote: Option<String>,
}

impl Argument {
    /// Short label used to refer to this argument.
    ///
    /// The title when present, otherwise the first sentence of the description
    /// capped at 80 characters.
    pub fn headline(&self) -> String {
        if let Some(title) = self.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            return title.to_string();
        }
        let description = self.description.trim();
        let sentence = match sentence_end(description) {
            Some(end) => &description[..end],
            None => description,
        };
        let sentence = sentence.trim();
        if sentence.chars().count() <= HEADLINE_MAX_CHARS {
            return sentence.to_string();
        }
        let mut cut: String = sentence.chars().take(HEADLINE_MAX_CHARS - 3).collect();
        cut.truncate(cut.trim_end().len());
        cut.push_str("...");
        cut
    }
}

/// Byte offset of the first `.`, `!` or `?` followed by whitespace or the end
/// of the text. Decimals like `3.5` do not end a sentence.
fn sentence_end(text: &str) -> Option<usize> {
    let mut chars = text.char_indices().peekable();
    while let Some((index, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        if chars.peek().is_none_or(|(_, next)| next.is_whitespace()) {
            return Some(index);
        }
    }
    None
}

/// Counter to a specific opponent argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rebuttal {
    /// Headline of the argument being countered.
    pub target: String,
    pub counter: String,
    pub evidence: Evidence,
}

/// Coach ratings for a human rebuttal, each in `1..=10`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Score {
    pub logic: u8,
    pub evidence: u8,
    pub relevance: u8,
    pub style: u8,
    pub suggestion: String,
}

impl Score {
    pub fn categories(&self) -> [(&'static str, u8); 4] {
        [
            ("Logic", self.logic),
            ("Evidence", self.evidence),
            ("Relevance", self.relevance),
            ("Style", self.style),
        ]
    }

    pub fn total(&self) -> u32 {
        self.categories()
            .iter()
            .map(|(_, value)| u32::from(*value))
            .sum()
    }
}

/// Normalise an optional model string: blank becomes `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
