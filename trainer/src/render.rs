//! Plain-text rendering for terminal output.

use std::fmt::Write as _;

use crate::coach::FavourBatch;
use crate::core::types::{Argument, Rebuttal, Score};
use crate::generate::GenerationError;

/// Numbered argument list under `heading`.
pub fn arguments(heading: &str, arguments: &[Argument]) -> String {
    let mut out = format!("{heading}\n");
    for (index, argument) in arguments.iter().enumerate() {
        let _ = writeln!(out, "\n{}. {}", index + 1, argument.headline());
        let _ = writeln!(out, "   {}", argument.description.trim());
        for item in &argument.evidence {
            match &item.source {
                Some(source) => {
                    let _ = writeln!(out, "   Evidence: {} ({source})", item.description);
                }
                None => {
                    let _ = writeln!(out, "   Evidence: {}", item.description);
                }
            }
        }
        if let Some(quote) = &argument.quote {
            let _ = writeln!(out, "   Quote: {quote}");
        }
    }
    out
}

/// Favour batch: successful arguments followed by failed angles.
pub fn favour_batch(batch: &FavourBatch) -> String {
    let mut out = arguments("Arguments in favour", &batch.arguments);
    for failure in &batch.failures {
        let _ = write!(
            out,
            "\n{} angle failed:\n{}",
            failure.angle.as_str(),
            generation_error(&failure.error)
        );
    }
    out
}

pub fn rebuttal(rebuttal: &Rebuttal) -> String {
    let mut out = format!("AI rebuttal to \"{}\"\n", rebuttal.target);
    let _ = writeln!(out, "   {}", rebuttal.counter.trim());
    match &rebuttal.evidence.source {
        Some(source) => {
            let _ = writeln!(out, "   Evidence: {} ({source})", rebuttal.evidence.description);
        }
        None => {
            let _ = writeln!(out, "   Evidence: {}", rebuttal.evidence.description);
        }
    }
    out
}

pub fn score(score: &Score) -> String {
    let mut out = String::from("Score\n");
    for (name, value) in score.categories() {
        let _ = writeln!(out, "   {name:<10} {value:>2}/10");
    }
    let _ = writeln!(out, "   {:<10} {:>2}/40", "Total", score.total());
    let _ = writeln!(out, "   Suggestion: {}", score.suggestion.trim());
    out
}

/// A generation failure, with the offending raw response when there is one.
pub fn generation_error(error: &GenerationError) -> String {
    match error {
        GenerationError::Exhausted {
            schema,
            attempts,
            failure,
            raw,
        } => format!(
            "error: {schema}: no valid response after {attempts} attempt(s): {failure}\n--- raw response ---\n{raw}\n--- end ---\n"
        ),
        other => format!("error: {other}\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coach::AngleFailure;
    use crate::core::types::{Angle, Evidence};
    use crate::generate::AttemptFailure;

    fn argument() -> Argument {
        Argument {
            title: Some("Bans push users to worse apps".to_string()),
            description: "Users migrate to unmoderated platforms.".to_string(),
            evidence: vec![Evidence {
                description: "Telegram growth after bans".to_string(),
                source: Some("Reuters".to_string()),
            }],
            quote: Some("\"Liberty lies in the hearts of men\" - Learned Hand".to_string()),
        }
    }

    #[test]
    fn arguments_are_numbered_with_evidence_and_quote() {
        let text = arguments("Opponent arguments", &[argument()]);
        assert!(text.starts_with("Opponent arguments\n"));
        assert!(text.contains("1. Bans push users to worse apps"));
        assert!(text.contains("Evidence: Telegram growth after bans (Reuters)"));
        assert!(text.contains("Quote: \"Liberty"));
    }

    #[test]
    fn score_shows_total() {
        let text = score(&Score {
            logic: 7,
            evidence: 6,
            relevance: 8,
            style: 5,
            suggestion: "Cite a study.".to_string(),
        });
        assert!(text.contains("Logic       7/10"));
        assert!(text.contains("Total      26/40"));
        assert!(text.contains("Suggestion: Cite a study."));
    }

    #[test]
    fn exhausted_error_includes_raw_text() {
        let error = GenerationError::Exhausted {
            schema: "score",
            attempts: 3,
            failure: AttemptFailure::Parse("no JSON object found in response".to_string()),
            raw: "Sorry, I cannot help".to_string(),
        };
        let text = generation_error(&error);
        assert!(text.contains("after 3 attempt(s)"));
        assert!(text.contains("--- raw response ---\nSorry, I cannot help\n"));
    }

    #[test]
    fn favour_batch_lists_failed_angles() {
        let batch = FavourBatch {
            arguments: vec![argument()],
            failures: vec![AngleFailure {
                angle: Angle::Societal,
                error: GenerationError::Exhausted {
                    schema: "argument",
                    attempts: 3,
                    failure: AttemptFailure::Validation(vec!["missing".to_string()]),
                    raw: "{}".to_string(),
                },
            }],
            cached: false,
        };
        let text = favour_batch(&batch);
        assert!(text.contains("1. Bans push users"));
        assert!(text.contains("societal angle failed:"));
    }
}
