//! Interactive practice: rebut each opponent argument, get scored, then see
//! the AI rebuttal.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use tracing::debug;

use crate::coach::Coach;
use crate::core::types::{Argument, Rebuttal, Score};
use crate::generate::GenerationError;
use crate::io::completion::Completion;
use crate::render;
use crate::session::Session;

/// One opponent argument and what happened to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    pub opponent: Argument,
    pub rebuttal: Option<String>,
    pub score: Option<Score>,
    pub ai_rebuttal: Option<Rebuttal>,
}

#[derive(Debug, Default)]
pub struct PracticeSummary {
    pub rounds: Vec<Round>,
    /// Generations that exhausted their attempts. Each was reported inline.
    pub failures: usize,
}

/// Run one practice pass over the session motion.
///
/// Reads one line per opponent argument from `input`; a blank line skips
/// scoring, end of input stops early. Exhausted generations are reported to
/// `output` and counted; transport errors abort.
pub fn run<C, R, W>(
    coach: &Coach<C>,
    session: &mut Session,
    mut input: R,
    mut output: W,
) -> Result<PracticeSummary>
where
    C: Completion,
    R: BufRead,
    W: Write,
{
    writeln!(output, "Motion: {} ({} style)\n", session.motion(), session.style())?;
    let opponents = coach.opponent_arguments(session)?;
    write!(output, "{}", render::arguments("Opponent arguments", &opponents))?;

    let mut summary = PracticeSummary::default();
    for (index, opponent) in opponents.into_iter().enumerate() {
        write!(
            output,
            "\nYour rebuttal to {}. \"{}\" (blank line to skip):\n> ",
            index + 1,
            opponent.headline()
        )?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line).context("read rebuttal")? == 0 {
            debug!(round = index + 1, "input closed, ending practice");
            break;
        }
        let rebuttal = Some(line.trim().to_string()).filter(|text| !text.is_empty());

        let score = match &rebuttal {
            Some(text) => reported(
                coach.score_rebuttal(session, &opponent, text),
                &mut output,
                &mut summary.failures,
            )?,
            None => None,
        };
        if let Some(score) = &score {
            write!(output, "\n{}", render::score(score))?;
        }

        let ai_rebuttal = reported(
            coach.ai_rebuttal(session, &opponent),
            &mut output,
            &mut summary.failures,
        )?;
        if let Some(ai) = &ai_rebuttal {
            write!(output, "\n{}", render::rebuttal(ai))?;
        }

        summary.rounds.push(Round {
            opponent,
            rebuttal,
            score,
            ai_rebuttal,
        });
    }
    Ok(summary)
}

/// Print exhausted generations and carry on; propagate everything else.
fn reported<T, W: Write>(
    result: Result<T, GenerationError>,
    output: &mut W,
    failures: &mut usize,
) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err @ GenerationError::Exhausted { .. }) => {
            *failures += 1;
            write!(output, "\n{}", render::generation_error(&err))?;
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}
