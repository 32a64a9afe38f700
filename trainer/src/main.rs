//! Debate practice coach.
//!
//! Generates arguments for and against a motion, AI rebuttals, and scores for
//! a human rebuttal, using an OpenAI-compatible chat-completion API.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use trainer::coach::Coach;
use trainer::core::motions::{DEFAULT_MOTIONS, random_motion};
use trainer::core::types::{Argument, Style};
use trainer::exit_codes;
use trainer::generate::GenerationError;
use trainer::io::completion::ChatCompletionsClient;
use trainer::io::config::{DEFAULT_CONFIG_FILE, load_config};
use trainer::session::Session;
use trainer::{logging, practice, render};

#[derive(Parser)]
#[command(
    name = "trainer",
    version,
    about = "Debate practice coach backed by an LLM chat-completion API"
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Print results as JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the built-in motions.
    Motions {
        /// Print one motion at random.
        #[arg(long)]
        random: bool,
    },
    /// Arguments in favour of the motion, then opponent arguments against it.
    Argue {
        #[command(flatten)]
        motion: MotionArgs,
        #[arg(long, default_value_t = Style::Wsdc)]
        style: Style,
    },
    /// Opponent arguments against the motion.
    Oppose {
        #[command(flatten)]
        motion: MotionArgs,
        #[arg(long, default_value_t = Style::Wsdc)]
        style: Style,
    },
    /// AI rebuttal to one opponent argument.
    Rebut {
        #[arg(long)]
        motion: String,
        /// The opponent argument to rebut.
        #[arg(long)]
        argument: String,
        #[arg(long, default_value_t = Style::Wsdc)]
        style: Style,
    },
    /// Score a rebuttal of one opponent argument.
    Score {
        #[arg(long)]
        motion: String,
        /// The opponent argument being rebutted.
        #[arg(long)]
        argument: String,
        /// Your rebuttal.
        #[arg(long)]
        rebuttal: String,
    },
    /// Interactive session: rebut each opponent argument from stdin.
    Practice {
        #[command(flatten)]
        motion: MotionArgs,
        #[arg(long, default_value_t = Style::Wsdc)]
        style: Style,
    },
}

#[derive(Args)]
struct MotionArgs {
    /// Debate motion, e.g. "This House Would ban TikTok".
    #[arg(long, conflicts_with = "random_motion")]
    motion: Option<String>,

    /// Use one of the built-in motions at random.
    #[arg(long)]
    random_motion: bool,
}

impl MotionArgs {
    fn resolve(self) -> Result<String> {
        match self.motion {
            Some(motion) if !motion.trim().is_empty() => Ok(motion.trim().to_string()),
            Some(_) => bail!("--motion must not be blank"),
            None if self.random_motion => Ok(random_motion(&mut rand::thread_rng()).to_string()),
            None => bail!("pass --motion or --random-motion"),
        }
    }
}

/// Failure classified by exit code.
struct Failure {
    code: i32,
    error: anyhow::Error,
}

impl Failure {
    fn config(error: anyhow::Error) -> Self {
        Self {
            code: exit_codes::CONFIG,
            error,
        }
    }
}

impl From<anyhow::Error> for Failure {
    fn from(error: anyhow::Error) -> Self {
        Self {
            code: exit_codes::FAILED,
            error,
        }
    }
}

impl From<GenerationError> for Failure {
    fn from(error: GenerationError) -> Self {
        anyhow::Error::new(error).into()
    }
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(()) => exit_codes::OK,
        Err(failure) => {
            report(&failure.error);
            failure.code
        }
    };
    std::process::exit(code);
}

fn report(error: &anyhow::Error) {
    match error.downcast_ref::<GenerationError>() {
        Some(generation) => eprint!("{}", render::generation_error(generation)),
        None => eprintln!("error: {error:#}"),
    }
}

fn run(cli: Cli) -> Result<(), Failure> {
    let json = cli.json;
    match cli.command {
        Command::Motions { random } => cmd_motions(random, json),
        Command::Argue { motion, style } => {
            let coach = connect(&cli.config)?;
            let motion = motion.resolve().map_err(Failure::config)?;
            cmd_argue(&coach, Session::new(motion, style), json)
        }
        Command::Oppose { motion, style } => {
            let coach = connect(&cli.config)?;
            let motion = motion.resolve().map_err(Failure::config)?;
            cmd_oppose(&coach, Session::new(motion, style), json)
        }
        Command::Rebut {
            motion,
            argument,
            style,
        } => {
            let motion = non_blank("--motion", motion).map_err(Failure::config)?;
            let argument = non_blank("--argument", argument).map_err(Failure::config)?;
            let coach = connect(&cli.config)?;
            let session = Session::new(motion, style);
            let rebuttal = coach.ai_rebuttal(&session, &opponent(argument))?;
            print_result(json, &rebuttal, || render::rebuttal(&rebuttal))
        }
        Command::Score {
            motion,
            argument,
            rebuttal,
        } => {
            let motion = non_blank("--motion", motion).map_err(Failure::config)?;
            let argument = non_blank("--argument", argument).map_err(Failure::config)?;
            let rebuttal = non_blank("--rebuttal", rebuttal).map_err(Failure::config)?;
            let coach = connect(&cli.config)?;
            let session = Session::new(motion, Style::default());
            let score = coach.score_rebuttal(&session, &opponent(argument), &rebuttal)?;
            print_result(json, &score, || render::score(&score))
        }
        Command::Practice { motion, style } => {
            let coach = connect(&cli.config)?;
            let motion = motion.resolve().map_err(Failure::config)?;
            let mut session = Session::new(motion, style);
            let summary = practice::run(&coach, &mut session, io::stdin().lock(), io::stdout())?;
            if summary.failures > 0 {
                return Err(anyhow::anyhow!(
                    "{} generation(s) failed during practice",
                    summary.failures
                )
                .into());
            }
            Ok(())
        }
    }
}

/// Load config and credential, then build the coach over the HTTP client.
fn connect(config_path: &Path) -> Result<Coach<ChatCompletionsClient>, Failure> {
    let config = load_config(config_path).map_err(Failure::config)?;
    let api_key = config.api_key().map_err(Failure::config)?;
    let client = ChatCompletionsClient::new(&config.api_base, api_key, config.model.clone());
    Coach::new(client, config).map_err(Failure::config)
}

/// Trimmed `value`, or an error naming `flag` when it is blank.
fn non_blank(flag: &str, value: String) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        bail!("{flag} must not be blank");
    }
    Ok(value.to_string())
}

/// An opponent argument given on the command line.
fn opponent(text: String) -> Argument {
    Argument {
        title: None,
        description: text.trim().to_string(),
        evidence: Vec::new(),
        quote: None,
    }
}

fn cmd_motions(random: bool, json: bool) -> Result<(), Failure> {
    let motions: Vec<&str> = if random {
        vec![random_motion(&mut rand::thread_rng())]
    } else {
        DEFAULT_MOTIONS.to_vec()
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&motions).context("serialize motions")?);
    } else {
        for motion in motions {
            println!("{motion}");
        }
    }
    Ok(())
}

fn cmd_argue(
    coach: &Coach<ChatCompletionsClient>,
    mut session: Session,
    json: bool,
) -> Result<(), Failure> {
    let batch = coach.favour_arguments(&mut session)?;
    let opponents = coach.opponent_arguments(&mut session);

    if json {
        let failures: Vec<_> = batch
            .failures
            .iter()
            .map(|failure| {
                json!({
                    "angle": failure.angle,
                    "error": failure.error.to_string(),
                    "raw": failure.error.raw_response(),
                })
            })
            .collect();
        let payload = json!({
            "motion": session.motion(),
            "style": session.style(),
            "favour": batch.arguments,
            "favour_failures": failures,
            "opponents": opponents.as_ref().ok(),
        });
        println!("{}", serde_json::to_string_pretty(&payload).context("serialize output")?);
    } else {
        println!("Motion: {} ({} style)\n", session.motion(), session.style());
        print!("{}", render::favour_batch(&batch));
        if let Ok(opponents) = &opponents {
            print!("\n{}", render::arguments("Opponent arguments", opponents));
        }
    }
    io::stdout().flush().context("flush stdout")?;

    opponents?;
    if !batch.is_complete() {
        return Err(anyhow::anyhow!(
            "{} of 3 favour angle(s) failed",
            batch.failures.len()
        )
        .into());
    }
    Ok(())
}

fn cmd_oppose(
    coach: &Coach<ChatCompletionsClient>,
    mut session: Session,
    json: bool,
) -> Result<(), Failure> {
    let opponents = coach.opponent_arguments(&mut session)?;
    print_result(json, &opponents, || {
        render::arguments("Opponent arguments", &opponents)
    })
}

fn print_result<T: Serialize>(
    json: bool,
    value: &T,
    text: impl FnOnce() -> String,
) -> Result<(), Failure> {
    if json {
        println!("{}", serde_json::to_string_pretty(value).context("serialize output")?);
    } else {
        print!("{}", text());
    }
    Ok(())
}
