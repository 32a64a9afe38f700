//! The four debate operations, each a prompt plus schema fed to the
//! structured generation client.

use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

use crate::core::types::{Angle, Argument, Rebuttal, Score, Stance};
use crate::generate::{GenerationError, GenerationRequest, StructuredClient};
use crate::io::completion::Completion;
use crate::io::config::{OperationConfig, TrainerConfig};
use crate::io::prompt::Prompt;
use crate::schema::{ArgumentWire, RebuttalWire, Schemas, ScoreWire};
use crate::session::Session;

/// One favour angle that exhausted its attempts.
#[derive(Debug)]
pub struct AngleFailure {
    pub angle: Angle,
    pub error: GenerationError,
}

/// Result of generating favour arguments, one call per angle.
#[derive(Debug)]
pub struct FavourBatch {
    /// Successful arguments in angle order (moral, economic, societal).
    pub arguments: Vec<Argument>,
    pub failures: Vec<AngleFailure>,
    /// Served from the session memo without upstream calls.
    pub cached: bool,
}

impl FavourBatch {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Debate coach: owns the generation client, schemas and budgets.
pub struct Coach<C> {
    client: StructuredClient<C>,
    schemas: Schemas,
    config: TrainerConfig,
}

impl<C: Completion> Coach<C> {
    pub fn new(completion: C, config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        let client = StructuredClient::new(completion)
            .context("compile prompt templates")?
            .with_retry_feedback(config.retry_with_feedback);
        let schemas = Schemas::builtin()?;
        Ok(Self {
            client,
            schemas,
            config,
        })
    }

    /// Up to three arguments in favour of the session motion, one per angle.
    ///
    /// Angles that exhaust their attempts are reported in
    /// [`FavourBatch::failures`]; a transport error aborts the whole batch.
    /// Only complete batches are memoised.
    #[instrument(skip_all, fields(motion = %session.motion(), style = %session.style()))]
    pub fn favour_arguments(&self, session: &mut Session) -> Result<FavourBatch, GenerationError> {
        if let Some(cached) = session.recall(Stance::InFavour) {
            info!("favour arguments served from session memo");
            let arguments = cached.to_vec();
            session.show(Stance::InFavour, arguments.clone());
            return Ok(FavourBatch {
                arguments,
                failures: Vec::new(),
                cached: true,
            });
        }

        let mut arguments = Vec::new();
        let mut failures = Vec::new();
        for angle in Angle::ALL {
            let prompt = self
                .client
                .prompts()
                .favour(session.motion(), session.style(), angle)?;
            let request = self.request(prompt, self.config.favour);
            match self.client.generate::<ArgumentWire>(
                &request,
                &self.schemas.argument,
                self.config.max_attempts,
            ) {
                Ok(wire) => arguments.push(Argument::from(wire)),
                Err(error) if error.is_transport() => return Err(error),
                Err(error) => {
                    warn!(angle = angle.as_str(), "favour argument failed");
                    failures.push(AngleFailure { angle, error });
                }
            }
        }

        if failures.is_empty() {
            session.remember(Stance::InFavour, arguments.clone());
        } else {
            session.show(Stance::InFavour, arguments.clone());
        }
        Ok(FavourBatch {
            arguments,
            failures,
            cached: false,
        })
    }

    /// Exactly three arguments against the session motion.
    #[instrument(skip_all, fields(motion = %session.motion(), style = %session.style()))]
    pub fn opponent_arguments(
        &self,
        session: &mut Session,
    ) -> Result<Vec<Argument>, GenerationError> {
        if let Some(cached) = session.recall(Stance::Against) {
            info!("opponent arguments served from session memo");
            let arguments = cached.to_vec();
            session.show(Stance::Against, arguments.clone());
            return Ok(arguments);
        }

        let prompt = self
            .client
            .prompts()
            .opponents(session.motion(), session.style())?;
        let request = self.request(prompt, self.config.opponents);
        let wires: Vec<ArgumentWire> = self.client.generate(
            &request,
            &self.schemas.opponents,
            self.config.max_attempts,
        )?;
        let arguments: Vec<Argument> = wires.into_iter().map(Argument::from).collect();
        session.remember(Stance::Against, arguments.clone());
        Ok(arguments)
    }

    /// An AI rebuttal to one opponent argument. Never memoised.
    #[instrument(skip_all, fields(motion = %session.motion(), target = %opponent.headline()))]
    pub fn ai_rebuttal(
        &self,
        session: &Session,
        opponent: &Argument,
    ) -> Result<Rebuttal, GenerationError> {
        let prompt = self
            .client
            .prompts()
            .rebuttal(session.motion(), session.style(), opponent)?;
        let request = self.request(prompt, self.config.rebuttal);
        let wire: RebuttalWire = self.client.generate(
            &request,
            &self.schemas.rebuttal,
            self.config.max_attempts,
        )?;
        Ok(wire.into_rebuttal(opponent))
    }

    /// Score a human rebuttal of `opponent`. Never memoised.
    ///
    /// Succeeds only with all four categories in `1..=10` and a suggestion.
    #[instrument(skip_all, fields(motion = %session.motion(), target = %opponent.headline()))]
    pub fn score_rebuttal(
        &self,
        session: &Session,
        opponent: &Argument,
        rebuttal: &str,
    ) -> Result<Score, GenerationError> {
        let prompt = self
            .client
            .prompts()
            .score(session.motion(), opponent, rebuttal)?;
        let request = self.request(prompt, self.config.score);
        let wire: ScoreWire =
            self.client
                .generate(&request, &self.schemas.score, self.config.max_attempts)?;
        Ok(Score::from(wire))
    }

    fn request(&self, prompt: Prompt, budget: OperationConfig) -> GenerationRequest {
        GenerationRequest {
            prompt,
            max_tokens: budget.max_tokens,
            temperature: budget.temperature,
        }
    }
}
