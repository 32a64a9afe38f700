//! Trainer configuration stored in `trainer.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Deserializer};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "trainer.toml";

/// Trainer configuration (TOML).
///
/// Intended to be edited by humans. Missing fields fall back to the defaults
/// below, which mirror the budgets the trainer has always used. A partial
/// operation table keeps that operation's default for the missing key.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrainerConfig {
    /// Model identifier sent with every completion request.
    pub model: String,

    /// Base URL of the OpenAI-compatible API (without `/chat/completions`).
    pub api_base: String,

    /// Environment variable holding the API credential.
    pub api_key_env: String,

    /// Attempts per generation before reporting a failure.
    pub max_attempts: u32,

    /// Feed the previous invalid response back into the next attempt.
    pub retry_with_feedback: bool,

    #[serde(deserialize_with = "favour_budget")]
    pub favour: OperationConfig,
    #[serde(deserialize_with = "opponents_budget")]
    pub opponents: OperationConfig,
    #[serde(deserialize_with = "rebuttal_budget")]
    pub rebuttal: OperationConfig,
    #[serde(deserialize_with = "score_budget")]
    pub score: OperationConfig,
}

/// Sampling budget for one kind of request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperationConfig {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl OperationConfig {
    const fn new(max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
        }
    }
}

/// An operation table as written, before defaults are filled in.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OperationTable {
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl OperationTable {
    fn or(self, default: OperationConfig) -> OperationConfig {
        OperationConfig {
            max_tokens: self.max_tokens.unwrap_or(default.max_tokens),
            temperature: self.temperature.unwrap_or(default.temperature),
        }
    }
}

fn favour_budget<'de, D: Deserializer<'de>>(d: D) -> Result<OperationConfig, D::Error> {
    Ok(OperationTable::deserialize(d)?.or(TrainerConfig::default().favour))
}

fn opponents_budget<'de, D: Deserializer<'de>>(d: D) -> Result<OperationConfig, D::Error> {
    Ok(OperationTable::deserialize(d)?.or(TrainerConfig::default().opponents))
}

fn rebuttal_budget<'de, D: Deserializer<'de>>(d: D) -> Result<OperationConfig, D::Error> {
    Ok(OperationTable::deserialize(d)?.or(TrainerConfig::default().rebuttal))
}

fn score_budget<'de, D: Deserializer<'de>>(d: D) -> Result<OperationConfig, D::Error> {
    Ok(OperationTable::deserialize(d)?.or(TrainerConfig::default().score))
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_attempts: 3,
            retry_with_feedback: false,
            favour: OperationConfig::new(350, 0.7),
            opponents: OperationConfig::new(800, 0.7),
            rebuttal: OperationConfig::new(300, 0.7),
            score: OperationConfig::new(200, 0.3),
        }
    }
}

impl TrainerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(anyhow!("model must be non-empty"));
        }
        if self.api_base.trim().is_empty() {
            return Err(anyhow!("api_base must be non-empty"));
        }
        if self.api_key_env.trim().is_empty() {
            return Err(anyhow!("api_key_env must be non-empty"));
        }
        if self.max_attempts == 0 {
            return Err(anyhow!("max_attempts must be > 0"));
        }
        for (name, op) in self.operations() {
            if op.max_tokens == 0 {
                return Err(anyhow!("{name}.max_tokens must be > 0"));
            }
            if !(0.0..=2.0).contains(&op.temperature) {
                return Err(anyhow!(
                    "{name}.temperature must be within 0.0..=2.0 (got {})",
                    op.temperature
                ));
            }
        }
        Ok(())
    }

    fn operations(&self) -> [(&'static str, OperationConfig); 4] {
        [
            ("favour", self.favour),
            ("opponents", self.opponents),
            ("rebuttal", self.rebuttal),
            ("score", self.score),
        ]
    }

    /// Read the API credential from the process environment.
    pub fn api_key(&self) -> Result<String> {
        self.api_key_from(|name| std::env::var(name).ok())
    }

    /// Read the API credential through `lookup`.
    ///
    /// A missing or blank credential is a configuration error, never retried.
    pub fn api_key_from(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
        lookup(&self.api_key_env)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "missing API credential: set the {} environment variable",
                    self.api_key_env
                )
            })
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `TrainerConfig::default()`.
pub fn load_config(path: &Path) -> Result<TrainerConfig> {
    if !path.exists() {
        let cfg = TrainerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: TrainerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, TrainerConfig::default());
        assert_eq!(cfg.max_attempts, 3);
        assert_eq!(cfg.score.max_tokens, 200);
    }

    #[test]
    fn full_file_overrides_every_field() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("trainer.toml");
        fs::write(
            &path,
            concat!(
                "model = \"gpt-4o-mini\"\n",
                "api_base = \"http://localhost:8080/v1\"\n",
                "api_key_env = \"LOCAL_KEY\"\n",
                "max_attempts = 2\n",
                "retry_with_feedback = true\n",
                "\n[opponents]\nmax_tokens = 900\ntemperature = 0.9\n",
            ),
        )
        .expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.model, "gpt-4o-mini");
        assert_eq!(cfg.api_base, "http://localhost:8080/v1");
        assert_eq!(cfg.api_key_env, "LOCAL_KEY");
        assert_eq!(cfg.max_attempts, 2);
        assert!(cfg.retry_with_feedback);
        assert_eq!(cfg.opponents, OperationConfig::new(900, 0.9));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("trainer.toml");
        fs::write(
            &path,
            "max_attempts = 5\n\n[score]\nmax_tokens = 250\n\n[rebuttal]\ntemperature = 0.2\n",
        )
        .expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.max_attempts, 5);
        assert_eq!(cfg.score, OperationConfig::new(250, 0.3));
        assert_eq!(cfg.rebuttal, OperationConfig::new(300, 0.2));
        assert_eq!(cfg.favour, TrainerConfig::default().favour);
        assert_eq!(cfg.model, "gpt-3.5-turbo");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("trainer.toml");
        fs::write(&path, "max_attempts = 0\n").expect("write");
        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("max_attempts must be > 0"));

        let cfg = TrainerConfig {
            rebuttal: OperationConfig::new(300, 3.5),
            ..TrainerConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("rebuttal.temperature"));
    }

    #[test]
    fn missing_or_blank_credential_is_an_error() {
        let cfg = TrainerConfig::default();
        let err = cfg.api_key_from(|_| None).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
        assert!(cfg.api_key_from(|_| Some("   ".to_string())).is_err());

        let key = cfg
            .api_key_from(|name| (name == "OPENAI_API_KEY").then(|| " sk-live ".to_string()))
            .expect("key");
        assert_eq!(key, "sk-live");
    }
}
