/*!
common/src/lib.rs

Shared configuration types for websum.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader for a TOML config file, with optional default + override merging
- Startup validation of the values the summarization pipeline depends on
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Chat-completions endpoint used when `openai.api_url` is not set.
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Environment variable consulted when `openai.apikey` is missing from the file.
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Startup configuration problems. All of them are fatal before the pipeline runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
    #[error("invalid value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// OpenAI-compatible completion service settings (`[openai]` table)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key. When absent, the variable named by `apikey_env` is read instead.
    pub apikey: Option<String>,
    pub apikey_env: Option<String>,
    pub organization: Option<String>,
    pub model: Option<String>,
    /// Upper bound on generated tokens per completion call
    pub maxtokens: Option<usize>,
    /// Sampling temperature in [0, 1]; defaults to 0 for reproducible summaries
    pub temperature: Option<f32>,
    pub api_url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

/// Chunk-and-reduce tuning (`[summary]` table, optional)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryTuning {
    /// Characters per chunk
    pub chunk_size: Option<usize>,
    /// Fraction of each chunk repeated at the start of the next one
    pub overlap: Option<f64>,
    /// Ceiling applied to the merged partial summaries before the reduce call
    pub reduction_budget: Option<usize>,
    /// "words" or "tokens"
    pub budget_unit: Option<String>,
    /// Number of chunk completions allowed in flight at once
    pub concurrency: Option<usize>,
}

/// Top-level application configuration (deserialized from openai.toml)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub summary: SummaryTuning,
}

/// Validated settings, ready to build the completion client and the summarizer from.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_key: String,
    pub organization: Option<String>,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    pub api_url: String,
    pub timeout_seconds: u64,
    pub chunk_size: usize,
    pub overlap: f64,
    pub reduction_budget: usize,
    pub budget_unit: String,
    pub concurrency: usize,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("openai.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        for path in [default_path, override_path].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let val: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse configuration: {}", path.display()))?;
            merge_toml(&mut config_value, val);
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }

    /// Check presence and ranges, resolving the API key from the environment if needed.
    pub fn validate(&self) -> Result<Settings, ConfigError> {
        self.validate_with_env(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::validate`] with an injectable environment lookup.
    pub fn validate_with_env<F>(&self, env: F) -> Result<Settings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai = &self.openai;

        let api_key = match openai.apikey.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => {
                let var = openai.apikey_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV);
                env(var)
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .ok_or(ConfigError::Missing("openai.apikey"))?
            }
        };

        let model = openai
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or(ConfigError::Missing("openai.model"))?
            .to_string();

        let max_tokens = openai.maxtokens.ok_or(ConfigError::Missing("openai.maxtokens"))?;
        if max_tokens == 0 {
            return Err(invalid("openai.maxtokens", "must be a positive integer"));
        }

        let temperature = openai.temperature.unwrap_or(0.0);
        if !(0.0..=1.0).contains(&temperature) {
            return Err(invalid("openai.temperature", format!("{} is outside [0, 1]", temperature)));
        }

        let timeout_seconds = openai.timeout_seconds.unwrap_or(30);
        if timeout_seconds == 0 {
            return Err(invalid("openai.timeout_seconds", "must be a positive integer"));
        }

        let tuning = &self.summary;
        let chunk_size = tuning.chunk_size.unwrap_or(9000);
        if chunk_size == 0 {
            return Err(invalid("summary.chunk_size", "must be a positive integer"));
        }
        let overlap = tuning.overlap.unwrap_or(0.5);
        if !(0.0..1.0).contains(&overlap) {
            return Err(invalid("summary.overlap", format!("{} is outside [0, 1)", overlap)));
        }
        let reduction_budget = tuning.reduction_budget.unwrap_or(3000);
        if reduction_budget == 0 {
            return Err(invalid("summary.reduction_budget", "must be a positive integer"));
        }
        let budget_unit = tuning.budget_unit.as_deref().unwrap_or("words").to_lowercase();
        if budget_unit != "words" && budget_unit != "tokens" {
            return Err(invalid("summary.budget_unit", format!("expected \"words\" or \"tokens\", got {:?}", budget_unit)));
        }
        let concurrency = tuning.concurrency.unwrap_or(1);
        if concurrency == 0 {
            return Err(invalid("summary.concurrency", "must be a positive integer"));
        }

        Ok(Settings {
            api_key,
            organization: openai.organization.clone().filter(|o| !o.trim().is_empty()),
            model,
            max_tokens,
            temperature,
            api_url: openai.api_url.clone().unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            timeout_seconds,
            chunk_size,
            overlap,
            reduction_budget,
            budget_unit,
            concurrency,
        })
    }
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { key, reason: reason.into() }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}
