//! Chunk-and-reduce summarization.
//!
//! The text is normalized and cut into overlapping chunks, each chunk is summarized by
//! the completion provider (map), and the joined partial summaries are deduplicated and
//! compressed by one last completion call (reduce).

use common::Settings;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::llm::{CompletionError, LlmProvider, LlmRequest, UsageMetadata};

pub mod budget;
pub mod chunker;
pub mod normalize;
pub mod prompt;

use budget::{BudgetUnit, ReductionBudget};
use chunker::Chunk;
use prompt::{PromptContext, PromptKind};

/// Share of every chunk repeated at the start of the next one
pub const DEFAULT_OVERLAP: f64 = 0.5;

/// Pipeline phases, as reported in logs and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Chunking,
    Mapping,
    Merging,
    Budgeting,
    Reducing,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Chunking => "chunking",
            Stage::Mapping => "map",
            Stage::Merging => "merging",
            Stage::Budgeting => "budgeting",
            Stage::Reducing => "reduce",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// A completion call failed; the run is abandoned and no summary is produced.
    #[error("summarization failed during {stage} stage{}: {source}", chunk_suffix(.chunk))]
    Failed {
        stage: Stage,
        chunk: Option<usize>,
        #[source]
        source: CompletionError,
    },
}

fn chunk_suffix(chunk: &Option<usize>) -> String {
    chunk.map(|i| format!(" (chunk {})", i)).unwrap_or_default()
}

/// Per-run parameters of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryConfig {
    pub chunk_size: usize,
    pub overlap_fraction: f64,
    pub prompt: PromptContext,
    pub temperature: f32,
    /// Generation ceiling for each completion call; provider default when unset
    pub max_tokens: Option<usize>,
    pub budget: Option<ReductionBudget>,
    /// Chunk completions allowed in flight at once
    pub concurrency: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            chunk_size: 9000,
            overlap_fraction: DEFAULT_OVERLAP,
            prompt: PromptContext::default(),
            temperature: 0.0,
            max_tokens: None,
            budget: Some(ReductionBudget::words(3000)),
            concurrency: 1,
        }
    }
}

impl SummaryConfig {
    /// Derive the pipeline parameters from validated settings and CLI choices.
    pub fn from_settings(settings: &Settings, prompt: PromptContext) -> Self {
        let unit = settings.budget_unit.parse().unwrap_or(BudgetUnit::Words);
        Self {
            chunk_size: settings.chunk_size,
            overlap_fraction: settings.overlap,
            prompt,
            temperature: settings.temperature,
            max_tokens: Some(settings.max_tokens),
            budget: Some(ReductionBudget {
                limit: settings.reduction_budget,
                unit,
            }),
            concurrency: settings.concurrency,
        }
    }
}

/// Two-stage map-reduce summarizer over a completion provider.
pub struct Summarizer {
    provider: Arc<dyn LlmProvider>,
    config: SummaryConfig,
}

impl Summarizer {
    pub fn new(provider: Arc<dyn LlmProvider>, config: SummaryConfig) -> Self {
        Self { provider, config }
    }

    /// Summarize `text`. Blank input returns `Ok(None)` without calling the provider.
    ///
    /// The first failing completion aborts the run: no further chunk calls are
    /// started and no partial summary is returned.
    pub async fn summarize(&self, text: &str) -> Result<Option<String>, SummarizeError> {
        if text.trim().is_empty() {
            debug!(stage = %Stage::Idle, "empty document, nothing to summarize");
            return Ok(None);
        }

        debug!(stage = %Stage::Chunking, chunk_size = self.config.chunk_size, overlap = self.config.overlap_fraction, "splitting document");
        let chunks = chunker::split(text, self.config.chunk_size, self.config.overlap_fraction)?;
        if chunks.is_empty() {
            debug!("document has no text left after normalization");
            return Ok(None);
        }
        info!(chunks = chunks.len(), chars = text.chars().count(), "summarizing document");

        let mut usage = UsageMetadata::default();

        let partials = self.map_chunks(chunks, &mut usage).await?;

        debug!(stage = %Stage::Merging, partials = partials.len(), "merging chunk summaries");
        let merged = normalize::normalize(&partials.join("\n"));

        let merged = match self.config.budget {
            Some(budget) => {
                let cut = budget.apply(&merged);
                if cut.truncated() {
                    warn!(
                        stage = %Stage::Budgeting,
                        unit = %budget.unit,
                        original = cut.original,
                        kept = cut.kept,
                        "merged summaries exceed the reduction budget, dropping the tail"
                    );
                }
                cut.text
            }
            None => merged,
        };

        debug!(stage = %Stage::Reducing, chars = merged.len(), "reducing merged summaries");
        let prompt = prompt::build(PromptKind::Reduce, &merged, &self.config.prompt);
        let response = self
            .provider
            .generate(self.request(prompt))
            .await
            .map_err(|source| SummarizeError::Failed {
                stage: Stage::Reducing,
                chunk: None,
                source,
            })?;
        usage += response.usage;

        info!(
            stage = %Stage::Done,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            total_tokens = usage.total_tokens,
            "summary generated"
        );

        Ok(Some(response.content))
    }

    /// Map stage: one completion per chunk, results kept in chunk order.
    async fn map_chunks(
        &self,
        chunks: Vec<Chunk>,
        usage: &mut UsageMetadata,
    ) -> Result<Vec<String>, SummarizeError> {
        let total = chunks.len();
        let concurrency = self.config.concurrency.max(1);

        let responses: Vec<_> = stream::iter(chunks)
            .map(|chunk| async move {
                debug!(stage = %Stage::Mapping, chunk = chunk.index, total, start = chunk.start, "summarizing chunk");
                let prompt = prompt::build(PromptKind::Map, &chunk.text, &self.config.prompt);
                self.provider
                    .generate(self.request(prompt))
                    .await
                    .map_err(|source| SummarizeError::Failed {
                        stage: Stage::Mapping,
                        chunk: Some(chunk.index),
                        source,
                    })
            })
            .buffered(concurrency)
            .try_collect()
            .await?;

        Ok(responses
            .into_iter()
            .map(|response| {
                *usage += response.usage;
                response.content
            })
            .collect())
    }

    fn request(&self, prompt: String) -> LlmRequest {
        LlmRequest::new(prompt)
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens)
    }
}
