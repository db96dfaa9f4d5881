/*
websum - command line entry point.
Fetches a webpage, extracts its text and prints an executive summary produced by the
chunk-and-reduce pipeline.
*/

use anyhow::{Context, Result};
use clap::Parser;
use common::{Config, Settings};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use websum::llm::remote::RemoteLlmProvider;
use websum::output::{self, Target};
use websum::scraping;
use websum::summary::prompt::PromptContext;
use websum::summary::{SummaryConfig, Summarizer};

const DEFAULT_MAX_WORDS: usize = 200;

#[derive(Parser, Debug)]
#[command(name = "websum", about = "Summarize a webpage with an LLM")]
struct Args {
    /// Webpage to summarize
    #[arg(long)]
    url: Option<String>,

    /// Language of the summary
    #[arg(long, default_value = "English")]
    lang: String,

    /// Write the summary to this file instead of stdout
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Render the summary as an HTML document
    #[arg(long)]
    html: bool,

    /// Requested level of detail, e.g. "analytical" or "concise"
    #[arg(long = "detail_level", default_value = "analytical")]
    detail_level: String,

    /// Maximum number of words in the final summary
    #[arg(long = "max_words", default_value = "200")]
    max_words: String,

    /// Path to the TOML configuration
    #[arg(long, value_name = "FILE", default_value = "openai.toml")]
    config: PathBuf,

    /// Override log level (info, debug, warn, error)
    #[arg(long = "log_level", default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let args = Args::parse();

    // Logs go to stderr, stdout carries only the summary
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let Some(url) = args.url.as_deref() else {
        eprintln!("Type \"--help\" for more information.");
        return ExitCode::FAILURE;
    };

    let settings = match load_settings(&args.config).await {
        Ok(settings) => settings,
        Err(e) => {
            error!(config = %args.config.display(), "failed to load configuration: {:#}", e);
            eprintln!("Error: Unable to read configuration: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(model = %settings.model, chunk_size = settings.chunk_size, "configuration loaded");

    let text = match scraping::scrape_page_text(url, settings.timeout_seconds).await {
        Ok(text) => text,
        Err(e) => {
            error!(%url, "failed to fetch page: {}", e);
            eprintln!("Error: Unable to fetch {}: {}", url, e);
            return ExitCode::FAILURE;
        }
    };

    let prompt = PromptContext {
        language: args.lang.clone(),
        detail_level: args.detail_level.clone(),
        max_words: parse_max_words(&args.max_words),
    };
    let provider = Arc::new(RemoteLlmProvider::from_settings(&settings));
    let summarizer = Summarizer::new(provider, SummaryConfig::from_settings(&settings, prompt));

    match summarizer.summarize(&text).await {
        Ok(Some(summary)) => {
            let target = match args.output.as_deref() {
                Some(path) => Target::File(path),
                None => Target::Stdout,
            };
            let title = format!("Summary of {}", url);
            if let Err(e) = output::write_summary(&summary, target, args.html, &title).await {
                error!("failed to write summary: {:#}", e);
                eprintln!("Error: {:#}", e);
            }
        }
        Ok(None) => {
            warn!(%url, "page has no readable text");
            eprintln!("Error: The webpage has no readable text to summarize.");
        }
        Err(e) => {
            error!(%url, "summarization failed: {}", e);
            eprintln!("Error: Unable to generate summary for the Webpage.");
            eprintln!("{}", e);
        }
    }

    ExitCode::SUCCESS
}

/// Resolve config files (`openai.default.toml` next to the override, then the override itself),
/// merge and validate them.
async fn load_settings(config_path: &Path) -> Result<Settings> {
    if !config_path.exists() {
        anyhow::bail!("config file not found: {}", config_path.display());
    }
    let default_path = config_path.with_file_name("openai.default.toml");

    let config = Config::load_with_defaults(
        if default_path.exists() { Some(default_path.as_path()) } else { None },
        Some(config_path),
    )
    .await?;
    info!(default = ?default_path, config = ?config_path, "configuration files read");

    config.validate().context("invalid configuration")
}

/// Positive integer, or the default with a warning.
fn parse_max_words(raw: &str) -> usize {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => n,
        _ => {
            warn!("--max_words expects a positive integer, got {:?}; using {}", raw, DEFAULT_MAX_WORDS);
            eprintln!("Warning: invalid --max_words value {:?}, using {}", raw, DEFAULT_MAX_WORDS);
            DEFAULT_MAX_WORDS
        }
    }
}
