use html2text::render::TrivialDecorator;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Elements that never carry readable page text
const SKIPPED_ELEMENTS: &str = "img, picture, figure, table, script, style, noscript, svg, iframe, template";

/// Wrap width handed to html2text; wide so paragraphs stay on one line
const TEXT_WIDTH: usize = 10_000;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to fetch page: {0}")]
    Request(#[from] reqwest::Error),
    #[error("page fetch failed with status: {0}")]
    Status(StatusCode),
}

/// Download the raw HTML of `url`.
pub async fn fetch_page(url: &str, timeout_secs: u64) -> Result<String, FetchError> {
    url::Url::parse(url).map_err(|source| FetchError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;

    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("websum/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }

    let html = response.text().await?;
    info!("scraping: fetched {} bytes from {}", html.len(), url);
    Ok(html)
}

/// Convert HTML to plain text, keeping paragraph breaks as newlines and leaving out
/// images, tables and link targets. Links render as their text alone.
pub fn extract_text(html: &str) -> String {
    let mut document = Html::parse_document(html);

    if let Ok(selector) = Selector::parse(SKIPPED_ELEMENTS) {
        let skipped: Vec<_> = document.select(&selector).map(|el| el.id()).collect();
        for id in skipped {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
            }
        }
    }

    let pruned = document.root_element().html();
    match html2text::from_read_with_decorator(pruned.as_bytes(), TEXT_WIDTH, TrivialDecorator::new()) {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            warn!("scraping: failed to convert HTML to text: {}", e);
            // Fall back to the bare text nodes, one per line
            document
                .root_element()
                .text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}

/// Fetch `url` and return its readable text.
pub async fn scrape_page_text(url: &str, timeout_secs: u64) -> Result<String, FetchError> {
    let html = fetch_page(url, timeout_secs).await?;
    let text = extract_text(&html);
    info!("scraping: extracted {} chars of text from {}", text.len(), url);
    Ok(text)
}
