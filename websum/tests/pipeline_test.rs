use mockito::{Matcher, Server};
use std::sync::Arc;
use websum::llm::remote::RemoteLlmProvider;
use websum::scraping::{self, FetchError};
use websum::summary::prompt::PromptContext;
use websum::summary::{Stage, SummarizeError, SummaryConfig, Summarizer};

const ARTICLE: &str = r#"<html><body>
    <article>
        <h1>Rust 1.70 released</h1>
        <p>The Rust team has published a new stable release with sparse registry support enabled by default.</p>
        <p>Cargo now fetches only the index entries it needs, which makes builds on fresh machines much faster.</p>
        <p>The release also stabilizes OnceCell and OnceLock for lazily initialized values.</p>
    </article>
</body></html>"#;

fn completion_body(content: &str) -> String {
    serde_json::json!({
        "model": "gpt-3.5-turbo",
        "choices": [{"message": {"role": "assistant", "content": content}}],
        "usage": {"prompt_tokens": 50, "completion_tokens": 10, "total_tokens": 60}
    })
    .to_string()
}

fn sampling() -> Matcher {
    Matcher::PartialJson(serde_json::json!({"temperature": 0.25, "max_tokens": 321}))
}

fn summarizer(server: &Server) -> Summarizer {
    let provider = RemoteLlmProvider::new(format!("{}/v1/chat/completions", server.url()), "fake-api-key", "gpt-3.5-turbo");
    let config = SummaryConfig {
        chunk_size: 120,
        temperature: 0.25,
        max_tokens: Some(321),
        prompt: PromptContext {
            language: "French".to_string(),
            detail_level: "analytical".to_string(),
            max_words: 80,
        },
        ..SummaryConfig::default()
    };
    Summarizer::new(Arc::new(provider), config)
}

#[tokio::test]
async fn summarizes_a_fetched_page() {
    let mut server = Server::new_async().await;

    let page = server
        .mock("GET", "/article")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(ARTICLE)
        .create_async()
        .await;
    let map = server
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::AllOf(vec![Matcher::Regex("tl;dr".to_string()), sampling()]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body("- Rust 1.70 makes sparse registries the default."))
        .expect_at_least(2)
        .create_async()
        .await;
    let reduce = server
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("remove duplicate".to_string()),
            Matcher::Regex("at most 80 words".to_string()),
            Matcher::Regex("Reply in French".to_string()),
            sampling(),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body("* Rust 1.70 enables sparse registries.\n* OnceCell is stable."))
        .expect(1)
        .create_async()
        .await;

    let text = scraping::scrape_page_text(&format!("{}/article", server.url()), 5)
        .await
        .expect("fetch page");
    assert!(text.contains("sparse registry support"));

    let summary = summarizer(&server).summarize(&text).await.expect("summarize");

    assert_eq!(
        summary.as_deref(),
        Some("* Rust 1.70 enables sparse registries.\n* OnceCell is stable.")
    );
    page.assert_async().await;
    map.assert_async().await;
    reduce.assert_async().await;
}

#[tokio::test]
async fn map_failure_aborts_before_reduce() {
    let mut server = Server::new_async().await;

    let map = server
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::Regex("tl;dr".to_string()))
        .with_status(500)
        .with_body("upstream exploded")
        .expect(1)
        .create_async()
        .await;
    let reduce = server
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::Regex("remove duplicate".to_string()))
        .with_status(200)
        .with_body(completion_body("never"))
        .expect(0)
        .create_async()
        .await;

    let text = "word ".repeat(200);
    let err = summarizer(&server).summarize(&text).await.unwrap_err();

    match err {
        SummarizeError::Failed { stage, chunk, source } => {
            assert_eq!(stage, Stage::Mapping);
            assert_eq!(chunk, Some(0));
            assert!(source.to_string().contains("500"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    map.assert_async().await;
    reduce.assert_async().await;
}

#[tokio::test]
async fn fetch_reports_http_status() {
    let mut server = Server::new_async().await;

    let _missing = server
        .mock("GET", "/missing")
        .with_status(404)
        .create_async()
        .await;

    let err = scraping::fetch_page(&format!("{}/missing", server.url()), 5)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Status(status) if status.as_u16() == 404));
    assert!(err.to_string().contains("404"));
}
