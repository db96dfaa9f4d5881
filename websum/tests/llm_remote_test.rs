use mockito::Matcher;
use websum::llm::remote::RemoteLlmProvider;
use websum::llm::{CompletionError, LlmProvider, LlmRequest};

const OK_BODY: &str = r#"{
    "model": "gpt-3.5-turbo",
    "choices": [{
        "message": {
            "role": "assistant",
            "content": "This is a test response"
        },
        "finish_reason": "stop"
    }],
    "usage": {
        "prompt_tokens": 10,
        "completion_tokens": 5,
        "total_tokens": 15
    }
}"#;

#[tokio::test]
async fn test_remote_provider_with_mock() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/")
        .match_header("authorization", "Bearer fake-api-key")
        .match_header("openai-organization", "org-test")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "model": "gpt-3.5-turbo",
            "messages": [{"role": "user", "content": "Test prompt"}],
            "max_tokens": 100,
            "temperature": 0.0
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(OK_BODY)
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gpt-3.5-turbo")
        .with_organization(Some("org-test".to_string()));

    let request = LlmRequest {
        prompt: "Test prompt".to_string(),
        max_tokens: Some(100),
        temperature: Some(0.0),
        timeout_seconds: Some(10),
    };

    let response = provider.generate(request).await.expect("completion");

    assert_eq!(response.content, "This is a test response");
    assert_eq!(response.usage.prompt_tokens, 10);
    assert_eq!(response.usage.completion_tokens, 5);
    assert_eq!(response.usage.total_tokens, 15);
    assert_eq!(response.model, "gpt-3.5-turbo");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_remote_provider_defaults_fill_request() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "max_tokens": 2000,
            "temperature": 0.5
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices": [{"message": {"role": "assistant", "content": "ok"}}]}"#)
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gpt-3.5-turbo")
        .with_defaults(10, 2000, 0.5);

    let response = provider.generate(LlmRequest::new("Test")).await.expect("completion");

    // Missing usage and model fall back to defaults
    assert_eq!(response.content, "ok");
    assert_eq!(response.usage.total_tokens, 0);
    assert_eq!(response.model, "gpt-3.5-turbo");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_remote_provider_error_handling() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/")
        .with_status(429)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": {"message": "Rate limit exceeded"}}"#)
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gpt-3.5-turbo");

    let err = provider.generate(LlmRequest::new("Test")).await.unwrap_err();

    assert!(matches!(err, CompletionError::Api { status, .. } if status.as_u16() == 429));
    assert!(err.to_string().contains("429"));
    assert!(err.to_string().contains("Rate limit exceeded"));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_remote_provider_malformed_response() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices": []}"#)
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gpt-3.5-turbo");

    let err = provider.generate(LlmRequest::new("Test")).await.unwrap_err();
    assert!(matches!(err, CompletionError::Malformed(_)));
}

#[tokio::test]
async fn test_remote_provider_timeout() {
    let mut server = mockito::Server::new_async().await;

    // Mock slow response
    let _mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_chunked_body(|w| {
            std::thread::sleep(std::time::Duration::from_secs(3));
            w.write_all(b"too late")
        })
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gpt-3.5-turbo");

    let request = LlmRequest {
        prompt: "Test".to_string(),
        max_tokens: None,
        temperature: None,
        timeout_seconds: Some(1), // 1 second timeout
    };

    let err = provider.generate(request).await.unwrap_err();

    assert!(matches!(err, CompletionError::Timeout(_)));
    assert!(err.to_string().contains("timed out"));
}
