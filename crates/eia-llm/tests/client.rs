//! Integration tests for `ChatClient` using wiremock HTTP mocks.

use eia_llm::{ChatClient, LlmError};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> ChatClient {
    ChatClient::with_base_url("test-key", 30, &format!("{base_url}/v1"))
        .expect("client construction should not fail")
        .with_retry(2, 0)
}

fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }
        ]
    })
}

#[tokio::test]
async fn complete_returns_first_choice_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-4",
            "max_tokens": 1000,
            "messages": [
                { "role": "system", "content": "system prompt" },
                { "role": "user", "content": "Bamboo utensils" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Carbon: 8/10")))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let content = client
        .complete("system prompt", "Bamboo utensils")
        .await
        .expect("completion should succeed");

    assert_eq!(content.as_deref(), Some("Carbon: 8/10"));
}

#[tokio::test]
async fn missing_content_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [ { "message": { "role": "assistant", "content": null } } ]
        })))
        .mount(&server)
        .await;

    let content = test_client(&server.uri())
        .complete("s", "u")
        .await
        .expect("completion should succeed");
    assert!(content.is_none());
}

#[tokio::test]
async fn empty_choices_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
        .mount(&server)
        .await;

    let content = test_client(&server.uri()).complete("s", "u").await.unwrap();
    assert!(content.is_none());
}

#[tokio::test]
async fn unauthorized_surfaces_api_message_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .complete("s", "u")
        .await
        .expect_err("401 should fail");

    match err {
        LlmError::Api { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Incorrect API key provided");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn server_errors_are_retried_until_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream overloaded"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Overall: 7/10")))
        .expect(1)
        .mount(&server)
        .await;

    let content = test_client(&server.uri())
        .complete("s", "u")
        .await
        .expect("third attempt should succeed");
    assert_eq!(content.as_deref(), Some("Overall: 7/10"));
}

#[tokio::test]
async fn rate_limit_exhausts_retries() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .expect(3)
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .complete("s", "u")
        .await
        .expect_err("should give up");
    assert!(
        matches!(err, LlmError::Api { status: 429, ref message } if message == "slow down"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn malformed_body_is_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .complete("s", "u")
        .await
        .expect_err("should fail");
    assert!(matches!(err, LlmError::Deserialize { .. }));
}
