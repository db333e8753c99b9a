//! Wiremock integration tests for DifyClient.

use std::time::Duration;

use instadiag_client::{ChatInputs, ChatRequest, DiagnosisGenerator, DifyClient, DifyConfig, GenerateError};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> DifyClient {
    DifyClient::new(DifyConfig {
        api_key: "app-test".to_string(),
        api_url: format!("{}/v1", server.uri()),
        timeout: Duration::from_millis(500),
        ..Default::default()
    })
    .expect("client should build")
}

fn request() -> ChatRequest {
    ChatRequest::blocking(
        ChatInputs { profile_context: "Username: foo".to_string(), mode: "mild".to_string() },
        "Diagnose this profile",
        "api-user",
    )
}

#[tokio::test]
async fn test_chat_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat-messages"))
        .and(header("Authorization", "Bearer app-test"))
        .and(body_partial_json(serde_json::json!({
            "inputs": {"profile_context": "Username: foo", "mode": "mild"},
            "response_mode": "blocking",
            "user": "api-user"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "answer": "Great profile!",
            "message_id": "m-1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let answer = client(&server).generate(&request()).await.expect("chat should succeed");
    assert_eq!(answer, "Great profile!");
}

#[tokio::test]
async fn test_chat_full_endpoint_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat-messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"outputs": {"result": "ok"}})))
        .expect(1)
        .mount(&server)
        .await;

    let client = DifyClient::new(DifyConfig {
        api_key: "app-test".to_string(),
        api_url: format!("{}/v1/chat-messages", server.uri()),
        ..Default::default()
    })
    .unwrap();

    assert_eq!(client.chat(&request()).await.unwrap(), "ok");
}

#[tokio::test]
async fn test_chat_empty_answer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat-messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"answer": ""})))
        .mount(&server)
        .await;

    let result = client(&server).chat(&request()).await;
    assert!(matches!(result, Err(GenerateError::EmptyAnswer)));
}

#[tokio::test]
async fn test_chat_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat-messages"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "code": "unauthorized",
            "message": "Access token is invalid"
        })))
        .mount(&server)
        .await;

    let result = client(&server).chat(&request()).await;
    assert!(matches!(result, Err(GenerateError::AuthError)));
}

#[tokio::test]
async fn test_chat_http_error_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat-messages"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "code": "invalid_param",
            "message": "profile_context is required"
        })))
        .mount(&server)
        .await;

    match client(&server).chat(&request()).await {
        Err(GenerateError::HttpError { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "profile_context is required");
        }
        other => panic!("expected HttpError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_chat_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat-messages"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"answer": "late"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let result = client(&server).chat(&request()).await;
    assert!(matches!(result, Err(GenerateError::Timeout)));
}
