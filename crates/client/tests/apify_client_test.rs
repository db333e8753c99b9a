//! Wiremock integration tests for ApifyClient.

use std::time::Duration;

use instadiag_client::{ApifyClient, ApifyConfig, ProfileScraper, ScrapeError};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RUN_PATH: &str = "/acts/apify~instagram-profile-scraper/run-sync-get-dataset-items";

fn client(server: &MockServer) -> ApifyClient {
    ApifyClient::new(ApifyConfig {
        token: "test_token".to_string(),
        base_url: server.uri(),
        timeout: Duration::from_millis(500),
        ..Default::default()
    })
    .expect("client should build")
}

fn usernames(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_scrape_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUN_PATH))
        .and(header("Authorization", "Bearer test_token"))
        .and(body_json(serde_json::json!({"usernames": ["foo", "rival"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"username": "foo", "biography": "hi", "followersCount": 100},
            [{"username": "rival", "fullName": "The Rival"}]
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let records = client(&server)
        .fetch_profiles(&usernames(&["foo", "rival"]))
        .await
        .expect("scrape should succeed");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].username.as_deref(), Some("foo"));
    assert_eq!(records[0].followers_count, Some(100));
    assert_eq!(records[1].full_name.as_deref(), Some("The Rival"));
}

#[tokio::test]
async fn test_scrape_keeps_target_when_competitor_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"username": "foo", "followersCount": 100},
            {"username": "rival", "followersCount": 1.5}
        ])))
        .mount(&server)
        .await;

    let records = client(&server)
        .scrape(&usernames(&["foo", "rival"]))
        .await
        .expect("one bad item should not fail the run");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].username.as_deref(), Some("foo"));
    assert_eq!(records[0].followers_count, Some(100));
}

#[tokio::test]
async fn test_scrape_error_records_pass_through() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"username": "foo", "error": "not_found", "errorDescription": "This account is private"}
        ])))
        .mount(&server)
        .await;

    let records = client(&server).scrape(&usernames(&["foo"])).await.unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].is_error());
    assert_eq!(records[0].error_text(), Some("This account is private"));
}

#[tokio::test]
async fn test_scrape_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUN_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client(&server).scrape(&usernames(&["foo"])).await;
    assert!(matches!(result, Err(ScrapeError::AuthError)));
}

#[tokio::test]
async fn test_scrape_http_error_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {"type": "invalid-input", "message": "Input is not valid"}
        })))
        .mount(&server)
        .await;

    match client(&server).scrape(&usernames(&["foo"])).await {
        Err(ScrapeError::HttpError { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "Input is not valid");
        }
        other => panic!("expected HttpError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_scrape_run_timeout_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUN_PATH))
        .respond_with(ResponseTemplate::new(408))
        .mount(&server)
        .await;

    let result = client(&server).scrape(&usernames(&["foo"])).await;
    assert!(matches!(result, Err(ScrapeError::Timeout)));
}

#[tokio::test]
async fn test_scrape_client_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let result = client(&server).scrape(&usernames(&["foo"])).await;
    assert!(matches!(result, Err(ScrapeError::Timeout)));
}

#[tokio::test]
async fn test_scrape_malformed_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client(&server).scrape(&usernames(&["foo"])).await;
    assert!(matches!(result, Err(ScrapeError::Parse(_))));
}

#[tokio::test]
async fn test_scrape_non_array_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"username": "foo"})))
        .mount(&server)
        .await;

    let result = client(&server).scrape(&usernames(&["foo"])).await;
    assert!(matches!(result, Err(ScrapeError::Parse(_))));
}
