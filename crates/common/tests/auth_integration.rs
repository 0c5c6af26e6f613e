//! Integration tests for the auth module
//!
//! Drives the client-credentials exchange against a local wiremock server:
//! happy path, rejection, and the timeout-only retry budget.

use std::time::Duration;

use bibops_common::auth::{TokenClient, TokenClientError, TokenFetcher, TokenManager};
use bibops_domain::config::{Credential, RetrySettings};
use wiremock::matchers::{body_string_contains, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credential() -> Credential {
    Credential {
        institution_symbol: "TS268".into(),
        client_id: "client-id".into(),
        client_secret: "client-secret".into(),
    }
}

fn client(server: &MockServer, timeout: Duration, retry: RetrySettings) -> TokenClient {
    TokenClient::new(
        format!("{}/token", server.uri()),
        credential(),
        vec!["WorldCatMetadataAPI:manage_bibs".into()],
        timeout,
        retry,
    )
    .expect("token client should build")
}

/// A successful exchange sends Basic auth plus the client-credentials form
/// body and yields a token set with expiry metadata.
#[tokio::test]
async fn test_fetch_token_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(header_exists("authorization"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("scope=WorldCatMetadataAPI"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "tk_live",
            "token_type": "bearer",
            "expires_in": 1199,
            "scope": "WorldCatMetadataAPI:manage_bibs"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, Duration::from_secs(5), RetrySettings::default());
    let token = client.fetch_token().await.expect("token fetch should succeed");

    assert_eq!(token.access_token, "tk_live");
    assert_eq!(token.expires_in, 1199);
    assert!(!token.is_expired(0));
}

/// A rejection is terminal: one request, no retries, status surfaced.
#[tokio::test]
async fn test_rejected_exchange_does_not_retry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(
        &server,
        Duration::from_secs(5),
        RetrySettings { max_attempts: 5, retry_delay_secs: 0 },
    );

    match client.fetch_token().await {
        Err(TokenClientError::Rejected { status, body }) => {
            assert_eq!(status, 401);
            assert!(body.contains("invalid_client"));
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

/// Timeouts consume the whole attempt budget, then surface as TimedOut.
#[tokio::test]
async fn test_timeout_exhausts_attempt_budget() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(500))
                .set_body_string("{}"),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = client(
        &server,
        Duration::from_millis(50),
        RetrySettings { max_attempts: 2, retry_delay_secs: 0 },
    );

    match client.fetch_token().await {
        Err(TokenClientError::TimedOut { attempts }) => assert_eq!(attempts, 2),
        other => panic!("expected TimedOut, got {other:?}"),
    }
}

/// The manager commits the fetched token and replaces it on refresh.
#[tokio::test]
async fn test_token_manager_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "tk_1",
            "token_type": "bearer",
            "expires_in": 1199
        })))
        .mount(&server)
        .await;

    let manager =
        TokenManager::new(client(&server, Duration::from_secs(5), RetrySettings::default()));
    manager.initialize().await.expect("initial fetch should succeed");
    assert_eq!(manager.bearer().await.as_deref(), Some("tk_1"));
}
