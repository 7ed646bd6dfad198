//! URL registration end to end: real token provider, mocked Daraja

use mpesa_feedback::payments::providers::{MpesaConfig, MpesaTokenProvider, UrlRegistrar};
use mpesa_feedback::payments::types::RegistrationOutcome;
use mpesa_feedback::payments::PaymentError;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(base_url: &str) -> MpesaConfig {
    MpesaConfig {
        consumer_key: Some("key".to_string()),
        consumer_secret: Some("secret".to_string()),
        shortcode: Some("600000".to_string()),
        confirmation_url: Some("https://example.com/payments-confirmation".to_string()),
        validation_url: Some("https://example.com/payments-validation".to_string()),
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
    }
}

fn registrar(base_url: &str) -> UrlRegistrar {
    let config = config(base_url);
    let tokens = Arc::new(MpesaTokenProvider::new(config.clone()).unwrap());
    UrlRegistrar::new(config, tokens).unwrap()
}

async fn mount_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/oauth/v2/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "expires_in": "3599"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn successful_registration_returns_provider_body() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/mpesa/c2b/v2/registerurl"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "OriginatorCoversationID": "7619-37765134-1",
            "ResponseCode": "0",
            "ResponseDescription": "success"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = registrar(&server.uri()).register().await.unwrap();

    match outcome {
        RegistrationOutcome::Registered(body) => assert_eq!(body["ResponseCode"], "0"),
        other => panic!("expected fresh registration, got {:?}", other),
    }
}

#[tokio::test]
async fn already_registered_is_success() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    let envelope = json!({
        "requestId": "11728-2929992-1",
        "errorCode": "500.003.1001",
        "errorMessage": "URLs are already registered"
    });
    Mock::given(method("POST"))
        .and(path("/mpesa/c2b/v2/registerurl"))
        .respond_with(ResponseTemplate::new(500).set_body_json(envelope.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = registrar(&server.uri()).register().await.unwrap();

    assert!(outcome.is_already_registered());
    let summary = outcome.to_json();
    assert_eq!(summary["status"], "success");
    assert_eq!(summary["message"], "URLs are already registered");
    assert_eq!(summary["responseData"], envelope);
}

#[tokio::test]
async fn second_unauthorized_fails_after_exactly_one_retry() {
    let server = MockServer::start().await;
    mount_token(&server, 2).await;
    Mock::given(method("POST"))
        .and(path("/mpesa/c2b/v2/registerurl"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "errorCode": "404.001.03",
            "errorMessage": "Invalid Access Token"
        })))
        .expect(2)
        .mount(&server)
        .await;

    match registrar(&server.uri()).register().await {
        Err(PaymentError::RegistrationError { status, body, .. }) => {
            assert_eq!(status, Some(401));
            assert!(body.unwrap_or_default().contains("Invalid Access Token"));
        }
        other => panic!("expected registration error, got {:?}", other),
    }
}

#[tokio::test]
async fn other_server_errors_are_not_retried() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/mpesa/c2b/v2/registerurl"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "errorCode": "500.003.02",
            "errorMessage": "System is busy"
        })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(matches!(
        registrar(&server.uri()).register().await,
        Err(PaymentError::RegistrationError {
            status: Some(500),
            ..
        })
    ));
}

#[tokio::test]
async fn token_failure_stops_before_registration() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oauth/v2/generate"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Invalid Credentials"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert!(matches!(
        registrar(&server.uri()).register().await,
        Err(PaymentError::AuthenticationError { .. })
    ));
}
