//! Delivery behavior against a mock HTTP endpoint

use hookwire::{
    HmacSha256Signer, RetryPolicy, SenderConfig, SignatureOptions, WebhookDestination,
    WebhookSender, WebhookSigner,
};
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn webhook() -> hookwire::Webhook {
    hookwire::Webhook {
        id: "evt-1".to_string(),
        event_type: "order.created".to_string(),
        timestamp: chrono::Utc::now(),
        name: "orders".to_string(),
        data: serde_json::json!({"order_id": "1234", "total": 42}),
        subscription_id: "sub-1".to_string(),
        destination: String::new(),
        secret: None,
        headers: HashMap::new(),
    }
}

#[tokio::test]
async fn successful_delivery_records_one_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let sender = WebhookSender::new(SenderConfig::default());
    let destination = WebhookDestination::new(format!("{}/hook", server.uri()));

    let result = sender.send(&destination, &webhook()).await;

    assert!(result.successful());
    assert_eq!(result.attempt_count(), 1);
    let attempt = result.last_attempt().unwrap();
    assert_eq!(attempt.number, 1);
    assert_eq!(attempt.response_code, Some(200));
    assert!(!attempt.failed());
}

#[tokio::test]
async fn server_error_is_retried_up_to_the_budget() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let sender = WebhookSender::new(SenderConfig::default());
    let destination = WebhookDestination::new(server.uri())
        .with_retry_options(RetryPolicy::new(1));

    let result = sender.send(&destination, &webhook()).await;

    assert!(!result.successful());
    let attempts = result.attempts();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].number, 1);
    assert_eq!(attempts[1].number, 2);
    assert!(attempts.iter().all(|a| a.response_code == Some(500)));
}

#[tokio::test]
async fn client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let sender = WebhookSender::new(SenderConfig::default());
    let destination = WebhookDestination::new(server.uri());

    let result = sender.send(&destination, &webhook()).await;

    assert!(!result.successful());
    assert_eq!(result.attempt_count(), 1);
    assert_eq!(result.last_attempt().unwrap().response_code, Some(404));
}

#[tokio::test]
async fn request_timeout_status_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(408))
        .expect(2)
        .mount(&server)
        .await;

    let sender = WebhookSender::new(SenderConfig::default());
    let destination = WebhookDestination::new(server.uri())
        .with_retry_options(RetryPolicy::new(1));

    let result = sender.send(&destination, &webhook()).await;

    assert!(!result.successful());
    assert_eq!(result.attempt_count(), 2);
}

#[tokio::test]
async fn transport_failure_produces_exactly_retries_plus_one_attempts() {
    // Nothing listens on this port; every attempt fails at the transport level
    let sender = WebhookSender::new(SenderConfig::default());
    let destination = WebhookDestination::new("http://127.0.0.1:9/hook")
        .with_retry_options(RetryPolicy::new(1));

    let result = sender.send(&destination, &webhook()).await;

    assert!(!result.successful());
    let attempts = result.attempts();
    assert_eq!(attempts.len(), 2);
    for (index, attempt) in attempts.iter().enumerate() {
        assert_eq!(attempt.number, index as u32 + 1);
        assert!(attempt.failed());
        assert!(attempt.response_code.is_none());
        assert!(attempt.response_message.is_some());
    }
}

#[tokio::test]
async fn slow_endpoint_times_out_and_counts_as_failed_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let sender = WebhookSender::new(SenderConfig::default());
    let destination = WebhookDestination::new(server.uri()).with_retry_options(
        RetryPolicy::none().with_timeout(Duration::from_millis(100)),
    );

    let result = sender.send(&destination, &webhook()).await;

    assert!(!result.successful());
    assert_eq!(result.attempt_count(), 1);
    let attempt = result.last_attempt().unwrap();
    assert!(attempt.failed());
    assert!(attempt.response_message.unwrap().contains("timed out"));
}

#[tokio::test]
async fn cancellation_stops_delivery_and_keeps_recorded_attempts() {
    let sender = WebhookSender::new(SenderConfig::default());
    let destination = WebhookDestination::new("http://127.0.0.1:9/hook")
        .with_retry_options(RetryPolicy::new(5));

    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = sender
        .send_cancellable(&destination, &webhook(), &cancel)
        .await;

    assert!(!result.successful());
    assert_eq!(result.attempt_count(), 1);
    let attempt = result.last_attempt().unwrap();
    assert!(attempt.response_message.unwrap().contains("cancelled"));
}

#[tokio::test]
async fn signed_delivery_carries_verifiable_signature_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let sender = WebhookSender::new(SenderConfig::default());
    let destination = WebhookDestination::new(server.uri()).with_secret("whsec_test");

    let result = sender.send(&destination, &webhook()).await;
    assert!(result.successful());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);

    let header = requests[0]
        .headers
        .get("X-Webhook-Signature")
        .expect("signature header missing")
        .to_str()
        .unwrap();
    let expected = HmacSha256Signer.sign(&requests[0].body, "whsec_test");
    assert_eq!(header, format!("sha256={expected}"));
}

#[tokio::test]
async fn query_signature_is_appended_to_the_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let sender = WebhookSender::new(SenderConfig::default());
    let destination = WebhookDestination::new(format!("{}/hook", server.uri()))
        .with_secret("whsec_test")
        .with_signature_options(
            SignatureOptions::default().in_query("signature", Some("sig_alg".to_string())),
        );

    let result = sender.send(&destination, &webhook()).await;
    assert!(result.successful());

    let requests = server.received_requests().await.unwrap();
    let query: HashMap<_, _> = requests[0].url.query_pairs().into_owned().collect();
    assert_eq!(query.get("sig_alg").unwrap(), "sha256");
    let expected = HmacSha256Signer.sign(&requests[0].body, "whsec_test");
    assert_eq!(query.get("signature").unwrap(), &expected);
}

#[tokio::test]
async fn custom_headers_are_attached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let config = SenderConfig::builder()
        .header("X-Source", "hookwire")
        .header("X-Shared", "default")
        .build();
    let sender = WebhookSender::new(config);
    let destination = WebhookDestination::new(server.uri())
        .with_header("X-Delivery", "custom")
        .with_header("X-Shared", "destination");

    sender.send(&destination, &webhook()).await;

    let requests = server.received_requests().await.unwrap();
    let headers = &requests[0].headers;
    // Sender-wide defaults arrive even without going through the notifier
    assert_eq!(headers.get("X-Source").unwrap().to_str().unwrap(), "hookwire");
    // A destination header replaces a same-named default
    assert_eq!(headers.get("X-Shared").unwrap().to_str().unwrap(), "destination");
    assert_eq!(headers.get("X-Delivery").unwrap().to_str().unwrap(), "custom");
    assert_eq!(
        headers.get("Content-Type").unwrap().to_str().unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn wire_payload_round_trips() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let sender = WebhookSender::new(SenderConfig::default());
    let destination = WebhookDestination::new(server.uri());
    let sent = webhook();

    sender.send(&destination, &sent).await;

    let requests = server.received_requests().await.unwrap();
    let parsed: hookwire::Webhook = serde_json::from_slice(&requests[0].body).unwrap();

    assert_eq!(parsed.id, sent.id);
    assert_eq!(parsed.event_type, sent.event_type);
    assert_eq!(parsed.timestamp, sent.timestamp);
    assert_eq!(parsed.data, sent.data);
}
