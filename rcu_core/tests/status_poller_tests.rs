use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rcu_core::poller::status_poller::StatusPoller;
use rcu_core::types::types::TransferError;

fn poller_for(server: &MockServer, token: CancellationToken) -> StatusPoller {
    StatusPoller::new(
        Arc::new(reqwest::Client::new()),
        server.uri(),
        Duration::from_millis(10),
        token,
    )
}

const STATUS_PATH: &str = "/process-status/acme/report.csv";

#[tokio::test]
async fn test_poller_completes_on_sentinel() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "Completed!",
            "progress": 0.4,
            "downloadUrl": "http://example.invalid/out.csv",
        })))
        .mount(&server)
        .await;

    let poller = poller_for(&server, CancellationToken::new());
    let report = poller
        .poll_until_terminal("acme", "report.csv", |_, _| {})
        .await
        .unwrap();

    // The sentinel alone is terminal, even with progress far below 1.0.
    assert_eq!(report.download_url.as_deref(), Some("http://example.invalid/out.csv"));
}

#[tokio::test]
async fn test_poller_completes_on_numeric_threshold() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "Processing", "progress": 1.0 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let poller = poller_for(&server, CancellationToken::new());
    let report = poller
        .poll_until_terminal("acme", "report.csv", |_, _| {})
        .await
        .unwrap();

    assert!(report.progress >= 1.0);
}

#[tokio::test]
async fn test_poller_fails_on_error_sentinel() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "Error", "error": "corrupt input" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let poller = poller_for(&server, CancellationToken::new());
    let result = poller
        .poll_until_terminal("acme", "report.csv", |_, _| {})
        .await;

    match result {
        Err(TransferError::ProcessingFailed(message)) => assert_eq!(message, "corrupt input"),
        other => panic!("expected ProcessingFailed, got {:?}", other.map(|r| r.status)),
    }
}

#[tokio::test]
async fn test_poller_emits_a_sample_per_running_tick() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "Translating", "progress": 0.25 })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "Translating", "progress": 0.5 })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "Completed!", "progress": 1.0 })),
        )
        .mount(&server)
        .await;

    let samples: Arc<Mutex<Vec<(f64, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&samples);

    let poller = poller_for(&server, CancellationToken::new());
    poller
        .poll_until_terminal("acme", "report.csv", move |fraction, label| {
            sink.lock().unwrap().push((fraction, label.to_string()));
        })
        .await
        .unwrap();

    let samples = samples.lock().unwrap();
    assert_eq!(samples.len(), 2, "one sample per non-terminal tick");
    assert_eq!(samples[0], (0.25, "Translating".to_string()));
    assert_eq!(samples[1], (0.5, "Translating".to_string()));
}

#[tokio::test]
async fn test_poller_unreachable_endpoint_fails() {
    let token = CancellationToken::new();
    let poller = StatusPoller::new(
        Arc::new(reqwest::Client::new()),
        "http://127.0.0.1:1",
        Duration::from_millis(10),
        token,
    );

    let result = poller
        .poll_until_terminal("acme", "report.csv", |_, _| {})
        .await;
    assert!(matches!(result, Err(TransferError::PollUnreachable(_))));
}

#[tokio::test]
async fn test_poller_non_2xx_fails_without_retry_by_default() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let poller = poller_for(&server, CancellationToken::new());
    let result = poller
        .poll_until_terminal("acme", "report.csv", |_, _| {})
        .await;

    assert!(matches!(result, Err(TransferError::PollUnreachable(_))));
}

#[tokio::test]
async fn test_poller_transient_retries_recover() {
    let server = MockServer::start().await;

    // Two bad ticks, then a clean terminal answer.
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "Completed!", "progress": 1.0 })),
        )
        .mount(&server)
        .await;

    let poller = poller_for(&server, CancellationToken::new()).with_transient_retries(2);
    let report = poller
        .poll_until_terminal("acme", "report.csv", |_, _| {})
        .await
        .unwrap();

    assert!(report.is_terminal_success());
}

#[tokio::test]
async fn test_poller_transient_retries_exhausted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let poller = poller_for(&server, CancellationToken::new()).with_transient_retries(1);
    let result = poller
        .poll_until_terminal("acme", "report.csv", |_, _| {})
        .await;

    assert!(matches!(result, Err(TransferError::PollUnreachable(_))));
}

#[tokio::test]
async fn test_poller_max_attempts_bound() {
    let server = MockServer::start().await;

    // A stuck server that reports the same running status forever.
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "Processing", "progress": 0.1 })),
        )
        .expect(3)
        .mount(&server)
        .await;

    let poller = poller_for(&server, CancellationToken::new()).with_max_attempts(Some(3));
    let result = poller
        .poll_until_terminal("acme", "report.csv", |_, _| {})
        .await;

    assert!(matches!(result, Err(TransferError::PollBudgetExceeded(3))));
}

#[tokio::test]
async fn test_poller_pre_cancelled_token_never_queries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "Processing", "progress": 0.1 })),
        )
        .expect(0)
        .mount(&server)
        .await;

    let token = CancellationToken::new();
    token.cancel();

    let poller = poller_for(&server, token);
    let result = poller
        .poll_until_terminal("acme", "report.csv", |_, _| {})
        .await;

    assert!(matches!(result, Err(TransferError::Cancelled)));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_poller_cancel_schedules_no_further_ticks() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "Processing", "progress": 0.1 })),
        )
        .mount(&server)
        .await;

    let token = CancellationToken::new();
    let poller = poller_for(&server, token.clone());

    let join = tokio::spawn(async move {
        poller
            .poll_until_terminal("acme", "report.csv", |_, _| {})
            .await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    token.cancel();

    let result = join.await.unwrap();
    assert!(matches!(result, Err(TransferError::Cancelled)));

    let requests_after_cancel = server.received_requests().await.unwrap().len();
    assert!(requests_after_cancel > 0, "poller should have run before cancel");
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        server.received_requests().await.unwrap().len(),
        requests_after_cancel,
        "a tick was scheduled after cancellation"
    );
}
