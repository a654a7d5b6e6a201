use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use paystream_net::{Headers, HttpClient, Net, NetError, NetExt, NetOptions, RetryPolicy};
use paystream_test_utils::TestHttpServer;
use rstest::*;

async fn payment_required() -> impl IntoResponse {
    (
        StatusCode::PAYMENT_REQUIRED,
        [("X-Payment-Required", "terms")],
        "pay first",
    )
}

async fn echo_payment(headers: axum::http::HeaderMap) -> String {
    headers
        .get("x-payment")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none")
        .to_string()
}

async fn flaky(State(hits): State<Arc<AtomicUsize>>) -> impl IntoResponse {
    if hits.fetch_add(1, Ordering::SeqCst) < 2 {
        (StatusCode::SERVICE_UNAVAILABLE, "busy").into_response()
    } else {
        "ok".into_response()
    }
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_millis(500)).await;
    "late"
}

async fn server(hits: Arc<AtomicUsize>) -> TestHttpServer {
    let router = Router::new()
        .route("/paid", get(payment_required))
        .route("/echo", get(echo_payment))
        .route("/flaky", get(flaky))
        .route("/slow", get(slow))
        .with_state(hits);
    TestHttpServer::new(router).await
}

#[fixture]
fn client() -> HttpClient {
    HttpClient::new(NetOptions::default()).unwrap()
}

#[rstest]
#[tokio::test]
async fn payment_required_is_returned_untouched(client: HttpClient) {
    let server = server(Arc::default()).await;

    let resp = client.get(server.url("paid"), None).await.unwrap();

    assert_eq!(resp.status, 402);
    assert!(resp.is_payment_required());
    assert_eq!(resp.header("X-Payment-Required"), Some("terms"));
    assert_eq!(resp.body.as_ref(), b"pay first");
}

#[rstest]
#[tokio::test]
async fn request_headers_are_sent(client: HttpClient) {
    let server = server(Arc::default()).await;
    let mut headers = Headers::new();
    headers.insert("X-Payment", "signed");

    let resp = client.get(server.url("echo"), Some(headers)).await.unwrap();

    assert_eq!(resp.body.as_ref(), b"signed");
}

#[rstest]
#[tokio::test]
async fn error_for_status_reports_code(client: HttpClient) {
    let server = server(Arc::default()).await;

    let err = client
        .get(server.url("paid"), None)
        .await
        .unwrap()
        .error_for_status()
        .unwrap_err();

    assert_eq!(err.status_code(), Some(402));
    assert!(!err.is_retryable());
}

#[rstest]
#[tokio::test]
async fn retry_layer_rides_out_unavailable(client: HttpClient) {
    let hits = Arc::new(AtomicUsize::new(0));
    let server = server(Arc::clone(&hits)).await;
    let net = client.with_retry(RetryPolicy::new(
        3,
        Duration::from_millis(5),
        Duration::from_millis(20),
    ));

    let resp = net.get(server.url("flaky"), None).await.unwrap();

    assert!(resp.is_success());
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[rstest]
#[tokio::test]
async fn timeout_layer_cuts_slow_response(client: HttpClient) {
    let server = server(Arc::default()).await;
    let net = client.with_timeout(Duration::from_millis(50));

    let err = net.get(server.url("slow"), None).await.unwrap_err();

    assert!(err.is_timeout());
    assert!(matches!(err, NetError::Timeout));
}
