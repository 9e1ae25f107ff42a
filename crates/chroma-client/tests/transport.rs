//! Integration coverage for `Transport`'s retry loop against a real TCP
//! connection, following the pack's preference for a minimal hand-rolled
//! fake over a heavyweight HTTP mocking crate (see DESIGN.md).

use chroma_client::auth::NoAuth;
use chroma_client::retry::{Idempotency, RetryPolicy};
use chroma_client::transport::Transport;
use reqwest::Method;
use serde::Deserialize;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Deserialize, PartialEq)]
struct Pong {
    pong: bool,
}

fn raw_response(status_line: &str, extra_headers: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status_line}\r\nconnection: close\r\n{extra_headers}content-length: {}\r\n\r\n{body}",
        body.len()
    )
}

/// Serves each of `responses` in order, one per accepted connection, then
/// stops. Returns the base URL the server is listening on.
fn spawn_fake_server(responses: Vec<String>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    std::thread::spawn(move || {
        for response in responses {
            let (mut stream, _) = listener.accept().expect("accept connection");
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            stream.write_all(response.as_bytes()).expect("write response");
        }
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn retries_after_429_then_succeeds() {
    let base = spawn_fake_server(vec![
        raw_response("429 Too Many Requests", "retry-after: 0\r\n", "{}"),
        raw_response("200 OK", "", "{\"pong\":true}"),
    ]);
    let transport = Transport::new(
        reqwest::Client::new(),
        Arc::new(NoAuth),
        RetryPolicy::new(3, Duration::ZERO, Duration::ZERO),
    );
    let url = url::Url::parse(&format!("{base}/ping")).unwrap();
    let result: Pong =
        transport.send_json::<(), Pong>(Method::GET, url, None, Idempotency::Safe).await.unwrap();
    assert_eq!(result, Pong { pong: true });
}

#[tokio::test]
async fn not_found_is_not_retried() {
    let base = spawn_fake_server(vec![raw_response("404 Not Found", "", "{\"message\":\"no such collection\"}")]);
    let transport =
        Transport::new(reqwest::Client::new(), Arc::new(NoAuth), RetryPolicy::new(3, Duration::ZERO, Duration::ZERO));
    let url = url::Url::parse(&format!("{base}/collections/missing")).unwrap();
    let err = transport.send_json::<(), Pong>(Method::GET, url, None, Idempotency::Safe).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn unsafe_idempotency_never_retries_even_a_retryable_error() {
    let base = spawn_fake_server(vec![raw_response("503 Service Unavailable", "", "{}")]);
    let transport =
        Transport::new(reqwest::Client::new(), Arc::new(NoAuth), RetryPolicy::new(5, Duration::ZERO, Duration::ZERO));
    let url = url::Url::parse(&format!("{base}/collections")).unwrap();
    let err = transport
        .send_json::<(), Pong>(Method::POST, url, Some(&()), Idempotency::Unsafe)
        .await
        .unwrap_err();
    assert!(err.is_retryable());
}
