use super::*;
use std::time::{Duration, UNIX_EPOCH};

use posture::{DetectionOutcome, OsInfo, PostureOutcomes};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

fn sample_report() -> SecurityReport {
    SecurityReport::from_outcomes(
        &PostureOutcomes {
            disk_encryption: DetectionOutcome::Detected("LUKS".to_string()),
            antivirus: DetectionOutcome::NotDetected,
            screen_lock: DetectionOutcome::Detected(5.0),
        },
        &OsInfo {
            name: "Linux | Ubuntu".to_string(),
            version: "24.04".to_string(),
        },
        UNIX_EPOCH,
    )
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        min_backoff: Duration::from_millis(10),
        max_backoff: Duration::from_millis(20),
        multiplier: 2,
        max_attempts: 3,
    }
}

fn client_for(base_url: &str) -> Client {
    Client::new(BackendSettings::new(base_url, "anon-key"))
        .expect("valid backend settings")
        .with_retry_policy(fast_retry())
}

/// Serves one canned response per connection and returns the raw requests.
async fn spawn_mock_backend(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind ephemeral");
    let addr = listener.local_addr().expect("local addr");
    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for (status, body) in responses {
            let (mut stream, _) = listener.accept().await.expect("accept");
            requests.push(read_request(&mut stream).await);
            let response = format!(
                "HTTP/1.1 {} Mock\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream
                .write_all(response.as_bytes())
                .await
                .expect("write response");
            let _ = stream.shutdown().await;
        }
        requests
    });
    (format!("http://{}", addr), handle)
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.expect("read request");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let content_length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[test]
fn rejects_non_http_backend_url() {
    let err = Client::new(BackendSettings::new("ftp://example.org", "anon-key"))
        .expect_err("ftp is not a backend scheme");
    assert!(err.to_string().contains("http"));

    let err = Client::new(BackendSettings::new("https://example.org", "  "))
        .expect_err("empty key");
    assert!(err.to_string().contains("API key"));
}

#[test]
fn trailing_slash_is_trimmed_from_base_url() {
    let client = client_for("https://project.example.org/");
    assert_eq!(client.base_url(), "https://project.example.org");
    assert_eq!(
        client.table_url("security_reports"),
        "https://project.example.org/rest/v1/security_reports"
    );
}

#[tokio::test]
async fn unreachable_backend_surfaces_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let client = client_for(&format!("http://{}", addr));
    let err = client
        .upsert_report("user-1", "SERIAL1", &sample_report())
        .await
        .expect_err("closed port must fail");
    assert!(err.downcast_ref::<BackendRejection>().is_none());
}

#[tokio::test]
async fn upsert_posts_keyed_row_with_merge_preference() {
    let (base_url, server) = spawn_mock_backend(vec![(201, "")]).await;
    let client = client_for(&base_url);

    client
        .upsert_report("user-1", "SERIAL1", &sample_report())
        .await
        .expect("upsert succeeds");

    let requests = server.await.expect("mock server");
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    let lowered = request.to_ascii_lowercase();
    assert!(request.starts_with(
        "POST /rest/v1/security_reports?on_conflict=user_id,device_id HTTP/1.1"
    ));
    assert!(lowered.contains("apikey: anon-key"));
    assert!(lowered.contains("authorization: bearer anon-key"));
    assert!(lowered.contains("prefer: resolution=merge-duplicates"));
    assert!(request.contains(r#""user_id":"user-1""#));
    assert!(request.contains(r#""device_id":"SERIAL1""#));
    assert!(request.contains(r#""encryption_type":"LUKS""#));
    assert!(request.contains(r#""antivirus_name":null"#));
}

#[tokio::test]
async fn upsert_retries_server_errors() {
    let (base_url, server) = spawn_mock_backend(vec![(503, "Service Unavailable"), (201, "")]).await;
    let client = client_for(&base_url);

    client
        .upsert_report("user-1", "SERIAL1", &sample_report())
        .await
        .expect("second attempt succeeds");

    assert_eq!(server.await.expect("mock server").len(), 2);
}

#[tokio::test]
async fn upsert_surfaces_client_rejection_without_retry() {
    let body = r#"{"code":"42501","details":"Row level security","hint":"Check the table policy","message":"permission denied for table security_reports"}"#;
    let (base_url, server) = spawn_mock_backend(vec![(401, body)]).await;
    let client = client_for(&base_url);

    let err = client
        .upsert_report("user-1", "SERIAL1", &sample_report())
        .await
        .expect_err("401 is final");

    let rejection = err
        .downcast_ref::<BackendRejection>()
        .expect("typed rejection");
    assert_eq!(rejection.status, 401);
    assert_eq!(rejection.message, "permission denied for table security_reports");
    assert_eq!(rejection.details.as_deref(), Some("Row level security"));
    assert_eq!(rejection.hint.as_deref(), Some("Check the table policy"));
    assert_eq!(server.await.expect("mock server").len(), 1);
}

#[tokio::test]
async fn user_lookup_reports_presence() {
    let (base_url, server) =
        spawn_mock_backend(vec![(200, r#"[{"user_id":"user-1"}]"#), (200, "[]")]).await;
    let client = client_for(&base_url);

    assert!(client.user_exists("user-1").await.expect("lookup"));
    assert!(!client.user_exists("ghost").await.expect("lookup"));

    let requests = server.await.expect("mock server");
    assert!(requests[0].starts_with(
        "GET /rest/v1/user_logs?select=user_id&user_id=eq.user-1&limit=1 HTTP/1.1"
    ));
}
