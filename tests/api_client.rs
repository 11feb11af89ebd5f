// tests/api_client.rs

mod common;
use crate::common::{TestResult, init_tracing};

use futures_util::TryStreamExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::{Duration, timeout};

use caesium_console::api::ApiClient;
use caesium_console::config::ConsoleConfig;
use caesium_console::errors::ConsoleError;
use caesium_console::events::EventFilter;
use caesium_console::logs::LogResponse;
use caesium_console::model::{Status, Trigger};

const WAIT: Duration = Duration::from_secs(5);

/// Answer exactly one HTTP request with `status` and `body`, then close.
///
/// The join handle yields the request line the client sent.
async fn serve_once(
    status: &'static str,
    content_type: &'static str,
    body: String,
) -> std::io::Result<(String, JoinHandle<std::io::Result<String>>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let base_url = format!("http://{}", listener.local_addr()?);

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await?;
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await?;
        socket.shutdown().await?;

        let head = String::from_utf8_lossy(&head).to_string();
        Ok(head.lines().next().unwrap_or_default().to_string())
    });

    Ok((base_url, handle))
}

fn client(base_url: &str) -> Result<ApiClient, ConsoleError> {
    ApiClient::new(&ConsoleConfig {
        base_url: base_url.to_string(),
        ..ConsoleConfig::default()
    })
}

#[tokio::test]
async fn get_run_decodes_the_snapshot() -> TestResult {
    init_tracing();
    let body = r#"{"id":"run-1","job_id":"job-1","status":"completed","tasks":[{"id":"a","status":"succeeded"}]}"#;
    let (base_url, server) = serve_once("200 OK", "application/json", body.to_string()).await?;

    let run = timeout(WAIT, client(&base_url)?.get_run("job-1", "run-1")).await??;
    assert_eq!(run.status, Status::Succeeded);
    assert_eq!(run.tasks[0].task_id, "a");

    let request_line = server.await??;
    assert_eq!(request_line, "GET /v1/jobs/job-1/runs/run-1 HTTP/1.1");
    Ok(())
}

#[tokio::test]
async fn job_and_run_listing_hit_their_routes() -> TestResult {
    init_tracing();
    let body = r#"{"id":"job-1","alias":"nightly","latest_run":null}"#;
    let (base_url, server) = serve_once("200 OK", "application/json", body.to_string()).await?;
    let job = timeout(WAIT, client(&base_url)?.get_job("job-1")).await??;
    assert_eq!((job.id.as_str(), job.alias.as_str()), ("job-1", "nightly"));
    assert_eq!(server.await??, "GET /v1/jobs/job-1 HTTP/1.1");

    let body = r#"[{"id":"run-2","status":"running","tasks":null},{"id":"run-1","status":"failed","error":"exit 1"}]"#;
    let (base_url, server) = serve_once("200 OK", "application/json", body.to_string()).await?;
    let runs = timeout(WAIT, client(&base_url)?.list_runs("job-1")).await??;
    let statuses: Vec<_> = runs.iter().map(|r| (r.id.as_str(), r.status)).collect();
    assert_eq!(statuses, vec![("run-2", Status::Running), ("run-1", Status::Failed)]);
    assert_eq!(runs[1].error.as_deref(), Some("exit 1"));
    assert_eq!(server.await??, "GET /v1/jobs/job-1/runs HTTP/1.1");

    let body = r#"[{"id":"t1","job_id":"job-1","atom_id":"a1","next_id":"t2"},{"id":"t2","atom_id":"a2","next_id":null}]"#;
    let (base_url, server) = serve_once("200 OK", "application/json", body.to_string()).await?;
    let tasks = timeout(WAIT, client(&base_url)?.list_tasks("job-1")).await??;
    assert_eq!(tasks[0].next_id.as_deref(), Some("t2"));
    assert_eq!(tasks[1].next_id, None);
    assert_eq!(server.await??, "GET /v1/jobs/job-1/tasks HTTP/1.1");
    Ok(())
}

#[tokio::test]
async fn atoms_triggers_and_stats_decode() -> TestResult {
    init_tracing();
    let body = r#"[{"id":"a1","engine":"docker","image":"alpine:3","command":"[\"echo\",\"hi\"]"}]"#;
    let (base_url, server) = serve_once("200 OK", "application/json", body.to_string()).await?;
    let atoms = timeout(WAIT, client(&base_url)?.list_atoms()).await??;
    assert_eq!(atoms[0].image, "alpine:3");
    assert_eq!(atoms[0].command, vec!["echo".to_string(), "hi".to_string()]);
    assert_eq!(server.await??, "GET /v1/atoms HTTP/1.1");

    let body = r#"[{"id":"tr-1","alias":"hourly","type":"cron","configuration":"{\"cron\":\"0 * * * *\"}"}]"#;
    let (base_url, server) = serve_once("200 OK", "application/json", body.to_string()).await?;
    let triggers = timeout(WAIT, client(&base_url)?.list_triggers()).await??;
    assert_eq!(triggers[0].trigger_type, "cron");
    assert_eq!(server.await??, "GET /v1/triggers HTTP/1.1");

    let body = r#"{"id":"tr-1","alias":"","type":"http","configuration":""}"#;
    let (base_url, server) = serve_once("200 OK", "application/json", body.to_string()).await?;
    let trigger: Trigger = timeout(WAIT, client(&base_url)?.get_trigger("tr-1")).await??;
    assert_eq!(trigger.configuration, None);
    assert_eq!(server.await??, "GET /v1/triggers/tr-1 HTTP/1.1");

    let body = r#"{"jobs":{"total":4,"recent_runs":12,"success_rate":0.75,"avg_duration_seconds":42.5},"top_failing":[{"job_id":"job-9","failure_count":3}]}"#;
    let (base_url, server) = serve_once("200 OK", "application/json", body.to_string()).await?;
    let stats = timeout(WAIT, client(&base_url)?.stats()).await??;
    assert_eq!(stats.jobs.total, 4);
    assert_eq!(stats.top_failing[0].failure_count, 3);
    assert!(stats.slowest_jobs.is_empty());
    assert_eq!(server.await??, "GET /v1/stats HTTP/1.1");
    Ok(())
}

#[tokio::test]
async fn error_status_becomes_api_error_with_body() -> TestResult {
    init_tracing();
    let (base_url, server) =
        serve_once("404 Not Found", "text/plain", "job not found\n".to_string()).await?;

    let err = timeout(WAIT, client(&base_url)?.get_dag("missing")).await?.unwrap_err();
    match err {
        ConsoleError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "job not found");
        }
        other => panic!("unexpected error {other}"),
    }
    server.await??;
    Ok(())
}

#[tokio::test]
async fn empty_error_body_uses_the_reason_phrase() -> TestResult {
    init_tracing();
    let (base_url, server) =
        serve_once("503 Service Unavailable", "text/plain", String::new()).await?;

    let err = timeout(WAIT, client(&base_url)?.list_jobs()).await?.unwrap_err();
    assert!(err.is_upstream());
    assert_eq!(err.detail(), "Service Unavailable");
    server.await??;
    Ok(())
}

#[tokio::test]
async fn rejected_log_request_keeps_body_text() -> TestResult {
    init_tracing();
    let (base_url, server) =
        serve_once("404 Not Found", "text/plain", "task not found".to_string()).await?;

    let response = timeout(WAIT, client(&base_url)?.open_logs("job-1", "run-1", "a")).await??;
    match response {
        LogResponse::Rejected { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "task not found");
        }
        LogResponse::Stream(_) => panic!("expected a rejection"),
    }

    let request_line = server.await??;
    assert_eq!(request_line, "GET /v1/jobs/job-1/runs/run-1/logs?task_id=a HTTP/1.1");
    Ok(())
}

#[tokio::test]
async fn event_stream_sends_filter_as_query() -> TestResult {
    init_tracing();
    let frame = "event: run_started\ndata: {\"type\":\"run_started\",\"run_id\":\"run-1\"}\n\n";
    let (base_url, server) = serve_once("200 OK", "text/event-stream", frame.to_string()).await?;

    let filter = EventFilter::for_run("job-1", "run-1");
    let stream = timeout(WAIT, client(&base_url)?.open_events(&filter)).await??;
    let chunks: Vec<Vec<u8>> = timeout(WAIT, stream.try_collect()).await??;
    assert_eq!(chunks.concat(), frame.as_bytes());

    let request_line = server.await??;
    assert!(
        request_line.starts_with("GET /v1/events?job_id=job-1&run_id=run-1&types="),
        "{request_line}"
    );
    Ok(())
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() -> TestResult {
    init_tracing();
    // Bind then drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let err = timeout(WAIT, client(&format!("http://{addr}"))?.list_jobs())
        .await?
        .unwrap_err();
    assert!(matches!(err, ConsoleError::Transport(_)), "{err}");
    Ok(())
}
