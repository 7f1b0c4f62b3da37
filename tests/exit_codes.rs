//! End-to-end checks of the `subgraph-probe` binary's exit codes
//!
//! Each test runs the compiled binary with a controlled environment and,
//! where needed, a stub graph node served by axum.

use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use std::process::Output;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::process::Command;

const READY_BODY: &str = r#"{"data":{"_meta":{"block":{"number":100}}}}"#;
const ERRORS_BODY: &str = r#"{"errors":[{"message":"Subgraph not found"}]}"#;

const PROBE_VARS: [&str; 4] = [
    "GRAPH_NODE_GRAPHQL_PORT",
    "DEPLOYMENT_NAME",
    "GRAPH_NODE_GRAPHQL_HOST",
    "SUBGRAPH_PROBE_TIMEOUT_SECS",
];

/// Run the binary with only the given probe variables set
async fn run_probe(vars: &[(&str, String)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_subgraph-probe"));
    for var in PROBE_VARS {
        cmd.env_remove(var);
    }
    cmd.env("RUST_LOG", "info");
    for (key, value) in vars {
        cmd.env(key, value);
    }
    cmd.output().await.expect("failed to run subgraph-probe")
}

/// Stub graph node answering every deployment with `body`; counts requests
async fn start_graph_node(status: StatusCode, body: &'static str) -> (u16, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    let app = Router::new().route(
        "/subgraphs/name/{name}",
        post(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (status, body)
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let port = listener.local_addr().expect("stub address").port();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (port, hits)
}

async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("address").port();
    drop(listener);
    port
}

#[tokio::test]
async fn test_ready_subgraph_exits_zero() {
    let (port, hits) = start_graph_node(StatusCode::OK, READY_BODY).await;

    let output = run_probe(&[
        ("GRAPH_NODE_GRAPHQL_PORT", port.to_string()),
        ("DEPLOYMENT_NAME", "my-subgraph".to_string()),
    ])
    .await;

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(output.stdout.is_empty(), "probe must not write to stdout");
}

#[tokio::test]
async fn test_errors_without_data_exit_one() {
    let (port, _) = start_graph_node(StatusCode::OK, ERRORS_BODY).await;

    let output = run_probe(&[
        ("GRAPH_NODE_GRAPHQL_PORT", port.to_string()),
        ("DEPLOYMENT_NAME", "my-subgraph".to_string()),
        ("GRAPH_NODE_GRAPHQL_HOST", "127.0.0.1".to_string()),
    ])
    .await;

    assert_eq!(output.status.code(), Some(1));
}

#[tokio::test]
async fn test_nothing_listening_exits_one() {
    let port = closed_port().await;

    let output = run_probe(&[
        ("GRAPH_NODE_GRAPHQL_PORT", port.to_string()),
        ("DEPLOYMENT_NAME", "my-subgraph".to_string()),
        ("GRAPH_NODE_GRAPHQL_HOST", "127.0.0.1".to_string()),
    ])
    .await;

    assert_eq!(output.status.code(), Some(1));
}

#[tokio::test]
async fn test_unknown_deployment_path_exits_one() {
    let (port, hits) = start_graph_node(StatusCode::OK, READY_BODY).await;

    // Nested name misses the stub's single-segment route, so axum answers 404
    let output = run_probe(&[
        ("GRAPH_NODE_GRAPHQL_PORT", port.to_string()),
        ("DEPLOYMENT_NAME", "org/my-subgraph".to_string()),
        ("GRAPH_NODE_GRAPHQL_HOST", "127.0.0.1".to_string()),
    ])
    .await;

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_port_is_config_error() {
    let output = run_probe(&[("DEPLOYMENT_NAME", "my-subgraph".to_string())]).await;

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("GRAPH_NODE_GRAPHQL_PORT"),
        "stderr should name the missing variable: {}",
        stderr
    );
}

#[tokio::test]
async fn test_non_numeric_port_is_config_error() {
    let output = run_probe(&[
        ("GRAPH_NODE_GRAPHQL_PORT", "http".to_string()),
        ("DEPLOYMENT_NAME", "my-subgraph".to_string()),
    ])
    .await;

    assert_eq!(output.status.code(), Some(2));
}

#[tokio::test]
async fn test_missing_deployment_name_is_config_error() {
    let output = run_probe(&[("GRAPH_NODE_GRAPHQL_PORT", "8000".to_string())]).await;

    assert_eq!(output.status.code(), Some(2));
}
