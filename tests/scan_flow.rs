//! End-to-end scan engine tests.
//!
//! Each test runs the orchestrator against throwaway axum origin servers on
//! ephemeral loopback ports, so the full probe/classify/persist path is
//! exercised without touching any external network.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, StatusCode};
use axum::response::Html;
use axum::routing::get;
use axum::Router;

use bakscan::scan::orchestrator;
use bakscan::scan::registry::{TargetState, TaskRegistry};

async fn spawn_origin(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn matched_backup_is_downloaded_and_counted() {
    let app = Router::new().route(
        "/site.zip",
        get(|| async {
            (
                [(header::CONTENT_TYPE, "application/octet-stream")],
                &b"PK\x03\x04fake zip payload"[..],
            )
        }),
    );
    let addr = spawn_origin(app).await;
    let output = tempfile::tempdir().unwrap();

    let registry = TaskRegistry::new();
    let task = registry
        .create(&[addr.to_string()], vec!["site.zip".into()], 5)
        .await;
    orchestrator::run(registry.clone(), task.id, output.path().to_path_buf()).await;

    let snap = registry.get(task.id).await.unwrap();
    assert!(snap.done);
    assert_eq!(snap.finished_targets, 1);
    assert_eq!(snap.targets[0].status, TargetState::Done);
    assert_eq!(snap.targets[0].found, 1);

    let saved = output
        .path()
        .join(format!("127.0.0.1_{}", addr.port()))
        .join(format!("127.0.0.1:{}_site.zip", addr.port()));
    let bytes = std::fs::read(&saved).unwrap();
    assert_eq!(&bytes, b"PK\x03\x04fake zip payload");
}

#[tokio::test]
async fn small_html_decoy_is_not_persisted() {
    let app = Router::new().route(
        "/backup.zip",
        get(|| async { Html("<html><body>pretty 404</body></html>") }),
    );
    let addr = spawn_origin(app).await;
    let output = tempfile::tempdir().unwrap();

    let registry = TaskRegistry::new();
    let task = registry
        .create(&[addr.to_string()], vec!["backup.zip".into()], 5)
        .await;
    orchestrator::run(registry.clone(), task.id, output.path().to_path_buf()).await;

    let snap = registry.get(task.id).await.unwrap();
    assert!(snap.done);
    assert_eq!(snap.targets[0].found, 0);
    assert!(snap
        .logs
        .iter()
        .any(|line| line.contains("looks like an html page")));

    let host_dir = output.path().join(format!("127.0.0.1_{}", addr.port()));
    assert!(!host_dir.exists());
}

#[tokio::test]
async fn duplicate_dictionary_entries_are_probed_twice() {
    // No routes at all: every probe answers 404.
    let addr = spawn_origin(Router::new()).await;
    let output = tempfile::tempdir().unwrap();

    let registry = TaskRegistry::new();
    let task = registry
        .create(
            &[addr.to_string()],
            vec!["db.sql".into(), "db.sql".into()],
            5,
        )
        .await;
    orchestrator::run(registry.clone(), task.id, output.path().to_path_buf()).await;

    let snap = registry.get(task.id).await.unwrap();
    let trying = format!("[+] trying http://{}/db.sql", addr);
    assert_eq!(
        snap.logs.iter().filter(|line| **line == trying).count(),
        2,
        "both duplicate entries must be probed"
    );
    assert!(snap
        .logs
        .iter()
        .any(|line| line.contains("invalid (HTTP 404)")));
    assert_eq!(snap.targets[0].found, 0);
    assert!(snap.done);
}

#[tokio::test]
async fn transport_errors_do_not_stall_the_scan() {
    // One live origin and one unroutable target; both must finish.
    let app = Router::new().route(
        "/db.sql",
        get(|| async {
            (
                [(header::CONTENT_TYPE, "application/sql")],
                "CREATE TABLE users (id INT);",
            )
        }),
    );
    let addr = spawn_origin(app).await;
    let output = tempfile::tempdir().unwrap();

    // Port 1 on loopback is a fast connection refusal.
    let dead = "127.0.0.1:1".to_string();

    let registry = TaskRegistry::new();
    let task = registry
        .create(&[dead, addr.to_string()], vec!["db.sql".into()], 2)
        .await;
    orchestrator::run(registry.clone(), task.id, output.path().to_path_buf()).await;

    let snap = registry.get(task.id).await.unwrap();
    assert!(snap.done);
    assert_eq!(snap.finished_targets, 2);
    assert!(snap.targets.iter().all(|t| t.status == TargetState::Done));
    assert_eq!(snap.targets[0].found, 0);
    assert_eq!(snap.targets[1].found, 1);
    assert!(snap.logs.iter().any(|line| line.contains("request error")));
}

#[tokio::test]
async fn worker_pool_is_bounded() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let mut targets = Vec::new();
    for _ in 0..4 {
        let in_flight = Arc::clone(&in_flight);
        let peak = Arc::clone(&peak);
        let app = Router::new().route(
            "/probe.bak",
            get(move || {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    StatusCode::NOT_FOUND
                }
            }),
        );
        targets.push(spawn_origin(app).await.to_string());
    }

    let registry = TaskRegistry::new();
    let output = tempfile::tempdir().unwrap();
    let task = registry.create(&targets, vec!["probe.bak".into()], 2).await;
    orchestrator::run(registry.clone(), task.id, output.path().to_path_buf()).await;

    let snap = registry.get(task.id).await.unwrap();
    assert!(snap.done);
    assert_eq!(snap.finished_targets, 4);
    let done_targets = snap
        .targets
        .iter()
        .filter(|t| t.status == TargetState::Done)
        .count();
    assert_eq!(done_targets, snap.finished_targets);

    let peak = peak.load(Ordering::SeqCst);
    assert!(peak >= 1);
    assert!(peak <= 2, "pool ran {} probes at once with 2 workers", peak);
}
