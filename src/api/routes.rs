//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::Config;
use crate::intake;
use crate::scan::orchestrator;
use crate::scan::registry::TaskRegistry;

use super::types::*;

/// JSON error body, so callers always get structured errors rather than a
/// framework error page.
type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Process-wide scan task table
    pub registry: TaskRegistry,
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let state = Arc::new(AppState {
        registry: TaskRegistry::new(),
        config: config.clone(),
    });

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/scans", post(create_scan))
        .route("/api/scans/:id", get(scan_progress))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::clone(&state));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for SIGTERM/SIGINT. Running scans are detached tasks and simply die
/// with the process; their in-memory state is not meant to survive it.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Submit a new scan.
///
/// Multipart fields: `targets_text`, `targets_file`, `dict_text`,
/// `dict_file`, `threads`. Targets from text and file are merged and
/// de-duplicated; dictionary entries are merged as-is, falling back to the
/// built-in dictionary when both sources are empty.
async fn create_scan(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<CreateScanResponse>, ApiError> {
    let mut targets_text = String::new();
    let mut targets_file = String::new();
    let mut dict_text = String::new();
    let mut dict_file = String::new();
    let mut threads_raw: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, format!("unreadable form data: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "targets_text" => {
                targets_text = field.text().await.map_err(|e| {
                    api_error(StatusCode::BAD_REQUEST, format!("unreadable target list: {}", e))
                })?;
            }
            "targets_file" => {
                let bytes = field.bytes().await.map_err(|e| {
                    api_error(StatusCode::BAD_REQUEST, format!("unreadable target file: {}", e))
                })?;
                // Uploaded lists may be in arbitrary encodings; keep what decodes.
                targets_file = String::from_utf8_lossy(&bytes).into_owned();
            }
            "dict_text" => {
                dict_text = field.text().await.map_err(|e| {
                    api_error(StatusCode::BAD_REQUEST, format!("unreadable dictionary: {}", e))
                })?;
            }
            "dict_file" => {
                let bytes = field.bytes().await.map_err(|e| {
                    api_error(StatusCode::BAD_REQUEST, format!("unreadable dictionary file: {}", e))
                })?;
                dict_file = String::from_utf8_lossy(&bytes).into_owned();
            }
            "threads" => {
                threads_raw = Some(field.text().await.map_err(|e| {
                    api_error(StatusCode::BAD_REQUEST, format!("unreadable thread count: {}", e))
                })?);
            }
            _ => {}
        }
    }

    let mut targets = intake::parse_target_lines(&targets_text);
    targets.extend(intake::parse_target_lines(&targets_file));
    let targets = intake::dedup_targets(targets);
    if targets.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "no valid targets: provide a target list or upload one",
        ));
    }

    let mut paths = intake::parse_dict_lines(&dict_text);
    paths.extend(intake::parse_dict_lines(&dict_file));
    if paths.is_empty() {
        paths = intake::DEFAULT_PATHS.iter().map(|s| s.to_string()).collect();
    }

    let workers = intake::resolve_worker_count(threads_raw.as_deref());

    let task = state.registry.create(&targets, paths, workers).await;
    orchestrator::spawn(
        state.registry.clone(),
        task.id,
        state.config.output_dir.clone(),
    );

    tracing::info!(
        task_id = %task.id,
        targets = task.total_targets,
        workers,
        "scan task created"
    );

    Ok(Json(CreateScanResponse { task_id: task.id }))
}

/// Poll scan progress.
///
/// Unknown and unparsable ids both report not-found; the caller cannot tell
/// a mistyped id from a task this process never had.
async fn scan_progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let task = match Uuid::parse_str(&id) {
        Ok(task_id) => state.registry.get(task_id).await,
        Err(_) => None,
    };

    let Some(task) = task else {
        return Err(api_error(
            StatusCode::NOT_FOUND,
            format!("scan task {} not found", id),
        ));
    };

    Ok(Json(ProgressResponse {
        done: task.done,
        logs: task.logs,
        targets: task.targets,
        total_targets: task.total_targets,
        finished_targets: task.finished_targets,
    }))
}
