//! API response types.

use serde::Serialize;
use uuid::Uuid;

use crate::scan::registry::TargetStatus;

/// Response after submitting a scan.
#[derive(Debug, Clone, Serialize)]
pub struct CreateScanResponse {
    /// Identifier to poll progress with
    pub task_id: Uuid,
}

/// Progress snapshot for one scan task.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressResponse {
    /// Whether the scan has finished
    pub done: bool,

    /// Scan log accumulated so far; append-only, so earlier reads stay
    /// valid prefixes of later ones
    pub logs: Vec<String>,

    /// Per-target progress in submission order
    pub targets: Vec<TargetStatus>,

    /// Total number of targets
    pub total_targets: usize,

    /// Number of targets finished so far
    pub finished_targets: usize,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}
