//! # bakscan
//!
//! Scanner for accidentally-exposed backup artifacts on web hosts.
//!
//! This library provides:
//! - A concurrent scan engine that probes each target host with a dictionary
//!   of candidate paths and downloads anything that classifies as a backup
//! - A shared in-memory task registry that tracks per-target progress
//! - An HTTP API for submitting scans and polling their progress
//!
//! ## Scan Flow
//! 1. Receive targets, dictionary and worker count via the API
//! 2. Create a task in the registry and detach a background scan
//! 3. A bounded worker pool probes one target per worker slot
//! 4. Matched files are streamed to disk; the client polls the task until done
//!
//! ## Modules
//! - `api`: HTTP endpoints for scan submission and progress polling
//! - `config`: environment-based server configuration
//! - `intake`: parsing of submitted target lists and dictionaries
//! - `scan`: the scan engine (normalizer, classifier, prober, registry,
//!   orchestrator)

pub mod api;
pub mod config;
pub mod intake;
pub mod scan;

pub use config::Config;
pub use scan::registry::{ScanTask, TargetState, TargetStatus, TaskRegistry};
