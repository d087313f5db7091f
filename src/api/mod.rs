//! HTTP API for bakscan.
//!
//! ## Endpoints
//!
//! - `POST /api/scans` - Submit a new scan (multipart form)
//! - `GET /api/scans/{id}` - Poll scan progress
//! - `GET /api/health` - Health check

mod routes;
pub mod types;

pub use routes::serve;
pub use types::*;
