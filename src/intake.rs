//! Parsing of submitted scan input.
//!
//! A scan submission carries two line-oriented lists (targets and dictionary
//! entries, each from a text field and/or an uploaded file) plus a worker
//! count. Targets are de-duplicated while preserving first-seen order;
//! dictionary entries are kept as-is, duplicates included, so a deliberately
//! repeated entry is probed again.

use std::collections::HashSet;

/// Dictionary used when a submission carries no entries of its own.
pub const DEFAULT_PATHS: &[&str] = &[
    "index.php.bak",
    "index.jsp.bak",
    "config.php.bak",
    "wwwroot.zip",
    "website.zip",
    "backup.zip",
    "site_backup.zip",
    "db.sql",
    "backup.sql",
];

/// Worker count used when the submission omits one or sends garbage.
pub const DEFAULT_WORKERS: usize = 5;

/// Hard upper bound on the per-task worker pool.
pub const MAX_WORKERS: usize = 50;

/// Split a target list into trimmed, non-empty lines.
pub fn parse_target_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split a dictionary into trimmed, non-empty lines with leading path
/// separators stripped, so entries join cleanly onto a base URL.
pub fn parse_dict_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim().trim_start_matches(&['/', '\\'][..]))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// De-duplicate targets, keeping the first occurrence of each.
pub fn dedup_targets(targets: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    targets
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Resolve the requested worker count.
///
/// Missing, non-numeric or non-positive input falls back to
/// [`DEFAULT_WORKERS`]; anything above [`MAX_WORKERS`] is clamped down.
pub fn resolve_worker_count(raw: Option<&str>) -> usize {
    let requested = raw
        .and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_WORKERS as i64);
    (requested as usize).min(MAX_WORKERS)
}
