//! Scan orchestration.
//!
//! One detached background task per scan: it fans the target list out over a
//! semaphore-bounded pool of probers, waits for every worker, and marks the
//! task done whatever the individual outcomes were. Worker failures are
//! logged into the task, never propagated, so a polling client cannot end up
//! watching a task that will never finish.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use uuid::Uuid;

use super::prober;
use super::registry::TaskRegistry;

/// Worker-pool size actually used for a task: never more workers than
/// targets, never less than one.
pub fn effective_pool_size(target_count: usize, requested: usize) -> usize {
    requested.min(target_count).max(1)
}

/// Detach the scan for `task_id` and return immediately.
pub fn spawn(registry: TaskRegistry, task_id: Uuid, output_root: PathBuf) {
    tokio::spawn(async move {
        run(registry, task_id, output_root).await;
    });
}

/// Run the scan for `task_id` to completion.
pub async fn run(registry: TaskRegistry, task_id: Uuid, output_root: PathBuf) {
    let Some(task) = registry.get(task_id).await else {
        tracing::warn!(%task_id, "scan task disappeared before start");
        return;
    };

    let targets: Vec<String> = task.targets.iter().map(|t| t.name.clone()).collect();
    let paths = Arc::new(task.paths.clone());
    let workers = effective_pool_size(targets.len(), task.max_workers);

    let _ = registry
        .append_log(
            task_id,
            format!(
                "[*] scan started: {} targets, {} dictionary entries, {} workers",
                targets.len(),
                paths.len(),
                workers
            ),
        )
        .await;
    let _ = registry
        .append_log(
            task_id,
            format!("[*] matched files will be saved under {}", output_root.display()),
        )
        .await;

    let semaphore = Arc::new(Semaphore::new(workers));
    let mut handles = Vec::with_capacity(targets.len());

    for (index, target) in targets.into_iter().enumerate() {
        let registry = registry.clone();
        let paths = Arc::clone(&paths);
        let semaphore = Arc::clone(&semaphore);
        let output_root = output_root.clone();

        handles.push(tokio::spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                // The semaphore lives as long as this pool; closure is unreachable.
                Err(_) => return Ok(()),
            };
            prober::probe_target(&registry, task_id, index, &target, &paths, &output_root).await
        }));
    }

    for handle in handles {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!(%task_id, "worker failed: {}", e);
                let _ = registry
                    .append_log(task_id, format!("[!] worker failed: {}", e))
                    .await;
            }
            Err(e) => {
                tracing::error!(%task_id, "worker panicked: {}", e);
                let _ = registry
                    .append_log(task_id, format!("[!] worker panicked: {}", e))
                    .await;
            }
        }
    }

    // Runs even when workers failed above: the done flag is the one promise
    // the polling API makes.
    let _ = registry.append_log(task_id, "[*] all targets finished.").await;
    if let Err(e) = registry.mark_done(task_id).await {
        tracing::error!(%task_id, "failed to mark scan done: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_size_is_bounded_by_targets_and_floored_at_one() {
        assert_eq!(effective_pool_size(10, 5), 5);
        assert_eq!(effective_pool_size(3, 5), 3);
        assert_eq!(effective_pool_size(3, 0), 1);
        assert_eq!(effective_pool_size(1, 50), 1);
    }
}
