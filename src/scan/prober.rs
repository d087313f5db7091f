//! Per-target probing.
//!
//! One prober drives a single target through the whole dictionary on a
//! persistent HTTP client, so TCP/TLS sessions are reused across the list.
//! Every failure inside the loop degrades to a log line and the next path;
//! the completion epilogue runs no matter what happened before it, which is
//! what keeps the task's finished counter truthful.

use std::path::Path;
use std::time::Duration;

use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT,
};
use url::Url;
use uuid::Uuid;

use super::classify::{classify, Verdict};
use super::normalize::{archive_file_name, host_tag, normalize_base_url};
use super::registry::{RegistryError, TargetState, TaskRegistry};
use super::storage;

/// Deadline for one probe request, body included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Redirect ceiling per probe; the classifier judges the final URL.
const MAX_REDIRECTS: usize = 10;

/// Fixed browser-identifying headers sent with every probe. Many servers
/// reject the default user agents of scripting tools outright, so these are
/// constant rather than configurable.
fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
        ),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9,zh-CN;q=0.8"),
    );
    headers
}

/// Per-target HTTP client. Invalid certificates are accepted on purpose:
/// forgotten backups live disproportionately on hosts with broken TLS.
fn build_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .default_headers(browser_headers())
        .danger_accept_invalid_certs(true)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
}

/// Probe one target with every dictionary entry, persisting matches under
/// `output_root`, then publish its completion.
///
/// Registry errors propagate (the task record is the one thing a worker may
/// not silently lose); everything network- or disk-side is logged into the
/// task and skipped.
pub async fn probe_target(
    registry: &TaskRegistry,
    task_id: Uuid,
    index: usize,
    target: &str,
    paths: &[String],
    output_root: &Path,
) -> Result<(), RegistryError> {
    let Some(base) = normalize_base_url(target) else {
        tracing::debug!(raw = target, "skipping blank target");
        return Ok(());
    };

    registry
        .set_target_state(task_id, index, TargetState::Scanning)
        .await?;
    registry
        .append_log(task_id, format!("===== scanning {} =====", base))
        .await?;

    match Url::parse(&base) {
        Ok(base_url) => {
            probe_paths(registry, task_id, index, &base_url, paths, output_root).await?;
        }
        Err(e) => {
            registry
                .append_log(task_id, format!("[-] unusable target url {}: {}", base, e))
                .await?;
        }
    }

    registry
        .set_target_state(task_id, index, TargetState::Done)
        .await?;
    let (finished, total) = registry.finish_target(task_id).await?;
    registry
        .append_log(
            task_id,
            format!("[*] target {} finished ({}/{})", base, finished, total),
        )
        .await?;

    Ok(())
}

async fn probe_paths(
    registry: &TaskRegistry,
    task_id: Uuid,
    index: usize,
    base_url: &Url,
    paths: &[String],
    output_root: &Path,
) -> Result<(), RegistryError> {
    let client = match build_client() {
        Ok(client) => client,
        Err(e) => {
            registry
                .append_log(task_id, format!("[-] failed to build http client: {}", e))
                .await?;
            return Ok(());
        }
    };

    let tag = host_tag(base_url);
    let mut found: u64 = 0;

    for path in paths {
        let full_url = match base_url.join(path) {
            Ok(url) => url,
            Err(e) => {
                registry
                    .append_log(task_id, format!("[-] unusable dictionary entry {}: {}", path, e))
                    .await?;
                continue;
            }
        };

        registry
            .append_log(task_id, format!("[+] trying {}", full_url))
            .await?;

        let resp = match client.get(full_url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                registry
                    .append_log(task_id, format!("[-] request error: {}", e))
                    .await?;
                continue;
            }
        };

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let declared_len = resp
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        let final_url = resp.url().clone();

        match classify(status, &content_type, declared_len, final_url.as_str()) {
            Verdict::Match => {
                let dest = output_root.join(&tag).join(archive_file_name(&final_url));
                registry
                    .append_log(task_id, format!("[!] possible backup file: {}", final_url))
                    .await?;
                registry
                    .append_log(task_id, format!("    saving to {}", dest.display()))
                    .await?;
                match storage::save_body(resp, &dest).await {
                    Ok(_) => {
                        found += 1;
                        registry.set_target_found(task_id, index, found).await?;
                    }
                    Err(e) => {
                        registry
                            .append_log(task_id, format!("[-] save failed: {:#}", e))
                            .await?;
                    }
                }
            }
            Verdict::HtmlDecoy => {
                registry
                    .append_log(
                        task_id,
                        format!("[-] looks like an html page, skipping {}", final_url),
                    )
                    .await?;
            }
            Verdict::StatusRejected | Verdict::SuffixMismatch => {
                registry
                    .append_log(task_id, format!("[-] invalid (HTTP {}): {}", status, final_url))
                    .await?;
            }
        }
    }

    Ok(())
}
