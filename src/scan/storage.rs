//! Streaming persistence of matched response bodies.

use std::path::Path;

use anyhow::Context;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;

/// Stream a response body to `dest`, creating parent directories on demand.
///
/// An existing file at `dest` is overwritten. Returns the number of bytes
/// written.
pub async fn save_body(resp: reqwest::Response, dest: &Path) -> anyhow::Result<u64> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let mut file = tokio::fs::File::create(dest)
        .await
        .with_context(|| format!("creating {}", dest.display()))?;

    let mut written: u64 = 0;
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("reading response body")?;
        file.write_all(&chunk)
            .await
            .with_context(|| format!("writing {}", dest.display()))?;
        written += chunk.len() as u64;
    }
    file.flush()
        .await
        .with_context(|| format!("flushing {}", dest.display()))?;

    Ok(written)
}
