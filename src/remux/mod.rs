use std::{path::Path, process::Stdio};

use async_trait::async_trait;
use reqwest::Url;
use tokio::process::Command;
use tracing::{debug, info};

use crate::{Error, Result, fetch::FetchOutcome};

#[async_trait]
pub trait Remux: Send + Sync {
    /// Materialize the playlist at `url` into `dest` via an external
    /// stream-copy. No-op when `dest` already exists.
    async fn remux(&self, url: &Url, dest: &Path) -> Result<FetchOutcome>;
}

/// Invokes ffmpeg to repackage an HLS playlist into a single `.ts` file
/// without re-encoding.
pub struct FfmpegRemuxer {
    ffmpeg_path: String,
}

impl FfmpegRemuxer {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }
}

#[async_trait]
impl Remux for FfmpegRemuxer {
    async fn remux(&self, url: &Url, dest: &Path) -> Result<FetchOutcome> {
        if dest.exists() {
            debug!(path = %dest.display(), "Destination exists, skipping remux");
            return Ok(FetchOutcome::Skipped);
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        info!(url = %url, path = %dest.display(), "Remuxing recording window");

        // ffmpeg writes into a staging path; the rename below means an
        // aborted remux never leaves a partial file behind the existence
        // check.
        let staging = staging_path(dest);

        let output = Command::new(&self.ffmpeg_path)
            .arg("-nostdin")
            .args(["-loglevel", "error"])
            .arg("-i")
            .arg(url.as_str())
            .args(["-c", "copy", "-f", "mpegts"])
            .arg(&staging)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let _ = tokio::fs::remove_file(&staging).await;
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Remux(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        tokio::fs::rename(&staging, dest).await?;

        Ok(FetchOutcome::Fetched)
    }
}

fn staging_path(dest: &Path) -> std::path::PathBuf {
    let mut staging = dest.as_os_str().to_os_string();
    staging.push(".part");
    staging.into()
}
