use std::{
    io::Write,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use reqwest::{Client, Url};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::{Error, Result};

/// A single fetch request: where to get the bytes and where they land.
/// Computed per call, never persisted.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub url: Url,
    pub dest_folder: PathBuf,
    pub dest_filename: String,
    pub headers: Vec<(String, String)>,
}

impl Artifact {
    pub fn dest_path(&self) -> PathBuf {
        self.dest_folder.join(&self.dest_filename)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Destination already existed; nothing was fetched.
    Skipped,
    /// Destination was newly written.
    Fetched,
}

#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, artifact: &Artifact) -> Result<FetchOutcome>;
}

/// Idempotent URL-to-file materializer. Presence of the destination file
/// is the sole dedup signal; content is never inspected.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, artifact: &Artifact) -> Result<FetchOutcome> {
        let dest = artifact.dest_path();

        if dest.exists() {
            debug!(path = %dest.display(), "Destination exists, skipping fetch");
            return Ok(FetchOutcome::Skipped);
        }

        info!(url = %artifact.url, path = %dest.display(), "Fetching artifact");

        let mut request = self.client.get(artifact.url.clone());
        for (name, value) in &artifact.headers {
            request = request.header(name, value);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(Error::Api(format!(
                "Fetch failed with status {} for {}",
                response.status(),
                artifact.url
            )));
        }

        let body = response.bytes().await?;

        tokio::fs::create_dir_all(&artifact.dest_folder).await?;
        write_atomically(&artifact.dest_folder, &dest, &body)?;

        Ok(FetchOutcome::Fetched)
    }
}

/// Write through a temp file in the destination folder, then rename onto
/// the final path. An interrupted run can leave a stray temp file but
/// never a truncated destination that would satisfy the existence check.
fn write_atomically(folder: &Path, dest: &Path, body: &[u8]) -> Result<()> {
    let mut temp_file = NamedTempFile::new_in(folder)?;
    temp_file.write_all(body)?;
    temp_file.flush()?;
    temp_file.persist(dest).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
