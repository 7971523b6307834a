use std::{path::PathBuf, sync::Arc};

use tracing::debug;

use crate::{
    Result,
    api::{Event, FrigateClient},
    fetch::{Artifact, Fetch},
};

/// Downloads the three per-event artifacts in a fixed order: thumbnail,
/// snapshot, clip. The first failure aborts the remaining fetches for
/// that event and surfaces to the caller.
pub struct MediaDownloader {
    client: Arc<FrigateClient>,
    fetcher: Arc<dyn Fetch>,
    output_dir: PathBuf,
}

impl MediaDownloader {
    pub fn new(client: Arc<FrigateClient>, fetcher: Arc<dyn Fetch>, output_dir: PathBuf) -> Self {
        Self {
            client,
            fetcher,
            output_dir,
        }
    }

    pub async fn download_event_artifacts(&self, event: &Event) -> Result<()> {
        debug!(event_id = %event.id, "Downloading event artifacts");

        for artifact in self.artifacts(event)? {
            self.fetcher.fetch(&artifact).await?;
        }

        Ok(())
    }

    fn artifacts(&self, event: &Event) -> Result<Vec<Artifact>> {
        // Thumbnail and snapshot carry the browser-emulation headers the
        // Frigate UI sends; the clip endpoint takes none.
        let browser_headers = self.client.browser_headers();

        Ok(vec![
            Artifact {
                url: self.client.thumbnail_url(&event.id)?,
                dest_folder: self.output_dir.join("thumbnails"),
                dest_filename: format!("{}.jpg", event.id),
                headers: browser_headers.clone(),
            },
            Artifact {
                url: self.client.snapshot_url(&event.id)?,
                dest_folder: self.output_dir.join("snapshots"),
                dest_filename: format!("{}.jpg", event.id),
                headers: browser_headers,
            },
            Artifact {
                url: self.client.clip_url(&event.id)?,
                dest_folder: self.output_dir.join("clips"),
                dest_filename: format!("{}.mp4", event.id),
                headers: vec![],
            },
        ])
    }
}
