use std::{path::PathBuf, sync::Arc};

use chrono::Utc;
use tracing::{info, warn};

use crate::{
    Result,
    api::{self, FrigateClient},
    backfill::Backfiller,
    config::Config,
    fetch::HttpFetcher,
    media::MediaDownloader,
    remux::FfmpegRemuxer,
};

/// Single-pass orchestrator: event listing, per-event media download,
/// recording backfill. No internal scheduling loop; cron drives repeats.
pub struct Exporter {
    client: Arc<FrigateClient>,
    media: MediaDownloader,
    backfiller: Backfiller,
    output_dir: PathBuf,
    backfill_days: u32,
}

impl Exporter {
    pub fn new(config: Config) -> Result<Self> {
        let client = Arc::new(FrigateClient::new(&config.server)?);
        let output_dir = config.export.output_dir.clone();

        let fetcher = Arc::new(HttpFetcher::new());
        let media = MediaDownloader::new(client.clone(), fetcher, output_dir.clone());

        let remuxer = Arc::new(FfmpegRemuxer::new(config.export.ffmpeg_path.clone()));
        let backfiller = Backfiller::new(client.clone(), remuxer, output_dir.clone());

        Ok(Self {
            client,
            media,
            backfiller,
            output_dir,
            backfill_days: config.export.backfill_days,
        })
    }

    /// Run one export pass. Listing and audit-write failures are fatal;
    /// per-event and backfill-stage failures are logged and contained.
    pub async fn run(&self) -> Result<()> {
        let body = self.client.fetch_event_listing().await?;
        self.write_audit_record(&body).await?;

        let events = api::parse_events(&body)?;
        info!(count = events.len(), "Events listed");

        for event in &events {
            if let Err(err) = self.media.download_event_artifacts(event).await {
                warn!(err = ?err, event_id = %event.id, "Failed to download event artifacts");
            }
        }

        if let Err(err) = self.backfiller.backfill(self.backfill_days).await {
            warn!(err = ?err, "Recording backfill stage failed");
        }

        Ok(())
    }

    /// Persist the raw listing body under a timestamp-keyed audit path,
    /// before any parsing so malformed responses are still captured.
    async fn write_audit_record(&self, body: &str) -> Result<()> {
        let folder = self.output_dir.join("events");
        tokio::fs::create_dir_all(&folder).await?;

        let path = folder.join(format!("{}.json", Utc::now().timestamp_millis()));
        tokio::fs::write(&path, body).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExportConfig, ServerConfig};

    fn exporter(output_dir: PathBuf) -> Exporter {
        Exporter::new(Config {
            server: ServerConfig {
                url: "http://frigate.local:5000".to_string(),
                timezone: "UTC".to_string(),
                camera: "front".to_string(),
            },
            export: ExportConfig {
                output_dir,
                ..ExportConfig::default()
            },
        })
        .expect("valid config")
    }

    #[tokio::test]
    async fn test_audit_record_lands_under_events() {
        let dir = tempfile::tempdir().expect("tempdir");
        let exporter = exporter(dir.path().to_path_buf());

        exporter
            .write_audit_record(r#"[{"id": "ev1"}]"#)
            .await
            .expect("audit write");

        let entries: Vec<_> = std::fs::read_dir(dir.path().join("events"))
            .expect("events folder created")
            .collect::<std::io::Result<_>>()
            .expect("readable");

        assert_eq!(entries.len(), 1);
        let name = entries[0].file_name();
        let name = name.to_string_lossy();
        assert!(name.ends_with(".json"));
        assert!(
            name.trim_end_matches(".json").parse::<i64>().is_ok(),
            "audit filename is a unix-millis timestamp: {name}"
        );

        let body = std::fs::read_to_string(entries[0].path()).expect("readable body");
        assert_eq!(body, r#"[{"id": "ev1"}]"#);
    }

    #[test]
    fn test_exporter_rejects_invalid_server_url() {
        let result = Exporter::new(Config {
            server: ServerConfig {
                url: "::not-a-url::".to_string(),
                timezone: "UTC".to_string(),
                camera: "front".to_string(),
            },
            export: ExportConfig::default(),
        });

        assert!(result.is_err());
    }
}
