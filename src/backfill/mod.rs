use std::{path::PathBuf, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::{Result, api::FrigateClient, fetch::FetchOutcome, remux::Remux};

/// Delay applied after a failed window before moving to the next one, so
/// a server that just errored is not hammered.
const FAILURE_BACKOFF: Duration = Duration::from_millis(200);

/// One hour of continuous recording, the server's native segmentation
/// granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Zero-padded `YYYY-MM` vod path segment of the window start.
    pub fn year_month(&self) -> String {
        self.start.format("%Y-%m").to_string()
    }

    /// Zero-padded day-of-month vod path segment.
    pub fn day(&self) -> String {
        self.start.format("%d").to_string()
    }

    /// Zero-padded hour vod path segment.
    pub fn hour(&self) -> String {
        self.start.format("%H").to_string()
    }

    /// Output filename, `YYYY-MM-DD.HH.ts`.
    pub fn filename(&self) -> String {
        self.start.format("%Y-%m-%d.%H.ts").to_string()
    }
}

/// Generate `from_days_ago * 24` one-hour windows in strictly increasing
/// chronological order, the first starting exactly `from_days_ago` days
/// before `now`.
pub fn windows(now: DateTime<Utc>, from_days_ago: u32) -> Vec<TimeWindow> {
    let first = now - chrono::Duration::days(i64::from(from_days_ago));

    (0..i64::from(from_days_ago) * 24)
        .map(|hour| {
            let start = first + chrono::Duration::hours(hour);
            TimeWindow {
                start,
                end: start + chrono::Duration::hours(1),
            }
        })
        .collect()
}

/// Walks hourly windows over a trailing day range and materializes each
/// one through the remuxer. Failures are isolated per window.
pub struct Backfiller {
    client: Arc<FrigateClient>,
    remuxer: Arc<dyn Remux>,
    output_dir: PathBuf,
}

impl Backfiller {
    pub fn new(client: Arc<FrigateClient>, remuxer: Arc<dyn Remux>, output_dir: PathBuf) -> Self {
        Self {
            client,
            remuxer,
            output_dir,
        }
    }

    pub async fn backfill(&self, from_days_ago: u32) -> Result<()> {
        self.backfill_from(Utc::now(), from_days_ago).await
    }

    async fn backfill_from(&self, now: DateTime<Utc>, from_days_ago: u32) -> Result<()> {
        let windows = windows(now, from_days_ago);
        info!(
            days = from_days_ago,
            windows = windows.len(),
            "Backfilling hourly recordings"
        );

        // Windows newer than this may still be appended to by the server.
        let cutoff = now - chrono::Duration::hours(1);

        for window in windows {
            if window.start >= cutoff {
                debug!(start = %window.start, "Window not fully elapsed, skipping");
                continue;
            }

            // Any per-window error, URL derivation included, is contained
            // here; the cursor still advances one hour.
            if let Err(err) = self.materialize(&window).await {
                warn!(err = ?err, start = %window.start, "Failed to fetch recording window");
                tokio::time::sleep(FAILURE_BACKOFF).await;
            }
        }

        Ok(())
    }

    async fn materialize(&self, window: &TimeWindow) -> Result<FetchOutcome> {
        let url =
            self.client
                .vod_playlist_url(&window.year_month(), &window.day(), &window.hour())?;
        let dest = self.output_dir.join("recordings").join(window.filename());

        self.remuxer.remux(&url, &dest).await
    }
}
