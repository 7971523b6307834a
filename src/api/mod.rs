use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result, config::ServerConfig};

/// A detected activity record as returned by the event listing. The
/// listing carries many more fields; only the id drives artifact paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
}

pub struct FrigateClient {
    client: Client,
    base_url: Url,
    timezone: String,
    camera: String,
}

impl FrigateClient {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let client = Client::new();

        let base_url = Url::parse(&config.url)
            .map_err(|e| Error::Config(format!("Invalid server URL: {e}")))?;

        Ok(FrigateClient {
            client,
            base_url,
            timezone: config.timezone.clone(),
            camera: config.camera.clone(),
        })
    }

    /// Fetch the raw event-listing body for the full current day.
    ///
    /// The body is returned verbatim so the caller can persist it as an
    /// audit record before parsing.
    pub async fn fetch_event_listing(&self) -> Result<String> {
        let url = self.events_url()?;
        debug!(url = %url, "Fetching event listing");

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(Error::Api(format!(
                "Event listing failed: {}",
                response.status()
            )));
        }

        Ok(response.text().await?)
    }

    fn events_url(&self) -> Result<Url> {
        let mut url = self.join("/api/events")?;

        url.query_pairs_mut()
            .append_pair("cameras", "all")
            .append_pair("labels", "all")
            .append_pair("zones", "all")
            .append_pair("sub_labels", "all")
            .append_pair("time_range", "00:00,24:00")
            .append_pair("timezone", &self.timezone)
            .append_pair("favorites", "0")
            .append_pair("is_submitted", "-1")
            .append_pair("in_progress", "0")
            .append_pair("include_thumbnails", "0")
            .append_pair("limit", "1000");

        Ok(url)
    }

    pub fn thumbnail_url(&self, event_id: &str) -> Result<Url> {
        self.join(&format!("/api/events/{event_id}/thumbnail.jpg"))
    }

    pub fn snapshot_url(&self, event_id: &str) -> Result<Url> {
        self.join(&format!("/api/events/{event_id}/snapshot.jpg?bbox=0"))
    }

    pub fn clip_url(&self, event_id: &str) -> Result<Url> {
        self.join(&format!("/api/events/{event_id}/clip.mp4?download=true"))
    }

    /// HLS playlist for one hour of recordings. The vod path encodes the
    /// timezone with `,` in place of `/`.
    pub fn vod_playlist_url(&self, year_month: &str, day: &str, hour: &str) -> Result<Url> {
        let timezone = self.timezone.replace('/', ",");
        self.join(&format!(
            "/vod/{year_month}/{day}/{hour}/{}/{timezone}/master.m3u8",
            self.camera
        ))
    }

    /// Header set sent with thumbnail and snapshot requests, matching what
    /// the Frigate web UI sends.
    pub fn browser_headers(&self) -> Vec<(String, String)> {
        let referer = self
            .base_url
            .join("/events")
            .map(|url| url.to_string())
            .unwrap_or_else(|_| self.base_url.to_string());

        vec![
            (
                "accept".to_string(),
                "image/avif,image/webp,image/apng,image/svg+xml,image/*,*/*;q=0.8".to_string(),
            ),
            ("accept-language".to_string(), "en-US,en;q=0.9".to_string()),
            ("cache-control".to_string(), "no-cache".to_string()),
            ("pragma".to_string(), "no-cache".to_string()),
            ("referer".to_string(), referer),
            (
                "referrer-policy".to_string(),
                "strict-origin-when-cross-origin".to_string(),
            ),
        ]
    }

    fn join(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Api(format!("Invalid URL path {path}: {e}")))
    }
}

/// Parse an event-listing body into events. Fatal to the run when it fails.
pub fn parse_events(body: &str) -> Result<Vec<Event>> {
    Ok(serde_json::from_str(body)?)
}
