use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "kebab-case"))]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "kebab-case"))]
pub struct ServerConfig {
    /// Base URL of the Frigate server, e.g. `http://frigate.local:5000`.
    pub url: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Camera selector used in recording playlist paths.
    #[serde(default = "default_camera")]
    pub camera: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "kebab-case"))]
pub struct ExportConfig {
    /// Root under which events/, thumbnails/, snapshots/, clips/ and
    /// recordings/ are created.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_backfill_days")]
    pub backfill_days: u32,
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            backfill_days: default_backfill_days(),
            ffmpeg_path: default_ffmpeg_path(),
        }
    }
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_camera() -> String {
    "front".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_backfill_days() -> u32 {
    14
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

#[derive(Parser, Debug)]
pub struct Args<T: serde::de::DeserializeOwned + Clone + Send + Sync + 'static> {
    #[arg(short, long, env, value_parser = toml_from_file::<T>)]
    pub config: Option<T>,
}

impl<T: serde::de::DeserializeOwned + Clone + Send + Sync + 'static> Args<T> {
    pub fn get_config(&self) -> Result<T> {
        if let Some(config) = &self.config {
            Ok(config.clone())
        } else {
            let default_path = default_config_path();
            toml_from_file(&default_path)
        }
    }
}

pub fn default_config_path() -> String {
    if let Ok(home_dir) = std::env::var("HOME") {
        format!("{home_dir}/.frigate-export/config.toml")
    } else {
        "config.toml".to_string()
    }
}

pub fn toml_from_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T> {
    let toml = std::fs::read_to_string(path)?;
    let config_json = toml::from_str(&toml)?;
    let config = serde_json::from_value(config_json)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> crate::Result<Config> {
        let config_json: serde_json::Value = toml::from_str(toml_str)?;
        Ok(serde_json::from_value(config_json)?)
    }

    #[test]
    fn test_minimal_config_applies_defaults() {
        let config = parse(
            r#"
            [server]
            url = "http://frigate.local:5000"
            "#,
        )
        .expect("minimal config should parse");

        assert_eq!(config.server.url, "http://frigate.local:5000");
        assert_eq!(config.server.timezone, "UTC");
        assert_eq!(config.server.camera, "front");
        assert_eq!(config.export.output_dir, PathBuf::from("."));
        assert_eq!(config.export.backfill_days, 14);
        assert_eq!(config.export.ffmpeg_path, "ffmpeg");
    }

    #[test]
    fn test_full_config() {
        let config = parse(
            r#"
            [server]
            url = "http://10.0.0.2:5000"
            timezone = "Australia/Sydney"
            camera = "driveway"

            [export]
            output-dir = "/srv/frigate"
            backfill-days = 7
            ffmpeg-path = "/usr/local/bin/ffmpeg"
            "#,
        )
        .expect("full config should parse");

        assert_eq!(config.server.timezone, "Australia/Sydney");
        assert_eq!(config.server.camera, "driveway");
        assert_eq!(config.export.output_dir, PathBuf::from("/srv/frigate"));
        assert_eq!(config.export.backfill_days, 7);
        assert_eq!(config.export.ffmpeg_path, "/usr/local/bin/ffmpeg");
    }

    #[test]
    fn test_missing_server_url_is_an_error() {
        let result = parse(
            r#"
            [server]
            timezone = "UTC"
            "#,
        );

        assert!(result.is_err());
    }
}
