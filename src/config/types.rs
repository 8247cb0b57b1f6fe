//! Configuration type definitions.

use crate::constants::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_INPUT_NAME, DEFAULT_INPUT_SIZE, dirs, geo, watcher,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory roles.
    pub paths: PathsConfig,

    /// Detection model settings.
    pub model: ModelConfig,

    /// Decoding settings.
    pub detection: DetectionConfig,

    /// Watcher and stability gate settings.
    pub watcher: WatcherConfig,

    /// Geolocation settings.
    pub geo: GeoConfig,

    /// Annotated copy settings.
    pub render: RenderConfig,
}

/// Directory roles used by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Inbox watched for new images.
    pub uploads: PathBuf,
    /// Annotated copies of processed images.
    pub processed: PathBuf,
    /// Persisted detection records.
    pub results: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            uploads: PathBuf::from(dirs::UPLOADS),
            processed: PathBuf::from(dirs::PROCESSED),
            results: PathBuf::from(dirs::RESULTS),
        }
    }
}

/// Detection model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the ONNX model file.
    pub path: Option<PathBuf>,

    /// Optional labels file (one label per line) replacing the built-in class table.
    pub labels: Option<PathBuf>,

    /// Name of the model's image input.
    pub input_name: String,

    /// Square input resolution expected by the model.
    pub input_size: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: None,
            labels: None,
            input_name: DEFAULT_INPUT_NAME.to_string(),
            input_size: DEFAULT_INPUT_SIZE,
        }
    }
}

/// Raw output decoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Detections must score strictly above this value.
    pub confidence_threshold: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

/// Watcher loop and stability gate settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Directory poll interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Readiness checks before a file is reported unavailable.
    pub stability_retries: u32,

    /// Delay between readiness checks in milliseconds.
    pub stability_delay_ms: u64,

    /// Number of files processed concurrently.
    pub workers: usize,

    /// File extensions (case-insensitive, without dot) picked up from the inbox.
    pub extensions: Vec<String>,
}

impl WatcherConfig {
    /// Poll interval as a [`Duration`].
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Stability retry delay as a [`Duration`].
    pub const fn stability_delay(&self) -> Duration {
        Duration::from_millis(self.stability_delay_ms)
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: watcher::DEFAULT_POLL_INTERVAL_MS,
            stability_retries: watcher::DEFAULT_STABILITY_RETRIES,
            stability_delay_ms: watcher::DEFAULT_STABILITY_DELAY_MS,
            workers: watcher::DEFAULT_WORKERS,
            extensions: watcher::IMAGE_EXTENSIONS
                .iter()
                .map(|ext| (*ext).to_string())
                .collect(),
        }
    }
}

/// Geolocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    /// Fall back to an IP-based lookup when an image carries no GPS tag.
    pub network_fallback: bool,

    /// Lookup service URL.
    pub lookup_url: String,

    /// Request timeout in milliseconds.
    pub timeout_ms: u64,

    /// How long a successful lookup is reused, in seconds. Zero disables caching.
    pub cache_ttl_secs: u64,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            network_fallback: true,
            lookup_url: geo::DEFAULT_LOOKUP_URL.to_string(),
            timeout_ms: geo::DEFAULT_TIMEOUT_MS,
            cache_ttl_secs: geo::DEFAULT_CACHE_TTL_SECS,
        }
    }
}

/// Annotated copy settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// TrueType font for box labels. When unset, common system fonts are
    /// tried and labels are left out if none loads.
    pub font: Option<PathBuf>,
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.detection.confidence_threshold, 0.5);
        assert_eq!(config.model.input_size, 640);
        assert_eq!(config.model.input_name, "images");
        assert_eq!(config.watcher.stability_retries, 10);
        assert_eq!(config.watcher.stability_delay(), Duration::from_secs(1));
        assert_eq!(config.watcher.poll_interval(), Duration::from_secs(5));
        assert!(config.geo.network_fallback);
        assert!(config.render.font.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
[detection]
confidence_threshold = 0.7

[watcher]
workers = 4
"#,
        )
        .unwrap_or_default();
        assert_eq!(config.detection.confidence_threshold, 0.7);
        assert_eq!(config.watcher.workers, 4);
        assert_eq!(config.watcher.stability_retries, 10);
        assert_eq!(config.paths.uploads, PathBuf::from("uploads"));
    }
}
