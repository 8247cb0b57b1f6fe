//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "ecovision";

/// File name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default confidence threshold. Detections must score strictly above it.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Default square input resolution of the detection model.
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// Default name of the model's single image input.
pub const DEFAULT_INPUT_NAME: &str = "images";

/// Minimum number of columns in a raw detection row:
/// `[center_x, center_y, width, height, confidence, class_id]`.
pub const DETECTION_ROW_MIN_COLS: usize = 6;

/// Label used for class ids missing from the class table.
pub const FALLBACK_LABEL: &str = "Other Waste";

/// Report text when a pass produced no detections.
pub const EMPTY_REPORT: &str = "No objects detected.";

/// Default directory roles, relative to the working directory.
pub mod dirs {
    /// Inbox watched for new images.
    pub const UPLOADS: &str = "uploads";
    /// Annotated copies of processed images.
    pub const PROCESSED: &str = "processed_images";
    /// One JSON document per detection record.
    pub const RESULTS: &str = "detection_results";
}

/// Watcher and stability gate defaults.
pub mod watcher {
    /// Directory poll interval in milliseconds.
    pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;
    /// Number of readiness checks before a file is reported unavailable.
    pub const DEFAULT_STABILITY_RETRIES: u32 = 10;
    /// Delay between readiness checks in milliseconds.
    pub const DEFAULT_STABILITY_DELAY_MS: u64 = 1_000;
    /// Number of files processed concurrently.
    pub const DEFAULT_WORKERS: usize = 1;
    /// Image extensions picked up from the inbox.
    pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];
    /// Suffixes left behind by browsers and download tools while a file is incomplete.
    pub const PARTIAL_SUFFIXES: &[&str] = &[".crdownload", ".part", ".partial", ".download"];
}

/// Network geolocation defaults.
pub mod geo {
    /// IP-based location lookup service.
    pub const DEFAULT_LOOKUP_URL: &str = "https://ipinfo.io/json";
    /// Request timeout in milliseconds.
    pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;
    /// How long a successful network lookup is reused, in seconds.
    pub const DEFAULT_CACHE_TTL_SECS: u64 = 600;
}

/// Result store file naming.
pub mod store {
    /// Extension of persisted record documents.
    pub const RECORD_EXTENSION: &str = "json";
    /// Prefix of in-progress temporary files. Readers skip these.
    pub const TEMP_PREFIX: &str = ".tmp-";
}

/// Bounding box rendering on annotated copies.
pub mod render {
    /// Outline colour (RGB).
    pub const BOX_COLOR: [u8; 3] = [0, 255, 0];
    /// Outline thickness in pixels.
    pub const BOX_THICKNESS: u32 = 2;
    /// Label text colour (RGB), drawn on a band in the outline colour.
    pub const LABEL_TEXT_COLOR: [u8; 3] = [0, 0, 0];
    /// Label glyph height in pixels.
    pub const LABEL_SCALE: f32 = 16.0;
    /// Padding around label text in pixels.
    pub const LABEL_PADDING: u32 = 2;
    /// Fonts tried when no label font is configured.
    pub const SYSTEM_FONTS: &[&str] = &[
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ];
}
