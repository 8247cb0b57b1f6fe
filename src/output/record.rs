//! Detection records and their persisted document form.

use crate::decode::{BoundingBox, Detection};
use crate::geo::GeoPoint;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The result of one image's processing pass.
#[derive(Debug, Clone)]
pub struct DetectionRecord {
    /// Where the image arrived.
    pub source_path: PathBuf,
    /// Annotated copy written after detection.
    pub processed_path: PathBuf,
    /// Resolved location, if any.
    pub geo: Option<GeoPoint>,
    /// Wall-clock time the record was built.
    pub captured_at: DateTime<Local>,
    /// Detections in decode order.
    pub detections: Vec<Detection>,
}

/// Persisted JSON document for a [`DetectionRecord`].
///
/// A missing location is stored as `0.0, 0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDocument {
    /// Annotated copy path.
    pub image_path: String,
    /// Source path in the inbox.
    pub original_path: String,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Unix seconds.
    pub timestamp: f64,
    /// ISO-8601 capture time.
    pub datetime: String,
    /// One label per detection.
    pub detected_objects: Vec<String>,
    /// Full detections, boxes included.
    #[serde(default)]
    pub detections: Vec<DetectionEntry>,
}

/// A detection as stored in a [`RecordDocument`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionEntry {
    /// Resolved label.
    pub label: String,
    /// Model class id.
    pub class_id: i64,
    /// Confidence score.
    pub confidence: f32,
    /// Pixel box in the original image.
    pub bbox: BoundingBox,
}

impl From<&Detection> for DetectionEntry {
    fn from(d: &Detection) -> Self {
        Self {
            label: d.label.clone(),
            class_id: d.class_id,
            confidence: d.confidence,
            bbox: d.bbox,
        }
    }
}

impl DetectionRecord {
    /// Basename of the source file without its extension.
    pub fn source_stem(&self) -> String {
        self.source_path
            .file_stem()
            .map_or_else(|| "image".to_string(), |s| s.to_string_lossy().into_owned())
    }

    /// Build the persisted document.
    #[allow(clippy::cast_precision_loss)]
    pub fn to_document(&self) -> RecordDocument {
        let geo = self.geo.unwrap_or(GeoPoint {
            latitude: 0.0,
            longitude: 0.0,
        });

        RecordDocument {
            image_path: self.processed_path.to_string_lossy().into_owned(),
            original_path: self.source_path.to_string_lossy().into_owned(),
            latitude: geo.latitude,
            longitude: geo.longitude,
            timestamp: self.captured_at.timestamp_millis() as f64 / 1000.0,
            datetime: self.captured_at.to_rfc3339(),
            detected_objects: self.detections.iter().map(|d| d.label.clone()).collect(),
            detections: self.detections.iter().map(DetectionEntry::from).collect(),
        }
    }
}
