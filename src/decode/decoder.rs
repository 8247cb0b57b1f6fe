//! Raw output decoding into labeled bounding boxes.

use crate::constants::EMPTY_REPORT;
use crate::decode::{BoundingBox, ClassNameResolver, Detection};
use crate::inference::RawOutput;
use std::fmt::Write;

/// Turns raw detection tables into thresholded, labeled detections.
///
/// Every row scoring strictly above the threshold is kept. Overlapping boxes
/// are not merged.
#[derive(Debug, Clone)]
pub struct DetectionDecoder {
    threshold: f32,
    labels: ClassNameResolver,
}

/// Output of one decode pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// Detections in row order.
    pub detections: Vec<Detection>,
    /// Rows in the raw table.
    pub candidates: usize,
    /// Rows above the threshold whose box collapsed after clamping.
    pub degenerate: usize,
}

impl Decoded {
    /// Whether nothing survived decoding.
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    /// Human-readable summary of the detections.
    pub fn report(&self) -> String {
        format_report(&self.detections)
    }
}

impl DetectionDecoder {
    /// Create a decoder with the given threshold and class table.
    pub fn new(threshold: f32, labels: ClassNameResolver) -> Self {
        Self { threshold, labels }
    }

    /// Confidence threshold in use.
    pub const fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Decode a raw table against the original image dimensions.
    ///
    /// Coordinates are `[0, 1]`-normalized in the model's input space and are
    /// scaled by the *original* `width`/`height`, truncated, and clamped to
    /// the image bounds. Boxes with `x1 >= x2` or `y1 >= y2` are dropped.
    pub fn decode(&self, raw: &RawOutput, width: u32, height: u32) -> Decoded {
        let mut detections = Vec::new();
        let mut degenerate = 0;

        for row in raw.iter_rows() {
            let (cx, cy, w, h, confidence, class) = (row[0], row[1], row[2], row[3], row[4], row[5]);

            if confidence.is_nan() || confidence <= self.threshold {
                continue;
            }

            let bbox = BoundingBox {
                x1: to_pixel(cx - w / 2.0, width),
                y1: to_pixel(cy - h / 2.0, height),
                x2: to_pixel(cx + w / 2.0, width),
                y2: to_pixel(cy + h / 2.0, height),
            };

            if !bbox.is_valid() {
                degenerate += 1;
                continue;
            }

            #[allow(clippy::cast_possible_truncation)]
            let class_id = class as i64;

            detections.push(Detection {
                class_id,
                label: self.labels.resolve(class_id).to_string(),
                confidence,
                bbox,
            });
        }

        Decoded {
            detections,
            candidates: raw.rows(),
            degenerate,
        }
    }
}

/// Scale a normalized coordinate, truncate toward zero, and clamp to `[0, extent]`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn to_pixel(normalized: f32, extent: u32) -> u32 {
    let scaled = (normalized * extent as f32) as i64;
    scaled.clamp(0, i64::from(extent)) as u32
}

/// Format detections as a readable report.
pub fn format_report(detections: &[Detection]) -> String {
    if detections.is_empty() {
        return EMPTY_REPORT.to_string();
    }

    let mut text = String::from("Detection Results:\n");
    for d in detections {
        let _ = writeln!(
            text,
            "Object: {}, Bounding Box: [{}, {}, {}, {}], Confidence: {:.2}",
            d.label, d.bbox.x1, d.bbox.y1, d.bbox.x2, d.bbox.y2, d.confidence
        );
    }
    text
}
