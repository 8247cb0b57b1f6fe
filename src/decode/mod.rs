//! Raw output decoding and class labels.

mod decoder;
mod labels;

pub use decoder::{Decoded, DetectionDecoder, format_report};
pub use labels::ClassNameResolver;

use serde::{Deserialize, Serialize};

/// Pixel-space box in the original image, `x1 < x2`, `y1 < y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x1: u32,
    /// Top edge.
    pub y1: u32,
    /// Right edge.
    pub x2: u32,
    /// Bottom edge.
    pub y2: u32,
}

impl BoundingBox {
    /// Whether the box has positive width and height.
    pub const fn is_valid(&self) -> bool {
        self.x1 < self.x2 && self.y1 < self.y2
    }
}

/// A single decoded detection.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Model class id.
    pub class_id: i64,
    /// Resolved label.
    pub label: String,
    /// Confidence, strictly above the decoder threshold.
    pub confidence: f32,
    /// Box in original image pixels.
    pub bbox: BoundingBox,
}
