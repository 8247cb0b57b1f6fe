//! Image normalization and guarded engine invocation.

use crate::inference::{DetectionEngine, InputTensor, RawOutput};
use image::DynamicImage;
use image::imageops::{self, FilterType};
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of one engine invocation.
///
/// Failures are recoverable: the pipeline still persists a record, with no
/// detections, so "processed, nothing found" stays distinguishable from
/// "never processed".
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceOutcome {
    /// The engine's raw output, unmodified.
    Output(RawOutput),
    /// The engine raised or returned something unusable.
    Failed {
        /// Why the invocation failed.
        reason: String,
    },
}

impl InferenceOutcome {
    /// The raw output, or an empty table when inference failed.
    pub fn into_output(self) -> RawOutput {
        match self {
            Self::Output(raw) => raw,
            Self::Failed { .. } => RawOutput::empty(),
        }
    }
}

/// Wraps a shared [`DetectionEngine`] with the model's input conventions.
#[derive(Clone)]
pub struct InferenceAdapter {
    engine: Arc<dyn DetectionEngine>,
    input_name: String,
    input_size: u32,
}

impl InferenceAdapter {
    /// Create an adapter around an engine loaded at startup.
    pub fn new(engine: Arc<dyn DetectionEngine>, input_name: &str, input_size: u32) -> Self {
        Self {
            engine,
            input_name: input_name.to_string(),
            input_size,
        }
    }

    /// Square input resolution fed to the engine.
    pub const fn input_size(&self) -> u32 {
        self.input_size
    }

    /// Normalize an image and run the engine on it.
    ///
    /// Never returns an error; failures become [`InferenceOutcome::Failed`].
    pub fn infer(&self, image: &DynamicImage) -> InferenceOutcome {
        let input = preprocess(image, &self.input_name, self.input_size);
        debug!(
            "Running inference on {}x{} input",
            self.input_size, self.input_size
        );

        match self.engine.run(input) {
            Ok(raw) => InferenceOutcome::Output(raw),
            Err(e) => {
                warn!("Inference failed: {e}");
                InferenceOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Resize to `size`x`size`, scale to `[0, 1]`, reorder to CHW, add a batch of 1.
pub fn preprocess(image: &DynamicImage, input_name: &str, size: u32) -> InputTensor {
    let rgb = image.to_rgb8();
    let resized = imageops::resize(&rgb, size, size, FilterType::Triangle);

    let side = size as usize;
    let plane = side * side;
    let mut data = vec![0.0_f32; 3 * plane];

    for (x, y, pixel) in resized.enumerate_pixels() {
        let offset = y as usize * side + x as usize;
        for (channel, value) in pixel.0.iter().enumerate() {
            data[channel * plane + offset] = f32::from(*value) / 255.0;
        }
    }

    InputTensor {
        name: input_name.to_string(),
        shape: [1, 3, side, side],
        data,
    }
}
