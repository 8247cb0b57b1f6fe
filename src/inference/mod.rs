//! Inference module: model input normalization and engine invocation.

mod adapter;
mod engine;
mod tensor;

pub use adapter::{InferenceAdapter, InferenceOutcome, preprocess};
pub use engine::{DetectionEngine, OrtEngine};
pub use tensor::{InputTensor, RawOutput};
