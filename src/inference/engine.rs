//! Detection engine abstraction and the ONNX Runtime implementation.

use crate::error::{Error, Result};
use crate::inference::{InputTensor, RawOutput};
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// An object-detection engine that maps one input tensor to one raw output table.
///
/// Implementations are shared across pipeline workers, so they must be usable
/// from multiple threads. Engines that cannot run concurrently serialize
/// internally.
pub trait DetectionEngine: Send + Sync {
    /// Run the model on a single normalized image.
    fn run(&self, input: InputTensor) -> Result<RawOutput>;
}

/// ONNX Runtime backed engine.
///
/// Running a session needs exclusive access, so calls are serialized behind a
/// mutex. The session is loaded once at startup and shared by every worker.
pub struct OrtEngine {
    session: Mutex<Session>,
}

impl OrtEngine {
    /// Load an ONNX model from disk.
    ///
    /// Failure here is fatal for the watcher.
    pub fn load(model_path: &Path) -> Result<Self> {
        let session = Session::builder()
            .map_err(|e| load_error(model_path, &e))?
            .commit_from_file(model_path)
            .map_err(|e| load_error(model_path, &e))?;

        info!("Loaded model: {}", model_path.display());

        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

impl DetectionEngine for OrtEngine {
    fn run(&self, input: InputTensor) -> Result<RawOutput> {
        let tensor =
            Tensor::from_array((input.shape, input.data)).map_err(|e| inference_error(&e))?;

        let mut session = self.session.lock().map_err(|_| Error::Inference {
            reason: "session lock poisoned".to_string(),
        })?;

        let outputs = session
            .run(ort::inputs![input.name.as_str() => tensor])
            .map_err(|e| inference_error(&e))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| inference_error(&e))?;

        debug!("Engine output shape: {:?}", &shape[..]);
        RawOutput::from_shape(&shape[..], data)
    }
}

fn load_error(path: &Path, e: &dyn std::fmt::Display) -> Error {
    Error::ModelLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

fn inference_error(e: &dyn std::fmt::Display) -> Error {
    Error::Inference {
        reason: e.to_string(),
    }
}
