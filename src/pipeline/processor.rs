//! Single image processing pipeline.

use crate::config::Config;
use crate::decode::{ClassNameResolver, DetectionDecoder};
use crate::error::{Error, Result};
use crate::geo::{GeoPoint, GeoResolver};
use crate::inference::{DetectionEngine, InferenceAdapter, InferenceOutcome};
use crate::output::{Annotator, DetectionRecord, ResultStore};
use crate::pipeline::{GateOutcome, StabilityGate};
use chrono::Local;
use image::GenericImageView;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Everything a pipeline pass needs, shared by all workers.
pub struct PipelineContext {
    /// Write-stability gate.
    pub gate: StabilityGate,
    /// Location resolver.
    pub geo: GeoResolver,
    /// Engine wrapper.
    pub adapter: InferenceAdapter,
    /// Raw output decoder.
    pub decoder: DetectionDecoder,
    /// Result persistence.
    pub store: ResultStore,
    /// Box and caption drawing for annotated copies.
    pub annotator: Annotator,
    /// Destination for annotated copies.
    pub processed_dir: PathBuf,
}

impl PipelineContext {
    /// Assemble the pipeline stages from configuration and a loaded engine.
    pub fn from_config(
        config: &Config,
        engine: Arc<dyn DetectionEngine>,
        labels: ClassNameResolver,
    ) -> Result<Self> {
        let annotator = match &config.render.font {
            Some(path) => Annotator::with_font_path(path)?,
            None => Annotator::with_system_font(),
        };

        Ok(Self {
            gate: StabilityGate::new(
                config.watcher.stability_retries,
                config.watcher.stability_delay(),
            ),
            geo: GeoResolver::new(&config.geo)?,
            adapter: InferenceAdapter::new(engine, &config.model.input_name, config.model.input_size),
            decoder: DetectionDecoder::new(config.detection.confidence_threshold, labels),
            store: ResultStore::new(&config.paths.results),
            annotator,
            processed_dir: config.paths.processed.clone(),
        })
    }
}

/// Result of processing a single image.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    /// Identifier of the persisted record.
    pub id: String,
    /// Number of detections in the record.
    pub detections: usize,
    /// Whether the engine failed and the record was persisted empty.
    pub inference_failed: bool,
    /// Whether a location was resolved.
    pub located: bool,
    /// Wall-clock processing time in seconds.
    pub duration_secs: f64,
}

/// Run one image through gate, geolocation, inference, decoding and persistence.
///
/// Unavailable and undecodable files are returned as skip errors. Geolocation
/// and inference failures degrade the record instead of failing the pass.
pub async fn process_file(ctx: Arc<PipelineContext>, path: PathBuf) -> Result<ProcessResult> {
    let start_time = Instant::now();
    info!("Processing: {}", path.display());

    if let GateOutcome::Unavailable { attempts } = ctx.gate.wait_until_ready(&path).await {
        return Err(Error::FileUnavailable { path, attempts });
    }

    let bytes = tokio::fs::read(&path).await?;
    let geo = ctx.geo.resolve(&bytes).await;
    if geo.is_none() {
        debug!("No location for {}", path.display());
    }

    let mut result =
        tokio::task::spawn_blocking(move || analyze(&ctx, &path, &bytes, geo)).await??;

    result.duration_secs = start_time.elapsed().as_secs_f64();
    info!(
        "Stored {} with {} detections in {:.2}s",
        result.id, result.detections, result.duration_secs
    );

    Ok(result)
}

/// CPU-bound half of the pipeline: decode, infer, render, persist.
fn analyze(
    ctx: &PipelineContext,
    path: &Path,
    bytes: &[u8],
    geo: Option<GeoPoint>,
) -> Result<ProcessResult> {
    let image = image::load_from_memory(bytes).map_err(|source| Error::UnreadableImage {
        path: path.to_path_buf(),
        source,
    })?;
    let (width, height) = image.dimensions();
    debug!("Decoded {width}x{height} image");

    let outcome = ctx.adapter.infer(&image);
    let inference_failed = matches!(outcome, InferenceOutcome::Failed { .. });

    let decoded = ctx.decoder.decode(&outcome.into_output(), width, height);
    if decoded.degenerate > 0 {
        debug!(
            "Dropped {} degenerate boxes of {} candidates",
            decoded.degenerate, decoded.candidates
        );
    }
    debug!(
        "Found {} detections above {:.1}% confidence",
        decoded.detections.len(),
        ctx.decoder.threshold() * 100.0
    );
    info!("{}", decoded.report());

    let file_name = path.file_name().map_or_else(
        || std::ffi::OsString::from("image"),
        std::ffi::OsStr::to_os_string,
    );
    let processed_path = ctx.processed_dir.join(file_name);
    if let Err(e) = ctx
        .annotator
        .write_processed(&image, bytes, &decoded.detections, &processed_path)
    {
        warn!("Annotated copy not written: {e}");
    }

    let record = DetectionRecord {
        source_path: path.to_path_buf(),
        processed_path,
        geo,
        captured_at: Local::now(),
        detections: decoded.detections,
    };
    let id = ctx.store.persist(&record)?;

    Ok(ProcessResult {
        id,
        detections: record.detections.len(),
        inference_failed,
        located: geo.is_some(),
        duration_secs: 0.0,
    })
}
