//! Processing pipeline components.

mod dedup;
mod gate;
mod processor;
mod submit;
mod watcher;

pub use dedup::DedupTracker;
pub use gate::{GateOutcome, StabilityGate, is_partial_download};
pub use processor::{PipelineContext, ProcessResult, process_file};
pub use submit::{sanitize_filename, submit_file};
pub use watcher::{WatchSummary, Watcher, list_candidates};
