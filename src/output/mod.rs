//! Detection records, result persistence, and annotated copies.

mod record;
mod render;
mod store;

pub use record::{DetectionEntry, DetectionRecord, RecordDocument};
pub use render::Annotator;
pub use store::ResultStore;
