//! Configuration loading and management.

mod file;
mod paths;
mod types;
mod validate;

pub use file::{load_config_file, load_default_config, save_config};
pub use paths::config_file_path;
pub use types::{
    Config, DetectionConfig, GeoConfig, ModelConfig, PathsConfig, RenderConfig, WatcherConfig,
};
pub use validate::{require_model_path, validate_config};
