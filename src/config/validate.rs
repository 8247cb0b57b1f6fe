//! Configuration validation.

use crate::config::Config;
use crate::error::{Error, Result};
use std::path::PathBuf;

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    let threshold = config.detection.confidence_threshold;
    if !(0.0..=1.0).contains(&threshold) {
        return Err(invalid(format!(
            "confidence_threshold must be between 0.0 and 1.0, got {threshold}"
        )));
    }

    if config.model.input_size == 0 {
        return Err(invalid("input_size must be at least 1".to_string()));
    }

    if config.model.input_name.trim().is_empty() {
        return Err(invalid("input_name must not be empty".to_string()));
    }

    let watcher = &config.watcher;
    if watcher.workers == 0 {
        return Err(invalid("workers must be at least 1".to_string()));
    }
    if watcher.stability_retries == 0 {
        return Err(invalid("stability_retries must be at least 1".to_string()));
    }
    if watcher.poll_interval_ms == 0 {
        return Err(invalid("poll_interval_ms must be at least 1".to_string()));
    }
    if watcher.extensions.iter().all(|ext| ext.trim().is_empty()) {
        return Err(invalid("extensions must list at least one file type".to_string()));
    }

    Ok(())
}

/// Resolve the configured model path and check the file exists.
pub fn require_model_path(config: &Config) -> Result<PathBuf> {
    let path = config.model.path.clone().ok_or_else(|| {
        invalid("no model specified (use --model-path or set model.path in config)".to_string())
    })?;

    if !path.exists() {
        return Err(Error::ModelFileNotFound { path });
    }

    Ok(path)
}

fn invalid(message: String) -> Error {
    Error::ConfigValidation { message }
}
