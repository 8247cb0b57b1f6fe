//! Platform-specific configuration paths.

use crate::constants::{APP_NAME, CONFIG_FILE_NAME};
use crate::error::{Error, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Default location of `config.toml`, used when `--config` is not given.
///
/// Resolves to `~/.config/ecovision/config.toml` on Linux and the platform
/// equivalent elsewhere.
pub fn config_file_path() -> Result<PathBuf> {
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
        .ok_or(Error::ConfigDirNotFound)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_path_ends_with_toml() {
        let result = config_file_path();
        assert!(result.is_ok());
        let path = result.unwrap();
        assert!(path.ends_with(CONFIG_FILE_NAME));
        assert!(path.to_string_lossy().contains(APP_NAME));
    }
}
