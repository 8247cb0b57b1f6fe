//! Write-stability gating for candidate files.

use crate::constants::watcher::PARTIAL_SUFFIXES;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Result of waiting on a candidate file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// The file exists and is not a partial download.
    Ready,
    /// The file never became ready within the retry budget.
    Unavailable {
        /// Checks performed.
        attempts: u32,
    },
}

/// Waits, with bounded retries, until a file is fully written.
#[derive(Debug, Clone, Copy)]
pub struct StabilityGate {
    retries: u32,
    delay: Duration,
}

impl StabilityGate {
    /// Create a gate performing at most `retries` checks, `delay` apart.
    pub const fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    /// Check `path` until it is ready or the retry budget is spent.
    pub async fn wait_until_ready(&self, path: &Path) -> GateOutcome {
        for attempt in 1..=self.retries {
            if is_ready(path).await {
                if attempt > 1 {
                    debug!("{} ready after {attempt} checks", path.display());
                }
                return GateOutcome::Ready;
            }
            if attempt < self.retries {
                tokio::time::sleep(self.delay).await;
            }
        }

        GateOutcome::Unavailable {
            attempts: self.retries,
        }
    }
}

async fn is_ready(path: &Path) -> bool {
    if is_partial_download(path) {
        return false;
    }
    tokio::fs::metadata(path).await.is_ok_and(|m| m.is_file())
}

/// Whether the file name ends with a known in-progress download suffix.
pub fn is_partial_download(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|name| PARTIAL_SUFFIXES.iter().any(|s| name.ends_with(s)))
}
