//! Inbox polling loop and worker dispatch.

use crate::config::WatcherConfig;
use crate::error::Result;
use crate::pipeline::{DedupTracker, PipelineContext, ProcessResult, is_partial_download, process_file};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc, watch};
use tokio::task::{JoinError, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Totals for one watcher run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchSummary {
    /// Files dispatched to the pipeline.
    pub dispatched: usize,
    /// Records persisted.
    pub processed: usize,
    /// Records persisted with no detections because inference failed.
    pub degraded: usize,
    /// Files skipped as unavailable or unreadable.
    pub skipped: usize,
    /// Files that failed for any other reason.
    pub failed: usize,
}

type Joined = std::result::Result<(PathBuf, Result<ProcessResult>), JoinError>;

impl WatchSummary {
    fn record(&mut self, joined: Joined) {
        match joined {
            Ok((_, Ok(result))) => {
                self.processed += 1;
                if result.inference_failed {
                    self.degraded += 1;
                }
            }
            Ok((path, Err(e))) if e.is_skip() => {
                warn!("Skipping {}: {e}", path.display());
                self.skipped += 1;
            }
            Ok((path, Err(e))) => {
                error!("Failed to process {}: {e}", path.display());
                self.failed += 1;
            }
            Err(e) => {
                error!("Worker task failed: {e}");
                self.failed += 1;
            }
        }
    }
}

/// Watches the inbox and feeds each new image to the pipeline exactly once.
pub struct Watcher {
    inbox: PathBuf,
    extensions: Vec<String>,
    poll_interval: Duration,
    workers: usize,
    ctx: Arc<PipelineContext>,
    shutdown: watch::Receiver<bool>,
}

impl Watcher {
    /// Create a watcher over `inbox`. Setting the shutdown flag to `true`
    /// (or dropping its sender) stops the loop.
    pub fn new(
        inbox: PathBuf,
        config: &WatcherConfig,
        ctx: Arc<PipelineContext>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            inbox,
            extensions: config.extensions.clone(),
            poll_interval: config.poll_interval(),
            workers: config.workers.max(1),
            ctx,
            shutdown,
        }
    }

    /// Poll until shutdown, then wait for in-flight work to finish.
    pub async fn run(self) -> WatchSummary {
        let Self {
            inbox,
            extensions,
            poll_interval,
            workers,
            ctx,
            mut shutdown,
        } = self;

        info!(
            "Watching {} every {:.1}s with {} worker(s)",
            inbox.display(),
            poll_interval.as_secs_f64(),
            workers
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = tokio::spawn(dispatch(rx, ctx, workers, shutdown.clone()));

        let mut dedup = DedupTracker::new();
        let mut interval = tokio::time::interval(poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    if *shutdown.borrow() {
                        break;
                    }
                    let candidates = match list_candidates(&inbox, &extensions).await {
                        Ok(candidates) => candidates,
                        Err(e) => {
                            warn!("Cannot list {}: {e}", inbox.display());
                            continue;
                        }
                    };
                    for path in candidates {
                        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                            continue;
                        };
                        if dedup.seen(&name) {
                            continue;
                        }
                        dedup.mark(&name);
                        debug!("Discovered {name}");
                        if tx.send(path).is_err() {
                            break;
                        }
                    }
                }
            }
        }

        info!("Shutdown requested, finishing in-flight work");
        drop(tx);

        match dispatcher.await {
            Ok(summary) => {
                info!(
                    "Watcher stopped: {} processed, {} skipped, {} failed",
                    summary.processed, summary.skipped, summary.failed
                );
                summary
            }
            Err(e) => {
                error!("Dispatcher failed: {e}");
                WatchSummary::default()
            }
        }
    }
}

/// Start queued files in discovery order, at most `workers` at a time.
async fn dispatch(
    mut rx: mpsc::UnboundedReceiver<PathBuf>,
    ctx: Arc<PipelineContext>,
    workers: usize,
    shutdown: watch::Receiver<bool>,
) -> WatchSummary {
    let semaphore = Arc::new(Semaphore::new(workers));
    let mut tasks = JoinSet::new();
    let mut summary = WatchSummary::default();

    while let Some(path) = rx.recv().await {
        while let Some(joined) = tasks.try_join_next() {
            summary.record(joined);
        }

        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
            break;
        };
        if *shutdown.borrow() {
            debug!("Not starting {} after shutdown", path.display());
            continue;
        }

        summary.dispatched += 1;
        let ctx = Arc::clone(&ctx);
        tasks.spawn(async move {
            let _permit = permit;
            let result = process_file(ctx, path.clone()).await;
            (path, result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        summary.record(joined);
    }
    summary
}

/// Image files currently in `dir`, sorted by name.
///
/// Hidden files and directories are ignored. Names carrying a partial-download
/// suffix are kept when the underlying extension matches, so the stability
/// gate decides their fate.
pub async fn list_candidates(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        if has_image_extension(name, extensions) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

fn has_image_extension(name: &str, extensions: &[String]) -> bool {
    let lower = name.to_ascii_lowercase();
    let base = if is_partial_download(Path::new(&lower)) {
        lower.rsplit_once('.').map_or(lower.as_str(), |(stem, _)| stem)
    } else {
        lower.as_str()
    };

    Path::new(base)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn extensions() -> Vec<String> {
        WatcherConfig::default().extensions
    }

    #[test]
    fn test_has_image_extension() {
        let exts = extensions();
        assert!(has_image_extension("a.jpg", &exts));
        assert!(has_image_extension("a.JPEG", &exts));
        assert!(has_image_extension("a.png.crdownload", &exts));
        assert!(!has_image_extension("a.txt", &exts));
        assert!(!has_image_extension("a.txt.part", &exts));
        assert!(!has_image_extension("noext", &exts));
    }

    #[tokio::test]
    async fn test_list_candidates_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        for name in ["b.jpg", "a.png", ".hidden.jpg", "notes.txt", "c.jpg.crdownload"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.jpg")).unwrap();

        let names: Vec<String> = list_candidates(dir.path(), &extensions())
            .await
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a.png", "b.jpg", "c.jpg.crdownload"]);
    }

    #[tokio::test]
    async fn test_list_candidates_missing_dir_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(
            list_candidates(&dir.path().join("missing"), &extensions())
                .await
                .is_err()
        );
    }
}
