//! CLI argument definitions.

use crate::cli::validators::{parse_confidence, parse_result_prefix};
use crate::config::Config;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Watch a folder for images, detect objects, and record geotagged results.
#[derive(Debug, Parser)]
#[command(name = "ecovision")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (default: platform config directory).
    #[arg(long, global = true, env = "ECOVISION_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory overrides.
    #[command(flatten)]
    pub dirs: DirArgs,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace+ORT info, -vvv: trace+ORT debug).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Watch the inbox and process new images until interrupted.
    Watch(WatchArgs),
    /// Queue an image for processing by copying it into the inbox.
    Submit {
        /// Image to queue.
        file: PathBuf,
    },
    /// Query persisted detection results.
    Results {
        /// Results action to perform.
        #[command(subcommand)]
        action: ResultsAction,
    },
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Results subcommand actions.
#[derive(Debug, Subcommand)]
pub enum ResultsAction {
    /// Print every persisted result as a JSON array.
    List,
    /// Print the first result whose id starts with the given prefix.
    Get {
        /// Result id or id prefix.
        #[arg(value_parser = parse_result_prefix)]
        prefix: String,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Directory overrides shared by every command.
#[derive(Debug, Default, Args)]
pub struct DirArgs {
    /// Inbox watched for new images.
    #[arg(long, global = true, env = "ECOVISION_UPLOADS_DIR")]
    pub uploads_dir: Option<PathBuf>,

    /// Directory for annotated copies.
    #[arg(long, global = true, env = "ECOVISION_PROCESSED_DIR")]
    pub processed_dir: Option<PathBuf>,

    /// Directory for result documents.
    #[arg(long, global = true, env = "ECOVISION_RESULTS_DIR")]
    pub results_dir: Option<PathBuf>,
}

impl DirArgs {
    /// Apply overrides on top of file configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.uploads_dir {
            config.paths.uploads.clone_from(dir);
        }
        if let Some(dir) = &self.processed_dir {
            config.paths.processed.clone_from(dir);
        }
        if let Some(dir) = &self.results_dir {
            config.paths.results.clone_from(dir);
        }
    }
}

/// Arguments for the watch command.
#[derive(Debug, Default, Args)]
pub struct WatchArgs {
    /// Path to ONNX model file (overrides config).
    #[arg(short, long, env = "ECOVISION_MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Path to labels file, one label per line (overrides config).
    #[arg(long, env = "ECOVISION_LABELS_PATH")]
    pub labels_path: Option<PathBuf>,

    /// Confidence threshold (0.0-1.0); detections must score above it.
    #[arg(short = 'c', long, value_parser = parse_confidence, env = "ECOVISION_CONFIDENCE")]
    pub confidence: Option<f32>,

    /// Number of images processed concurrently.
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..), env = "ECOVISION_WORKERS")]
    pub workers: Option<u16>,

    /// Inbox poll interval in milliseconds.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..), env = "ECOVISION_POLL_INTERVAL_MS")]
    pub poll_interval_ms: Option<u64>,

    /// Disable the network location fallback.
    #[arg(long)]
    pub no_network_geo: bool,
}

impl WatchArgs {
    /// Apply overrides on top of file configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.model_path {
            config.model.path = Some(path.clone());
        }
        if let Some(path) = &self.labels_path {
            config.model.labels = Some(path.clone());
        }
        if let Some(confidence) = self.confidence {
            config.detection.confidence_threshold = confidence;
        }
        if let Some(workers) = self.workers {
            config.watcher.workers = usize::from(workers);
        }
        if let Some(ms) = self.poll_interval_ms {
            config.watcher.poll_interval_ms = ms;
        }
        if self.no_network_geo {
            config.geo.network_fallback = false;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_watch_with_options() {
        let cli = Cli::try_parse_from([
            "ecovision",
            "watch",
            "-m",
            "yolo.onnx",
            "-c",
            "0.25",
            "-w",
            "4",
            "--no-network-geo",
            "-q",
        ])
        .unwrap();

        assert!(cli.quiet);
        let Command::Watch(args) = cli.command else {
            panic!("expected watch command");
        };
        assert_eq!(args.model_path, Some(PathBuf::from("yolo.onnx")));
        assert_eq!(args.confidence, Some(0.25));
        assert_eq!(args.workers, Some(4));

        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(config.detection.confidence_threshold, 0.25);
        assert_eq!(config.watcher.workers, 4);
        assert!(!config.geo.network_fallback);
        assert_eq!(config.model.path, Some(PathBuf::from("yolo.onnx")));
    }

    #[test]
    fn test_cli_rejects_bad_values() {
        assert!(Cli::try_parse_from(["ecovision", "watch", "-c", "1.5"]).is_err());
        assert!(Cli::try_parse_from(["ecovision", "watch", "-w", "0"]).is_err());
        assert!(Cli::try_parse_from(["ecovision", "results", "get", "../x"]).is_err());
    }

    #[test]
    fn test_cli_parse_results_subcommands() {
        let cli = Cli::try_parse_from(["ecovision", "results", "list"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Results {
                action: ResultsAction::List
            }
        ));

        let cli = Cli::try_parse_from(["ecovision", "results", "get", "beach_1700"]).unwrap();
        let Command::Results {
            action: ResultsAction::Get { prefix },
        } = cli.command
        else {
            panic!("expected results get");
        };
        assert_eq!(prefix, "beach_1700");
    }

    #[test]
    fn test_global_dir_overrides() {
        let cli = Cli::try_parse_from([
            "ecovision",
            "submit",
            "photo.jpg",
            "--uploads-dir",
            "/tmp/inbox",
        ])
        .unwrap();

        let mut config = Config::default();
        cli.dirs.apply(&mut config);
        assert_eq!(config.paths.uploads, PathBuf::from("/tmp/inbox"));
        assert_eq!(config.paths.results, PathBuf::from("detection_results"));
    }

    #[test]
    fn test_cli_parse_config_subcommand() {
        let cli = Cli::try_parse_from(["ecovision", "config", "path"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config {
                action: ConfigAction::Path
            }
        ));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["ecovision"]).is_err());
    }
}
