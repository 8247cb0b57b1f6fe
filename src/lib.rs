//! Ecovision - folder-watching object detection with geotagged results.
//!
//! Images dropped into an inbox are gated until fully written, geolocated,
//! run through an ONNX detection model, decoded into labeled boxes, and
//! persisted as JSON records that can be listed and looked up by id.

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod constants;
pub mod decode;
pub mod error;
pub mod geo;
pub mod inference;
pub mod output;
pub mod pipeline;

use clap::Parser;
use cli::{Cli, Command, ConfigAction, ResultsAction};
use config::{
    Config, config_file_path, load_config_file, load_default_config, require_model_path,
    save_config, validate_config,
};
use decode::ClassNameResolver;
use inference::OrtEngine;
use output::ResultStore;
use pipeline::{PipelineContext, Watcher, submit_file};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

pub use error::{Error, Result};

/// Main entry point for the ecovision CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.quiet);

    // Load configuration, then apply directory overrides
    let mut config = load_config(cli.config.as_deref())?;
    cli.dirs.apply(&mut config);

    handle_command(cli.command, config, cli.config.as_deref())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    path.map_or_else(load_default_config, load_config_file)
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    // ORT logging is suppressed by default; -v shows its warnings.
    let filter_str = if quiet {
        "warn,ort=off".to_string()
    } else {
        match verbose {
            0 => "info,ort=off".to_string(),
            1 => "debug,ort=warn".to_string(),
            2 => "trace,ort=info".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    // Logs go to stderr so `results` output stays machine-readable.
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_command(command: Command, mut config: Config, config_path: Option<&Path>) -> Result<()> {
    match command {
        Command::Watch(args) => {
            args.apply(&mut config);
            run_watch(&config)
        }
        Command::Submit { file } => handle_submit(&config, &file),
        Command::Results { action } => handle_results_command(action, &config),
        Command::Config { action } => handle_config_command(action, &config, config_path),
    }
}

/// Load the engine and run the watcher until Ctrl+C.
fn run_watch(config: &Config) -> Result<()> {
    validate_config(config)?;

    for dir in [
        &config.paths.uploads,
        &config.paths.processed,
        &config.paths.results,
    ] {
        std::fs::create_dir_all(dir)?;
    }

    // Engine load failure is fatal
    let model_path = require_model_path(config)?;
    let engine = OrtEngine::load(&model_path)?;

    let labels = match &config.model.labels {
        Some(path) => ClassNameResolver::from_labels_file(path)?,
        None => ClassNameResolver::default(),
    };
    info!("Using {} class labels", labels.len());

    let ctx = Arc::new(PipelineContext::from_config(
        config,
        Arc::new(engine),
        labels,
    )?);

    // Ctrl+C stops discovery; in-flight files are allowed to finish
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    // A closed channel reads as shutdown; keep a sender even if no handler
    let _shutdown_guard = shutdown_tx.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        if !*shutdown_tx.borrow() {
            info!("Interrupt received, stopping after in-flight work");
        }
        let _ = shutdown_tx.send(true);
    }) {
        warn!("Failed to install Ctrl+C handler: {e}");
    }

    let runtime = tokio::runtime::Runtime::new().map_err(|e| Error::Internal {
        message: format!("Failed to create async runtime: {e}"),
    })?;

    let watcher = Watcher::new(
        config.paths.uploads.clone(),
        &config.watcher,
        ctx,
        shutdown_rx,
    );
    let summary = runtime.block_on(watcher.run());

    if summary.degraded > 0 {
        warn!(
            "{} file(s) were recorded without detections after inference failures",
            summary.degraded
        );
    }

    Ok(())
}

fn handle_submit(config: &Config, file: &Path) -> Result<()> {
    if !file.is_file() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no such file: {}", file.display()),
        )));
    }

    let queued = submit_file(&config.paths.uploads, file, &config.watcher.extensions)?;
    println!("{}", queued.display());
    Ok(())
}

fn handle_results_command(action: ResultsAction, config: &Config) -> Result<()> {
    let store = ResultStore::new(&config.paths.results);

    let json = match action {
        ResultsAction::List => {
            let documents = store.list()?;
            serde_json::to_string_pretty(&documents)
        }
        ResultsAction::Get { prefix } => {
            let document = store
                .get(&prefix)?
                .ok_or(Error::ResultNotFound { prefix })?;
            serde_json::to_string_pretty(&document)
        }
    }
    .map_err(|source| Error::ResultSerialize { source })?;

    println!("{json}");
    Ok(())
}

fn handle_config_command(
    action: ConfigAction,
    config: &Config,
    config_path: Option<&Path>,
) -> Result<()> {
    let path = || -> Result<PathBuf> {
        config_path.map_or_else(config_file_path, |p| Ok(p.to_path_buf()))
    };

    match action {
        ConfigAction::Init => {
            let path = path()?;
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                save_config(&Config::default(), &path)?;
                println!("Created configuration file: {}", path.display());
                println!("\nNext steps:");
                println!("  set [model].path to your detection model, then run `ecovision watch`");
            }
            Ok(())
        }
        ConfigAction::Show => {
            println!("{config:#?}");
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", path()?.display());
            Ok(())
        }
    }
}
