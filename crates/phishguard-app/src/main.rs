//! PhishGuard - URL phishing classifier.
//!
//! Subcommands:
//! - `serve`: run the HTTP API
//! - `check`: classify URLs and print one verdict per line
//! - `features`: print the feature record of URLs
//! - `validate-model`: load and validate the model artifact

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use phishguard_core::classifier::{ModelInfo, RandomForest};
use phishguard_core::{DetectorConfig, FeatureExtractor, UrlPipeline, Verdict};
use phishguard_server::models::PredictResponse;
use phishguard_server::{AppState, Server, ServerConfig, DEFAULT_HOST, DEFAULT_PORT};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// PhishGuard - classify URLs as safe or malicious
#[derive(Parser, Debug)]
#[command(name = "phishguard", version, about)]
struct Args {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Path to the random-forest model artifact (JSON)
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Path to a detector configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = DEFAULT_HOST)]
        host: String,

        /// Port to bind to
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },

    /// Classify URLs and print one `/predict`-shaped JSON verdict per line
    Check {
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Print the feature record of URLs (no model needed)
    Features {
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Load the model, check it against the feature schema, and print its metadata
    ValidateModel,
}

/// Get the application data directory.
fn data_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "phishguard", "PhishGuard").map(|dirs| dirs.data_dir().to_path_buf())
}

/// Default location of the model artifact.
fn default_model_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("models").join("url_forest.json"))
}

/// Initialize logging with file rotation.
///
/// Console output goes to stderr so `check` and `features` can print JSON on stdout.
fn init_logging(args: &Args) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_level = if args.debug { "debug" } else { &args.log_level };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("phishguard={},warn", log_level)));

    if let Some(log_dir) = data_dir().map(|dir| dir.join("logs")) {
        if std::fs::create_dir_all(&log_dir).is_ok() {
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .max_log_files(5)
                .filename_prefix("phishguard")
                .filename_suffix("log")
                .build(&log_dir)
                .ok();

            if let Some(appender) = file_appender {
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().with_writer(std::io::stderr))
                    .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                    .init();

                tracing::debug!("Logging to {:?}", log_dir);
                return Some(guard);
            }
        }
    }

    // Fallback: console logging only
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::warn!("File logging unavailable, using console only");
    None
}

/// Loads the detector configuration, or the built-in lists when no path is given.
fn load_config(path: Option<&Path>) -> anyhow::Result<DetectorConfig> {
    match path {
        Some(path) => DetectorConfig::from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => Ok(DetectorConfig::default()),
    }
}

/// Resolves the model path from the flag or the platform data directory.
fn resolve_model_path(flag: Option<&Path>) -> anyhow::Result<PathBuf> {
    match flag {
        Some(path) => Ok(path.to_path_buf()),
        None => match default_model_path() {
            Some(path) => Ok(path),
            None => bail!("no model path given and no data directory available; pass --model"),
        },
    }
}

/// Loads the model and builds the pipeline, validating the feature contract.
fn load_pipeline(
    model_path: &Path,
    config: DetectorConfig,
) -> anyhow::Result<(UrlPipeline, ModelInfo)> {
    let model = RandomForest::load(model_path).context("model artifact is unusable")?;
    let info = model.info().clone();
    let pipeline =
        UrlPipeline::new(config, Arc::new(model)).context("failed to build classification pipeline")?;
    Ok((pipeline, info))
}

/// Renders a verdict in the same JSON shape `POST /predict` returns.
fn verdict_json(verdict: Verdict) -> anyhow::Result<String> {
    Ok(serde_json::to_string(&PredictResponse::from(verdict))?)
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Features { urls } => {
            let extractor = FeatureExtractor::new(&config.normalized()?);
            for url in urls {
                println!("{}", serde_json::to_string(&extractor.extract(url.trim()))?);
            }
        }
        Command::Check { urls } => {
            let model_path = resolve_model_path(args.model.as_deref())?;
            let (pipeline, _) = load_pipeline(&model_path, config)?;
            for url in urls {
                println!("{}", verdict_json(pipeline.classify(&url))?);
            }
        }
        Command::ValidateModel => {
            let model_path = resolve_model_path(args.model.as_deref())?;
            let (_, info) = load_pipeline(&model_path, config)?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Command::Serve { host, port } => {
            let model_path = resolve_model_path(args.model.as_deref())?;
            let (pipeline, info) = load_pipeline(&model_path, config)?;
            tracing::info!(
                model = %model_path.display(),
                fingerprint = %info.fingerprint,
                "Model validated"
            );

            let state = AppState::new(Arc::new(pipeline)).with_model_info(info);
            let server_config = ServerConfig::default().with_host(host).with_port(port);
            Server::new(server_config, state)?.run().await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _log_guard = init_logging(&args);

    if let Err(e) = run(args).await {
        tracing::error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}
