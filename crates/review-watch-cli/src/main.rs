//! Review Watch CLI
//!
//! Main entry point for the homework review status poller.

use std::fs::OpenOptions;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use review_watch::{load_env_file, ApiClient, Config, Credentials, PollLoop, TelegramNotifier};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Review Watch - Homework Review Notifier
///
/// Polls the homework review API every ten minutes and posts review status
/// changes to a Telegram chat. Reads PRACTICUM_TOKEN, TELEGRAM_TOKEN and
/// TG_CHAT_ID from the environment or a `.env` file.
#[derive(Parser, Debug)]
#[command(name = "review-watch")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: review-watch.json in current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Log file appended to alongside stdout (overrides logFile from config)
    #[arg(short, long, value_name = "FILE")]
    log_file: Option<String>,

    /// Environment file with credentials (default: .env in current directory or a parent)
    #[arg(short, long, value_name = "FILE")]
    env_file: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Loads settings, checks credentials, and polls until Ctrl+C.
async fn run(args: Args) -> anyhow::Result<()> {
    let env_file = load_env_file(args.env_file.as_deref().map(Path::new))?;
    let mut config = load_config(args.config.as_deref())?;
    if let Some(log_file) = args.log_file {
        config.log_file = log_file;
    }
    config.validate()?;

    init_logging(Path::new(&config.log_file), args.verbose)?;
    tracing::info!("Review Watch starting");
    if let Some(env_file) = &env_file {
        tracing::info!(path = %env_file.display(), "Loaded environment file");
    }
    tracing::debug!(
        endpoint = %config.endpoint,
        timeout_secs = config.request_timeout_secs,
        log_file = %config.log_file,
        "Configuration loaded"
    );

    let credentials = Credentials::from_env().map_err(|e| {
        tracing::error!(error = %e, "Required credentials are missing, exiting");
        e
    })?;

    let source = ApiClient::new(&config, &credentials)?;
    let notifier = TelegramNotifier::new(&config, &credentials)?;
    let mut poll = PollLoop::new(source, notifier, config.retry_period);

    poll.run(shutdown_signal()).await;
    tracing::info!("Review Watch stopped");
    Ok(())
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Ok(Config::load_from_file(path)?)
        }
        None => Ok(Config::load()?),
    }
}

/// Sends log lines to stdout and appends them to `log_file`.
///
/// Priority: `RUST_LOG` env var > `--verbose` flag > default (info).
fn init_logging(log_file: &Path, verbose: bool) -> anyhow::Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to open log file '{}': {e}\n\nSuggestion: Check write permissions or pass --log-file",
                log_file.display()
            )
        })?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout.and(Mutex::new(file)))
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    Ok(())
}

/// Resolves on Ctrl+C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Cannot listen for Ctrl+C, running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received Ctrl+C, shutting down");
}
