//! Stock coverage report CLI.
//!
//! # Usage
//!
//! ```bash
//! # Build the report for every configured brand and email it
//! coverage-cli run
//!
//! # Render the report for one brand into a file without sending it
//! coverage-cli --brand OPPO preview --output report.html
//!
//! # Validate config.json and the environment
//! coverage-cli --config /etc/coverage/config.json check-config
//! ```
//!
//! # Commands
//!
//! - `run` - Fetch, compute, render and send the report
//! - `preview` - Fetch, compute and render; write the HTML instead of sending
//! - `check-config` - Load and validate the configuration, then exit
//!
//! Exit status is 0 when the report was sent or there was nothing to send,
//! and 1 on configuration, render or delivery failure.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stock_coverage_report::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "coverage-cli")]
#[command(author, version, about = "Stock and coverage report for Odoo brands")]
struct Cli {
    /// Path to the JSON configuration document
    #[arg(short, long, global = true, default_value = "config.json")]
    config: PathBuf,

    /// Only report this configured brand (repeatable)
    #[arg(short, long = "brand", global = true)]
    brands: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the report and email it
    Run,
    /// Build the report and write the HTML instead of sending it
    Preview {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate the configuration and exit
    CheckConfig,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &AppConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "stock_coverage_report=info,coverage_cli=info".into());

    // JSON for log shippers, text for terminals
    let is_json = std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json");
    let json_layer = is_json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!is_json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Sentry needs the configuration and must be initialized before tracing,
    // so configuration warnings are logged once tracing is up
    let config = AppConfig::load(&cli.config);
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);
    init_tracing();

    let mut config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(path = %cli.config.display(), error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    for warning in config.warnings() {
        tracing::warn!("{warning}");
    }
    if let Err(e) = config.retain_brands(&cli.brands) {
        tracing::error!(error = %e, "Invalid --brand selection");
        return ExitCode::FAILURE;
    }

    let today = chrono::Local::now().date_naive();
    let result = match cli.command {
        Commands::Run => commands::run::execute(&config, today).await,
        Commands::Preview { output } => {
            commands::preview::execute(&config, today, output.as_deref()).await
        }
        Commands::CheckConfig => commands::check::execute(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}
