//! diskguard CLI - single entrypoint for the disk check
//!
//! Runs one check and exits. Scheduling is left to cron or a systemd timer.

mod commands;

use clap::{Parser, Subcommand};
use commands::{CheckCommand, UsageCommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, Layer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "DISKGUARD_LOG_LEVEL", global = true)]
    log_level: String,

    /// Log format: compact, full
    #[arg(
        long,
        default_value = "compact",
        env = "DISKGUARD_LOG_FORMAT",
        global = true
    )]
    log_format: String,

    /// Settings file with KEY=value lines
    #[arg(
        long,
        default_value = diskguard_config::DEFAULT_ENV_FILE,
        env = "DISKGUARD_ENV_FILE",
        global = true
    )]
    env_file: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check free disk space on / and send the alert email (default)
    Check(CheckCommand),
    /// Print memory and disk usage and warn above 80%
    Usage(UsageCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // If RUST_LOG is set, use it directly; otherwise use our default filter
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .expect("Invalid RUST_LOG environment variable")
    } else {
        tracing_subscriber::EnvFilter::new(default_log_filter(&cli.log_level))
    };

    let fmt_layer = match cli.log_format.as_str() {
        "full" => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
        _ => tracing_subscriber::fmt::layer() // "compact" or any other value
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default subscriber");

    match cli.command.unwrap_or_default() {
        Commands::Check(check_cmd) => check_cmd.execute(&cli.env_file),
        Commands::Usage(usage_cmd) => usage_cmd.execute(),
    }
}

/// Filter directives for our crates at `level`, with chatty dependencies held at warn
fn default_log_filter(level: &str) -> String {
    format!(
        "diskguard_cli={level},\
         diskguard_config={level},\
         diskguard_core={level},\
         diskguard_monitoring={level},\
         diskguard_notifications={level},\
         diskguard_error_tracking={level},\
         lettre=warn,\
         reqwest=warn,\
         hyper=warn,\
         rustls=warn",
        level = level
    )
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Check(CheckCommand::default())
    }
}
