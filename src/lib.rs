pub mod commands;
pub mod config;
pub mod drafts;
pub mod form;
pub mod models;
pub mod pdf;
pub mod pipeline;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Binary entry point: parse arguments, run the command, exit 1 on error.
pub fn run() {
    // Logs go to stderr; stdout carries command output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let cli = commands::Cli::parse();
    if let Err(message) = commands::execute(cli) {
        eprintln!("erro: {message}");
        std::process::exit(1);
    }
}
