pub mod analysis;
pub mod cli;
pub mod config;
pub mod export;
pub mod models;
pub mod pipeline;
pub mod timeline;
pub mod wearable;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub use cli::AppError;

pub fn run() -> Result<(), AppError> {
    // Initialize tracing
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .try_init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let args = cli::Cli::parse();
    cli::execute(&args)
}
