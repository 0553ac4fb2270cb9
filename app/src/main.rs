//! Main application entry point for Fotolenta.

use clap::Parser;
use session::Session;
use std::path::PathBuf;
use tracing_appender::rolling;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

mod config;
use config::{AppConfig, AppConfigOverrides};

#[derive(Parser)]
#[command(
    name = "fotolenta",
    author,
    version,
    about = "Self-hosted photo feed client"
)]
struct Cli {
    /// Server base URL (e.g. https://photos.example.org)
    #[arg(long)]
    server_url: Option<String>,
    /// Override log level (e.g. info, debug)
    #[arg(long)]
    log_level: Option<String>,
    /// Blocks fetched per feed page
    #[arg(long)]
    blocks_per_load: Option<usize>,
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Store the session token in ~/.fotolenta/token.json instead of the system keyring
    #[arg(long)]
    use_file_store: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    if cli.use_file_store {
        std::env::set_var(session::USE_FILE_STORE_ENV, "1");
    }
    let overrides = AppConfigOverrides {
        server_url: cli.server_url,
        log_level: cli.log_level,
        blocks_per_load: cli.blocks_per_load,
    };
    let cfg = AppConfig::load_from(cli.config).apply_overrides(&overrides);

    std::fs::create_dir_all(&cfg.data_path)?;
    let file_appender = rolling::daily(&cfg.data_path, "fotolenta.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(cfg.log_level.clone()))
        .with_writer(file_writer.and(std::io::stdout))
        .init();

    let session = Session::load();
    tracing::info!(
        server = %cfg.server_url,
        logged_in = session.is_logged_in(),
        "starting fotolenta"
    );

    ui::run(ui::UiFlags {
        server_url: cfg.server_url.clone(),
        session,
        blocks_per_load: cfg.blocks_per_load,
    })?;
    Ok(())
}
