//! todofile server binary
//!
//! Configuration comes from the environment (TODO_TOKEN, SERVER_HOST,
//! SERVER_PORT, DEBUG_MODE, PAGE_TITLE, SHOW_ADMIN_PANEL_BUTTON, DATA_DIR);
//! the flags below override the bind address and data directory.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use todofile_core::ServerConfig;

#[derive(Parser)]
#[command(name = "todofile")]
#[command(version, about = "File-backed task-list web service")]
struct Cli {
    /// Bind host (overrides SERVER_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides SERVER_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Data directory for the persisted documents (overrides DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = ServerConfig::from_env();

    let level = if cli.verbose || config.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    if config.api_token.is_none() {
        tracing::warn!("TODO_TOKEN is not set; authenticated endpoints will return 500");
    }

    info!(
        "todofile listening on {} (data dir: {})",
        config.bind_addr(),
        config.data_dir.display()
    );

    todofile_server::run(config).await
}
