//! Vistela Server - Main entry point

use anyhow::Result;
use tracing::info;
use vistela_common::logging::{init_logging, LogConfig};
use vistela_server::{api, config::Config};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Environment variables take precedence over these defaults
    let log_config = LogConfig::default()
        .with_file_prefix("vistela-server")
        .with_filter("vistela_server=debug,tower_http=debug,sqlx=warn")
        .merge_env()?;
    let _guard = init_logging(&log_config)?;

    info!("Starting Vistela Server");

    let config = Config::load()?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        store = ?config.store,
        uploads = config.storage.is_some(),
        "Configuration loaded"
    );

    api::serve(config).await
}
