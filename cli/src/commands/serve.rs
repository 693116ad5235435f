use anyhow::{anyhow, Result};
use database::DatabaseConfig;
use tracing::info;

use crate::utils::service_config::ServiceConfig;

/// Open the database and run the API until the process is stopped
pub async fn execute(
    config: &ServiceConfig,
    host: Option<String>,
    port: Option<u16>,
    seed_demo: bool,
) -> Result<()> {
    let db = database::initialize_database(
        DatabaseConfig::new().with_database_path(config.database_path()),
    )
    .await?;

    let mut api_config = config.api_config().with_demo_data(seed_demo);
    if let Some(host) = host {
        api_config = api_config.with_host(host);
    }
    if let Some(port) = port {
        api_config = api_config.with_port(port);
    }

    info!(
        "=== Classgate starting ({}) on {} ===",
        api_config.environment,
        api_config.bind_addr()
    );

    api::start_server_with_config(db, api_config)
        .await
        .map_err(|e| anyhow!("API server error: {}", e))?;

    info!("=== Classgate shutdown complete ===");
    Ok(())
}
