use anyhow::{Context, Result};
use colored::*;
use database::{DatabaseConfig, SeedData, SqliteResourceStore};
use std::path::PathBuf;

use crate::utils::service_config::ServiceConfig;

/// Load a seed file, or the bundled demo data, into the configured database
pub async fn execute(config: &ServiceConfig, file: Option<PathBuf>) -> Result<()> {
    let seed = match &file {
        Some(path) => SeedData::from_file(path)
            .with_context(|| format!("Failed to load seed file {}", path.display()))?,
        None => SeedData::demo()?,
    };

    let db = database::initialize_database(
        DatabaseConfig::new().with_database_path(config.database_path()),
    )
    .await?;
    let store = SqliteResourceStore::new(db);

    let rows = seed.seed(&store).await?;

    let source = file
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "demo data".to_string());
    println!(
        "{} {} rows from {} into {}",
        "Seeded".green().bold(),
        rows,
        source,
        config.database_path().display()
    );
    Ok(())
}
