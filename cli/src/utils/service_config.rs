use anyhow::{anyhow, Context, Result};
use api::{ApiConfig, Environment};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use super::env_paths::EnvPaths;

/// Network settings for `classgate serve`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3030,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite file; relative paths resolve against the data directory
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// Write a daily rolling log file under the data directory
    pub file: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: true,
        }
    }
}

/// Shape of `config/config.<APP_ENV>.yaml`. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    environment: Option<Environment>,
    server: ServerSettings,
    database: DatabaseSettings,
    logging: LoggingSettings,
}

/// Resolved service configuration
#[derive(Debug, Clone, Serialize)]
pub struct ServiceConfig {
    pub environment: Environment,
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
    /// File the values were read from, if one existed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
}

impl ServiceConfig {
    /// Load the configuration for the named environment.
    ///
    /// A missing file yields the defaults. The environment is taken from the
    /// file when it names one, otherwise from `environment_name`.
    pub fn load(paths: &EnvPaths, environment_name: &str) -> Result<Self> {
        let file_path = paths.config_file(environment_name);

        let (file, source) = if file_path.exists() {
            let content = std::fs::read_to_string(&file_path)
                .with_context(|| format!("Failed to read {}", file_path.display()))?;
            let file: ConfigFile = serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid configuration in {}", file_path.display()))?;
            (file, Some(file_path))
        } else {
            debug!(
                "No configuration file at {}, using defaults",
                file_path.display()
            );
            (ConfigFile::default(), None)
        };

        let environment = match file.environment {
            Some(environment) => environment,
            None => environment_name
                .parse::<Environment>()
                .map_err(|e| anyhow!("{} (set APP_ENV to dev or production)", e))?,
        };

        let mut database = file.database;
        database.path = Some(match database.path {
            Some(path) if path.is_relative() => paths.data_path.join(path),
            Some(path) => path,
            None => paths.database_path(),
        });

        Ok(Self {
            environment,
            server: file.server,
            database,
            logging: file.logging,
            source,
        })
    }

    /// Resolved database file
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("data").join("classgate.db"))
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::new()
            .with_host(self.server.host.clone())
            .with_port(self.server.port)
            .with_environment(self.environment)
    }
}
