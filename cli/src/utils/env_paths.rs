use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Environment-based path configuration
#[derive(Debug, Clone)]
pub struct EnvPaths {
    pub data_path: PathBuf,
    pub configuration_path: PathBuf,
}

impl EnvPaths {
    /// Load paths from environment variables with defaults
    pub fn load() -> Result<Self> {
        Self::load_with_base(None)
    }

    /// Load paths from environment variables with an optional base directory
    /// This is primarily for testing purposes
    pub fn load_with_base(base_dir: Option<PathBuf>) -> Result<Self> {
        let base = if let Some(base) = base_dir {
            base
        } else {
            // Try to load .env file if it exists in current directory
            if let Ok(env_path) = env::current_dir() {
                let env_file = env_path.join(".env");
                if env_file.exists() {
                    dotenv::from_path(&env_file).ok();
                }
            }
            env::current_dir().context("Failed to get current directory")?
        };

        Ok(Self {
            data_path: Self::get_path_from_env("DATA_PATH", "./data", &base),
            configuration_path: Self::get_path_from_env("CONFIGURATION_PATH", "./config", &base),
        })
    }

    /// Get a path from environment variable or use default
    fn get_path_from_env(var_name: &str, default: &str, base_dir: &Path) -> PathBuf {
        let path_str = env::var(var_name).unwrap_or_else(|_| default.to_string());
        let path = PathBuf::from(path_str);

        // If the path is relative, make it relative to the base directory
        if path.is_relative() {
            base_dir.join(path)
        } else {
            path
        }
    }

    /// Default database location when the configuration names none
    pub fn database_path(&self) -> PathBuf {
        self.data_path.join("classgate.db")
    }

    /// Get the logs directory path
    pub fn logs_path(&self) -> PathBuf {
        self.data_path.join("logs")
    }

    /// Configuration file for the named environment
    pub fn config_file(&self, environment: &str) -> PathBuf {
        self.configuration_path
            .join(format!("config.{}.yaml", environment))
    }
}

/// Get the current environment name (dev, production, ...)
pub fn get_environment() -> String {
    env::var("APP_ENV")
        .unwrap_or_else(|_| env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Use a mutex to ensure tests don't interfere with each other's environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_env_paths_with_base_dir() {
        let _guard = ENV_MUTEX.lock().unwrap();

        let temp_dir = TempDir::new().unwrap();
        let base_path = temp_dir.path().to_path_buf();

        env::remove_var("DATA_PATH");
        env::remove_var("CONFIGURATION_PATH");

        let paths = EnvPaths::load_with_base(Some(base_path.clone())).unwrap();

        assert_eq!(paths.data_path, base_path.join("data"));
        assert_eq!(paths.configuration_path, base_path.join("config"));
        assert_eq!(paths.database_path(), base_path.join("data/classgate.db"));
        assert_eq!(paths.logs_path(), base_path.join("data/logs"));
        assert_eq!(
            paths.config_file("production"),
            base_path.join("config/config.production.yaml")
        );
    }

    #[test]
    fn test_env_paths_with_absolute_env_vars() {
        let _guard = ENV_MUTEX.lock().unwrap();

        let temp_dir = TempDir::new().unwrap();
        let temp_path = temp_dir.path();

        env::set_var("DATA_PATH", temp_path.join("custom_data").to_str().unwrap());
        env::set_var(
            "CONFIGURATION_PATH",
            temp_path.join("custom_config").to_str().unwrap(),
        );

        let paths = EnvPaths::load_with_base(Some(PathBuf::from("/elsewhere"))).unwrap();

        // When absolute paths are provided, they should be used as-is
        assert_eq!(paths.data_path, temp_path.join("custom_data"));
        assert_eq!(paths.configuration_path, temp_path.join("custom_config"));

        env::remove_var("DATA_PATH");
        env::remove_var("CONFIGURATION_PATH");
    }

    #[test]
    fn test_get_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();

        env::remove_var("ENVIRONMENT");
        env::remove_var("APP_ENV");
        assert_eq!(get_environment(), "dev");

        env::set_var("ENVIRONMENT", "production");
        assert_eq!(get_environment(), "production");

        // APP_ENV wins over ENVIRONMENT
        env::set_var("APP_ENV", "staging");
        assert_eq!(get_environment(), "staging");

        env::remove_var("ENVIRONMENT");
        env::remove_var("APP_ENV");
    }
}
