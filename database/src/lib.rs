use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

pub mod error;
pub mod init;
pub mod seed;
pub mod store;

pub use error::{DatabaseError, Result};

// Re-export initialization functions for convenience
pub use init::{create_tables, initialize_database, DatabaseConfig};
pub use seed::SeedData;
pub use store::SqliteResourceStore;

/// Database connection pool
#[derive(Debug)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection, creating the file if needed
    pub async fn new(database_path: &str) -> Result<Self> {
        // Ensure the data directory exists
        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Connecting to database at: {}", database_path);

        let connection_string = if database_path.starts_with("sqlite:") {
            database_path.to_string()
        } else if database_path.starts_with('/') {
            // Absolute paths need the sqlite:///path form
            format!("sqlite://{}", database_path)
        } else {
            format!("sqlite:{}", database_path)
        };

        debug!("Using connection string: {}", connection_string);

        let options = SqliteConnectOptions::from_str(&connection_string)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        debug!("Database connection established");

        Ok(Self { pool })
    }

    /// Open a private in-memory database.
    ///
    /// The pool is limited to a single connection because every SQLite
    /// in-memory connection is a separate database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        debug!("In-memory database opened");
        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Check if a table exists
    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let query = r#"
            SELECT COUNT(*) as count
            FROM sqlite_master
            WHERE type='table' AND name=?
        "#;

        let result: (i32,) = sqlx::query_as(query)
            .bind(table_name)
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0 > 0)
    }

    /// Round-trip a trivial query to confirm the store is reachable
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
