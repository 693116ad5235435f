use crate::{Database, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Tables backing the resource store.
///
/// Parent reference columns are nullable and carry no foreign keys, so an
/// orphaned row can exist. The authorization engine reports such rows as a
/// broken ownership chain.
const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS projects (
        id INTEGER PRIMARY KEY,
        teacher_id INTEGER NOT NULL,
        school_id INTEGER,
        is_public INTEGER NOT NULL DEFAULT 0
    )"#,
    r#"CREATE TABLE IF NOT EXISTS milestones (
        id INTEGER PRIMARY KEY,
        project_id INTEGER
    )"#,
    r#"CREATE TABLE IF NOT EXISTS assessments (
        id INTEGER PRIMARY KEY,
        milestone_id INTEGER
    )"#,
    r#"CREATE TABLE IF NOT EXISTS submissions (
        id INTEGER PRIMARY KEY,
        student_id INTEGER NOT NULL,
        assessment_id INTEGER
    )"#,
    r#"CREATE TABLE IF NOT EXISTS teams (
        id INTEGER PRIMARY KEY,
        project_id INTEGER
    )"#,
    r#"CREATE TABLE IF NOT EXISTS team_members (
        id INTEGER PRIMARY KEY,
        team_id INTEGER,
        student_id INTEGER NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS project_assignments (
        project_id INTEGER NOT NULL,
        student_id INTEGER NOT NULL,
        PRIMARY KEY (project_id, student_id)
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_team_members_student ON team_members (student_id)",
    "CREATE INDEX IF NOT EXISTS idx_teams_project ON teams (project_id)",
];

/// Database initialization configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Whether to create tables on initialization
    pub create_tables: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data").join("classgate.db"),
            create_tables: true,
        }
    }
}

impl DatabaseConfig {
    /// Create a new database configuration with default paths
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom database path
    pub fn with_database_path(mut self, path: PathBuf) -> Self {
        self.database_path = path;
        self
    }

    /// Set whether to create tables on initialization
    pub fn with_create_tables(mut self, create: bool) -> Self {
        self.create_tables = create;
        self
    }
}

/// Initialize the database with the given configuration
pub async fn initialize_database(config: DatabaseConfig) -> Result<Arc<Database>> {
    info!("Initializing database with configuration");

    let db_path_str = config
        .database_path
        .to_str()
        .ok_or_else(|| crate::DatabaseError::Other("Invalid database path".into()))?;

    let db = Arc::new(Database::new(db_path_str).await?);
    info!("Database connection established");

    if config.create_tables {
        create_tables(&db).await?;
    }

    Ok(db)
}

/// Create the resource tables if they do not exist yet
pub async fn create_tables(db: &Database) -> Result<()> {
    info!("Creating resource tables");

    for statement in SCHEMA {
        sqlx::query(*statement)
            .execute(db.pool())
            .await
            .map_err(|e| crate::DatabaseError::TableCreation(e.to_string()))?;
    }

    Ok(())
}
