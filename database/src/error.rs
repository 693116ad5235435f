use thiserror::Error;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Seed parsing error: {0}")]
    SeedParsing(String),

    #[error("Table creation error: {0}")]
    TableCreation(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// Store faults reach the authorization engine as opaque [`authz::StoreError`]s.
impl From<DatabaseError> for authz::StoreError {
    fn from(err: DatabaseError) -> Self {
        authz::StoreError::new(err.to_string())
    }
}
