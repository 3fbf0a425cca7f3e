//! Database error types.

use thiserror::Error;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A stored row failed validation when loaded.
    #[error("corrupt {entity} record {id}: {reason}")]
    Corrupt {
        entity: &'static str,
        id: String,
        reason: String,
    },

    /// Filesystem error while reading legacy data files.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Legacy data file was not valid JSON.
    #[error("invalid legacy data: {0}")]
    Json(#[from] serde_json::Error),
}

impl DatabaseError {
    pub(crate) fn corrupt(entity: &'static str, id: impl ToString, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            entity,
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
