//! Database error types for pal-db.

use pal_core::errors::CoreError;
use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed or returned unparseable data.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Input rejected before touching storage.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A storage-level invariant was violated (duplicate membership, second
    /// valid link, ...).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid state encountered (e.g., bad data in DB).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    pub(crate) fn not_found(entity: &str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.into(),
        }
    }
}

/// Constraint violations surface as [`DatabaseError::Conflict`]; everything
/// else stays a storage failure.
impl From<libsql::Error> for DatabaseError {
    fn from(e: libsql::Error) -> Self {
        let msg = e.to_string();
        if msg.contains("UNIQUE constraint failed") || msg.contains("PRIMARY KEY constraint failed")
        {
            Self::Conflict(msg)
        } else {
            Self::LibSql(e)
        }
    }
}

impl From<CoreError> for DatabaseError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Validation(msg) => Self::Validation(msg),
        }
    }
}

impl From<serde_json::Error> for DatabaseError {
    fn from(e: serde_json::Error) -> Self {
        Self::Other(e.into())
    }
}

#[cfg(test)]
mod tests {
    use pal_core::rating::Rating;

    use super::*;

    #[test]
    fn rating_errors_become_validation_failures() {
        let err: DatabaseError = Rating::try_from(7u8).unwrap_err().into();
        assert!(matches!(err, DatabaseError::Validation(ref msg) if msg.contains('7')), "{err:?}");
    }
}
