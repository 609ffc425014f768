//! Repository errors and their mapping onto the store port errors.

use paysettle_core::store::StoreError;
use sea_orm::{DbErr, SqlErr};
use uuid::Uuid;

/// Error types for repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Row changed since it was read.
    #[error("{entity} {id} was modified concurrently (expected version {expected}, found {actual})")]
    VersionConflict {
        /// Table name.
        entity: &'static str,
        /// Row ID.
        id: Uuid,
        /// Version the caller read.
        expected: i64,
        /// Version currently stored.
        actual: i64,
    },

    /// Row does not exist.
    #[error("{entity} {id} does not exist")]
    NotFound {
        /// Table name.
        entity: &'static str,
        /// Row ID.
        id: Uuid,
    },

    /// Primary key or unique constraint violated.
    #[error("{entity} {id} already exists")]
    Duplicate {
        /// Table name.
        entity: &'static str,
        /// Row ID.
        id: Uuid,
    },

    /// A stored column holds a value the domain does not know.
    #[error("Invalid value '{value}' in column {column}")]
    InvalidValue {
        /// Column name.
        column: &'static str,
        /// Offending value.
        value: String,
    },

    /// Document column could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl RepositoryError {
    /// Maps a unique violation on insert to `Duplicate`.
    pub(crate) fn on_insert(err: DbErr, entity: &'static str, id: Uuid) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::Duplicate { entity, id },
            _ => Self::Database(err),
        }
    }

    pub(crate) fn invalid(column: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            column,
            value: value.into(),
        }
    }
}

impl From<RepositoryError> for StoreError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::VersionConflict {
                entity,
                id,
                expected,
                actual,
            } => Self::VersionConflict {
                entity,
                id,
                expected,
                actual,
            },
            RepositoryError::NotFound { entity, id } => Self::Missing { entity, id },
            RepositoryError::Duplicate { entity, id } => Self::Duplicate { entity, id },
            RepositoryError::Serialization(e) => Self::Serialization(e.to_string()),
            err @ RepositoryError::InvalidValue { .. } => Self::Serialization(err.to_string()),
            RepositoryError::Database(e) => Self::Database(e.to_string()),
        }
    }
}
