//! Database error types.

use std::fmt;
use std::path::PathBuf;

use rusqlite::ffi;
use thiserror::Error;

use crate::validation::ValidationError;

const FOREIGN_KEY_FAILED: &str = "FOREIGN KEY constraint failed";

/// Which integrity rule a rejected write broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    PrimaryKey,
    ForeignKey,
    NotNull,
    Check,
    Other,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintKind::Unique => "unique",
            ConstraintKind::PrimaryKey => "primary key",
            ConstraintKind::ForeignKey => "foreign key",
            ConstraintKind::NotNull => "not null",
            ConstraintKind::Check => "check",
            ConstraintKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// Errors from database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// SQLite error from rusqlite that is not a constraint violation.
    #[error("SQLite error: {0}")]
    Sqlite(rusqlite::Error),

    /// A write was rejected by a uniqueness, foreign-key or other constraint.
    #[error("{kind} constraint violated: {message}")]
    Constraint {
        kind: ConstraintKind,
        message: String,
    },

    /// The record failed validation and was not written.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// No row with the given id exists.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// IO error when creating directories or files.
    #[error("IO error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A migration failed to apply.
    #[error("Migration failed at version {version}: {reason}")]
    Migration { version: u32, reason: String },

    /// The database lock was poisoned.
    #[error("Database lock poisoned")]
    LockPoisoned,
}

impl DatabaseError {
    /// Returns the violated constraint kind, if this is a constraint error.
    pub fn constraint_kind(&self) -> Option<ConstraintKind> {
        match self {
            DatabaseError::Constraint { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self.constraint_kind(),
            Some(ConstraintKind::Unique | ConstraintKind::PrimaryKey)
        )
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        self.constraint_kind() == Some(ConstraintKind::ForeignKey)
    }
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref failure, ref message) = err {
            if failure.code == rusqlite::ErrorCode::ConstraintViolation {
                let kind = match failure.extended_code {
                    ffi::SQLITE_CONSTRAINT_UNIQUE => ConstraintKind::Unique,
                    ffi::SQLITE_CONSTRAINT_PRIMARYKEY => ConstraintKind::PrimaryKey,
                    ffi::SQLITE_CONSTRAINT_FOREIGNKEY => ConstraintKind::ForeignKey,
                    ffi::SQLITE_CONSTRAINT_NOTNULL => ConstraintKind::NotNull,
                    ffi::SQLITE_CONSTRAINT_CHECK => ConstraintKind::Check,
                    // RESTRICT actions fail with the bare constraint code.
                    _ if message.as_deref() == Some(FOREIGN_KEY_FAILED) => {
                        ConstraintKind::ForeignKey
                    }
                    _ => ConstraintKind::Other,
                };
                return DatabaseError::Constraint {
                    kind,
                    message: message.clone().unwrap_or_else(|| failure.to_string()),
                };
            }
        }
        DatabaseError::Sqlite(err)
    }
}
