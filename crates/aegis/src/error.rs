use std::path::PathBuf;
use thiserror::Error;

pub use crate::db::DatabaseError;
pub use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum AegisError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl AegisError {
    /// The validation failure behind this error, if any.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            AegisError::Database(DatabaseError::Validation(e)) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for AegisError {
    fn from(err: ValidationError) -> Self {
        AegisError::Database(DatabaseError::Validation(err))
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, AegisError>;
