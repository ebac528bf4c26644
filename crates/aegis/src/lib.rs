//! Persistent data model for the Aegis job scheduling and alerting admin.
//!
//! Operators own jobs, jobs belong to categories, and each job carries a
//! crontab-style schedule, alert mail recipients, typed script parameters
//! and declared result fields. An external runner records every execution
//! attempt as a run with log lines and captured result values.
//!
//! All storage goes through [`Database`] and the per-table repositories in
//! [`db`]. Their `create`/`update` functions validate before writing.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod validation;

pub use config::{load_config, load_config_from_str, Config, LogFormat, LoggingConfig};
pub use db::{default_database_path, ConstraintKind, Database, DatabaseError};
pub use error::{AegisError, ConfigError, Result};
pub use model::{FieldType, LogLevel, RecipientRole, RunStatus};
pub use validation::ValidationError;
