//! Value types shared by the repositories.
//!
//! Each enum has a stable on-disk code (the single-character or numeric
//! representation stored in SQLite) and converts to and from it through
//! `rusqlite`'s `ToSql`/`FromSql`.

use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An on-disk code that does not map to any known variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind} code '{code}'")]
pub struct UnknownCode {
    pub kind: &'static str,
    pub code: String,
}

/// Declared type of a job parameter or result field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Int,
    Str,
    Float,
}

impl FieldType {
    pub fn code(self) -> &'static str {
        match self {
            FieldType::Int => "I",
            FieldType::Str => "S",
            FieldType::Float => "F",
        }
    }

    pub fn from_code(code: &str) -> Result<Self, UnknownCode> {
        match code {
            "I" => Ok(FieldType::Int),
            "S" => Ok(FieldType::Str),
            "F" => Ok(FieldType::Float),
            other => Err(UnknownCode {
                kind: "field type",
                code: other.to_string(),
            }),
        }
    }

    /// Returns true when `value` can be read as this type.
    ///
    /// Surrounding whitespace is ignored. Integers may be arbitrarily long
    /// and carry a leading sign; floats accept anything `f64` parses,
    /// including `inf` and `nan`.
    pub fn accepts(self, value: &str) -> bool {
        let trimmed = value.trim();
        match self {
            FieldType::Str => true,
            FieldType::Int => {
                let digits = trimmed
                    .strip_prefix('-')
                    .or_else(|| trimmed.strip_prefix('+'))
                    .unwrap_or(trimmed);
                !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
            }
            FieldType::Float => trimmed.parse::<f64>().is_ok(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Int => "int",
            FieldType::Str => "str",
            FieldType::Float => "float",
        };
        f.write_str(name)
    }
}

/// State of one execution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Executing,
    Failed,
    Success,
}

impl RunStatus {
    pub fn code(self) -> &'static str {
        match self {
            RunStatus::Executing => "E",
            RunStatus::Failed => "F",
            RunStatus::Success => "S",
        }
    }

    pub fn from_code(code: &str) -> Result<Self, UnknownCode> {
        match code {
            "E" => Ok(RunStatus::Executing),
            "F" => Ok(RunStatus::Failed),
            "S" => Ok(RunStatus::Success),
            other => Err(UnknownCode {
                kind: "run status",
                code: other.to_string(),
            }),
        }
    }

    /// Human-readable label shown to operators.
    pub fn label(self) -> &'static str {
        match self {
            RunStatus::Executing => "On Execution",
            RunStatus::Failed => "Failed",
            RunStatus::Success => "Success",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, RunStatus::Executing)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Severity of a run log line, using the numeric levels of the runner's
/// logging framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    NotSet,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn code(self) -> i64 {
        match self {
            LogLevel::NotSet => 0,
            LogLevel::Debug => 10,
            LogLevel::Info => 20,
            LogLevel::Warning => 30,
            LogLevel::Error => 40,
            LogLevel::Critical => 50,
        }
    }

    pub fn from_code(code: i64) -> Result<Self, UnknownCode> {
        match code {
            0 => Ok(LogLevel::NotSet),
            10 => Ok(LogLevel::Debug),
            20 => Ok(LogLevel::Info),
            30 => Ok(LogLevel::Warning),
            40 => Ok(LogLevel::Error),
            50 => Ok(LogLevel::Critical),
            other => Err(UnknownCode {
                kind: "log level",
                code: other.to_string(),
            }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LogLevel::NotSet => "NOTSET",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LogLevel {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NOTSET" => Ok(LogLevel::NotSet),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" | "FATAL" => Ok(LogLevel::Critical),
            _ => Err(UnknownCode {
                kind: "log level",
                code: s.to_string(),
            }),
        }
    }
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => LogLevel::Error,
            log::Level::Warn => LogLevel::Warning,
            log::Level::Info => LogLevel::Info,
            log::Level::Debug | log::Level::Trace => LogLevel::Debug,
        }
    }
}

/// Role a mail recipient plays for a job's alert mail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientRole {
    To,
    Cc,
    Bcc,
}

impl RecipientRole {
    pub const ALL: [RecipientRole; 3] = [RecipientRole::To, RecipientRole::Cc, RecipientRole::Bcc];

    /// Join table holding this role's recipients.
    pub(crate) fn table(self) -> &'static str {
        match self {
            RecipientRole::To => "sch_job_to_mail_ids",
            RecipientRole::Cc => "sch_job_cc_mail_ids",
            RecipientRole::Bcc => "sch_job_bcc_mail_ids",
        }
    }
}

fn text_column<'a>(value: ValueRef<'a>) -> FromSqlResult<&'a str> {
    value.as_str()
}

impl ToSql for FieldType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for FieldType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let code = text_column(value)?;
        FieldType::from_code(code).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for RunStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for RunStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let code = text_column(value)?;
        RunStatus::from_code(code).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for LogLevel {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for LogLevel {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let code = value.as_i64()?;
        LogLevel::from_code(code).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_codes() {
        for ft in [FieldType::Int, FieldType::Str, FieldType::Float] {
            assert_eq!(FieldType::from_code(ft.code()).unwrap(), ft);
        }
        assert!(FieldType::from_code("X").is_err());
    }

    #[test]
    fn test_int_accepts() {
        assert!(FieldType::Int.accepts("42"));
        assert!(FieldType::Int.accepts(" -7 "));
        assert!(FieldType::Int.accepts("+3"));
        assert!(FieldType::Int.accepts("123456789012345678901234567890"));
        assert!(!FieldType::Int.accepts("abc"));
        assert!(!FieldType::Int.accepts("4.2"));
        assert!(!FieldType::Int.accepts("-"));
        assert!(!FieldType::Int.accepts(""));
    }

    #[test]
    fn test_float_accepts() {
        assert!(FieldType::Float.accepts("4.2"));
        assert!(FieldType::Float.accepts("42"));
        assert!(FieldType::Float.accepts("1e-3"));
        assert!(!FieldType::Float.accepts("four"));
    }

    #[test]
    fn test_str_accepts_anything() {
        assert!(FieldType::Str.accepts("abc"));
        assert!(FieldType::Str.accepts(""));
    }

    #[test]
    fn test_run_status_default_and_labels() {
        assert_eq!(RunStatus::default(), RunStatus::Executing);
        assert_eq!(RunStatus::Executing.to_string(), "On Execution");
        assert!(!RunStatus::Executing.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert_eq!(RunStatus::from_code("S").unwrap(), RunStatus::Success);
    }

    #[test]
    fn test_log_level_codes() {
        assert_eq!(LogLevel::Warning.code(), 30);
        assert_eq!(LogLevel::from_code(50).unwrap(), LogLevel::Critical);
        assert!(LogLevel::from_code(15).is_err());
        assert_eq!("warn".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!(LogLevel::from(log::Level::Trace), LogLevel::Debug);
        assert!(LogLevel::Error > LogLevel::Info);
    }
}
