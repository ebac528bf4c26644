//! Field- and record-level validation run before every write.
//!
//! Repositories call these helpers from their `create`/`update` functions,
//! so an invalid record never reaches the store.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::model::{FieldType, RunStatus};

static RE_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@(?:localhost|[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+)$",
    )
    .unwrap()
});

/// Longest address accepted for an email field.
pub const EMAIL_MAX_LEN: usize = 254;

/// Errors raised before a record is persisted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Script '{location}' doesn't exist")]
    ScriptNotFound { location: String },

    #[error("Value '{value}' of '{field_name}' does not match field type {field_type}")]
    ValueTypeMismatch {
        field_name: String,
        field_type: FieldType,
        value: String,
    },

    #[error("At least one of value or custom value is required for '{field_name}'")]
    MissingValue { field_name: String },

    #[error("Field '{field}' must not be blank")]
    Blank { field: &'static str },

    #[error("Field '{field}' is {actual} characters long, at most {max} allowed")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("Field '{field}' is not a valid email address: '{value}'")]
    InvalidEmail { field: &'static str, value: String },

    #[error("SMTP port must be non-zero")]
    InvalidPort,

    #[error("A job needs at least one 'to' recipient")]
    NoRecipients,

    #[error("Run cannot finish with status '{0}'")]
    NotTerminal(RunStatus),
}

/// Treats empty strings like absent values.
pub(crate) fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Fails when a required text field is empty or whitespace only.
pub fn required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank { field });
    }
    Ok(())
}

/// Fails when `value` has more than `max` characters.
pub fn max_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong { field, max, actual });
    }
    Ok(())
}

/// Required text field with a length bound.
pub fn required_max_len(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    required(field, value)?;
    max_len(field, value, max)
}

/// Length bound on an optional text field.
pub fn optional_max_len(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<(), ValidationError> {
    match value {
        Some(v) => max_len(field, v, max),
        None => Ok(()),
    }
}

pub fn email(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.chars().count() > EMAIL_MAX_LEN || !RE_EMAIL.is_match(value) {
        return Err(ValidationError::InvalidEmail {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Checks that a python job's script exists on disk right now.
///
/// Non-python jobs are not checked. This performs a synchronous
/// filesystem lookup.
pub fn script_location(
    is_python_script: bool,
    location: Option<&str>,
) -> Result<(), ValidationError> {
    if !is_python_script {
        return Ok(());
    }
    match present(location) {
        Some(path) if Path::new(path).exists() => Ok(()),
        other => Err(ValidationError::ScriptNotFound {
            location: other.unwrap_or_default().to_string(),
        }),
    }
}

/// Checks a job parameter's value against its declared type.
///
/// Empty strings count as unset. `custom_value` is free text and is never
/// type checked.
pub fn conf_value(
    field_name: &str,
    field_type: FieldType,
    value: Option<&str>,
    custom_value: Option<&str>,
) -> Result<(), ValidationError> {
    let value = present(value);
    if let Some(v) = value {
        if !field_type.accepts(v) {
            return Err(ValidationError::ValueTypeMismatch {
                field_name: field_name.to_string(),
                field_type,
                value: v.to_string(),
            });
        }
    }
    if value.is_none() && present(custom_value).is_none() {
        return Err(ValidationError::MissingValue {
            field_name: field_name.to_string(),
        });
    }
    Ok(())
}
