//! Job parameter repository: CRUD operations for the `job_config` table.
//!
//! Parameters are handed to a job's script at run time. Each has a declared
//! type; a typed `value` must parse as that type, while `custom_value` is
//! free text (a query, a template, ...). At least one of the two is required.

use std::fmt;

use rusqlite::{params, Row};
use serde::Serialize;

use super::{expect_affected, query_all, query_opt, Database, DatabaseError};
use crate::model::FieldType;
use crate::validation;

pub const FIELD_NAME_MAX_LEN: usize = 30;
pub const VALUE_MAX_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobConfRow {
    pub id: i64,
    pub job_id: i64,
    pub field_name: String,
    pub field_type: FieldType,
    pub value: Option<String>,
    pub custom_value: Option<String>,
}

impl JobConfRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            job_id: row.get("job_id")?,
            field_name: row.get("field_name")?,
            field_type: row.get("field_type")?,
            value: row.get("value")?,
            custom_value: row.get("custom_value")?,
        })
    }
}

impl fmt::Display for JobConfRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            self.field_name,
            self.value.as_deref().unwrap_or_default()
        )
    }
}

#[derive(Debug, Clone)]
pub struct NewJobConf {
    pub job_id: i64,
    pub field_name: String,
    pub field_type: FieldType,
    pub value: Option<String>,
    pub custom_value: Option<String>,
}

impl NewJobConf {
    /// A parameter with a typed value.
    pub fn typed(
        job_id: i64,
        field_name: impl Into<String>,
        field_type: FieldType,
        value: impl Into<String>,
    ) -> Self {
        Self {
            job_id,
            field_name: field_name.into(),
            field_type,
            value: Some(value.into()),
            custom_value: None,
        }
    }

    /// A parameter carrying only free-text custom content.
    pub fn custom(
        job_id: i64,
        field_name: impl Into<String>,
        field_type: FieldType,
        custom_value: impl Into<String>,
    ) -> Self {
        Self {
            job_id,
            field_name: field_name.into(),
            field_type,
            value: None,
            custom_value: Some(custom_value.into()),
        }
    }
}

fn validate(
    field_name: &str,
    field_type: FieldType,
    value: Option<&str>,
    custom_value: Option<&str>,
) -> Result<(), DatabaseError> {
    validation::required_max_len("field_name", field_name, FIELD_NAME_MAX_LEN)?;
    validation::optional_max_len("value", value, VALUE_MAX_LEN)?;
    validation::conf_value(field_name, field_type, value, custom_value)?;
    Ok(())
}

pub fn create(db: &Database, new: &NewJobConf) -> Result<JobConfRow, DatabaseError> {
    validate(
        &new.field_name,
        new.field_type,
        new.value.as_deref(),
        new.custom_value.as_deref(),
    )?;
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO job_config (job_id, field_name, field_type, value, custom_value)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                new.job_id,
                new.field_name,
                new.field_type,
                new.value,
                new.custom_value,
            ],
        )?;
        Ok(JobConfRow {
            id: conn.last_insert_rowid(),
            job_id: new.job_id,
            field_name: new.field_name.clone(),
            field_type: new.field_type,
            value: new.value.clone(),
            custom_value: new.custom_value.clone(),
        })
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<JobConfRow>, DatabaseError> {
    db.with_conn(|conn| {
        query_opt(
            conn,
            "SELECT * FROM job_config WHERE id = ?1",
            params![id],
            JobConfRow::from_row,
        )
    })
}

/// All parameters of a job, ordered by field name.
pub fn list_for_job(db: &Database, job_id: i64) -> Result<Vec<JobConfRow>, DatabaseError> {
    db.with_conn(|conn| {
        query_all(
            conn,
            "SELECT * FROM job_config WHERE job_id = ?1 ORDER BY field_name",
            params![job_id],
            JobConfRow::from_row,
        )
    })
}

pub fn update(db: &Database, row: &JobConfRow) -> Result<(), DatabaseError> {
    validate(
        &row.field_name,
        row.field_type,
        row.value.as_deref(),
        row.custom_value.as_deref(),
    )?;
    db.with_conn(|conn| {
        let affected = conn.execute(
            "UPDATE job_config SET job_id = ?2, field_name = ?3, field_type = ?4,
             value = ?5, custom_value = ?6 WHERE id = ?1",
            params![
                row.id,
                row.job_id,
                row.field_name,
                row.field_type,
                row.value,
                row.custom_value,
            ],
        )?;
        expect_affected(affected, "job_config", row.id)
    })
}

pub fn delete(db: &Database, id: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute("DELETE FROM job_config WHERE id = ?1", params![id])?;
        expect_affected(affected, "job_config", id)
    })
}
