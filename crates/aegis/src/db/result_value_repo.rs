//! Result value repository: output values captured from one run.
//!
//! The same name may be recorded several times for a run as long as the
//! values differ; an exact `(run, name, value)` repeat is rejected.

use rusqlite::{params, Row};
use serde::Serialize;

use super::{expect_affected, query_all, query_opt, Database, DatabaseError};
use crate::validation;

pub const NAME_MAX_LEN: usize = 100;
pub const VALUE_MAX_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultValueRow {
    pub id: i64,
    pub run_id: i64,
    pub name: String,
    pub value: String,
}

impl ResultValueRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            run_id: row.get("runningjob_id")?,
            name: row.get("name")?,
            value: row.get("value")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewResultValue {
    pub run_id: i64,
    pub name: String,
    pub value: String,
}

impl NewResultValue {
    pub fn new(run_id: i64, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            run_id,
            name: name.into(),
            value: value.into(),
        }
    }
}

fn validate(name: &str, value: &str) -> Result<(), DatabaseError> {
    validation::required_max_len("name", name, NAME_MAX_LEN)?;
    validation::required_max_len("value", value, VALUE_MAX_LEN)?;
    Ok(())
}

pub fn create(db: &Database, new: &NewResultValue) -> Result<ResultValueRow, DatabaseError> {
    validate(&new.name, &new.value)?;
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO job_result_value (runningjob_id, name, value) VALUES (?1, ?2, ?3)",
            params![new.run_id, new.name, new.value],
        )?;
        Ok(ResultValueRow {
            id: conn.last_insert_rowid(),
            run_id: new.run_id,
            name: new.name.clone(),
            value: new.value.clone(),
        })
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<ResultValueRow>, DatabaseError> {
    db.with_conn(|conn| {
        query_opt(
            conn,
            "SELECT * FROM job_result_value WHERE id = ?1",
            params![id],
            ResultValueRow::from_row,
        )
    })
}

/// Values captured for a run, in insertion order.
pub fn list_for_run(db: &Database, run_id: i64) -> Result<Vec<ResultValueRow>, DatabaseError> {
    db.with_conn(|conn| {
        query_all(
            conn,
            "SELECT * FROM job_result_value WHERE runningjob_id = ?1 ORDER BY id",
            params![run_id],
            ResultValueRow::from_row,
        )
    })
}

pub fn update(db: &Database, row: &ResultValueRow) -> Result<(), DatabaseError> {
    validate(&row.name, &row.value)?;
    db.with_conn(|conn| {
        let affected = conn.execute(
            "UPDATE job_result_value SET runningjob_id = ?2, name = ?3, value = ?4 WHERE id = ?1",
            params![row.id, row.run_id, row.name, row.value],
        )?;
        expect_affected(affected, "job_result_value", row.id)
    })
}

pub fn delete(db: &Database, id: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute("DELETE FROM job_result_value WHERE id = ?1", params![id])?;
        expect_affected(affected, "job_result_value", id)
    })
}
