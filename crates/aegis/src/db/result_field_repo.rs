//! Result field repository: the outputs a job declares it will produce.

use rusqlite::{params, Row};
use serde::Serialize;

use super::{expect_affected, query_all, query_opt, Database, DatabaseError};
use crate::model::FieldType;
use crate::validation;

pub const FIELD_NAME_MAX_LEN: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultFieldRow {
    pub id: i64,
    pub job_id: i64,
    pub field_name: String,
    pub field_type: FieldType,
}

impl ResultFieldRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            job_id: row.get("job_id")?,
            field_name: row.get("field_name")?,
            field_type: row.get("field_type")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewResultField {
    pub job_id: i64,
    pub field_name: String,
    pub field_type: FieldType,
}

pub fn create(db: &Database, new: &NewResultField) -> Result<ResultFieldRow, DatabaseError> {
    validation::required_max_len("field_name", &new.field_name, FIELD_NAME_MAX_LEN)?;
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO job_result_field (job_id, field_name, field_type) VALUES (?1, ?2, ?3)",
            params![new.job_id, new.field_name, new.field_type],
        )?;
        Ok(ResultFieldRow {
            id: conn.last_insert_rowid(),
            job_id: new.job_id,
            field_name: new.field_name.clone(),
            field_type: new.field_type,
        })
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<ResultFieldRow>, DatabaseError> {
    db.with_conn(|conn| {
        query_opt(
            conn,
            "SELECT * FROM job_result_field WHERE id = ?1",
            params![id],
            ResultFieldRow::from_row,
        )
    })
}

pub fn list_for_job(db: &Database, job_id: i64) -> Result<Vec<ResultFieldRow>, DatabaseError> {
    db.with_conn(|conn| {
        query_all(
            conn,
            "SELECT * FROM job_result_field WHERE job_id = ?1 ORDER BY field_name",
            params![job_id],
            ResultFieldRow::from_row,
        )
    })
}

pub fn update(db: &Database, row: &ResultFieldRow) -> Result<(), DatabaseError> {
    validation::required_max_len("field_name", &row.field_name, FIELD_NAME_MAX_LEN)?;
    db.with_conn(|conn| {
        let affected = conn.execute(
            "UPDATE job_result_field SET job_id = ?2, field_name = ?3, field_type = ?4
             WHERE id = ?1",
            params![row.id, row.job_id, row.field_name, row.field_type],
        )?;
        expect_affected(affected, "job_result_field", row.id)
    })
}

pub fn delete(db: &Database, id: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute("DELETE FROM job_result_field WHERE id = ?1", params![id])?;
        expect_affected(affected, "job_result_field", id)
    })
}
