//! Operator repository: the teams or people that own jobs.

use std::fmt;

use rusqlite::{params, Row};
use serde::Serialize;

use super::{expect_affected, query_all, query_opt, Database, DatabaseError};
use crate::validation;

pub const NAME_MAX_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperatorRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl fmt::Display for OperatorRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl OperatorRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewOperator {
    pub name: String,
    pub description: Option<String>,
}

impl NewOperator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

pub fn create(db: &Database, new: &NewOperator) -> Result<OperatorRow, DatabaseError> {
    validation::required_max_len("name", &new.name, NAME_MAX_LEN)?;
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO operator (name, description) VALUES (?1, ?2)",
            params![new.name, new.description],
        )?;
        Ok(OperatorRow {
            id: conn.last_insert_rowid(),
            name: new.name.clone(),
            description: new.description.clone(),
        })
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<OperatorRow>, DatabaseError> {
    db.with_conn(|conn| {
        query_opt(
            conn,
            "SELECT * FROM operator WHERE id = ?1",
            params![id],
            OperatorRow::from_row,
        )
    })
}

pub fn find_by_name(db: &Database, name: &str) -> Result<Option<OperatorRow>, DatabaseError> {
    db.with_conn(|conn| {
        query_opt(
            conn,
            "SELECT * FROM operator WHERE name = ?1",
            params![name],
            OperatorRow::from_row,
        )
    })
}

pub fn list(db: &Database) -> Result<Vec<OperatorRow>, DatabaseError> {
    db.with_conn(|conn| {
        query_all(
            conn,
            "SELECT * FROM operator ORDER BY name",
            [],
            OperatorRow::from_row,
        )
    })
}

pub fn update(db: &Database, row: &OperatorRow) -> Result<(), DatabaseError> {
    validation::required_max_len("name", &row.name, NAME_MAX_LEN)?;
    db.with_conn(|conn| {
        let affected = conn.execute(
            "UPDATE operator SET name = ?2, description = ?3 WHERE id = ?1",
            params![row.id, row.name, row.description],
        )?;
        expect_affected(affected, "operator", row.id)
    })
}

pub fn delete(db: &Database, id: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute("DELETE FROM operator WHERE id = ?1", params![id])?;
        expect_affected(affected, "operator", id)
    })
}
