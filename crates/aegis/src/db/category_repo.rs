//! Category repository: CRUD operations for the `category` table.

use std::fmt;

use rusqlite::{params, Row};
use serde::Serialize;

use super::{expect_affected, query_all, query_opt, Database, DatabaseError};
use crate::validation;

pub const NAME_MAX_LEN: usize = 100;

/// A category row. Groups jobs by purpose (alerts, reports, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl fmt::Display for CategoryRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl CategoryRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
        })
    }
}

/// Input for [`create`].
#[derive(Debug, Clone, Default)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
}

impl NewCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

fn validate(name: &str) -> Result<(), DatabaseError> {
    validation::required_max_len("name", name, NAME_MAX_LEN)?;
    Ok(())
}

pub fn create(db: &Database, new: &NewCategory) -> Result<CategoryRow, DatabaseError> {
    validate(&new.name)?;
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO category (name, description) VALUES (?1, ?2)",
            params![new.name, new.description],
        )?;
        Ok(CategoryRow {
            id: conn.last_insert_rowid(),
            name: new.name.clone(),
            description: new.description.clone(),
        })
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<CategoryRow>, DatabaseError> {
    db.with_conn(|conn| {
        query_opt(
            conn,
            "SELECT * FROM category WHERE id = ?1",
            params![id],
            CategoryRow::from_row,
        )
    })
}

pub fn find_by_name(db: &Database, name: &str) -> Result<Option<CategoryRow>, DatabaseError> {
    db.with_conn(|conn| {
        query_opt(
            conn,
            "SELECT * FROM category WHERE name = ?1",
            params![name],
            CategoryRow::from_row,
        )
    })
}

/// Lists all categories ordered by name.
pub fn list(db: &Database) -> Result<Vec<CategoryRow>, DatabaseError> {
    db.with_conn(|conn| {
        query_all(
            conn,
            "SELECT * FROM category ORDER BY name",
            [],
            CategoryRow::from_row,
        )
    })
}

pub fn update(db: &Database, row: &CategoryRow) -> Result<(), DatabaseError> {
    validate(&row.name)?;
    db.with_conn(|conn| {
        let affected = conn.execute(
            "UPDATE category SET name = ?2, description = ?3 WHERE id = ?1",
            params![row.id, row.name, row.description],
        )?;
        expect_affected(affected, "category", row.id)
    })
}

/// Deletes a category. Fails with a foreign-key violation while jobs
/// still reference it.
pub fn delete(db: &Database, id: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute("DELETE FROM category WHERE id = ?1", params![id])?;
        expect_affected(affected, "category", id)
    })
}
