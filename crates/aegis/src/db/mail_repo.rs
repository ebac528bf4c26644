//! Mail recipient repository: CRUD operations for the `mailid` table.

use std::fmt;

use rusqlite::{params, Row};
use serde::Serialize;

use super::{expect_affected, query_all, query_opt, Database, DatabaseError};
use crate::validation;

pub const NAME_MAX_LEN: usize = 100;

/// A reusable alert mail recipient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MailIdRow {
    pub id: i64,
    pub email_id: String,
    pub name: Option<String>,
}

impl MailIdRow {
    pub(crate) fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            email_id: row.get("email_id")?,
            name: row.get("name")?,
        })
    }
}

/// Formats as a mailbox, e.g. `Ops Team <ops@example.com>`.
impl fmt::Display for MailIdRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => write!(f, "{} <{}>", name, self.email_id),
            None => f.write_str(&self.email_id),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewMailId {
    pub email_id: String,
    pub name: Option<String>,
}

impl NewMailId {
    pub fn new(email_id: impl Into<String>) -> Self {
        Self {
            email_id: email_id.into(),
            name: None,
        }
    }

    pub fn named(email_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email_id: email_id.into(),
            name: Some(name.into()),
        }
    }
}

fn validate(email_id: &str, name: Option<&str>) -> Result<(), DatabaseError> {
    validation::email("email_id", email_id)?;
    validation::optional_max_len("name", name, NAME_MAX_LEN)?;
    Ok(())
}

pub fn create(db: &Database, new: &NewMailId) -> Result<MailIdRow, DatabaseError> {
    validate(&new.email_id, new.name.as_deref())?;
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO mailid (email_id, name) VALUES (?1, ?2)",
            params![new.email_id, new.name],
        )?;
        Ok(MailIdRow {
            id: conn.last_insert_rowid(),
            email_id: new.email_id.clone(),
            name: new.name.clone(),
        })
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<MailIdRow>, DatabaseError> {
    db.with_conn(|conn| {
        query_opt(
            conn,
            "SELECT * FROM mailid WHERE id = ?1",
            params![id],
            MailIdRow::from_row,
        )
    })
}

pub fn find_by_email(db: &Database, email_id: &str) -> Result<Option<MailIdRow>, DatabaseError> {
    db.with_conn(|conn| {
        query_opt(
            conn,
            "SELECT * FROM mailid WHERE email_id = ?1",
            params![email_id],
            MailIdRow::from_row,
        )
    })
}

pub fn list(db: &Database) -> Result<Vec<MailIdRow>, DatabaseError> {
    db.with_conn(|conn| {
        query_all(
            conn,
            "SELECT * FROM mailid ORDER BY email_id",
            [],
            MailIdRow::from_row,
        )
    })
}

pub fn update(db: &Database, row: &MailIdRow) -> Result<(), DatabaseError> {
    validate(&row.email_id, row.name.as_deref())?;
    db.with_conn(|conn| {
        let affected = conn.execute(
            "UPDATE mailid SET email_id = ?2, name = ?3 WHERE id = ?1",
            params![row.id, row.email_id, row.name],
        )?;
        expect_affected(affected, "mailid", row.id)
    })
}

/// Deletes a recipient. Fails while any job still lists it.
pub fn delete(db: &Database, id: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute("DELETE FROM mailid WHERE id = ?1", params![id])?;
        expect_affected(affected, "mailid", id)
    })
}
