//! SMTP repository: outbound mail connection settings.
//!
//! These rows are process-wide: they are not tied to any job. The mail
//! sender uses [`current`] to pick the server.

use rusqlite::{params, Row};
use serde::Serialize;

use super::{expect_affected, query_all, query_opt, Database, DatabaseError};
use crate::validation::{self, ValidationError};

pub const SERVER_MAX_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmtpRow {
    pub id: i64,
    pub server: String,
    pub port: u16,
}

impl SmtpRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            server: row.get("server")?,
            port: row.get("port")?,
        })
    }

    /// `server:port`, ready for a mail transport.
    pub fn address(&self) -> String {
        format!("{}:{}", self.server, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct NewSmtp {
    pub server: String,
    pub port: u16,
}

fn validate(server: &str, port: u16) -> Result<(), DatabaseError> {
    validation::required_max_len("server", server, SERVER_MAX_LEN)?;
    if port == 0 {
        return Err(ValidationError::InvalidPort.into());
    }
    Ok(())
}

pub fn create(db: &Database, new: &NewSmtp) -> Result<SmtpRow, DatabaseError> {
    validate(&new.server, new.port)?;
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO smtp (server, port) VALUES (?1, ?2)",
            params![new.server, new.port],
        )?;
        Ok(SmtpRow {
            id: conn.last_insert_rowid(),
            server: new.server.clone(),
            port: new.port,
        })
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<SmtpRow>, DatabaseError> {
    db.with_conn(|conn| {
        query_opt(
            conn,
            "SELECT * FROM smtp WHERE id = ?1",
            params![id],
            SmtpRow::from_row,
        )
    })
}

/// The server outbound mail should use: the earliest configured one.
pub fn current(db: &Database) -> Result<Option<SmtpRow>, DatabaseError> {
    db.with_conn(|conn| {
        query_opt(
            conn,
            "SELECT * FROM smtp ORDER BY id LIMIT 1",
            [],
            SmtpRow::from_row,
        )
    })
}

pub fn list(db: &Database) -> Result<Vec<SmtpRow>, DatabaseError> {
    db.with_conn(|conn| query_all(conn, "SELECT * FROM smtp ORDER BY id", [], SmtpRow::from_row))
}

pub fn update(db: &Database, row: &SmtpRow) -> Result<(), DatabaseError> {
    validate(&row.server, row.port)?;
    db.with_conn(|conn| {
        let affected = conn.execute(
            "UPDATE smtp SET server = ?2, port = ?3 WHERE id = ?1",
            params![row.id, row.server, row.port],
        )?;
        expect_affected(affected, "smtp", row.id)
    })
}

pub fn delete(db: &Database, id: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute("DELETE FROM smtp WHERE id = ?1", params![id])?;
        expect_affected(affected, "smtp", id)
    })
}
