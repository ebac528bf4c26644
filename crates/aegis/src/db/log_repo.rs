//! Run log repository: the `job_log_status` lines a run emits.
//!
//! `log_time` is owned by this module: every insert and every update
//! stamps the current time, whatever the caller had in its row.

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use serde::Serialize;

use super::{expect_affected, query_all, query_opt, Database, DatabaseError};
use crate::model::LogLevel;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRow {
    pub id: i64,
    pub run_id: i64,
    pub level: LogLevel,
    pub message: String,
    pub log_time: DateTime<Utc>,
}

impl LogRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            run_id: row.get("runningjob_id")?,
            level: row.get("level")?,
            message: row.get("message")?,
            log_time: row.get("log_time")?,
        })
    }
}

/// Input for [`create`], which stamps `log_time` itself.
#[derive(Debug, Clone)]
pub struct NewLog {
    pub run_id: i64,
    pub level: LogLevel,
    pub message: String,
}

pub fn create(db: &Database, new: &NewLog) -> Result<LogRow, DatabaseError> {
    let log_time = Utc::now();
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO job_log_status (runningjob_id, level, message, log_time)
             VALUES (?1, ?2, ?3, ?4)",
            params![new.run_id, new.level, new.message, log_time],
        )?;
        Ok(LogRow {
            id: conn.last_insert_rowid(),
            run_id: new.run_id,
            level: new.level,
            message: new.message.clone(),
            log_time,
        })
    })
}

/// Appends one line to a run's log.
pub fn append(
    db: &Database,
    run_id: i64,
    level: LogLevel,
    message: impl Into<String>,
) -> Result<LogRow, DatabaseError> {
    create(
        db,
        &NewLog {
            run_id,
            level,
            message: message.into(),
        },
    )
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<LogRow>, DatabaseError> {
    db.with_conn(|conn| {
        query_opt(
            conn,
            "SELECT * FROM job_log_status WHERE id = ?1",
            params![id],
            LogRow::from_row,
        )
    })
}

/// Log lines of a run, newest first.
pub fn list_for_run(db: &Database, run_id: i64) -> Result<Vec<LogRow>, DatabaseError> {
    db.with_conn(|conn| {
        query_all(
            conn,
            "SELECT * FROM job_log_status WHERE runningjob_id = ?1
             ORDER BY log_time DESC, id DESC",
            params![run_id],
            LogRow::from_row,
        )
    })
}

/// Rewrites a log line and re-stamps it. Returns the new `log_time`;
/// `row.log_time` is ignored.
pub fn update(db: &Database, row: &LogRow) -> Result<DateTime<Utc>, DatabaseError> {
    let log_time = Utc::now();
    db.with_conn(|conn| {
        let affected = conn.execute(
            "UPDATE job_log_status SET runningjob_id = ?2, level = ?3, message = ?4, log_time = ?5
             WHERE id = ?1",
            params![row.id, row.run_id, row.level, row.message, log_time],
        )?;
        expect_affected(affected, "job_log_status", row.id)
    })?;
    Ok(log_time)
}

pub fn delete(db: &Database, id: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute("DELETE FROM job_log_status WHERE id = ?1", params![id])?;
        expect_affected(affected, "job_log_status", id)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::run_repo;
    use crate::db::test_support::db_with_job;
    use crate::db::ConstraintKind;
    use chrono::Duration;

    #[test]
    fn test_log_time_is_stamped_on_create() {
        let (db, job_id) = db_with_job();
        let run = run_repo::start(&db, job_id).unwrap();

        let before = Utc::now();
        let line = append(&db, run.id, LogLevel::Info, "started").unwrap();
        let after = Utc::now();

        assert!(line.log_time >= before && line.log_time <= after);
        let stored = find_by_id(&db, line.id).unwrap().unwrap();
        assert_eq!(stored, line);
        assert_eq!(stored.level, LogLevel::Info);
    }

    #[test]
    fn test_caller_time_is_ignored_on_update() {
        let (db, job_id) = db_with_job();
        let run = run_repo::start(&db, job_id).unwrap();
        let mut line = append(&db, run.id, LogLevel::Warning, "slow query").unwrap();

        line.log_time = Utc::now() - Duration::days(30);
        line.message = "very slow query".to_string();
        let stamped = update(&db, &line).unwrap();

        let stored = find_by_id(&db, line.id).unwrap().unwrap();
        assert_eq!(stored.log_time, stamped);
        assert!(stored.log_time > line.log_time);
        assert_eq!(stored.message, "very slow query");
    }

    #[test]
    fn test_list_is_newest_first() {
        let (db, job_id) = db_with_job();
        let run = run_repo::start(&db, job_id).unwrap();
        let first = append(&db, run.id, LogLevel::Info, "one").unwrap();
        let second = append(&db, run.id, LogLevel::Error, "two").unwrap();

        let lines = list_for_run(&db, run.id).unwrap();
        assert_eq!(
            lines.iter().map(|l| l.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );
    }

    #[test]
    fn test_unknown_run_rejected() {
        let (db, _) = db_with_job();
        assert!(append(&db, 999, LogLevel::Info, "x")
            .unwrap_err()
            .is_foreign_key_violation());
    }

    #[test]
    fn test_empty_message_is_kept() {
        let (db, job_id) = db_with_job();
        let run = run_repo::start(&db, job_id).unwrap();
        let line = append(&db, run.id, LogLevel::Info, "").unwrap();
        assert_eq!(find_by_id(&db, line.id).unwrap().unwrap().message, "");
    }

    #[test]
    fn test_unknown_level_rejected_by_schema() {
        let (db, job_id) = db_with_job();
        let run = run_repo::start(&db, job_id).unwrap();
        let err = db
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO job_log_status (runningjob_id, level, message, log_time)
                     VALUES (?1, 25, 'odd', ?2)",
                    params![run.id, Utc::now()],
                )?;
                Ok(())
            })
            .unwrap_err();
        assert_eq!(err.constraint_kind(), Some(ConstraintKind::Check));
        assert!(list_for_run(&db, run.id).unwrap().is_empty());
    }

    #[test]
    fn test_run_with_logs_cannot_be_deleted() {
        let (db, job_id) = db_with_job();
        let run = run_repo::start(&db, job_id).unwrap();
        let line = append(&db, run.id, LogLevel::Debug, "x").unwrap();
        assert!(run_repo::delete(&db, run.id)
            .unwrap_err()
            .is_foreign_key_violation());
        delete(&db, line.id).unwrap();
        run_repo::delete(&db, run.id).unwrap();
    }
}
