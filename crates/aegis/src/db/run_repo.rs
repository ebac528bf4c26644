//! Run history repository: one `running_status` row per execution attempt.
//!
//! Rows are written by the external runner: [`start`] when a job begins and
//! [`finish`] when it ends. Listings are newest-start-first.

use std::fmt;

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use serde::Serialize;

use super::{expect_affected, query_all, query_opt, Database, DatabaseError};
use crate::model::RunStatus;
use crate::validation::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRow {
    pub id: i64,
    pub job_id: i64,
    pub status: RunStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

/// `job <id> <start time> <status>`, e.g. `job 3 2024-05-01 02:00:00 Success`.
impl fmt::Display for RunRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "job {} {} {}",
            self.job_id,
            self.start_time.format("%Y-%m-%d %H:%M:%S"),
            self.status
        )
    }
}

impl RunRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            job_id: row.get("job_id")?,
            status: row.get("status")?,
            start_time: row.get("start_time")?,
            end_time: row.get("end_time")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewRun {
    pub job_id: i64,
    pub status: RunStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

pub fn create(db: &Database, new: &NewRun) -> Result<RunRow, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO running_status (job_id, status, start_time, end_time)
             VALUES (?1, ?2, ?3, ?4)",
            params![new.job_id, new.status, new.start_time, new.end_time],
        )?;
        Ok(RunRow {
            id: conn.last_insert_rowid(),
            job_id: new.job_id,
            status: new.status,
            start_time: new.start_time,
            end_time: new.end_time,
        })
    })
}

/// Records that a job started executing now.
pub fn start(db: &Database, job_id: i64) -> Result<RunRow, DatabaseError> {
    let run = create(
        db,
        &NewRun {
            job_id,
            status: RunStatus::Executing,
            start_time: Utc::now(),
            end_time: None,
        },
    )?;
    tracing::debug!(job_id, run_id = run.id, "Run started");
    Ok(run)
}

/// Closes a run with a terminal status and stamps its end time.
pub fn finish(db: &Database, run_id: i64, status: RunStatus) -> Result<RunRow, DatabaseError> {
    if !status.is_terminal() {
        return Err(ValidationError::NotTerminal(status).into());
    }
    let end_time = Utc::now();
    db.with_conn(|conn| {
        let affected = conn.execute(
            "UPDATE running_status SET status = ?2, end_time = ?3 WHERE id = ?1",
            params![run_id, status, end_time],
        )?;
        expect_affected(affected, "running_status", run_id)
    })?;
    tracing::debug!(run_id, %status, "Run finished");

    find_by_id(db, run_id)?.ok_or(DatabaseError::NotFound {
        entity: "running_status",
        id: run_id,
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<RunRow>, DatabaseError> {
    db.with_conn(|conn| {
        query_opt(
            conn,
            "SELECT * FROM running_status WHERE id = ?1",
            params![id],
            RunRow::from_row,
        )
    })
}

/// Runs of a job, newest start first.
pub fn list_for_job(db: &Database, job_id: i64) -> Result<Vec<RunRow>, DatabaseError> {
    db.with_conn(|conn| {
        query_all(
            conn,
            "SELECT * FROM running_status WHERE job_id = ?1 ORDER BY start_time DESC, id DESC",
            params![job_id],
            RunRow::from_row,
        )
    })
}

pub fn latest_for_job(db: &Database, job_id: i64) -> Result<Option<RunRow>, DatabaseError> {
    db.with_conn(|conn| {
        query_opt(
            conn,
            "SELECT * FROM running_status WHERE job_id = ?1
             ORDER BY start_time DESC, id DESC LIMIT 1",
            params![job_id],
            RunRow::from_row,
        )
    })
}

pub fn update(db: &Database, row: &RunRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute(
            "UPDATE running_status SET job_id = ?2, status = ?3, start_time = ?4, end_time = ?5
             WHERE id = ?1",
            params![row.id, row.job_id, row.status, row.start_time, row.end_time],
        )?;
        expect_affected(affected, "running_status", row.id)
    })
}

/// Deletes a run. Fails while log lines or result values reference it.
pub fn delete(db: &Database, id: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute("DELETE FROM running_status WHERE id = ?1", params![id])?;
        expect_affected(affected, "running_status", id)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::db_with_job;
    use chrono::Duration;

    #[test]
    fn test_start_defaults_to_executing() {
        let (db, job_id) = db_with_job();
        let before = Utc::now();
        let run = start(&db, job_id).unwrap();

        assert_eq!(run.status, RunStatus::Executing);
        assert!(run.end_time.is_none());
        assert!(run.start_time >= before);
        assert_eq!(find_by_id(&db, run.id).unwrap().unwrap(), run);
    }

    #[test]
    fn test_finish_sets_status_and_end_time() {
        let (db, job_id) = db_with_job();
        let run = start(&db, job_id).unwrap();
        let done = finish(&db, run.id, RunStatus::Success).unwrap();

        assert_eq!(done.status, RunStatus::Success);
        let end = done.end_time.unwrap();
        assert!(end >= done.start_time);
    }

    #[test]
    fn test_finish_rejects_executing() {
        let (db, job_id) = db_with_job();
        let run = start(&db, job_id).unwrap();
        assert!(matches!(
            finish(&db, run.id, RunStatus::Executing),
            Err(DatabaseError::Validation(ValidationError::NotTerminal(
                RunStatus::Executing
            )))
        ));
        assert!(matches!(
            finish(&db, 999, RunStatus::Failed),
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[test]
    fn test_list_is_newest_first() {
        let (db, job_id) = db_with_job();
        let now = Utc::now();
        for hours_ago in [3, 1, 2] {
            create(
                &db,
                &NewRun {
                    job_id,
                    status: RunStatus::Success,
                    start_time: now - Duration::hours(hours_ago),
                    end_time: None,
                },
            )
            .unwrap();
        }

        let runs = list_for_job(&db, job_id).unwrap();
        let starts: Vec<_> = runs.iter().map(|r| r.start_time).collect();
        assert_eq!(
            starts,
            vec![
                now - Duration::hours(1),
                now - Duration::hours(2),
                now - Duration::hours(3)
            ]
        );
        assert_eq!(
            latest_for_job(&db, job_id).unwrap().unwrap().start_time,
            now - Duration::hours(1)
        );
    }

    #[test]
    fn test_unknown_job_rejected() {
        let (db, _) = db_with_job();
        assert!(start(&db, 999).unwrap_err().is_foreign_key_violation());
    }

    #[test]
    fn test_job_with_runs_cannot_be_deleted() {
        let (db, job_id) = db_with_job();
        let run = start(&db, job_id).unwrap();
        assert!(crate::db::job_repo::delete(&db, job_id)
            .unwrap_err()
            .is_foreign_key_violation());

        delete(&db, run.id).unwrap();
        crate::db::job_repo::delete(&db, job_id).unwrap();
    }

    #[test]
    fn test_display() {
        let run = RunRow {
            id: 1,
            job_id: 3,
            status: RunStatus::Executing,
            start_time: "2024-05-01T02:00:00Z".parse().unwrap(),
            end_time: None,
        };
        assert_eq!(run.to_string(), "job 3 2024-05-01 02:00:00 On Execution");
    }

    #[test]
    fn test_update() {
        let (db, job_id) = db_with_job();
        let mut run = start(&db, job_id).unwrap();
        run.status = RunStatus::Failed;
        update(&db, &run).unwrap();
        assert_eq!(
            find_by_id(&db, run.id).unwrap().unwrap().status,
            RunStatus::Failed
        );
    }
}
