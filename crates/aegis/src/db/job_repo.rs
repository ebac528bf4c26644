//! Job repository: CRUD operations for the `sch_job` table and its
//! to/cc/bcc recipient join tables.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use serde::Serialize;

use super::mail_repo::MailIdRow;
use super::{expect_affected, query_all, query_opt, Database, DatabaseError};
use crate::model::RecipientRole;
use crate::validation::{self, ValidationError};

pub const NAME_MAX_LEN: usize = 200;
pub const MAIL_HEAD_MAX_LEN: usize = 200;
pub const SCHEDULE_MAX_LEN: usize = 30;
pub const SCRIPT_LOCATION_MAX_LEN: usize = 100;

/// Every editable column of a scheduled job.
///
/// Used both as the input of [`create`] and as the body of a [`JobRow`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobFields {
    pub name: String,
    pub operator_id: i64,
    pub category_id: i64,
    pub is_running: bool,
    pub is_scheduled: bool,
    pub last_execution: Option<DateTime<Utc>>,
    pub description: Option<String>,
    /// Primary recipients, in display order. At least one is required.
    pub to_mail_ids: Vec<i64>,
    pub cc_mail_ids: Vec<i64>,
    pub bcc_mail_ids: Vec<i64>,
    /// Sender address for alert mail.
    pub from_id: Option<String>,
    /// Alert mail subject.
    pub mail_head: Option<String>,
    pub mail_html_body: Option<String>,
    /// Crontab hour field.
    pub sch_hour: String,
    /// Crontab minute field.
    pub sch_minute: String,
    /// Crontab day-of-week field.
    pub sch_frequency: String,
    pub is_python_script: bool,
    pub script_location: Option<String>,
}

impl JobFields {
    /// A job with the column defaults: unscheduled, not running, run every
    /// minute (`* * *`), python script with no location yet.
    pub fn new(name: impl Into<String>, operator_id: i64, category_id: i64) -> Self {
        Self {
            name: name.into(),
            operator_id,
            category_id,
            is_running: false,
            is_scheduled: false,
            last_execution: None,
            description: None,
            to_mail_ids: Vec::new(),
            cc_mail_ids: Vec::new(),
            bcc_mail_ids: Vec::new(),
            from_id: None,
            mail_head: None,
            mail_html_body: None,
            sch_hour: "*".to_string(),
            sch_minute: "*".to_string(),
            sch_frequency: "*".to_string(),
            is_python_script: true,
            script_location: None,
        }
    }

    pub fn recipients(&self, role: RecipientRole) -> &[i64] {
        match role {
            RecipientRole::To => &self.to_mail_ids,
            RecipientRole::Cc => &self.cc_mail_ids,
            RecipientRole::Bcc => &self.bcc_mail_ids,
        }
    }

    fn recipients_mut(&mut self, role: RecipientRole) -> &mut Vec<i64> {
        match role {
            RecipientRole::To => &mut self.to_mail_ids,
            RecipientRole::Cc => &mut self.cc_mail_ids,
            RecipientRole::Bcc => &mut self.bcc_mail_ids,
        }
    }

    /// Drops repeated mail ids within each role, keeping the first occurrence.
    pub fn dedup_recipients(&mut self) {
        for role in RecipientRole::ALL {
            let mut seen = HashSet::new();
            self.recipients_mut(role).retain(|id| seen.insert(*id));
        }
    }

    /// Field checks first, then the script existence check, which touches
    /// the filesystem.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required_max_len("name", &self.name, NAME_MAX_LEN)?;
        if let Some(from) = validation::present(self.from_id.as_deref()) {
            validation::email("from_id", from)?;
        }
        validation::optional_max_len("mail_head", self.mail_head.as_deref(), MAIL_HEAD_MAX_LEN)?;
        validation::required_max_len("sch_hour", &self.sch_hour, SCHEDULE_MAX_LEN)?;
        validation::required_max_len("sch_minute", &self.sch_minute, SCHEDULE_MAX_LEN)?;
        validation::required_max_len("sch_frequency", &self.sch_frequency, SCHEDULE_MAX_LEN)?;
        validation::optional_max_len(
            "script_location",
            self.script_location.as_deref(),
            SCRIPT_LOCATION_MAX_LEN,
        )?;
        if self.to_mail_ids.is_empty() {
            return Err(ValidationError::NoRecipients);
        }
        validation::script_location(self.is_python_script, self.script_location.as_deref())
    }
}

/// A persisted job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRow {
    pub id: i64,
    #[serde(flatten)]
    pub fields: JobFields,
}

impl fmt::Display for JobRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fields.name)
    }
}

impl JobRow {
    /// Reads the `sch_job` columns; recipient lists are filled separately.
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            fields: JobFields {
                name: row.get("name")?,
                operator_id: row.get("operator_id")?,
                category_id: row.get("category_id")?,
                is_running: row.get("is_running")?,
                is_scheduled: row.get("is_scheduled")?,
                last_execution: row.get("last_execution")?,
                description: row.get("description")?,
                to_mail_ids: Vec::new(),
                cc_mail_ids: Vec::new(),
                bcc_mail_ids: Vec::new(),
                from_id: row.get("from_id")?,
                mail_head: row.get("mail_head")?,
                mail_html_body: row.get("mail_html_body")?,
                sch_hour: row.get("sch_hour")?,
                sch_minute: row.get("sch_minute")?,
                sch_frequency: row.get("sch_frequency")?,
                is_python_script: row.get("is_python_script")?,
                script_location: row.get("script_location")?,
            },
        })
    }
}

/// Query filter parameters for job listing.
#[derive(Debug, Default, Clone)]
pub struct JobFilter {
    pub operator_id: Option<i64>,
    pub category_id: Option<i64>,
    pub is_scheduled: Option<bool>,
    pub is_running: Option<bool>,
}

fn write_recipients(conn: &Connection, job_id: i64, fields: &JobFields) -> Result<(), DatabaseError> {
    for role in RecipientRole::ALL {
        conn.execute(
            &format!("DELETE FROM {} WHERE job_id = ?1", role.table()),
            params![job_id],
        )?;
        let sql = format!(
            "INSERT INTO {} (job_id, mailid_id, position) VALUES (?1, ?2, ?3)",
            role.table()
        );
        let mut seen = HashSet::new();
        let ids = fields.recipients(role).iter().filter(|id| seen.insert(**id));
        for (position, mail_id) in ids.enumerate() {
            conn.execute(&sql, params![job_id, mail_id, position as i64])?;
        }
    }
    Ok(())
}

fn load_recipients(conn: &Connection, job: &mut JobRow) -> Result<(), DatabaseError> {
    for role in RecipientRole::ALL {
        let ids = query_all(
            conn,
            &format!(
                "SELECT mailid_id FROM {} WHERE job_id = ?1 ORDER BY position",
                role.table()
            ),
            params![job.id],
            |r| r.get::<_, i64>(0),
        )?;
        *job.fields.recipients_mut(role) = ids;
    }
    Ok(())
}

/// Validates and inserts a job together with its recipient lists.
pub fn create(db: &Database, fields: &JobFields) -> Result<JobRow, DatabaseError> {
    fields.validate()?;
    let mut fields = fields.clone();
    fields.dedup_recipients();
    let id = db.with_tx(|conn| {
        conn.execute(
            "INSERT INTO sch_job (name, operator_id, category_id, is_running, is_scheduled,
             last_execution, description, from_id, mail_head, mail_html_body, sch_hour,
             sch_minute, sch_frequency, is_python_script, script_location)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                fields.name,
                fields.operator_id,
                fields.category_id,
                fields.is_running,
                fields.is_scheduled,
                fields.last_execution,
                fields.description,
                fields.from_id,
                fields.mail_head,
                fields.mail_html_body,
                fields.sch_hour,
                fields.sch_minute,
                fields.sch_frequency,
                fields.is_python_script,
                fields.script_location,
            ],
        )?;
        let id = conn.last_insert_rowid();
        write_recipients(conn, id, &fields)?;
        Ok(id)
    })?;

    tracing::debug!(job_id = id, name = %fields.name, "Created job");

    Ok(JobRow { id, fields })
}

/// Validates and overwrites every column and recipient list of a job.
pub fn update(db: &Database, job: &JobRow) -> Result<(), DatabaseError> {
    job.fields.validate()?;
    let f = &job.fields;
    db.with_tx(|conn| {
        let affected = conn.execute(
            "UPDATE sch_job SET name=?2, operator_id=?3, category_id=?4, is_running=?5,
             is_scheduled=?6, last_execution=?7, description=?8, from_id=?9, mail_head=?10,
             mail_html_body=?11, sch_hour=?12, sch_minute=?13, sch_frequency=?14,
             is_python_script=?15, script_location=?16
             WHERE id=?1",
            params![
                job.id,
                f.name,
                f.operator_id,
                f.category_id,
                f.is_running,
                f.is_scheduled,
                f.last_execution,
                f.description,
                f.from_id,
                f.mail_head,
                f.mail_html_body,
                f.sch_hour,
                f.sch_minute,
                f.sch_frequency,
                f.is_python_script,
                f.script_location,
            ],
        )?;
        expect_affected(affected, "job", job.id)?;
        write_recipients(conn, job.id, f)
    })?;

    tracing::debug!(job_id = job.id, "Updated job");
    Ok(())
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let job = query_opt(
            conn,
            "SELECT * FROM sch_job WHERE id = ?1",
            params![id],
            JobRow::from_row,
        )?;
        match job {
            Some(mut job) => {
                load_recipients(conn, &mut job)?;
                Ok(Some(job))
            }
            None => Ok(None),
        }
    })
}

/// Looks a job up by its natural key.
pub fn find_by_name(
    db: &Database,
    name: &str,
    operator_id: i64,
) -> Result<Option<JobRow>, DatabaseError> {
    let id = db.with_conn(|conn| {
        query_opt(
            conn,
            "SELECT id FROM sch_job WHERE name = ?1 AND operator_id = ?2",
            params![name, operator_id],
            |r| r.get::<_, i64>(0),
        )
    })?;
    match id {
        Some(id) => find_by_id(db, id),
        None => Ok(None),
    }
}

/// Lists jobs matching the filter, ordered by name.
pub fn list(db: &Database, filter: &JobFilter) -> Result<Vec<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut conditions = Vec::new();
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(operator_id) = filter.operator_id {
            conditions.push(format!("operator_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(operator_id));
        }
        if let Some(category_id) = filter.category_id {
            conditions.push(format!("category_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(category_id));
        }
        if let Some(is_scheduled) = filter.is_scheduled {
            conditions.push(format!("is_scheduled = ?{}", param_values.len() + 1));
            param_values.push(Box::new(is_scheduled));
        }
        if let Some(is_running) = filter.is_running {
            conditions.push(format!("is_running = ?{}", param_values.len() + 1));
            param_values.push(Box::new(is_running));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!("SELECT * FROM sch_job {} ORDER BY name, id", where_clause);

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut jobs = query_all(conn, &sql, params_ref.as_slice(), JobRow::from_row)?;
        for job in &mut jobs {
            load_recipients(conn, job)?;
        }
        Ok(jobs)
    })
}

/// All jobs of a category, optionally narrowed to one operator.
pub fn list_by_category(
    db: &Database,
    category_id: i64,
    operator_id: Option<i64>,
) -> Result<Vec<JobRow>, DatabaseError> {
    list(
        db,
        &JobFilter {
            category_id: Some(category_id),
            operator_id,
            ..Default::default()
        },
    )
}

pub fn list_scheduled(db: &Database) -> Result<Vec<JobRow>, DatabaseError> {
    list(
        db,
        &JobFilter {
            is_scheduled: Some(true),
            ..Default::default()
        },
    )
}

/// Resolves the recipients of one role, in their stored order.
pub fn recipients(
    db: &Database,
    job_id: i64,
    role: RecipientRole,
) -> Result<Vec<MailIdRow>, DatabaseError> {
    db.with_conn(|conn| {
        query_all(
            conn,
            &format!(
                "SELECT m.* FROM mailid m JOIN {} r ON r.mailid_id = m.id
                 WHERE r.job_id = ?1 ORDER BY r.position",
                role.table()
            ),
            params![job_id],
            MailIdRow::from_row,
        )
    })
}

/// Sets only the running flag. Takes no lock beyond the row update.
pub fn set_running(db: &Database, id: i64, running: bool) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute(
            "UPDATE sch_job SET is_running = ?2 WHERE id = ?1",
            params![id, running],
        )?;
        expect_affected(affected, "job", id)
    })
}

pub fn set_scheduled(db: &Database, id: i64, scheduled: bool) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute(
            "UPDATE sch_job SET is_scheduled = ?2 WHERE id = ?1",
            params![id, scheduled],
        )?;
        expect_affected(affected, "job", id)
    })
}

/// Stores the time of the latest execution.
pub fn record_execution(db: &Database, id: i64, at: DateTime<Utc>) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute(
            "UPDATE sch_job SET last_execution = ?2 WHERE id = ?1",
            params![id, at],
        )?;
        expect_affected(affected, "job", id)
    })
}

/// Deletes a job and its recipient links. Fails with a foreign-key
/// violation while parameters, result fields or runs reference it.
pub fn delete(db: &Database, id: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute("DELETE FROM sch_job WHERE id = ?1", params![id])?;
        expect_affected(affected, "job", id)
    })
}
