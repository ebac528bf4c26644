//! Builder patterns for creating test data programmatically.

#![allow(dead_code)]

use aegis::db::category_repo::{self, NewCategory};
use aegis::db::job_repo::{self, JobFields, JobRow};
use aegis::db::mail_repo::{self, NewMailId};
use aegis::db::operator_repo::{self, NewOperator};
use aegis::{Database, DatabaseError};

/// In-memory database with one operator, one category and three recipients.
pub struct Seed {
    pub db: Database,
    pub operator_id: i64,
    pub category_id: i64,
    pub mail_ids: Vec<i64>,
}

impl Seed {
    pub fn new() -> Self {
        let db = Database::open_in_memory().expect("Failed to create test database");
        let operator_id = operator_repo::create(&db, &NewOperator::new("ops"))
            .unwrap()
            .id;
        let category_id = category_repo::create(&db, &NewCategory::new("alerts"))
            .unwrap()
            .id;
        let mail_ids = [
            NewMailId::named("oncall@example.com", "On call"),
            NewMailId::new("lead@example.com"),
            NewMailId::new("audit@example.com"),
        ]
        .iter()
        .map(|m| mail_repo::create(&db, m).unwrap().id)
        .collect();

        Self {
            db,
            operator_id,
            category_id,
            mail_ids,
        }
    }

    /// A builder for a job owned by the seeded operator and category.
    pub fn job(&self, name: &str) -> JobBuilder {
        JobBuilder::new(name, self.operator_id, self.category_id).to(self.mail_ids[0])
    }
}

impl Default for Seed {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobFields`. Starts as a non-python job.
pub struct JobBuilder {
    fields: JobFields,
}

impl JobBuilder {
    pub fn new(name: &str, operator_id: i64, category_id: i64) -> Self {
        let mut fields = JobFields::new(name, operator_id, category_id);
        fields.is_python_script = false;
        Self { fields }
    }

    pub fn operator(mut self, operator_id: i64) -> Self {
        self.fields.operator_id = operator_id;
        self
    }

    /// Marks the job as a python script at `path`.
    pub fn python_script(mut self, path: &str) -> Self {
        self.fields.is_python_script = true;
        self.fields.script_location = Some(path.to_string());
        self
    }

    pub fn to(mut self, mail_id: i64) -> Self {
        self.fields.to_mail_ids.push(mail_id);
        self
    }

    pub fn cc(mut self, mail_id: i64) -> Self {
        self.fields.cc_mail_ids.push(mail_id);
        self
    }

    pub fn bcc(mut self, mail_id: i64) -> Self {
        self.fields.bcc_mail_ids.push(mail_id);
        self
    }

    pub fn schedule(mut self, minute: &str, hour: &str, frequency: &str) -> Self {
        self.fields.sch_minute = minute.to_string();
        self.fields.sch_hour = hour.to_string();
        self.fields.sch_frequency = frequency.to_string();
        self
    }

    pub fn scheduled(mut self) -> Self {
        self.fields.is_scheduled = true;
        self
    }

    pub fn mail(mut self, from: &str, subject: &str) -> Self {
        self.fields.from_id = Some(from.to_string());
        self.fields.mail_head = Some(subject.to_string());
        self
    }

    pub fn build(self) -> JobFields {
        self.fields
    }

    pub fn create(self, db: &Database) -> Result<JobRow, DatabaseError> {
        job_repo::create(db, &self.fields)
    }
}
