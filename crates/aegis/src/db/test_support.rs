//! Fixtures shared by the repository unit tests.

use super::category_repo::{self, NewCategory};
use super::job_repo::{self, JobFields};
use super::mail_repo::{self, NewMailId};
use super::operator_repo::{self, NewOperator};
use super::Database;

/// In-memory database holding one non-python job; returns its id.
pub(crate) fn db_with_job() -> (Database, i64) {
    let db = Database::open_in_memory().expect("Failed to create test database");
    let op = operator_repo::create(&db, &NewOperator::new("ops")).unwrap();
    let cat = category_repo::create(&db, &NewCategory::new("alerts")).unwrap();
    let mail = mail_repo::create(&db, &NewMailId::new("ops@example.com")).unwrap();

    let mut job = JobFields::new("nightly", op.id, cat.id);
    job.is_python_script = false;
    job.to_mail_ids = vec![mail.id];
    let job_id = job_repo::create(&db, &job).unwrap().id;
    (db, job_id)
}
