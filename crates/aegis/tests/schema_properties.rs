//! End-to-end checks of the schema's integrity rules.

mod common;

use aegis::db::job_conf_repo::{self, NewJobConf};
use aegis::db::result_value_repo::{self, NewResultValue};
use aegis::db::{job_repo, log_repo, operator_repo, run_repo};
use aegis::{DatabaseError, FieldType, LogLevel, ValidationError};
use chrono::Utc;

use common::Seed;

#[test]
fn python_job_requires_existing_script() {
    let seed = Seed::new();

    let err = seed
        .job("etl")
        .python_script("/nonexistent/etl.py")
        .create(&seed.db)
        .unwrap_err();
    assert!(matches!(
        err,
        DatabaseError::Validation(ValidationError::ScriptNotFound { .. })
    ));

    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("etl.py");
    std::fs::write(&script, "print('ok')\n").unwrap();
    let job = seed
        .job("etl")
        .python_script(&script.to_string_lossy())
        .create(&seed.db)
        .unwrap();
    assert!(job.fields.is_python_script);
}

#[test]
fn script_removed_after_save_fails_next_save() {
    let seed = Seed::new();
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("report.py");
    std::fs::write(&script, "").unwrap();

    let mut job = seed
        .job("report")
        .python_script(&script.to_string_lossy())
        .create(&seed.db)
        .unwrap();

    std::fs::remove_file(&script).unwrap();
    // Stored rows are not rechecked; only the next save is.
    assert!(job_repo::find_by_id(&seed.db, job.id).unwrap().is_some());
    job.fields.description = Some("weekly".to_string());
    assert!(job_repo::update(&seed.db, &job).is_err());
}

#[test]
fn job_conf_value_must_match_type() {
    let seed = Seed::new();
    let job = seed.job("etl").create(&seed.db).unwrap();

    let err = job_conf_repo::create(
        &seed.db,
        &NewJobConf::typed(job.id, "batch", FieldType::Int, "abc"),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        DatabaseError::Validation(ValidationError::ValueTypeMismatch { .. })
    ));

    let conf = job_conf_repo::create(
        &seed.db,
        &NewJobConf::typed(job.id, "batch", FieldType::Int, "42"),
    )
    .unwrap();
    let stored = job_conf_repo::find_by_id(&seed.db, conf.id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.value.as_deref(), Some("42"));
}

#[test]
fn job_conf_needs_some_value() {
    let seed = Seed::new();
    let job = seed.job("etl").create(&seed.db).unwrap();

    let err = job_conf_repo::create(
        &seed.db,
        &NewJobConf {
            job_id: job.id,
            field_name: "batch".to_string(),
            field_type: FieldType::Int,
            value: None,
            custom_value: None,
        },
    )
    .unwrap_err();
    assert!(matches!(
        err,
        DatabaseError::Validation(ValidationError::MissingValue { .. })
    ));
}

#[test]
fn job_name_unique_per_operator() {
    let seed = Seed::new();
    seed.job("nightly").create(&seed.db).unwrap();

    let err = seed.job("nightly").create(&seed.db).unwrap_err();
    assert!(err.is_unique_violation());

    let other = operator_repo::create(&seed.db, &operator_repo::NewOperator::new("dba"))
        .unwrap();
    seed.job("nightly")
        .operator(other.id)
        .create(&seed.db)
        .unwrap();
}

#[test]
fn log_time_is_set_at_save() {
    let seed = Seed::new();
    let job = seed.job("etl").create(&seed.db).unwrap();
    let run = run_repo::start(&seed.db, job.id).unwrap();

    let before = Utc::now();
    let line = log_repo::append(&seed.db, run.id, LogLevel::Error, "disk full").unwrap();
    let after = Utc::now();

    let stored = log_repo::find_by_id(&seed.db, line.id).unwrap().unwrap();
    assert!(stored.log_time >= before);
    assert!(stored.log_time <= after);
    assert_eq!(stored.level, LogLevel::Error);
}

#[test]
fn result_values_unique_on_full_triple() {
    let seed = Seed::new();
    let job = seed.job("etl").create(&seed.db).unwrap();
    let run = run_repo::start(&seed.db, job.id).unwrap();

    result_value_repo::create(&seed.db, &NewResultValue::new(run.id, "table", "orders"))
        .unwrap();
    result_value_repo::create(&seed.db, &NewResultValue::new(run.id, "table", "users"))
        .unwrap();

    let err =
        result_value_repo::create(&seed.db, &NewResultValue::new(run.id, "table", "users"))
            .unwrap_err();
    assert!(err.is_unique_violation());
    assert_eq!(
        result_value_repo::list_for_run(&seed.db, run.id)
            .unwrap()
            .len(),
        2
    );
}
