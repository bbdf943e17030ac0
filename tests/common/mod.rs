#![allow(dead_code, unused_macros)]

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use attendance::clock::{Clock, FixedClock};
use attendance::config::Config;
use attendance::db;
use attendance::services::mail::{MailError, ReportMailer};
use attendance::services::report::ReportArtifact;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()
}

/// Single connection so every query sees the same in-memory database.
pub async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("in-memory sqlite");
    db::migrate(&pool).await.expect("migrations");
    pool
}

pub async fn insert_section(pool: &SqlitePool, name: &str) -> i64 {
    sqlx::query("INSERT INTO sections (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
}

pub async fn insert_hour(pool: &SqlitePool, section_id: i64, slot: &str) -> i64 {
    sqlx::query("INSERT INTO hours (time_slot, section_id) VALUES (?, ?)")
        .bind(slot)
        .bind(section_id)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
}

pub async fn insert_student(pool: &SqlitePool, section_id: i64, reg_no: &str, name: &str) -> i64 {
    sqlx::query("INSERT INTO students (reg_no, name, section_id) VALUES (?, ?, ?)")
        .bind(reg_no)
        .bind(name)
        .bind(section_id)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
}

pub async fn count_attendance(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM attendance")
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Section "IT-A" with hour "9-10" and students A and B.
pub struct Classroom {
    pub section_id: i64,
    pub hour_id: i64,
    pub student_a: i64,
    pub student_b: i64,
}

pub async fn seed_classroom(pool: &SqlitePool) -> Classroom {
    let section_id = insert_section(pool, "IT-A").await;
    let hour_id = insert_hour(pool, section_id, "9-10").await;
    let student_a = insert_student(pool, section_id, "22331A1201", "A").await;
    let student_b = insert_student(pool, section_id, "22331A1202", "B").await;
    Classroom {
        section_id,
        hour_id,
        student_a,
        student_b,
    }
}

// -------------------- Mailers --------------------

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, Vec<String>, usize)>>,
}

#[async_trait]
impl ReportMailer for RecordingMailer {
    async fn send_report(
        &self,
        artifact: &ReportArtifact,
        recipients: &BTreeSet<String>,
    ) -> Result<(), MailError> {
        self.sent.lock().unwrap().push((
            artifact.file_name.clone(),
            recipients.iter().cloned().collect(),
            artifact.bytes.len(),
        ));
        Ok(())
    }
}

pub struct FailingMailer;

#[async_trait]
impl ReportMailer for FailingMailer {
    async fn send_report(
        &self,
        _artifact: &ReportArtifact,
        _recipients: &BTreeSet<String>,
    ) -> Result<(), MailError> {
        Err(MailError::Transport("connection refused".into()))
    }
}

// -------------------- App context --------------------

pub struct TestCtx {
    pub pool: SqlitePool,
    pub config: Config,
    pub clock: Arc<dyn Clock>,
    pub mailer: Arc<dyn ReportMailer>,
    pub reports: TempDir,
}

impl TestCtx {
    pub async fn new(mailer: Arc<dyn ReportMailer>) -> Self {
        let reports = TempDir::new().expect("temp dir");
        let config = Config {
            reports_dir: reports.path().to_path_buf(),
            report_recipients: vec!["hod@college.edu".into(), "principal@college.edu".into()],
            session_secret: "test-secret".into(),
            ..Config::default()
        };

        Self {
            pool: memory_pool().await,
            config,
            clock: Arc::new(FixedClock(today())),
            mailer,
            reports,
        }
    }
}

macro_rules! test_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($ctx.pool.clone()))
                .app_data(actix_web::web::Data::new($ctx.config.clone()))
                .app_data(actix_web::web::Data::from($ctx.clock.clone()))
                .app_data(actix_web::web::Data::from($ctx.mailer.clone()))
                .configure(attendance::routes::configure),
        )
        .await
    };
}
