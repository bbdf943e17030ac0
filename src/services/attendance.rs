use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::{
    db,
    error::AppError,
    model::attendance::{AttendanceEntry, AttendanceRecord, AttendanceSummary},
    model::student::Student,
};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct BatchOutcome {
    pub inserted: usize,
    pub updated: usize,
}

/// Find-or-create the record for (student, hour, date).
///
/// Runs in a deferred transaction. When two writers race on the same key,
/// SQLite refuses the lock upgrade of the one that read first with
/// `SQLITE_BUSY`, so that call fails with a database error and only one row
/// is written. Rows already duplicated for a key are tolerated: the lowest id
/// receives the update.
pub async fn record_attendance(
    pool: &SqlitePool,
    entry: &AttendanceEntry,
    date: NaiveDate,
) -> Result<UpsertOutcome, AppError> {
    let mut tx = pool.begin().await?;
    let outcome = upsert(&mut *tx, entry, date).await?;
    tx.commit().await?;
    Ok(outcome)
}

/// Applies entries in order; a later entry for the same key overwrites an
/// earlier one. Any failure rolls the whole batch back.
pub async fn record_batch(
    pool: &SqlitePool,
    entries: &[AttendanceEntry],
    date: NaiveDate,
) -> Result<BatchOutcome, AppError> {
    let mut tx = pool.begin().await?;
    let mut outcome = BatchOutcome::default();

    for entry in entries {
        match upsert(&mut *tx, entry, date).await? {
            UpsertOutcome::Inserted => outcome.inserted += 1,
            UpsertOutcome::Updated => outcome.updated += 1,
        }
    }

    tx.commit().await?;
    debug!(
        inserted = outcome.inserted,
        updated = outcome.updated,
        %date,
        "Attendance batch recorded"
    );
    Ok(outcome)
}

async fn upsert(
    conn: &mut SqliteConnection,
    entry: &AttendanceEntry,
    date: NaiveDate,
) -> Result<UpsertOutcome, AppError> {
    ensure_exists(conn, "students", entry.student_id, "Student").await?;
    ensure_exists(conn, "hours", entry.hour_id, "Hour").await?;

    let existing = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT id FROM attendance
        WHERE student_id = ? AND hour_id = ? AND date = ?
        ORDER BY id
        LIMIT 1
        "#,
    )
    .bind(entry.student_id)
    .bind(entry.hour_id)
    .bind(date)
    .fetch_optional(&mut *conn)
    .await?;

    match existing {
        Some(id) => {
            sqlx::query("UPDATE attendance SET status = ? WHERE id = ?")
                .bind(entry.status)
                .bind(id)
                .execute(&mut *conn)
                .await?;
            Ok(UpsertOutcome::Updated)
        }
        None => {
            sqlx::query(
                "INSERT INTO attendance (student_id, hour_id, date, status) VALUES (?, ?, ?, ?)",
            )
            .bind(entry.student_id)
            .bind(entry.hour_id)
            .bind(date)
            .bind(entry.status)
            .execute(&mut *conn)
            .await?;
            Ok(UpsertOutcome::Inserted)
        }
    }
}

async fn ensure_exists(
    conn: &mut SqliteConnection,
    table: &str,
    id: i64,
    label: &str,
) -> Result<(), AppError> {
    let exists = sqlx::query_scalar::<_, bool>(&format!(
        "SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?)"
    ))
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;

    if exists {
        Ok(())
    } else {
        Err(AppError::reference(format!("{label} {id} does not exist")))
    }
}

/// Records of an hour on a given day, joined with their students.
pub async fn records_for_hour(
    pool: &SqlitePool,
    hour_id: i64,
    date: NaiveDate,
) -> Result<Vec<AttendanceRecord>, AppError> {
    let records = sqlx::query_as::<_, AttendanceRecord>(
        r#"
        SELECT a.id, a.student_id, s.name, s.reg_no, a.status
        FROM attendance a
        JOIN students s ON s.id = a.student_id
        WHERE a.hour_id = ? AND a.date = ?
        ORDER BY a.id
        "#,
    )
    .bind(hour_id)
    .bind(date)
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// Splits every student of the section by whether a present mark exists
/// for the hour on that day. Students without any record count as absent.
pub async fn summary(
    pool: &SqlitePool,
    section_id: i64,
    hour_id: i64,
    date: NaiveDate,
) -> Result<AttendanceSummary, AppError> {
    let students = db::list_students(pool, section_id).await?;

    let present_ids: Vec<i64> = sqlx::query_scalar(
        r#"
        SELECT DISTINCT a.student_id
        FROM attendance a
        JOIN students s ON s.id = a.student_id
        WHERE s.section_id = ? AND a.hour_id = ? AND a.date = ? AND a.status = 1
        "#,
    )
    .bind(section_id)
    .bind(hour_id)
    .bind(date)
    .fetch_all(pool)
    .await?;

    let (present, absent): (Vec<Student>, Vec<Student>) = students
        .into_iter()
        .partition(|s| present_ids.contains(&s.id));

    Ok(AttendanceSummary { present, absent })
}
