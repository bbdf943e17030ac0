use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

use crate::model::{hour::Hour, section::Section, student::Student};

pub async fn init_db(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid DATABASE_URL: {database_url}"))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;

    migrate(&pool).await?;
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run migrations")
}

// -------------------- Lookups --------------------

pub async fn list_sections(pool: &SqlitePool) -> Result<Vec<Section>, sqlx::Error> {
    sqlx::query_as::<_, Section>("SELECT id, name FROM sections ORDER BY id")
        .fetch_all(pool)
        .await
}

pub async fn find_section(pool: &SqlitePool, section_id: i64) -> Result<Option<Section>, sqlx::Error> {
    sqlx::query_as::<_, Section>("SELECT id, name FROM sections WHERE id = ?")
        .bind(section_id)
        .fetch_optional(pool)
        .await
}

/// Hours of a section in stored order.
pub async fn list_hours(pool: &SqlitePool, section_id: i64) -> Result<Vec<Hour>, sqlx::Error> {
    sqlx::query_as::<_, Hour>(
        "SELECT id, time_slot, section_id FROM hours WHERE section_id = ? ORDER BY id",
    )
    .bind(section_id)
    .fetch_all(pool)
    .await
}

pub async fn find_hour(pool: &SqlitePool, hour_id: i64) -> Result<Option<Hour>, sqlx::Error> {
    sqlx::query_as::<_, Hour>("SELECT id, time_slot, section_id FROM hours WHERE id = ?")
        .bind(hour_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_students(pool: &SqlitePool, section_id: i64) -> Result<Vec<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(
        "SELECT id, reg_no, name FROM students WHERE section_id = ? ORDER BY id",
    )
    .bind(section_id)
    .fetch_all(pool)
    .await
}

// -------------------- Demo data --------------------

const TIME_SLOTS: [&str; 7] = ["9-10", "10-11", "11-12", "1-2", "2-3", "3-4", "4-5"];

const DEMO_STUDENTS: [(&str, &str, &str); 10] = [
    ("22331A1201", "Aditya", "IT-A"),
    ("22331A1202", "Aravind", "IT-A"),
    ("22331A1203", "Vamsi", "IT-A"),
    ("22331A1204", "Mohan", "IT-A"),
    ("22331A1205", "Harika", "IT-A"),
    ("22331A1267", "kavya", "IT-B"),
    ("22331A1268", "Bala Aditya", "IT-B"),
    ("22331A1269", "Praveenya", "IT-B"),
    ("22331A1270", "Yuva Priya", "IT-B"),
    ("22331A1271", "Sampath", "IT-B"),
];

async fn is_empty(pool: &SqlitePool, table: &str) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await?;
    Ok(count == 0)
}

/// Two sections with a full day of hours and five students each.
/// Each table is only touched while it is empty, so reruns are no-ops.
pub async fn seed_demo_data(pool: &SqlitePool) -> Result<()> {
    if is_empty(pool, "sections").await? {
        let mut tx = pool.begin().await?;
        for name in ["IT-A", "IT-B"] {
            sqlx::query("INSERT INTO sections (name) VALUES (?)")
                .bind(name)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        info!("Sections added");
    }

    let sections = list_sections(pool).await?;

    if is_empty(pool, "hours").await? {
        let mut tx = pool.begin().await?;
        for section in &sections {
            for slot in TIME_SLOTS {
                sqlx::query("INSERT INTO hours (time_slot, section_id) VALUES (?, ?)")
                    .bind(slot)
                    .bind(section.id)
                    .execute(&mut *tx)
                    .await?;
            }
        }
        tx.commit().await?;
        info!("Hours added for {} sections", sections.len());
    }

    if is_empty(pool, "students").await? {
        let mut tx = pool.begin().await?;
        for (reg_no, name, section_name) in DEMO_STUDENTS {
            let Some(section) = sections.iter().find(|s| s.name == section_name) else {
                continue;
            };
            sqlx::query("INSERT INTO students (reg_no, name, section_id) VALUES (?, ?, ?)")
                .bind(reg_no)
                .bind(name)
                .bind(section.id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        info!("Students added");
    }

    Ok(())
}
