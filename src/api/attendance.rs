use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use std::collections::BTreeSet;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::{
    clock::Clock,
    config::Config,
    error::AppError,
    model::attendance::{AttendanceEntry, AttendanceRecord, AttendanceSummary},
    services::{
        attendance,
        mail::{self, ReportMailer},
        report,
    },
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkAttendance {
    #[schema(example = 1)]
    pub student_id: Option<i64>,
    #[schema(example = 1)]
    pub hour_id: Option<i64>,
    /// Absent when omitted.
    #[schema(example = true)]
    pub status: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitEntry {
    #[schema(example = 1)]
    pub student_id: Option<i64>,
    #[schema(example = 1)]
    pub hour_id: Option<i64>,
    #[schema(example = true)]
    pub status: Option<bool>,
    /// Only read from the first entry.
    #[schema(example = 1)]
    pub section_id: Option<i64>,
}

fn to_entry(
    student_id: Option<i64>,
    hour_id: Option<i64>,
    status: Option<bool>,
) -> Result<AttendanceEntry, AppError> {
    match (student_id, hour_id) {
        (Some(student_id), Some(hour_id)) => Ok(AttendanceEntry {
            student_id,
            hour_id,
            status: status.unwrap_or(false),
        }),
        _ => Err(AppError::validation("student_id and hour_id are required")),
    }
}

/// Mark one student for today
#[utoipa::path(
    post,
    path = "/mark_attendance",
    request_body = MarkAttendance,
    responses(
        (status = 200, description = "Attendance recorded", body = Object, example = json!({
            "message": "Attendance marked successfully"
        })),
        (status = 400, description = "Missing student or hour id"),
        (status = 422, description = "Student or hour does not exist"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    pool: web::Data<SqlitePool>,
    clock: web::Data<dyn Clock>,
    payload: web::Json<MarkAttendance>,
) -> Result<impl Responder, AppError> {
    let entry = to_entry(payload.student_id, payload.hour_id, payload.status)?;

    attendance::record_attendance(pool.get_ref(), &entry, clock.today()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance marked successfully"
    })))
}

/// Submit a whole hour, then email its report
#[utoipa::path(
    post,
    path = "/submit_attendance",
    request_body = [SubmitEntry],
    responses(
        (status = 200, description = "Saved and emailed", body = Object, example = json!({
            "message": "Attendance submitted and report emailed successfully",
            "report": "attendance_report_1_1_2026-03-09.pdf",
            "delivered": true
        })),
        (status = 400, description = "Empty list or missing section/hour id"),
        (status = 422, description = "Student or hour does not exist"),
        (status = 500, description = "Saved, but the report was not delivered", body = Object, example = json!({
            "message": "Attendance saved, but the report could not be emailed",
            "report": "attendance_report_1_1_2026-03-09.pdf",
            "delivered": false
        }))
    ),
    tag = "Attendance"
)]
pub async fn submit_attendance(
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    clock: web::Data<dyn Clock>,
    mailer: web::Data<dyn ReportMailer>,
    payload: web::Json<Vec<SubmitEntry>>,
) -> Result<impl Responder, AppError> {
    let submitted = payload.into_inner();

    let first = submitted
        .first()
        .ok_or_else(|| AppError::validation("No attendance data received"))?;

    let (section_id, hour_id) = match (first.section_id, first.hour_id) {
        (Some(section_id), Some(hour_id)) => (section_id, hour_id),
        _ => return Err(AppError::validation("Section ID or Hour ID missing")),
    };

    let entries = submitted
        .iter()
        .map(|e| to_entry(e.student_id, e.hour_id, e.status))
        .collect::<Result<Vec<_>, _>>()?;

    let today = clock.today();
    let outcome = attendance::record_batch(pool.get_ref(), &entries, today).await?;
    info!(
        section_id,
        hour_id,
        inserted = outcome.inserted,
        updated = outcome.updated,
        "Attendance submitted"
    );

    // rows are committed from here on; failures below are partial successes
    let artifact = match report::generate_report(
        pool.get_ref(),
        &config.reports_dir,
        section_id,
        Some(hour_id),
        today,
    )
    .await
    {
        Ok(artifact) => artifact,
        Err(e) => {
            error!(error = %e, section_id, hour_id, "Report generation failed after submit");
            return Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Attendance saved, but the report could not be generated",
                "delivered": false
            })));
        }
    };

    let recipients: BTreeSet<String> = config.report_recipients.iter().cloned().collect();

    if mail::dispatch(mailer.get_ref(), &artifact, &recipients).await {
        Ok(HttpResponse::Ok().json(json!({
            "message": "Attendance submitted and report emailed successfully",
            "report": artifact.file_name,
            "delivered": true
        })))
    } else {
        warn!(report = %artifact.file_name, "Report saved locally but not delivered");
        Ok(HttpResponse::InternalServerError().json(json!({
            "message": "Attendance saved, but the report could not be emailed",
            "report": artifact.file_name,
            "delivered": false
        })))
    }
}

/// Today's records for an hour
#[utoipa::path(
    get,
    path = "/get_attendance/{hour_id}",
    params(
        ("hour_id", Path, description = "Hour ID")
    ),
    responses(
        (status = 200, description = "Records marked today", body = [AttendanceRecord])
    ),
    tag = "Attendance"
)]
pub async fn get_attendance(
    pool: web::Data<SqlitePool>,
    clock: web::Data<dyn Clock>,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let records = attendance::records_for_hour(pool.get_ref(), path.into_inner(), clock.today()).await?;
    Ok(HttpResponse::Ok().json(records))
}

/// Present / absent split of a section for an hour today
#[utoipa::path(
    get,
    path = "/attendance_summary/{section_id}/{hour_id}",
    params(
        ("section_id", Path, description = "Section ID"),
        ("hour_id", Path, description = "Hour ID")
    ),
    responses(
        (status = 200, description = "Every student of the section in exactly one list", body = AttendanceSummary)
    ),
    tag = "Attendance"
)]
pub async fn attendance_summary(
    pool: web::Data<SqlitePool>,
    clock: web::Data<dyn Clock>,
    path: web::Path<(i64, i64)>,
) -> Result<impl Responder, AppError> {
    let (section_id, hour_id) = path.into_inner();
    let summary = attendance::summary(pool.get_ref(), section_id, hour_id, clock.today()).await?;
    Ok(HttpResponse::Ok().json(summary))
}
