use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::SqlitePool;
use utoipa::IntoParams;

use crate::{config::Config, error::AppError, services::report};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// Restrict the report to one hour and add a tally.
    pub hour_id: Option<i64>,
}

/// Download a section's report for a day
#[utoipa::path(
    get,
    path = "/generate_report/{section_id}/{date}",
    params(
        ("section_id", Path, description = "Section ID"),
        ("date", Path, description = "Day of the report, YYYY-MM-DD"),
        ReportQuery
    ),
    responses(
        (status = 200, description = "PDF attachment", content_type = "application/pdf"),
        (status = 400, description = "Malformed date"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Report"
)]
pub async fn generate_report(
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    path: web::Path<(i64, String)>,
    query: web::Query<ReportQuery>,
) -> Result<impl Responder, AppError> {
    let (section_id, raw_date) = path.into_inner();
    let date = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date: {raw_date}")))?;

    let artifact = report::generate_report(
        pool.get_ref(),
        &config.reports_dir,
        section_id,
        query.hour_id,
        date,
    )
    .await?;

    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(artifact.file_name)],
        })
        .body(artifact.bytes))
}

