use actix_web::{HttpResponse, Responder, web};
use sqlx::SqlitePool;

use crate::{
    db,
    error::AppError,
    model::{hour::Hour, section::Section, student::Student},
};

/// List sections
#[utoipa::path(
    get,
    path = "/sections",
    responses(
        (status = 200, description = "All sections", body = [Section]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Catalog"
)]
pub async fn get_sections(pool: web::Data<SqlitePool>) -> Result<impl Responder, AppError> {
    let sections = db::list_sections(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(sections))
}

/// List the hours of a section
#[utoipa::path(
    get,
    path = "/hours/{section_id}",
    params(
        ("section_id", Path, description = "Section ID")
    ),
    responses(
        (status = 200, description = "Hours in stored order", body = [Hour])
    ),
    tag = "Catalog"
)]
pub async fn get_hours(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let hours = db::list_hours(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(hours))
}

/// List the students of a section
#[utoipa::path(
    get,
    path = "/students/{section_id}",
    params(
        ("section_id", Path, description = "Section ID")
    ),
    responses(
        (status = 200, description = "Students of the section", body = [Student])
    ),
    tag = "Catalog"
)]
pub async fn get_students(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let students = db::list_students(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(students))
}
