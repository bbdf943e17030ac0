use crate::api::{attendance, catalog, pages, report};
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    // Pages + session
    cfg.service(
        web::resource("/")
            .route(web::get().to(pages::landing))
            .route(web::post().to(pages::login)),
    )
    .service(
        web::resource("/register")
            .route(web::get().to(pages::register_form))
            .route(web::post().to(pages::register)),
    )
    .route("/logout", web::get().to(pages::logout))
    .route("/attendance", web::get().to(pages::attendance_page))
    .route("/hours", web::get().to(pages::hours_page))
    .route("/students", web::get().to(pages::students_page))
    .route("/view_stats", web::get().to(pages::view_stats_page));

    // JSON
    cfg.route("/sections", web::get().to(catalog::get_sections))
        .route("/hours/{section_id}", web::get().to(catalog::get_hours))
        .route("/students/{section_id}", web::get().to(catalog::get_students))
        .route("/mark_attendance", web::post().to(attendance::mark_attendance))
        .route("/submit_attendance", web::post().to(attendance::submit_attendance))
        .route("/get_attendance/{hour_id}", web::get().to(attendance::get_attendance))
        .route(
            "/attendance_summary/{section_id}/{hour_id}",
            web::get().to(attendance::attendance_summary),
        )
        .route(
            "/generate_report/{section_id}/{date}",
            web::get().to(report::generate_report),
        );
}
