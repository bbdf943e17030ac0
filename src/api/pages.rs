use actix_web::http::StatusCode;
use actix_web::http::header::{ContentType, LOCATION};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{debug, error, info, instrument};

use crate::{
    auth::{
        password::{hash_password, verify_password},
        session::{SessionUser, expired_session_cookie, issue_session_token, session_cookie},
    },
    config::Config,
    model::user::User,
};

const LOGIN: &str = include_str!("../../templates/login.html");
const REGISTER: &str = include_str!("../../templates/register.html");
const INDEX: &str = include_str!("../../templates/index.html");
const ATTENDANCE: &str = include_str!("../../templates/attendance.html");
const HOURS: &str = include_str!("../../templates/hours.html");
const STUDENTS: &str = include_str!("../../templates/students.html");
const VIEW_STATS: &str = include_str!("../../templates/view_stats.html");

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LandingQuery {
    pub logged_out: Option<String>,
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Fills the `{{ message }}` slot of a template.
fn render(template: &str, message: Option<&str>) -> String {
    let slot = match message {
        Some(msg) => format!(r#"<p class="message">{}</p>"#, escape(msg)),
        None => String::new(),
    };
    template.replace("{{ message }}", &slot)
}

fn html(status: StatusCode, template: &str, message: Option<&str>) -> HttpResponse {
    HttpResponse::build(status)
        .content_type(ContentType::html())
        .body(render(template, message))
}

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((LOCATION, location))
        .finish()
}

// -------------------- Landing / login --------------------

pub async fn landing(session: Option<SessionUser>, query: web::Query<LandingQuery>) -> impl Responder {
    match session {
        Some(user) => {
            debug!(user_id = user.user_id, "Session found, serving dashboard");
            html(StatusCode::OK, INDEX, None)
        }
        None if query.logged_out.is_some() => {
            html(StatusCode::OK, LOGIN, Some("Logged out successfully"))
        }
        None => html(StatusCode::OK, LOGIN, None),
    }
}

#[instrument(
    name = "login",
    skip(pool, config, form),
    fields(username = %form.username)
)]
pub async fn login(
    form: web::Form<Credentials>,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    if form.username.trim().is_empty() || form.password.is_empty() {
        return html(
            StatusCode::BAD_REQUEST,
            LOGIN,
            Some("Username and password are required"),
        );
    }

    let user = match sqlx::query_as::<_, User>(
        "SELECT id, username, password_hash FROM users WHERE username = ?",
    )
    .bind(form.username.trim())
    .fetch_optional(pool.get_ref())
    .await
    {
        Ok(Some(user)) => user,
        Ok(None) => {
            info!("Invalid credentials: user not found");
            return html(StatusCode::UNAUTHORIZED, LOGIN, Some("Invalid credentials"));
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching user");
            return HttpResponse::InternalServerError().finish();
        }
    };

    if let Err(e) = verify_password(&form.password, &user.password_hash) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return html(StatusCode::UNAUTHORIZED, LOGIN, Some("Invalid credentials"));
    }

    let token = match issue_session_token(
        user.id,
        &user.username,
        &config.session_secret,
        config.session_ttl,
    ) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to issue session token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    info!(user_id = user.id, "Login successful");

    HttpResponse::SeeOther()
        .insert_header((LOCATION, "/"))
        .cookie(session_cookie(token, config.session_ttl))
        .finish()
}

pub async fn logout() -> impl Responder {
    HttpResponse::SeeOther()
        .insert_header((LOCATION, "/?logged_out=1"))
        .cookie(expired_session_cookie())
        .finish()
}

// -------------------- Registration --------------------

pub async fn register_form() -> impl Responder {
    html(StatusCode::OK, REGISTER, None)
}

pub async fn register(form: web::Form<Credentials>, pool: web::Data<SqlitePool>) -> impl Responder {
    let username = form.username.trim();

    if username.is_empty() || form.password.is_empty() {
        return html(
            StatusCode::BAD_REQUEST,
            REGISTER,
            Some("Username and password must not be empty"),
        );
    }

    let taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)",
    )
    .bind(username)
    .fetch_one(pool.get_ref())
    .await;

    match taken {
        Ok(true) => {
            return html(StatusCode::CONFLICT, REGISTER, Some("Username already exists"));
        }
        Ok(false) => {}
        Err(e) => {
            error!(error = %e, "Failed to check username");
            return HttpResponse::InternalServerError().finish();
        }
    }

    let hashed = match hash_password(&form.password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "Failed to hash password");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let result = sqlx::query("INSERT INTO users (username, password_hash) VALUES (?, ?)")
        .bind(username)
        .bind(hashed)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(_) => {
            info!(username, "User registered");
            see_other("/")
        }
        Err(e) => {
            // lost a race with another registration for the same name
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return html(StatusCode::CONFLICT, REGISTER, Some("Username already exists"));
                }
            }
            error!(error = %e, "Failed to register user");
            HttpResponse::InternalServerError().finish()
        }
    }
}

// -------------------- Static shells --------------------

pub async fn attendance_page() -> impl Responder {
    html(StatusCode::OK, ATTENDANCE, None)
}

pub async fn hours_page() -> impl Responder {
    html(StatusCode::OK, HOURS, None)
}

pub async fn students_page() -> impl Responder {
    html(StatusCode::OK, STUDENTS, None)
}

pub async fn view_stats_page() -> impl Responder {
    html(StatusCode::OK, VIEW_STATS, None)
}
