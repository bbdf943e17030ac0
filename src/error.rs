use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

#[derive(Debug, Display)]
pub enum AppError {
    #[display(fmt = "{}", _0)]
    Validation(String),

    /// An id in the request points at a row that does not exist.
    #[display(fmt = "{}", _0)]
    Reference(String),

    #[display(fmt = "data integrity error: {}", _0)]
    DataIntegrity(String),

    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),

    #[display(fmt = "report error: {}", _0)]
    Report(String),
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Report(e.to_string())
    }
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn reference(msg: impl Into<String>) -> Self {
        AppError::Reference(msg.into())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Reference(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DataIntegrity(_) | AppError::Database(_) | AppError::Report(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Validation(msg) | AppError::Reference(msg) => msg.clone(),
            AppError::DataIntegrity(_) => "Attendance data is inconsistent, contact the system admin".to_string(),
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                "Internal Server Error".to_string()
            }
            AppError::Report(e) => {
                tracing::error!(error = %e, "Report generation failed");
                "Failed to generate report".to_string()
            }
        };

        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}
