use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use askama::Template;
use std::fmt;

use crate::storage::StorageError;
use crate::templates_structs::ApiErrorResponse;

#[derive(Debug)]
pub enum AppError {
    Validation { field: String, message: String },
    FileValidation { filename: String, rule: String },
    NotFound(String),
    Conflict { expected: u64, actual: u64 },
    Format(String),
    Storage(StorageError),
    Template(askama::Error),
}

impl AppError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn file(filename: &str, rule: impl Into<String>) -> Self {
        AppError::FileValidation {
            filename: filename.to_string(),
            rule: rule.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::FileValidation { .. } => "file_validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict { .. } => "conflict",
            AppError::Format(_) => "format_error",
            AppError::Storage(_) => "storage_error",
            AppError::Template(_) => "internal_error",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation { message, .. } => write!(f, "{message}"),
            AppError::FileValidation { filename, rule } => write!(f, "File '{filename}': {rule}"),
            AppError::NotFound(what) => write!(f, "{what} not found"),
            AppError::Conflict { expected, actual } => write!(
                f,
                "Response was modified concurrently (expected revision {expected}, found {actual})"
            ),
            AppError::Format(e) => write!(f, "Question definition error: {e}"),
            AppError::Storage(e) => write!(f, "Storage error: {e}"),
            AppError::Template(e) => write!(f, "Template error: {e}"),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::FileValidation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Format(_) | AppError::Storage(_) | AppError::Template(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{self}");
        }

        let field = match self {
            AppError::Validation { field, .. } => Some(field.clone()),
            AppError::FileValidation { filename, .. } => Some(filename.clone()),
            _ => None,
        };
        // Storage and template details stay in the log.
        let message = match self {
            AppError::Storage(_) => "Failed to access survey storage".to_string(),
            AppError::Template(_) => "Failed to render page".to_string(),
            other => other.to_string(),
        };

        HttpResponse::build(status).json(ApiErrorResponse {
            error: self.code().to_string(),
            message,
            field,
        })
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        AppError::Storage(e)
    }
}

impl From<askama::Error> for AppError {
    fn from(e: askama::Error) -> Self {
        AppError::Template(e)
    }
}

/// Render an askama template into an HTML response.
pub fn render(tmpl: impl Template) -> Result<HttpResponse, AppError> {
    let body = tmpl.render()?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body))
}
