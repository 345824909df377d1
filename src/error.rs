use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub const DESCRIPTION_NOT_PROVIDED_MESSAGE: &str = "The Todo description wasn't provided";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("The Todo item with the ID {0} wasn't found")]
    NotFound(i64),

    #[error("{0}")]
    InvalidInput(String),

    #[error("An operation to change the status to PAST_DUE with a future date is not allowed for the Todo id {0}")]
    PastDueWithFutureDate(i64),

    #[error("It's not allowed to update the information for the Todo id {0} because it's a past due item")]
    PastDueItemFrozen(i64),

    #[error("The Todo item {0} was already marked as DONE. It needs to be updated to NOT_DONE before performing this operation")]
    DoneItemLocked(i64),

    #[error("It's not allowed to change a Todo item to a status PAST_DUE with a null or non-expired dueAt date for the item {0}")]
    PastDueWithoutElapsedDueAt(i64),

    #[error("It's not allowed to update a Todo item with a expired date and Status different of PAST_DUE for the item {0}")]
    ElapsedDueAtWithoutPastDue(i64),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_)
            | AppError::PastDueWithFutureDate(_)
            | AppError::PastDueItemFrozen(_)
            | AppError::DoneItemLocked(_)
            | AppError::PastDueWithoutElapsedDueAt(_)
            | AppError::ElapsedDueAtWithoutPastDue(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Binds the error to the request path so the response body can name it.
    pub fn at(self, path: impl Into<String>) -> ApiError {
        ApiError {
            error: self,
            path: path.into(),
        }
    }
}

/// An [`AppError`] raised while serving a particular request path.
#[derive(Debug)]
pub struct ApiError {
    pub error: AppError,
    pub path: String,
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        ApiError {
            error,
            path: String::new(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub http_status: String,
    pub message: String,
    pub description: String,
}

/// `404 Not Found` becomes `NOT_FOUND`.
fn status_name(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("UNKNOWN")
        .to_ascii_uppercase()
        .replace([' ', '-'], "_")
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        let message = match &self.error {
            AppError::Database(e) => {
                error!("database error: {}", e);
                "Database error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            http_status: status_name(status),
            message,
            description: format!("uri={}", self.path),
        });

        (status, body).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
