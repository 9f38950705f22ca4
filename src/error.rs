//! Application error type and the JSON response envelope.
//!
//! Every handler returns [`AppResult`]. Errors are never fatal: they are
//! converted at the HTTP boundary into `{ "success": false, "message": ... }`.
//!
//! | Variant        | Status | Raised when                                   |
//! |----------------|--------|-----------------------------------------------|
//! | `Validation`   | 400    | required field missing or malformed           |
//! | `Conflict`     | 409    | slot already booked, duplicate table number   |
//! | `NotFound`     | 404    | booking or table id does not exist            |
//! | `Authorization`| 403    | cancel with mismatched email, bad credentials |
//! | `InvalidState` | 409    | cancel on a terminal booking                  |
//! | `InvalidEnum`  | 400    | unrecognized status value                     |
//! | `Database`     | 500    | storage failure, raw message surfaced         |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    InvalidEnum(String),

    #[error(transparent)]
    Database(#[from] DbErr),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn booking_not_found(id: Uuid) -> Self {
        Self::NotFound(format!("Booking {id} not found"))
    }

    pub fn table_not_found(id: Uuid) -> Self {
        Self::NotFound(format!("Table {id} not found"))
    }

    pub fn slot_taken() -> Self {
        Self::Conflict("Table is already booked for this date and time".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidEnum(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) | AppError::InvalidState(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let body = ApiResponse::<()>::failure(self.to_string());
        (status, Json(body)).into_response()
    }
}

/// Uniform response envelope.
///
/// ```json
/// { "success": true, "message": "...", "data": { ... }, "bookingId": "..." }
/// ```
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_pre_order: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_number: Option<i32>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            booking_id: None,
            has_pre_order: None,
            table_number: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            booking_id: None,
            has_pre_order: None,
            table_number: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            ..Self::message(message)
        }
    }
}

/// Successful JSON response with data.
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(data))
}
