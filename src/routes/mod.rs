pub mod bookings;
pub mod tables;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use serde::Deserialize;

use crate::error::AppError;

/// `{ "status": "..." }` body shared by the booking and table status routes.
#[derive(Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}
