use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    entities::booking::{self, BookingStatus},
    error::{ApiResponse, AppError, AppResult, ok},
    router::AppState,
    routes::StatusUpdate,
    services::booking::{self as lifecycle, NewBooking, ReleasePolicy},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bookings).post(create_booking))
        .route("/user", get(user_bookings))
        .route("/date/{date}", get(bookings_by_date))
        .route("/{id}", get(get_booking).delete(delete_booking))
        .route("/{id}/status", patch(update_status))
        .route("/{id}/cancel", post(cancel_booking))
}

#[derive(Deserialize)]
pub struct ListParams {
    status: Option<String>,
}

#[derive(Deserialize)]
pub struct UserParams {
    email: Option<String>,
    phone: Option<String>,
}

#[derive(Deserialize)]
pub struct CancelRequest {
    email: String,
}

fn parse_status(status: &str) -> AppResult<BookingStatus> {
    status.parse().map_err(AppError::InvalidEnum)
}

pub async fn create_booking(
    State(state): State<AppState>,
    payload: Result<Json<NewBooking>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let created = lifecycle::create(&state.db, payload).await?;

    let booking = created.booking;
    let response = ApiResponse {
        booking_id: Some(booking.id),
        has_pre_order: Some(booking.has_pre_order),
        table_number: created.table.map(|t| t.table_number),
        ..ApiResponse::success(booking).with_message("Booking created successfully")
    };
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_bookings(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> AppResult<Json<ApiResponse<Vec<booking::Model>>>> {
    let Query(params) = params?;
    let status = params.status.as_deref().map(parse_status).transpose()?;
    let bookings = lifecycle::list(&state.db, status).await?;
    Ok(ok(bookings))
}

pub async fn get_booking(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ApiResponse<booking::Model>>> {
    let Path(id) = id?;
    Ok(ok(lifecycle::get(&state.db, id).await?))
}

pub async fn bookings_by_date(
    State(state): State<AppState>,
    date: Result<Path<String>, PathRejection>,
) -> AppResult<Json<ApiResponse<Vec<booking::Model>>>> {
    let Path(date) = date?;
    let date = lifecycle::parse_date(&date)?;
    Ok(ok(lifecycle::list_by_date(&state.db, date).await?))
}

pub async fn user_bookings(
    State(state): State<AppState>,
    params: Result<Query<UserParams>, QueryRejection>,
) -> AppResult<Json<ApiResponse<Vec<booking::Model>>>> {
    let Query(params) = params?;
    let bookings =
        lifecycle::list_by_user(&state.db, params.email.as_deref(), params.phone.as_deref()).await?;
    Ok(ok(bookings))
}

pub async fn update_status(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> AppResult<Json<ApiResponse<booking::Model>>> {
    let Path(id) = id?;
    let Json(StatusUpdate { status }) = payload?;
    let status = parse_status(&status)?;
    let policy = ReleasePolicy::new(state.release_window);
    let booking = lifecycle::set_status(&state.db, id, status, policy).await?;
    Ok(Json(
        ApiResponse::success(booking).with_message(format!("Booking status updated to {status}")),
    ))
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<CancelRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<booking::Model>>> {
    let Path(id) = id?;
    let Json(CancelRequest { email }) = payload?;
    let policy = ReleasePolicy::new(state.release_window);
    let booking = lifecycle::cancel_by_user(&state.db, id, &email, policy).await?;
    Ok(Json(
        ApiResponse::success(booking).with_message("Booking cancelled successfully"),
    ))
}

pub async fn delete_booking(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ApiResponse<()>>> {
    let Path(id) = id?;
    let policy = ReleasePolicy::new(state.release_window);
    lifecycle::delete(&state.db, id, policy).await?;
    Ok(Json(ApiResponse::message("Booking deleted successfully")))
}
