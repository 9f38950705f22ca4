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
use chrono::Local;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    entities::dining_table,
    error::{ApiResponse, AppResult, ok},
    router::AppState,
    routes::StatusUpdate,
    services::{
        availability::{self, AvailabilityQuery},
        booking::parse_date,
        tables::{self, NewTable, TableOverview, TableUpdate},
    },
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tables).post(add_table))
        .route("/available", get(available_tables))
        .route(
            "/{id}",
            get(get_table).put(update_table).delete(delete_table),
        )
        .route("/{id}/status", patch(update_table_status))
        .route("/{id}/toggle-active", post(toggle_table_active))
}

#[derive(Deserialize)]
pub struct AvailableParams {
    date: Option<String>,
    time: Option<String>,
    guests: Option<i32>,
}

pub async fn add_table(
    State(state): State<AppState>,
    payload: Result<Json<NewTable>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let table = tables::add(&state.db, payload).await?;
    let response = ApiResponse {
        table_number: Some(table.table_number),
        ..ApiResponse::success(table).with_message("Table added successfully")
    };
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_tables(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<TableOverview>>>> {
    let overview = tables::list_with_bookings(&state.db, Local::now().naive_local()).await?;
    Ok(ok(overview))
}

pub async fn available_tables(
    State(state): State<AppState>,
    params: Result<Query<AvailableParams>, QueryRejection>,
) -> AppResult<Json<ApiResponse<Vec<dining_table::Model>>>> {
    let Query(params) = params?;
    let query = AvailabilityQuery {
        date: params.date.as_deref().map(parse_date).transpose()?,
        time: params.time.filter(|t| !t.trim().is_empty()),
        min_guests: params.guests,
    };
    let tables = availability::list_available_tables(&state.db, &query).await?;
    Ok(ok(tables))
}

pub async fn get_table(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ApiResponse<dining_table::Model>>> {
    let Path(id) = id?;
    Ok(ok(tables::get(&state.db, id).await?))
}

pub async fn update_table(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<TableUpdate>, JsonRejection>,
) -> AppResult<Json<ApiResponse<dining_table::Model>>> {
    let Path(id) = id?;
    let Json(changes) = payload?;
    let table = tables::update(&state.db, id, changes).await?;
    Ok(Json(
        ApiResponse::success(table).with_message("Table updated successfully"),
    ))
}

pub async fn update_table_status(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> AppResult<Json<ApiResponse<dining_table::Model>>> {
    let Path(id) = id?;
    let Json(StatusUpdate { status }) = payload?;
    let table = tables::update_status(&state.db, id, &status).await?;
    let message = format!("Table status updated to {}", table.status);
    Ok(Json(ApiResponse::success(table).with_message(message)))
}

pub async fn toggle_table_active(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ApiResponse<dining_table::Model>>> {
    let Path(id) = id?;
    let table = tables::toggle_active(&state.db, id).await?;
    let message = if table.is_active {
        "Table activated"
    } else {
        "Table deactivated"
    };
    Ok(Json(ApiResponse::success(table).with_message(message)))
}

pub async fn delete_table(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ApiResponse<()>>> {
    let Path(id) = id?;
    tables::delete(&state.db, id).await?;
    Ok(Json(ApiResponse::message("Table deleted successfully")))
}
