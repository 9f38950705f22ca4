//! Dining table administration and the per-table booking overview.

use std::collections::HashMap;

use chrono::{NaiveDateTime, Timelike, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, SqlErr, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::availability::DayWindow;
use crate::entities::{
    booking::{self, BookingStatus},
    dining_table::{self, Features, Location, TableStatus},
    prelude::*,
};
use crate::error::{AppError, AppResult};

/// Days counted by `upcomingBookings`, today included.
const UPCOMING_DAYS: u64 = 7;
/// A table is "booked now" when one of today's bookings starts within this
/// many hours of the current hour.
const BUSY_HOURS: u32 = 2;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTable {
    pub table_number: Option<i32>,
    pub table_name: Option<String>,
    pub capacity: Option<i32>,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub features: Vec<String>,
    pub min_booking_hours: Option<i32>,
    pub price_per_hour: Option<f64>,
    pub description: Option<String>,
    pub status: Option<TableStatus>,
}

/// Fields an administrator may change. Anything else in the payload is
/// rejected during deserialization.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TableUpdate {
    pub table_number: Option<i32>,
    pub table_name: Option<String>,
    pub capacity: Option<i32>,
    pub location: Option<Location>,
    pub features: Option<Vec<String>>,
    pub min_booking_hours: Option<i32>,
    pub price_per_hour: Option<f64>,
    pub description: Option<String>,
    pub status: Option<TableStatus>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableOverview {
    #[serde(flatten)]
    pub table: dining_table::Model,
    pub today_bookings: Vec<booking::Model>,
    pub upcoming_bookings: usize,
    pub is_currently_booked: bool,
}

fn positive(value: i32, field: &str) -> AppResult<i32> {
    if value < 1 {
        return Err(AppError::Validation(format!("{field} must be at least 1")));
    }
    Ok(value)
}

fn duplicate_number(number: i32) -> AppError {
    AppError::Conflict(format!("Table number {number} already exists"))
}

fn map_unique(number: i32) -> impl FnOnce(DbErr) -> AppError {
    move |err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => duplicate_number(number),
        _ => AppError::from(err),
    }
}

async fn ensure_number_unused(
    db: &DatabaseConnection,
    number: i32,
    except: Option<Uuid>,
) -> AppResult<()> {
    let existing = DiningTable::find()
        .filter(dining_table::Column::TableNumber.eq(number))
        .one(db)
        .await?;
    match existing {
        Some(table) if Some(table.id) != except => Err(duplicate_number(number)),
        _ => Ok(()),
    }
}

pub async fn add(db: &DatabaseConnection, payload: NewTable) -> AppResult<dining_table::Model> {
    let (Some(number), Some(capacity)) = (payload.table_number, payload.capacity) else {
        return Err(AppError::Validation(
            "Table number and capacity are required".to_string(),
        ));
    };
    let number = positive(number, "Table number")?;
    let capacity = positive(capacity, "Capacity")?;
    ensure_number_unused(db, number, None).await?;

    let now = Utc::now().naive_utc();
    let table = dining_table::ActiveModel {
        id: Set(Uuid::new_v4()),
        table_number: Set(number),
        table_name: Set(payload.table_name),
        capacity: Set(capacity),
        location: Set(payload.location),
        features: Set(Features::from(payload.features)),
        min_booking_hours: Set(payload.min_booking_hours.unwrap_or(1)),
        price_per_hour: Set(payload.price_per_hour.unwrap_or(0.0)),
        description: Set(payload.description),
        status: Set(payload.status.unwrap_or_default()),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .map_err(map_unique(number))?;

    info!(table_id = %table.id, table_number = table.table_number, "table added");
    Ok(table)
}

pub async fn get(db: &DatabaseConnection, table_id: Uuid) -> AppResult<dining_table::Model> {
    DiningTable::find_by_id(table_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::table_not_found(table_id))
}

pub async fn update(
    db: &DatabaseConnection,
    table_id: Uuid,
    changes: TableUpdate,
) -> AppResult<dining_table::Model> {
    let existing = get(db, table_id).await?;
    let current_number = existing.table_number;
    let mut table = existing.into_active_model();

    if let Some(number) = changes.table_number {
        let number = positive(number, "Table number")?;
        if number != current_number {
            ensure_number_unused(db, number, Some(table_id)).await?;
        }
        table.table_number = Set(number);
    }
    if let Some(capacity) = changes.capacity {
        table.capacity = Set(positive(capacity, "Capacity")?);
    }
    if let Some(name) = changes.table_name {
        table.table_name = Set(Some(name));
    }
    if let Some(location) = changes.location {
        table.location = Set(location);
    }
    if let Some(features) = changes.features {
        table.features = Set(Features::from(features));
    }
    if let Some(hours) = changes.min_booking_hours {
        table.min_booking_hours = Set(hours);
    }
    if let Some(price) = changes.price_per_hour {
        table.price_per_hour = Set(price);
    }
    if let Some(description) = changes.description {
        table.description = Set(Some(description));
    }
    if let Some(status) = changes.status {
        table.status = Set(status);
    }
    if let Some(active) = changes.is_active {
        table.is_active = Set(active);
    }
    table.updated_at = Set(Utc::now().naive_utc());

    let number = changes.table_number.unwrap_or(current_number);
    let table = table.update(db).await.map_err(map_unique(number))?;
    info!(table_id = %table.id, "table updated");
    Ok(table)
}

/// Sets the status from its wire name, rejecting anything outside the enum.
pub async fn update_status(
    db: &DatabaseConnection,
    table_id: Uuid,
    status: &str,
) -> AppResult<dining_table::Model> {
    let status: TableStatus = status.parse().map_err(AppError::InvalidEnum)?;
    let mut table = get(db, table_id).await?.into_active_model();
    table.status = Set(status);
    table.updated_at = Set(Utc::now().naive_utc());
    let table = table.update(db).await?;

    info!(table_id = %table.id, %status, "table status set");
    Ok(table)
}

pub async fn toggle_active(db: &DatabaseConnection, table_id: Uuid) -> AppResult<dining_table::Model> {
    let existing = get(db, table_id).await?;
    let is_active = !existing.is_active;
    let mut table = existing.into_active_model();
    table.is_active = Set(is_active);
    table.updated_at = Set(Utc::now().naive_utc());
    let table = table.update(db).await?;

    info!(table_id = %table.id, is_active, "table active flag toggled");
    Ok(table)
}

/// Deletes the table. Bookings that reference it are left untouched.
pub async fn delete(db: &DatabaseConnection, table_id: Uuid) -> AppResult<()> {
    let result = DiningTable::delete_by_id(table_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::table_not_found(table_id));
    }
    info!(%table_id, "table deleted");
    Ok(())
}

/// Writes a table status as a booking side effect. A missing table is not
/// an error: bookings may outlive the table they reference.
pub(crate) async fn set_table_status<C: ConnectionTrait>(
    db: &C,
    table_id: Uuid,
    status: TableStatus,
) -> Result<(), DbErr> {
    DiningTable::update_many()
        .col_expr(dining_table::Column::Status, Expr::value(status))
        .col_expr(
            dining_table::Column::UpdatedAt,
            Expr::value(Utc::now().naive_utc()),
        )
        .filter(dining_table::Column::Id.eq(table_id))
        .exec(db)
        .await?;
    Ok(())
}

/// All tables ordered by number, each with today's active bookings, the
/// count of active bookings over the coming week and a rough "busy now"
/// flag.
pub async fn list_with_bookings(
    db: &DatabaseConnection,
    now: NaiveDateTime,
) -> AppResult<Vec<TableOverview>> {
    let tables = DiningTable::find()
        .order_by_asc(dining_table::Column::TableNumber)
        .all(db)
        .await?;

    let today = DayWindow::day(now.date());
    let upcoming = DayWindow::days(now.date(), UPCOMING_DAYS);
    let bookings = Booking::find()
        .filter(booking::Column::TableId.is_not_null())
        .filter(upcoming.condition())
        .filter(booking::Column::Status.is_in(BookingStatus::ACTIVE))
        .order_by_asc(booking::Column::Date)
        .order_by_asc(booking::Column::Time)
        .all(db)
        .await?;

    let mut by_table: HashMap<Uuid, Vec<booking::Model>> = HashMap::new();
    for booking in bookings {
        if let Some(table_id) = booking.table_id {
            by_table.entry(table_id).or_default().push(booking);
        }
    }

    let overview = tables
        .into_iter()
        .map(|table| {
            let bookings = by_table.remove(&table.id).unwrap_or_default();
            let upcoming_bookings = bookings.len();
            let today_bookings: Vec<booking::Model> = bookings
                .into_iter()
                .filter(|b| today.contains(b.date))
                .collect();
            let is_currently_booked = today_bookings
                .iter()
                .any(|b| starts_near(&b.time, now.hour()));

            TableOverview {
                table,
                today_bookings,
                upcoming_bookings,
                is_currently_booked,
            }
        })
        .collect();
    Ok(overview)
}

/// Compares hours only, so "busy now" is approximate.
fn starts_near(time: &str, current_hour: u32) -> bool {
    time.split(':')
        .next()
        .and_then(|hour| hour.parse::<u32>().ok())
        .is_some_and(|hour| hour.abs_diff(current_hour) <= BUSY_HOURS)
}
