//! Slot availability for tables.
//!
//! A table is taken for a slot when an active (Pending or Confirmed) booking
//! exists for the same table, the same calendar day and the exact same time
//! string. Times are not treated as durations: a booking at "18:00" does not
//! conflict with a request for "18:30".

use std::collections::HashSet;

use chrono::{Days, NaiveDate};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select,
};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::entities::{
    booking::{self, BookingStatus},
    dining_table::{self, TableStatus},
    prelude::*,
};

/// Half-open range of calendar days, `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DayWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DayWindow {
    pub fn day(date: NaiveDate) -> Self {
        Self::days(date, 1)
    }

    pub fn days(start: NaiveDate, count: u64) -> Self {
        let end = start
            .checked_add_days(Days::new(count))
            .unwrap_or(NaiveDate::MAX);
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    pub(crate) fn condition(&self) -> Condition {
        Condition::all()
            .add(booking::Column::Date.gte(self.start))
            .add(booking::Column::Date.lt(self.end))
    }
}

/// Active bookings for a table within a day window.
pub(crate) fn active_bookings_for_table(table_id: Uuid, window: DayWindow) -> Select<booking::Entity> {
    Booking::find()
        .filter(booking::Column::TableId.eq(table_id))
        .filter(window.condition())
        .filter(booking::Column::Status.is_in(BookingStatus::ACTIVE))
}

pub async fn is_table_free<C: ConnectionTrait>(
    db: &C,
    table_id: Uuid,
    date: NaiveDate,
    time: &str,
    exclude_booking_id: Option<Uuid>,
) -> Result<bool, DbErr> {
    let mut query =
        active_bookings_for_table(table_id, DayWindow::day(date)).filter(booking::Column::Time.eq(time));
    if let Some(id) = exclude_booking_id {
        query = query.filter(booking::Column::Id.ne(id));
    }

    let conflicts = query.count(db).await?;
    if conflicts > 0 {
        debug!(%table_id, %date, time, conflicts, "table already booked for slot");
    }
    Ok(conflicts == 0)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub min_guests: Option<i32>,
}

/// Active, non-maintenance tables that fit the party, smallest first.
///
/// When both a date and a time are given, tables holding an active booking
/// for that exact slot are left out.
pub async fn list_available_tables<C: ConnectionTrait>(
    db: &C,
    query: &AvailabilityQuery,
) -> Result<Vec<dining_table::Model>, DbErr> {
    let mut select = DiningTable::find()
        .filter(dining_table::Column::IsActive.eq(true))
        .filter(dining_table::Column::Status.ne(TableStatus::Maintenance))
        .order_by_asc(dining_table::Column::Capacity)
        .order_by_asc(dining_table::Column::TableNumber);
    if let Some(guests) = query.min_guests {
        select = select.filter(dining_table::Column::Capacity.gte(guests));
    }
    let tables = select.all(db).await?;

    let (Some(date), Some(time)) = (query.date, query.time.as_deref()) else {
        return Ok(tables);
    };

    let booked = booked_table_ids(db, date, time).await?;
    Ok(tables
        .into_iter()
        .filter(|table| !booked.contains(&table.id))
        .collect())
}

async fn booked_table_ids<C: ConnectionTrait>(
    db: &C,
    date: NaiveDate,
    time: &str,
) -> Result<HashSet<Uuid>, DbErr> {
    let ids: Vec<Option<Uuid>> = Booking::find()
        .select_only()
        .column(booking::Column::TableId)
        .filter(booking::Column::TableId.is_not_null())
        .filter(DayWindow::day(date).condition())
        .filter(booking::Column::Time.eq(time))
        .filter(booking::Column::Status.is_in(BookingStatus::ACTIVE))
        .into_tuple()
        .all(db)
        .await?;

    Ok(ids.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::booking::{self as lifecycle, NewBooking};
    use crate::services::tables;
    use crate::services::testing::{self, date};

    fn request(table_id: Uuid, day: &str, time: &str) -> NewBooking {
        NewBooking {
            name: Some("A".into()),
            email: Some("a@x.com".into()),
            phone: Some("123".into()),
            date: Some(day.into()),
            time: Some(time.into()),
            guests: Some(2),
            table_id: Some(table_id),
            ..Default::default()
        }
    }

    #[test]
    fn day_window_is_half_open() {
        let window = DayWindow::day(date("2024-06-01"));
        assert!(window.contains(date("2024-06-01")));
        assert!(!window.contains(date("2024-06-02")));
        assert!(!window.contains(date("2024-05-31")));

        let week = DayWindow::days(date("2024-06-01"), 7);
        assert_eq!(week.end, date("2024-06-08"));
    }

    #[tokio::test]
    async fn table_is_free_until_slot_is_booked() {
        let db = testing::db().await;
        let table = testing::table(&db, 5, 4).await;
        let day = date("2024-06-01");

        assert!(is_table_free(&db, table.id, day, "18:00", None).await.unwrap());

        let created = lifecycle::create(&db, request(table.id, "2024-06-01", "18:00"))
            .await
            .unwrap();

        assert!(!is_table_free(&db, table.id, day, "18:00", None).await.unwrap());
        assert!(is_table_free(&db, table.id, day, "18:00", Some(created.booking.id)).await.unwrap());
        // Exact time match only.
        assert!(is_table_free(&db, table.id, day, "18:30", None).await.unwrap());
        assert!(is_table_free(&db, table.id, date("2024-06-02"), "18:00", None).await.unwrap());
    }

    #[tokio::test]
    async fn cancelled_bookings_do_not_hold_the_slot() {
        let db = testing::db().await;
        let table = testing::table(&db, 5, 4).await;
        let created = lifecycle::create(&db, request(table.id, "2024-06-01", "18:00"))
            .await
            .unwrap();

        lifecycle::set_status(
            &db,
            created.booking.id,
            BookingStatus::Cancelled,
            lifecycle::ReleasePolicy::today(date("2024-06-01")),
        )
        .await
        .unwrap();

        assert!(is_table_free(&db, table.id, date("2024-06-01"), "18:00", None).await.unwrap());
    }

    #[tokio::test]
    async fn available_tables_fit_party_smallest_first() {
        let db = testing::db().await;
        testing::table(&db, 1, 6).await;
        testing::table(&db, 2, 2).await;
        testing::table(&db, 3, 4).await;

        let tables = list_available_tables(
            &db,
            &AvailabilityQuery {
                min_guests: Some(3),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let capacities: Vec<i32> = tables.iter().map(|t| t.capacity).collect();
        assert_eq!(capacities, vec![4, 6]);
    }

    #[tokio::test]
    async fn no_table_fits_a_party_larger_than_capacity() {
        let db = testing::db().await;
        testing::table(&db, 1, 4).await;
        testing::table(&db, 2, 4).await;

        let tables = list_available_tables(
            &db,
            &AvailabilityQuery {
                date: Some(date("2024-06-01")),
                time: Some("19:00".into()),
                min_guests: Some(6),
            },
        )
        .await
        .unwrap();

        assert!(tables.is_empty());
    }

    #[tokio::test]
    async fn booked_inactive_and_maintenance_tables_are_excluded() {
        let db = testing::db().await;
        let booked = testing::table(&db, 1, 4).await;
        let inactive = testing::table(&db, 2, 4).await;
        let broken = testing::table(&db, 3, 4).await;
        let free = testing::table(&db, 4, 4).await;

        lifecycle::create(&db, request(booked.id, "2024-06-01", "19:00"))
            .await
            .unwrap();
        tables::toggle_active(&db, inactive.id).await.unwrap();
        tables::update_status(&db, broken.id, "maintenance").await.unwrap();

        let slot = AvailabilityQuery {
            date: Some(date("2024-06-01")),
            time: Some("19:00".into()),
            min_guests: Some(2),
        };
        let ids: Vec<Uuid> = list_available_tables(&db, &slot)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![free.id]);

        // Without a slot the reserved table is still offered.
        let any = AvailabilityQuery {
            min_guests: Some(2),
            ..Default::default()
        };
        let ids: Vec<Uuid> = list_available_tables(&db, &any)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![booked.id, free.id]);
    }
}
