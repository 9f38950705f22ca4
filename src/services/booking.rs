//! Booking lifecycle: creation, status transitions, user cancellation and
//! deletion, plus the table status side effects they trigger.

use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDate, NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, DbErr, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder, SqlErr, TransactionTrait,
};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::availability::{self, DayWindow};
use super::tables;
use crate::entities::{
    booking::{self, BookingStatus, PreOrderItem, PreOrderedItems},
    dining_table::{self, TableStatus},
    prelude::*,
};
use crate::error::{AppError, AppResult};

/// Which day the table-release check looks at when a booking ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReleaseWindow {
    /// The current date, whatever date the booking was for.
    #[default]
    Today,
    /// The date of the booking being completed, cancelled or deleted.
    BookingDate,
}

impl FromStr for ReleaseWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(ReleaseWindow::Today),
            "booking-date" => Ok(ReleaseWindow::BookingDate),
            other => Err(format!("unknown release window '{other}'")),
        }
    }
}

impl fmt::Display for ReleaseWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseWindow::Today => f.write_str("today"),
            ReleaseWindow::BookingDate => f.write_str("booking-date"),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ReleasePolicy {
    pub window: ReleaseWindow,
    pub today: NaiveDate,
}

impl ReleasePolicy {
    pub fn new(window: ReleaseWindow) -> Self {
        Self {
            window,
            today: Local::now().date_naive(),
        }
    }

    pub fn today(today: NaiveDate) -> Self {
        Self {
            window: ReleaseWindow::Today,
            today,
        }
    }

    fn date_for(&self, booking: &booking::Model) -> NaiveDate {
        match self.window {
            ReleaseWindow::Today => self.today,
            ReleaseWindow::BookingDate => booking.date,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub guests: Option<i32>,
    pub table_id: Option<Uuid>,
    pub occasion: Option<String>,
    pub special_requests: Option<String>,
    #[serde(default)]
    pub pre_ordered_items: Vec<PreOrderItem>,
    pub pre_order_total: Option<f64>,
}

#[derive(Debug)]
pub struct CreatedBooking {
    pub booking: booking::Model,
    pub table: Option<dining_table::Model>,
}

struct Contact {
    name: String,
    email: String,
    phone: String,
    date: NaiveDate,
    time: String,
    guests: i32,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl NewBooking {
    fn validate(&mut self) -> AppResult<Contact> {
        let name = present(self.name.take());
        let email = present(self.email.take());
        let phone = present(self.phone.take());
        let date = present(self.date.take());
        let time = present(self.time.take());

        let missing: Vec<&str> = [
            ("name", name.is_none()),
            ("email", email.is_none()),
            ("phone", phone.is_none()),
            ("date", date.is_none()),
            ("time", time.is_none()),
            ("guests", self.guests.is_none()),
        ]
        .into_iter()
        .filter_map(|(field, absent)| absent.then_some(field))
        .collect();

        let (Some(name), Some(email), Some(phone), Some(date), Some(time), Some(guests)) =
            (name, email, phone, date, time, self.guests)
        else {
            return Err(AppError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        };

        let date = parse_date(&date)?;
        NaiveTime::parse_from_str(&time, "%H:%M")
            .map_err(|_| AppError::Validation(format!("Invalid time '{time}', expected HH:MM")))?;
        if guests < 1 {
            return Err(AppError::Validation("Guests must be at least 1".to_string()));
        }

        Ok(Contact {
            name,
            email,
            phone,
            date,
            time,
            guests,
        })
    }
}

pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Invalid date '{date}', expected YYYY-MM-DD")))
}

fn slot_key(table_id: Uuid, date: NaiveDate, time: &str) -> String {
    format!("{table_id}|{date}|{time}")
}

/// A unique violation on insert means another active booking took the slot.
fn slot_conflict(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::slot_taken(),
        _ => AppError::from(err),
    }
}

/// Creates a Pending booking and marks its table reserved.
///
/// The free-slot check and the insert run in one transaction, and the
/// `slot_key` unique index rejects a second active booking for the same
/// table, day and time if two requests race past the check.
pub async fn create(db: &DatabaseConnection, mut payload: NewBooking) -> AppResult<CreatedBooking> {
    let contact = payload.validate()?;
    let txn = db.begin().await?;

    let table = match payload.table_id {
        Some(table_id) => {
            let table = DiningTable::find_by_id(table_id)
                .one(&txn)
                .await?
                .ok_or_else(|| AppError::table_not_found(table_id))?;
            if !availability::is_table_free(&txn, table_id, contact.date, &contact.time, None).await? {
                return Err(AppError::slot_taken());
            }
            Some(table)
        }
        None => None,
    };

    let items = PreOrderedItems(payload.pre_ordered_items);
    let has_pre_order = !items.is_empty();
    let pre_order_total = payload.pre_order_total.unwrap_or_else(|| items.total());
    let now = Utc::now().naive_utc();

    let booking = booking::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(contact.name),
        email: Set(contact.email),
        phone: Set(contact.phone),
        date: Set(contact.date),
        time: Set(contact.time.clone()),
        guests: Set(contact.guests),
        table_id: Set(table.as_ref().map(|t| t.id)),
        table_number: Set(table.as_ref().map(|t| t.table_number)),
        table_name: Set(table.as_ref().and_then(|t| t.table_name.clone())),
        occasion: Set(present(payload.occasion)),
        special_requests: Set(present(payload.special_requests)),
        status: Set(BookingStatus::Pending),
        pre_ordered_items: Set(items),
        pre_order_total: Set(pre_order_total),
        has_pre_order: Set(has_pre_order),
        slot_key: Set(table
            .as_ref()
            .map(|t| slot_key(t.id, contact.date, &contact.time))),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await
    .map_err(slot_conflict)?;

    // One status per table: a later slot overwrites whatever an earlier
    // booking on the same day set.
    if let Some(table) = &table {
        tables::set_table_status(&txn, table.id, TableStatus::Reserved).await?;
    }
    txn.commit().await?;

    info!(
        booking_id = %booking.id,
        table_number = ?booking.table_number,
        date = %booking.date,
        time = %booking.time,
        has_pre_order,
        "booking created"
    );
    Ok(CreatedBooking { booking, table })
}

pub fn can_transition(from: BookingStatus, to: BookingStatus) -> bool {
    use BookingStatus::*;
    match (from, to) {
        (a, b) if a == b => !a.is_terminal(),
        (Pending, Confirmed | Completed | Cancelled) => true,
        (Confirmed, Completed | Cancelled) => true,
        _ => false,
    }
}

pub async fn set_status(
    db: &DatabaseConnection,
    booking_id: Uuid,
    status: BookingStatus,
    policy: ReleasePolicy,
) -> AppResult<booking::Model> {
    let existing = Booking::find_by_id(booking_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::booking_not_found(booking_id))?;

    if !can_transition(existing.status, status) {
        return Err(AppError::InvalidState(format!(
            "Cannot change booking status from {} to {}",
            existing.status, status
        )));
    }

    let updated = write_status(db, existing, status).await?;
    sync_table(db, &updated, policy).await?;
    Ok(updated)
}

/// Self-service cancellation. The email must match the one on the booking.
pub async fn cancel_by_user(
    db: &DatabaseConnection,
    booking_id: Uuid,
    email: &str,
    policy: ReleasePolicy,
) -> AppResult<booking::Model> {
    let existing = Booking::find_by_id(booking_id)
        .filter(booking::Column::Email.eq(email.trim()))
        .one(db)
        .await?
        .ok_or_else(|| {
            debug!(%booking_id, "cancel rejected: no booking for this email");
            AppError::Authorization("Booking not found or unauthorized".to_string())
        })?;

    if existing.status.is_terminal() {
        return Err(AppError::InvalidState(format!(
            "Cannot cancel a booking that is already {}",
            existing.status
        )));
    }

    let updated = write_status(db, existing, BookingStatus::Cancelled).await?;
    sync_table(db, &updated, policy).await?;
    Ok(updated)
}

/// Removes a booking whatever its status.
pub async fn delete(db: &DatabaseConnection, booking_id: Uuid, policy: ReleasePolicy) -> AppResult<()> {
    let existing = Booking::find_by_id(booking_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::booking_not_found(booking_id))?;

    Booking::delete_by_id(booking_id).exec(db).await?;
    info!(%booking_id, "booking deleted");

    if let Some(table_id) = existing.table_id {
        release_table_if_idle(db, table_id, booking_id, policy.date_for(&existing)).await?;
    }
    Ok(())
}

async fn write_status<C: ConnectionTrait>(
    db: &C,
    existing: booking::Model,
    status: BookingStatus,
) -> Result<booking::Model, DbErr> {
    let previous = existing.status;
    let mut model = existing.into_active_model();
    model.status = Set(status);
    if status.is_terminal() {
        model.slot_key = Set(None);
    }
    model.updated_at = Set(Utc::now().naive_utc());
    let updated = model.update(db).await?;

    info!(booking_id = %updated.id, from = %previous, to = %status, "booking status changed");
    Ok(updated)
}

async fn sync_table(db: &DatabaseConnection, booking: &booking::Model, policy: ReleasePolicy) -> AppResult<()> {
    let Some(table_id) = booking.table_id else {
        return Ok(());
    };

    match booking.status {
        BookingStatus::Completed | BookingStatus::Cancelled => {
            release_table_if_idle(db, table_id, booking.id, policy.date_for(booking)).await?;
        }
        BookingStatus::Confirmed => {
            tables::set_table_status(db, table_id, TableStatus::Reserved).await?;
        }
        BookingStatus::Pending => {}
    }
    Ok(())
}

/// Frees the table when no other active booking holds it on `date`.
async fn release_table_if_idle<C: ConnectionTrait>(
    db: &C,
    table_id: Uuid,
    ended_booking: Uuid,
    date: NaiveDate,
) -> Result<bool, DbErr> {
    let others = availability::active_bookings_for_table(table_id, DayWindow::day(date))
        .filter(booking::Column::Id.ne(ended_booking))
        .count(db)
        .await?;

    if others > 0 {
        debug!(%table_id, %date, others, "table still held by other bookings");
        return Ok(false);
    }

    tables::set_table_status(db, table_id, TableStatus::Available).await?;
    info!(%table_id, %date, "table released");
    Ok(true)
}

// Queries

pub async fn get(db: &DatabaseConnection, booking_id: Uuid) -> AppResult<booking::Model> {
    Booking::find_by_id(booking_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::booking_not_found(booking_id))
}

/// All bookings, newest first, optionally restricted to one status.
pub async fn list(db: &DatabaseConnection, status: Option<BookingStatus>) -> AppResult<Vec<booking::Model>> {
    let mut query = Booking::find().order_by_desc(booking::Column::CreatedAt);
    if let Some(status) = status {
        query = query.filter(booking::Column::Status.eq(status));
    }
    Ok(query.all(db).await?)
}

/// Non-cancelled bookings on one day, in time order.
pub async fn list_by_date(db: &DatabaseConnection, date: NaiveDate) -> AppResult<Vec<booking::Model>> {
    Ok(Booking::find()
        .filter(DayWindow::day(date).condition())
        .filter(booking::Column::Status.ne(BookingStatus::Cancelled))
        .order_by_asc(booking::Column::Time)
        .all(db)
        .await?)
}

/// Bookings matching the email or the phone number, newest first.
pub async fn list_by_user(
    db: &DatabaseConnection,
    email: Option<&str>,
    phone: Option<&str>,
) -> AppResult<Vec<booking::Model>> {
    let email = email.map(str::trim).filter(|v| !v.is_empty());
    let phone = phone.map(str::trim).filter(|v| !v.is_empty());
    if email.is_none() && phone.is_none() {
        return Err(AppError::Validation("Email or phone is required".to_string()));
    }

    let condition = Condition::any()
        .add_option(email.map(|e| booking::Column::Email.eq(e)))
        .add_option(phone.map(|p| booking::Column::Phone.eq(p)));

    Ok(Booking::find()
        .filter(condition)
        .order_by_desc(booking::Column::CreatedAt)
        .all(db)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{self, date};

    fn request(table_id: Option<Uuid>, time: &str) -> NewBooking {
        NewBooking {
            name: Some("A".into()),
            email: Some("a@x.com".into()),
            phone: Some("123".into()),
            date: Some("2024-06-01".into()),
            time: Some(time.into()),
            guests: Some(2),
            table_id,
            ..Default::default()
        }
    }

    async fn table_status(db: &DatabaseConnection, id: Uuid) -> TableStatus {
        tables::get(db, id).await.unwrap().status
    }

    fn on_booking_day() -> ReleasePolicy {
        ReleasePolicy::today(date("2024-06-01"))
    }

    #[tokio::test]
    async fn create_reserves_table_and_rejects_second_booking() {
        let db = testing::db().await;
        let table = testing::table(&db, 5, 4).await;

        let created = create(&db, request(Some(table.id), "18:00")).await.unwrap();
        assert_eq!(created.booking.status, BookingStatus::Pending);
        assert_eq!(created.booking.table_number, Some(5));
        assert_eq!(table_status(&db, table.id).await, TableStatus::Reserved);

        let err = create(&db, request(Some(table.id), "18:00")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(err.to_string().contains("already booked"));
    }

    #[tokio::test]
    async fn create_reports_every_missing_field() {
        let db = testing::db().await;
        let err = create(
            &db,
            NewBooking {
                name: Some("A".into()),
                phone: Some("  ".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        match err {
            AppError::Validation(msg) => {
                assert_eq!(msg, "Missing required fields: email, phone, date, time, guests")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_rejects_malformed_time_and_unknown_table() {
        let db = testing::db().await;
        let err = create(&db, request(None, "6pm")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = create(&db, request(Some(Uuid::new_v4()), "18:00")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn has_pre_order_follows_items() {
        let db = testing::db().await;

        let plain = create(&db, request(None, "18:00")).await.unwrap();
        assert!(!plain.booking.has_pre_order);
        assert_eq!(plain.booking.pre_order_total, 0.0);

        let mut with_items = request(None, "19:00");
        with_items.pre_ordered_items = vec![
            PreOrderItem {
                item_id: "soup".into(),
                name: None,
                quantity: 2,
                price: 4.5,
            },
            PreOrderItem {
                item_id: "bread".into(),
                name: Some("Bread".into()),
                quantity: 1,
                price: 2.0,
            },
        ];
        let ordered = create(&db, with_items).await.unwrap();
        assert!(ordered.booking.has_pre_order);
        assert_eq!(ordered.booking.pre_ordered_items.0.len(), 2);
        assert_eq!(ordered.booking.pre_order_total, 11.0);
    }

    #[tokio::test]
    async fn completing_last_booking_releases_table() {
        let db = testing::db().await;
        let table = testing::table(&db, 5, 4).await;
        let created = create(&db, request(Some(table.id), "18:00")).await.unwrap();

        let updated = set_status(&db, created.booking.id, BookingStatus::Completed, on_booking_day())
            .await
            .unwrap();
        assert_eq!(updated.status, BookingStatus::Completed);
        assert_eq!(table_status(&db, table.id).await, TableStatus::Available);
    }

    #[tokio::test]
    async fn table_stays_reserved_while_another_booking_is_active() {
        let db = testing::db().await;
        let table = testing::table(&db, 5, 4).await;
        let early = create(&db, request(Some(table.id), "18:00")).await.unwrap();
        create(&db, request(Some(table.id), "20:00")).await.unwrap();

        set_status(&db, early.booking.id, BookingStatus::Cancelled, on_booking_day())
            .await
            .unwrap();
        assert_eq!(table_status(&db, table.id).await, TableStatus::Reserved);
    }

    #[tokio::test]
    async fn release_window_decides_which_day_is_checked() {
        let db = testing::db().await;
        let table = testing::table(&db, 5, 4).await;
        let first = create(&db, request(Some(table.id), "18:00")).await.unwrap();
        create(&db, request(Some(table.id), "20:00")).await.unwrap();

        // Checked against an unrelated "today": no other bookings that day.
        let elsewhere = ReleasePolicy::today(date("2024-05-20"));
        set_status(&db, first.booking.id, BookingStatus::Completed, elsewhere)
            .await
            .unwrap();
        assert_eq!(table_status(&db, table.id).await, TableStatus::Available);

        let db = testing::db().await;
        let table = testing::table(&db, 5, 4).await;
        let first = create(&db, request(Some(table.id), "18:00")).await.unwrap();
        create(&db, request(Some(table.id), "20:00")).await.unwrap();

        let booking_day = ReleasePolicy {
            window: ReleaseWindow::BookingDate,
            today: date("2024-05-20"),
        };
        set_status(&db, first.booking.id, BookingStatus::Completed, booking_day)
            .await
            .unwrap();
        assert_eq!(table_status(&db, table.id).await, TableStatus::Reserved);
    }

    #[tokio::test]
    async fn confirming_reserves_table_again() {
        let db = testing::db().await;
        let table = testing::table(&db, 5, 4).await;
        let created = create(&db, request(Some(table.id), "18:00")).await.unwrap();
        tables::update_status(&db, table.id, "available").await.unwrap();

        set_status(&db, created.booking.id, BookingStatus::Confirmed, on_booking_day())
            .await
            .unwrap();
        assert_eq!(table_status(&db, table.id).await, TableStatus::Reserved);
    }

    #[tokio::test]
    async fn terminal_statuses_are_final() {
        let db = testing::db().await;
        let created = create(&db, request(None, "18:00")).await.unwrap();
        let id = created.booking.id;

        set_status(&db, id, BookingStatus::Completed, on_booking_day()).await.unwrap();
        for next in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ] {
            let err = set_status(&db, id, next, on_booking_day()).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidState(_)), "{next} accepted");
        }

        let err = set_status(&db, Uuid::new_v4(), BookingStatus::Confirmed, on_booking_day())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn transitions_move_forward_only() {
        use BookingStatus::*;
        assert!(can_transition(Pending, Confirmed));
        assert!(can_transition(Pending, Cancelled));
        assert!(can_transition(Confirmed, Completed));
        assert!(can_transition(Confirmed, Confirmed));
        assert!(!can_transition(Confirmed, Pending));
        assert!(!can_transition(Cancelled, Pending));
        assert!(!can_transition(Completed, Cancelled));
    }

    #[tokio::test]
    async fn slot_can_be_rebooked_after_cancellation() {
        let db = testing::db().await;
        let table = testing::table(&db, 5, 4).await;
        let created = create(&db, request(Some(table.id), "18:00")).await.unwrap();
        cancel_by_user(&db, created.booking.id, "a@x.com", on_booking_day())
            .await
            .unwrap();

        let again = create(&db, request(Some(table.id), "18:00")).await.unwrap();
        assert_eq!(again.booking.status, BookingStatus::Pending);
    }

    fn copy_of(booking: &booking::Model) -> booking::ActiveModel {
        booking::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("B".into()),
            email: Set("b@x.com".into()),
            phone: Set("456".into()),
            date: Set(booking.date),
            time: Set(booking.time.clone()),
            guests: Set(2),
            table_id: Set(booking.table_id),
            table_number: Set(booking.table_number),
            table_name: Set(None),
            occasion: Set(None),
            special_requests: Set(None),
            status: Set(BookingStatus::Pending),
            pre_ordered_items: Set(PreOrderedItems::default()),
            pre_order_total: Set(0.0),
            has_pre_order: Set(false),
            slot_key: Set(booking.slot_key.clone()),
            created_at: Set(booking.created_at),
            updated_at: Set(booking.updated_at),
        }
    }

    #[tokio::test]
    async fn unique_slot_key_rejects_a_racing_insert() {
        let db = testing::db().await;
        let table = testing::table(&db, 5, 4).await;
        let first = create(&db, request(Some(table.id), "18:00")).await.unwrap().booking;
        assert_eq!(
            first.slot_key.as_deref(),
            Some(format!("{}|2024-06-01|18:00", table.id).as_str())
        );

        // Skips the free-slot check, as a concurrent request would.
        let err = copy_of(&first).insert(&db).await.unwrap_err();
        assert!(matches!(
            err.sql_err(),
            Some(SqlErr::UniqueConstraintViolation(_))
        ));

        let err = slot_conflict(err);
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(err.to_string().contains("already booked"));
        assert_eq!(Booking::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn terminal_status_frees_the_slot_key() {
        let db = testing::db().await;
        let table = testing::table(&db, 5, 4).await;
        let completed = create(&db, request(Some(table.id), "18:00")).await.unwrap().booking;
        let cancelled = create(&db, request(Some(table.id), "20:00")).await.unwrap().booking;
        let untouched = create(&db, request(Some(table.id), "21:00")).await.unwrap().booking;

        set_status(&db, completed.id, BookingStatus::Completed, on_booking_day())
            .await
            .unwrap();
        cancel_by_user(&db, cancelled.id, "a@x.com", on_booking_day())
            .await
            .unwrap();
        set_status(&db, untouched.id, BookingStatus::Confirmed, on_booking_day())
            .await
            .unwrap();

        assert_eq!(get(&db, completed.id).await.unwrap().slot_key, None);
        assert_eq!(get(&db, cancelled.id).await.unwrap().slot_key, None);
        assert_eq!(get(&db, untouched.id).await.unwrap().slot_key, untouched.slot_key);

        // A direct insert into the freed slot now succeeds at the storage level.
        let mut reuse = completed.clone();
        reuse.slot_key = Some(slot_key(table.id, completed.date, &completed.time));
        copy_of(&reuse).insert(&db).await.unwrap();
    }

    #[tokio::test]
    async fn cancel_by_user_checks_owner_and_state() {
        let db = testing::db().await;
        let table = testing::table(&db, 5, 4).await;
        let created = create(&db, request(Some(table.id), "18:00")).await.unwrap();
        let id = created.booking.id;

        let err = cancel_by_user(&db, id, "wrong@x.com", on_booking_day()).await.unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
        assert_eq!(err.to_string(), "Booking not found or unauthorized");

        let err = cancel_by_user(&db, Uuid::new_v4(), "a@x.com", on_booking_day())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));

        let cancelled = cancel_by_user(&db, id, "a@x.com", on_booking_day()).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(table_status(&db, table.id).await, TableStatus::Available);

        let err = cancel_by_user(&db, id, "a@x.com", on_booking_day()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn delete_removes_booking_and_releases_table() {
        let db = testing::db().await;
        let table = testing::table(&db, 5, 4).await;
        let created = create(&db, request(Some(table.id), "18:00")).await.unwrap();

        delete(&db, created.booking.id, on_booking_day()).await.unwrap();
        assert!(matches!(
            get(&db, created.booking.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert_eq!(table_status(&db, table.id).await, TableStatus::Available);
    }

    #[tokio::test]
    async fn deleting_table_leaves_booking_snapshot() {
        let db = testing::db().await;
        let table = testing::table(&db, 5, 4).await;
        let created = create(&db, request(Some(table.id), "18:00")).await.unwrap();

        tables::delete(&db, table.id).await.unwrap();

        let booking = get(&db, created.booking.id).await.unwrap();
        assert_eq!(booking.table_id, Some(table.id));
        assert_eq!(booking.table_number, Some(5));
        // Ending a booking whose table is gone is not an error.
        set_status(&db, booking.id, BookingStatus::Completed, on_booking_day())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn queries_by_date_and_user() {
        let db = testing::db().await;
        let first = create(&db, request(None, "20:00")).await.unwrap();
        create(&db, request(None, "18:00")).await.unwrap();
        let mut other = request(None, "19:00");
        other.email = Some("b@x.com".into());
        other.phone = Some("456".into());
        create(&db, other).await.unwrap();

        cancel_by_user(&db, first.booking.id, "a@x.com", on_booking_day())
            .await
            .unwrap();

        let times: Vec<String> = list_by_date(&db, date("2024-06-01"))
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.time)
            .collect();
        assert_eq!(times, vec!["18:00", "19:00"]);
        assert!(list_by_date(&db, date("2024-06-02")).await.unwrap().is_empty());

        assert_eq!(list_by_user(&db, Some("a@x.com"), None).await.unwrap().len(), 2);
        assert_eq!(list_by_user(&db, None, Some("456")).await.unwrap().len(), 1);
        assert_eq!(list_by_user(&db, Some("a@x.com"), Some("456")).await.unwrap().len(), 3);
        assert!(matches!(
            list_by_user(&db, None, Some(" ")).await.unwrap_err(),
            AppError::Validation(_)
        ));

        assert_eq!(list(&db, None).await.unwrap().len(), 3);
        assert_eq!(list(&db, Some(BookingStatus::Cancelled)).await.unwrap().len(), 1);
    }
}
