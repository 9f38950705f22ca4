use sea_orm_migration::{prelude::*, schema::*};

use crate::iden::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create DiningTable Table
        let table = table_auto(DiningTable::Table)
            .col(pk_uuid(DiningTable::Id))
            .col(integer_uniq(DiningTable::TableNumber))
            .col(string_null(DiningTable::TableName))
            .col(integer(DiningTable::Capacity))
            .col(string_len(DiningTable::Location, 16).default("indoor"))
            .col(json(DiningTable::Features))
            .col(integer(DiningTable::MinBookingHours).default(1))
            .col(double(DiningTable::PricePerHour).default(0.0))
            .col(string_null(DiningTable::Description))
            .col(string_len(DiningTable::Status, 16).default("available"))
            .col(boolean(DiningTable::IsActive).default(true))
            .check(Expr::col(DiningTable::Capacity).gte(1))
            .to_owned();
        manager.create_table(table).await?;

        // Create Booking Table
        //
        // No foreign key on table_id: deleting a dining table leaves its
        // historical bookings pointing at the old id.
        let table = table_auto(Booking::Table)
            .col(pk_uuid(Booking::Id))
            .col(string(Booking::Name))
            .col(string(Booking::Email))
            .col(string(Booking::Phone))
            .col(date(Booking::Date))
            .col(string_len(Booking::Time, 5))
            .col(integer(Booking::Guests))
            .col(uuid_null(Booking::TableId))
            .col(integer_null(Booking::TableNumber))
            .col(string_null(Booking::TableName))
            .col(string_null(Booking::Occasion))
            .col(string_null(Booking::SpecialRequests))
            .col(string_len(Booking::Status, 16).default("Pending"))
            .col(json(Booking::PreOrderedItems))
            .col(double(Booking::PreOrderTotal).default(0.0))
            .col(boolean(Booking::HasPreOrder).default(false))
            .col(string_len_null(Booking::SlotKey, 64).unique_key())
            .to_owned();
        manager.create_table(table).await?;

        // Create indices for common lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_booking_table_date")
                    .table(Booking::Table)
                    .col(Booking::TableId)
                    .col(Booking::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_booking_email")
                    .table(Booking::Table)
                    .col(Booking::Email)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Booking::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(DiningTable::Table).to_owned())
            .await?;

        Ok(())
    }
}
