use sea_orm_migration::prelude::*;

// Define table names
#[derive(DeriveIden)]
pub enum DiningTable {
    Table,
    Id,
    TableNumber,
    TableName,
    Capacity,
    Location,
    Features,
    MinBookingHours,
    PricePerHour,
    Description,
    Status,
    IsActive,
}

#[derive(DeriveIden)]
pub enum Booking {
    Table,
    Id,
    Name,
    Email,
    Phone,
    Date,
    Time,
    Guests,
    TableId,
    TableNumber,
    TableName,
    Occasion,
    SpecialRequests,
    Status,
    PreOrderedItems,
    PreOrderTotal,
    HasPreOrder,
    SlotKey,
}

#[derive(DeriveIden)]
pub enum User {
    Table,
    Id,
    Name,
    Email,
    PasswordHash,
    SessionToken,
}
