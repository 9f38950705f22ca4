//! `SeaORM` entities for the booking service.

pub mod prelude;

pub mod booking;
pub mod dining_table;
pub mod user;
