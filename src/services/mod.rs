//! Booking and table domain logic.
//!
//! Services are plain async functions over a `DatabaseConnection`. Anything
//! that depends on the wall clock takes the current date or time as an
//! argument; handlers pass `chrono::Local::now()`.

pub mod availability;
pub mod booking;
pub mod tables;
