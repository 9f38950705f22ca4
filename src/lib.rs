//! Restaurant table booking service.
//!
//! - [`services::availability`]: is a table free for a slot, which tables fit a party
//! - [`services::booking`]: booking lifecycle and its table side effects
//! - [`services::tables`]: table administration and the booking overview
//! - [`routes`]: JSON handlers for bookings and tables
//! - [`auth`]: email/password sign-in behind the login popup

pub mod auth;
pub mod config;
pub mod database;
pub mod entities;
pub mod error;
pub mod router;
pub mod routes;
pub mod services;
pub mod util;
