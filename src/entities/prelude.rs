pub use super::booking::Entity as Booking;
pub use super::dining_table::Entity as DiningTable;
pub use super::user::Entity as User;
