pub mod auth;
pub mod bookings;
pub mod categories;
pub mod dashboard;
pub mod notifications;
pub mod users;
