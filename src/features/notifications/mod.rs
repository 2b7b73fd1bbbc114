//! Inbox notifications. Records only; nothing is pushed to devices.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod templates;

pub use services::NotificationService;
