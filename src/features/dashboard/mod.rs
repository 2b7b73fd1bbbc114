//! Admin analytics: dashboard and revenue report.

pub mod calendar;
pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod services;

pub use routes::routes;
pub use services::DashboardService;
