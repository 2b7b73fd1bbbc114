//! Scrap category registry.
//!
//! Public reads return the active catalogue; admin writes keep the slug and
//! price history in step with name and price changes.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod slug;

pub use services::CategoryService;
