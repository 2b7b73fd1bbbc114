//! Bookings: creation, the lifecycle state machine, agent pickups and
//! settlement.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/api/bookings` | Create booking |
//! | GET | `/api/bookings` | List all bookings (admin) |
//! | GET | `/api/bookings/my` | Current user's bookings |
//! | GET | `/api/bookings/{id}` | Get booking |
//! | PUT | `/api/bookings/{id}/status` | Generic transition (admin/agent) |
//! | PUT | `/api/bookings/{id}/assign` | Assign agent (admin) |
//! | PUT | `/api/bookings/{id}/cancel` | Cancel (owner/admin) |
//! | PUT | `/api/bookings/{id}/rate` | Rate completed booking (owner) |
//! | GET | `/api/agents/pickups` | Agent task list |
//! | PUT | `/api/agents/pickups/{id}/start` | Start pickup |
//! | PUT | `/api/agents/pickups/{id}/complete` | Complete and settle |

pub mod booking_code;
pub mod dtos;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod routes;
pub mod services;
pub mod settlement;

pub use services::BookingService;
