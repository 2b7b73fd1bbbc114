//! Users, agents and the earnings ledger.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/users/me` | Current profile with ledger totals |
//! | GET | `/api/users/me/earnings` | Current user's ledger entries |
//! | GET | `/api/users` | List users (admin) |
//! | GET | `/api/users/{id}` | Get user (admin) |
//! | PUT | `/api/users/{id}/toggle-active` | Activate/deactivate (admin) |
//! | GET | `/api/agents` | List agents (admin) |
//! | POST | `/api/agents` | Create or promote an agent (admin) |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
