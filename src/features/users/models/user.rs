use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// User role enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Customer,
    Agent,
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Customer => write!(f, "customer"),
            UserRole::Agent => write!(f, "agent"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

/// Database model for user
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub agent_area: Option<String>,
    pub agent_vehicle: Option<String>,
    pub agent_rating: Decimal,
    pub agent_is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) const USER_COLUMNS: &str = "id, name, phone, email, role, is_active, agent_area, \
     agent_vehicle, agent_rating, agent_is_available, created_at, updated_at";

/// Data for onboarding an agent (new user or promotion of an existing phone)
#[derive(Debug)]
pub struct UpsertAgent {
    pub name: Option<String>,
    pub phone: String,
    pub agent_area: Option<String>,
    pub agent_vehicle: Option<String>,
}
