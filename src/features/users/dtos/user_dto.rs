use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::users::models::{EarningEvent, EarningTotals, User, UserRole};
use crate::shared::types::{default_page, default_page_size, PaginationQuery};
use crate::shared::validation::PHONE_REGEX;

/// Response DTO for user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponseDto {
    pub id: Uuid,
    pub name: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentDetailsDto>,
    pub created_at: DateTime<Utc>,
}

/// Agent-only fields, present when role is agent
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AgentDetailsDto {
    pub area: Option<String>,
    pub vehicle: Option<String>,
    pub rating: Decimal,
    pub is_available: bool,
}

impl From<User> for UserResponseDto {
    fn from(u: User) -> Self {
        let agent = (u.role == UserRole::Agent).then(|| AgentDetailsDto {
            area: u.agent_area,
            vehicle: u.agent_vehicle,
            rating: u.agent_rating,
            is_available: u.agent_is_available,
        });

        Self {
            id: u.id,
            name: u.name,
            phone: u.phone,
            email: u.email,
            role: u.role,
            is_active: u.is_active,
            agent,
            created_at: u.created_at,
        }
    }
}

/// Current user's profile with ledger-derived aggregates
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfileDto {
    #[serde(flatten)]
    pub user: UserResponseDto,
    pub total_pickups: i64,
    pub total_earnings: Decimal,
    pub loyalty_points: i64,
}

impl UserProfileDto {
    pub fn new(user: User, totals: EarningTotals) -> Self {
        Self {
            user: user.into(),
            total_pickups: totals.total_pickups,
            total_earnings: totals.total_earnings,
            loyalty_points: totals.loyalty_points,
        }
    }
}

/// Ledger entry as returned to the customer
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EarningEventDto {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub amount: Decimal,
    pub loyalty_points: i64,
    pub created_at: DateTime<Utc>,
}

impl From<EarningEvent> for EarningEventDto {
    fn from(e: EarningEvent) -> Self {
        Self {
            id: e.id,
            booking_id: e.booking_id,
            amount: e.amount,
            loyalty_points: e.loyalty_points,
            created_at: e.created_at,
        }
    }
}

/// Query params for the admin user listing
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListUsersQuery {
    /// Filter by role
    pub role: Option<UserRole>,
    /// Case-insensitive match on name or phone
    pub search: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

impl ListUsersQuery {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery::new(self.page, self.page_size)
    }
}

/// Request DTO for onboarding an agent
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAgentDto {
    #[validate(length(min = 1, max = 128, message = "Name must be 1-128 characters"))]
    pub name: Option<String>,

    #[validate(regex(path = *PHONE_REGEX, message = "Phone must be 10-15 digits with optional +"))]
    pub phone: String,

    #[validate(length(max = 128, message = "Area must not exceed 128 characters"))]
    pub agent_area: Option<String>,

    #[validate(length(max = 64, message = "Vehicle must not exceed 64 characters"))]
    pub agent_vehicle: Option<String>,
}

/// Request DTO for an agent switching availability
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateAvailabilityDto {
    pub is_available: bool,
}
