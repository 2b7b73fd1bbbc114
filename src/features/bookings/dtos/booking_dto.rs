use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::core::error::AppError;
use crate::features::bookings::lifecycle::TransitionCommand;
use crate::features::bookings::models::{
    Booking, BookingDetails, BookingItem, BookingStatus, PaymentMethod, PaymentStatus,
    PickupAddress, StatusHistoryEntry, TimeSlot,
};
use crate::features::bookings::settlement::CompletionInput;
use crate::shared::constants::MAX_ITEM_WEIGHT;
use crate::shared::types::{default_page, default_page_size, PaginationQuery};

fn validate_item_weight(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO || *value > Decimal::from(MAX_ITEM_WEIGHT) {
        return Err(ValidationError::new("weight_out_of_range"));
    }
    Ok(())
}

/// One requested line item; pricing comes from the category registry
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct BookingItemRequest {
    pub category_id: Uuid,

    #[validate(custom(
        function = "validate_item_weight",
        message = "Estimated weight must be greater than 0 and at most 100000"
    ))]
    pub estimated_weight: Decimal,
}

/// Request DTO for creating a booking
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBookingDto {
    #[validate(length(min = 1, message = "At least one item is required"), nested)]
    pub items: Vec<BookingItemRequest>,

    #[validate(nested)]
    pub address: PickupAddress,

    pub scheduled_date: NaiveDate,

    pub time_slot: TimeSlot,

    #[validate(length(max = 500, message = "Notes must not exceed 500 characters"))]
    pub notes: Option<String>,

    #[serde(default)]
    pub payment_method: PaymentMethod,
}

/// Generic status change by an admin or the bound agent
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateStatusDto {
    pub status: BookingStatus,

    #[validate(length(max = 500, message = "Note must not exceed 500 characters"))]
    pub note: Option<String>,

    /// Required when moving to `assigned`
    pub agent_id: Option<Uuid>,

    #[validate(length(max = 500, message = "Cancel reason must not exceed 500 characters"))]
    pub cancel_reason: Option<String>,

    /// Used when moving to `completed`
    pub actual_weights: Option<Vec<Decimal>>,

    /// Used when moving to `completed`
    pub final_amount: Option<Decimal>,
}

impl UpdateStatusDto {
    pub fn into_command(self) -> Result<TransitionCommand, AppError> {
        match self.status {
            BookingStatus::Pending => Err(AppError::InvalidTransition(
                "Bookings cannot be moved back to 'pending'".to_string(),
            )),
            BookingStatus::Confirmed => Ok(TransitionCommand::Confirm { note: self.note }),
            BookingStatus::Assigned => {
                let agent_id = self.agent_id.ok_or_else(|| {
                    AppError::Validation("agent_id is required to assign a booking".to_string())
                })?;
                Ok(TransitionCommand::Assign {
                    agent_id,
                    note: self.note,
                })
            }
            BookingStatus::OutForPickup => Ok(TransitionCommand::StartPickup),
            BookingStatus::Completed => Ok(TransitionCommand::Complete(CompletionInput {
                actual_weights: self.actual_weights,
                final_amount: self.final_amount,
            })),
            BookingStatus::Cancelled => Ok(TransitionCommand::Cancel {
                reason: self.cancel_reason.or(self.note),
            }),
        }
    }
}

/// Request DTO for assigning an agent
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AssignAgentDto {
    pub agent_id: Uuid,

    #[validate(length(max = 500, message = "Note must not exceed 500 characters"))]
    pub note: Option<String>,
}

/// Request DTO for cancelling a booking
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CancelBookingDto {
    #[validate(length(max = 500, message = "Reason must not exceed 500 characters"))]
    pub reason: Option<String>,
}

/// Request DTO for rating a completed booking
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RateBookingDto {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i16,

    #[validate(length(max = 1000, message = "Feedback must not exceed 1000 characters"))]
    pub feedback: Option<String>,
}

/// Name and phone of a booking party
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PartyDto {
    pub id: Uuid,
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// Response DTO for booking
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingResponseDto {
    pub id: Uuid,
    pub booking_code: String,
    pub customer: PartyDto,
    pub items: Vec<BookingItem>,
    pub address: PickupAddress,
    pub scheduled_date: NaiveDate,
    pub time_slot: TimeSlot,
    pub notes: Option<String>,
    pub status: BookingStatus,
    pub agent: Option<PartyDto>,
    pub estimated_amount: Decimal,
    pub final_amount: Option<Decimal>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status_history: Vec<StatusHistoryEntry>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
    pub rating: Option<i16>,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BookingDetails> for BookingResponseDto {
    fn from(d: BookingDetails) -> Self {
        let b = d.booking;
        Self {
            id: b.id,
            booking_code: b.booking_code,
            customer: PartyDto {
                id: b.customer_id,
                name: d.customer_name,
                phone: d.customer_phone,
            },
            items: b.items.0,
            address: b.address.0,
            scheduled_date: b.scheduled_date,
            time_slot: b.time_slot,
            notes: b.notes,
            status: b.status,
            agent: b.agent_id.map(|id| PartyDto {
                id,
                name: d.agent_name,
                phone: d.agent_phone,
            }),
            estimated_amount: b.estimated_amount,
            final_amount: b.final_amount,
            payment_method: b.payment_method,
            payment_status: b.payment_status,
            status_history: b.status_history.0,
            completed_at: b.completed_at,
            cancel_reason: b.cancel_reason,
            rating: b.rating,
            feedback: b.feedback,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

impl From<Booking> for BookingResponseDto {
    fn from(booking: Booking) -> Self {
        BookingDetails {
            booking,
            customer_name: None,
            customer_phone: None,
            agent_name: None,
            agent_phone: None,
        }
        .into()
    }
}

/// Query params for the customer's own bookings
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListMyBookingsQuery {
    pub status: Option<BookingStatus>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

impl ListMyBookingsQuery {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery::new(self.page, self.page_size)
    }
}

/// Query params for the admin booking listing
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListBookingsQuery {
    /// A booking status, or `all`
    pub status: Option<String>,
    /// Scheduled pickup date
    pub date: Option<NaiveDate>,
    /// Matches booking code, address, customer name or phone
    pub search: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

impl ListBookingsQuery {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery::new(self.page, self.page_size)
    }

    pub fn status_filter(&self) -> Result<Option<BookingStatus>, AppError> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => Ok(None),
            Some(s) => s.parse().map(Some).map_err(AppError::BadRequest),
        }
    }
}

/// Query params for the agent task list
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct AgentPickupsQuery {
    /// Defaults to assigned and out-for-pickup bookings
    pub status: Option<BookingStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_dto(status: BookingStatus) -> UpdateStatusDto {
        UpdateStatusDto {
            status,
            note: None,
            agent_id: None,
            cancel_reason: None,
            actual_weights: None,
            final_amount: None,
        }
    }

    #[test]
    fn test_create_requires_items() {
        let dto: CreateBookingDto = serde_json::from_value(serde_json::json!({
            "items": [],
            "address": { "full_address": "12 MG Road" },
            "scheduled_date": "2026-03-08",
            "time_slot": "8AM-10AM"
        }))
        .unwrap();

        assert_eq!(dto.payment_method, PaymentMethod::Cash);
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_create_rejects_zero_weight() {
        let dto: CreateBookingDto = serde_json::from_value(serde_json::json!({
            "items": [{ "category_id": Uuid::new_v4(), "estimated_weight": "0" }],
            "address": { "full_address": "12 MG Road" },
            "scheduled_date": "2026-03-08",
            "time_slot": "8AM-10AM"
        }))
        .unwrap();

        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_create_rejects_oversized_weight() {
        let dto: CreateBookingDto = serde_json::from_value(serde_json::json!({
            "items": [{
                "category_id": Uuid::new_v4(),
                "estimated_weight": "10000000000000000000000000000"
            }],
            "address": { "full_address": "12 MG Road" },
            "scheduled_date": "2026-03-08",
            "time_slot": "8AM-10AM"
        }))
        .unwrap();

        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_assign_status_needs_agent() {
        assert!(matches!(
            status_dto(BookingStatus::Assigned).into_command(),
            Err(AppError::Validation(_))
        ));

        let agent_id = Uuid::new_v4();
        let dto = UpdateStatusDto {
            agent_id: Some(agent_id),
            ..status_dto(BookingStatus::Assigned)
        };
        assert_eq!(
            dto.into_command().unwrap(),
            TransitionCommand::Assign {
                agent_id,
                note: None
            }
        );
    }

    #[test]
    fn test_pending_is_never_a_target() {
        assert!(matches!(
            status_dto(BookingStatus::Pending).into_command(),
            Err(AppError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_cancel_reason_falls_back_to_note() {
        let dto = UpdateStatusDto {
            note: Some("Customer unreachable".to_string()),
            ..status_dto(BookingStatus::Cancelled)
        };
        assert_eq!(
            dto.into_command().unwrap(),
            TransitionCommand::Cancel {
                reason: Some("Customer unreachable".to_string())
            }
        );
    }

    #[test]
    fn test_rating_range() {
        let ok = RateBookingDto {
            rating: 5,
            feedback: None,
        };
        assert!(ok.validate().is_ok());

        let too_high = RateBookingDto {
            rating: 6,
            feedback: None,
        };
        assert!(too_high.validate().is_err());
    }

    #[test]
    fn test_status_filter_accepts_all() {
        let query = |status: Option<&str>| ListBookingsQuery {
            status: status.map(str::to_string),
            date: None,
            search: None,
            page: 1,
            page_size: 20,
        };

        assert_eq!(query(None).status_filter().unwrap(), None);
        assert_eq!(query(Some("all")).status_filter().unwrap(), None);
        assert_eq!(
            query(Some("out_for_pickup")).status_filter().unwrap(),
            Some(BookingStatus::OutForPickup)
        );
        assert!(query(Some("lost")).status_filter().is_err());
    }
}
