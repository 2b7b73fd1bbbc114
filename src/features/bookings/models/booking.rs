use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::categories::models::CategoryUnit;

/// Booking status enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Assigned,
    OutForPickup,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Assigned => "assigned",
            BookingStatus::OutForPickup => "out_for_pickup",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// No transition leaves a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "assigned" => Ok(BookingStatus::Assigned),
            "out_for_pickup" => Ok(BookingStatus::OutForPickup),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("Unknown booking status '{}'", other)),
        }
    }
}

/// Two-hour pickup windows offered to customers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "time_slot")]
pub enum TimeSlot {
    #[sqlx(rename = "8AM-10AM")]
    #[serde(rename = "8AM-10AM")]
    Slot8To10,
    #[sqlx(rename = "10AM-12PM")]
    #[serde(rename = "10AM-12PM")]
    Slot10To12,
    #[sqlx(rename = "12PM-2PM")]
    #[serde(rename = "12PM-2PM")]
    Slot12To14,
    #[sqlx(rename = "2PM-4PM")]
    #[serde(rename = "2PM-4PM")]
    Slot14To16,
    #[sqlx(rename = "4PM-6PM")]
    #[serde(rename = "4PM-6PM")]
    Slot16To18,
    #[sqlx(rename = "6PM-8PM")]
    #[serde(rename = "6PM-8PM")]
    Slot18To20,
}

impl TimeSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeSlot::Slot8To10 => "8AM-10AM",
            TimeSlot::Slot10To12 => "10AM-12PM",
            TimeSlot::Slot12To14 => "12PM-2PM",
            TimeSlot::Slot14To16 => "2PM-4PM",
            TimeSlot::Slot16To18 => "4PM-6PM",
            TimeSlot::Slot18To20 => "6PM-8PM",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Upi,
    Razorpay,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

/// Line item with the category snapshot taken when the booking was priced.
/// The snapshot is never refreshed from the live category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookingItem {
    pub category_id: Uuid,
    pub category_name: String,
    pub unit: CategoryUnit,
    pub estimated_weight: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_weight: Option<Decimal>,
    pub unit_price: Decimal,
    pub amount: Decimal,
}

/// Pickup address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct PickupAddress {
    #[validate(length(min = 1, max = 500, message = "Full address must be 1-500 characters"))]
    pub full_address: String,
    #[validate(length(max = 200, message = "Landmark must not exceed 200 characters"))]
    pub landmark: Option<String>,
    #[validate(length(max = 100, message = "City must not exceed 100 characters"))]
    pub city: Option<String>,
    #[validate(length(min = 4, max = 10, message = "Pincode must be 4-10 characters"))]
    pub pincode: Option<String>,
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be within -90..90"))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be within -180..180"))]
    pub longitude: Option<f64>,
}

/// One status change; the first entry records creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatusHistoryEntry {
    pub status: BookingStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Database model for booking
#[derive(Debug, Clone, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub booking_code: String,
    pub customer_id: Uuid,
    pub items: Json<Vec<BookingItem>>,
    pub address: Json<PickupAddress>,
    pub scheduled_date: NaiveDate,
    pub time_slot: TimeSlot,
    pub notes: Option<String>,
    pub status: BookingStatus,
    pub agent_id: Option<Uuid>,
    pub estimated_amount: Decimal,
    pub final_amount: Option<Decimal>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status_history: Json<Vec<StatusHistoryEntry>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
    pub rating: Option<i16>,
    pub feedback: Option<String>,
    /// Bumped on every write; updates are conditional on the value read
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Booking columns qualified with the `b` alias used by every booking query
pub(crate) const BOOKING_COLUMNS: &str = "b.id, b.booking_code, b.customer_id, b.items, \
     b.address, b.scheduled_date, b.time_slot, b.notes, b.status, b.agent_id, \
     b.estimated_amount, b.final_amount, b.payment_method, b.payment_status, \
     b.status_history, b.completed_at, b.cancel_reason, b.rating, b.feedback, \
     b.revision, b.created_at, b.updated_at";

/// Booking joined with the contact details of its customer and agent
#[derive(Debug, Clone, FromRow)]
pub struct BookingDetails {
    #[sqlx(flatten)]
    pub booking: Booking,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub agent_name: Option<String>,
    pub agent_phone: Option<String>,
}

/// Data for inserting a freshly priced booking
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub customer_id: Uuid,
    pub items: Vec<BookingItem>,
    pub address: PickupAddress,
    pub scheduled_date: NaiveDate,
    pub time_slot: TimeSlot,
    pub notes: Option<String>,
    pub payment_method: PaymentMethod,
    pub estimated_amount: Decimal,
    pub status_history: Vec<StatusHistoryEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_string_forms_agree() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Assigned,
            BookingStatus::OutForPickup,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, serde_json::Value::String(status.to_string()));
            assert_eq!(status.as_str().parse::<BookingStatus>(), Ok(status));
        }
        assert!("shipped".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn test_time_slot_wire_form() {
        let slot: TimeSlot = serde_json::from_str(r#""10AM-12PM""#).unwrap();
        assert_eq!(slot, TimeSlot::Slot10To12);
        assert_eq!(serde_json::to_value(slot).unwrap(), slot.as_str());
        assert!(serde_json::from_str::<TimeSlot>(r#""9AM-11AM""#).is_err());
    }

    #[test]
    fn test_address_coordinates_validated() {
        let mut address = PickupAddress {
            full_address: "H.No 12, Nizampet".to_string(),
            landmark: None,
            city: Some("Hyderabad".to_string()),
            pincode: Some("500090".to_string()),
            latitude: Some(17.51),
            longitude: Some(78.38),
        };
        assert!(address.validate().is_ok());

        address.latitude = Some(123.0);
        assert!(address.validate().is_err());
    }
}
