//! Inbox messages produced by booking events.

use crate::features::bookings::models::{Booking, BookingStatus};
use crate::features::notifications::models::{NewNotification, NotificationKind};
use crate::shared::constants::CURRENCY_SYMBOL;

fn to_customer(booking: &Booking, kind: NotificationKind, title: &str, body: String) -> NewNotification {
    NewNotification {
        user_id: booking.customer_id,
        title: title.to_string(),
        body,
        kind,
        booking_id: Some(booking.id),
    }
}

/// Acknowledgement sent to the customer when a booking is placed
pub fn booking_placed(booking: &Booking) -> NewNotification {
    to_customer(
        booking,
        NotificationKind::BookingConfirmed,
        "Booking Placed! 🎉",
        format!(
            "Your booking #{} has been placed. Estimated amount: {}{}",
            booking.booking_code, CURRENCY_SYMBOL, booking.estimated_amount
        ),
    )
}

/// Messages for a booking that has just entered its current status
pub fn status_changed(booking: &Booking) -> Vec<NewNotification> {
    let code = &booking.booking_code;
    match booking.status {
        BookingStatus::Pending => Vec::new(),
        BookingStatus::Confirmed => vec![to_customer(
            booking,
            NotificationKind::BookingConfirmed,
            "Booking Confirmed ✅",
            format!("Your booking #{} has been confirmed!", code),
        )],
        BookingStatus::Assigned => {
            let mut out = vec![to_customer(
                booking,
                NotificationKind::BookingAssigned,
                "Agent Assigned 🚛",
                format!("An agent has been assigned for your pickup #{}", code),
            )];
            if let Some(agent_id) = booking.agent_id {
                out.push(NewNotification {
                    user_id: agent_id,
                    title: "New Pickup Assigned 📦".to_string(),
                    body: format!(
                        "You have a new pickup #{} scheduled for {} ({})",
                        code,
                        booking.scheduled_date.format("%d %b %Y"),
                        booking.time_slot.as_str()
                    ),
                    kind: NotificationKind::BookingAssigned,
                    booking_id: Some(booking.id),
                });
            }
            out
        }
        BookingStatus::OutForPickup => vec![to_customer(
            booking,
            NotificationKind::OutForPickup,
            "On The Way! 🏃",
            format!(
                "Our agent is heading to your location for pickup #{}",
                code
            ),
        )],
        BookingStatus::Completed => vec![to_customer(
            booking,
            NotificationKind::PickupCompleted,
            "Pickup Completed! 🎉",
            format!(
                "Pickup #{} is done. Amount: {}{}",
                code,
                CURRENCY_SYMBOL,
                booking.final_amount.unwrap_or(booking.estimated_amount)
            ),
        )],
        BookingStatus::Cancelled => vec![to_customer(
            booking,
            NotificationKind::BookingCancelled,
            "Booking Cancelled ❌",
            format!("Booking #{} has been cancelled.", code),
        )],
    }
}
