//! Booking state machine.
//!
//! Every status change goes through [`apply`], which consults [`TRANSITIONS`].
//! The order of checks is fixed:
//!
//! 1. ownership: an agent must be bound to the booking and a customer must
//!    own it, otherwise `Forbidden`
//! 2. the `(from, to)` pair must be listed, otherwise `InvalidTransition`
//! 3. the actor must hold one of the listed authorities, otherwise `Forbidden`
//!
//! `apply` only mutates the in-memory booking. Persisting it (with the
//! revision check) is the caller's job.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::features::bookings::models::{Booking, BookingStatus, StatusHistoryEntry};
use crate::features::bookings::settlement::{self, CompletionInput, Settlement, SettlementError};
use crate::features::users::models::UserRole;
use crate::shared::constants::DEFAULT_CANCEL_REASON;

/// Who is asking for a change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: UserRole,
}

/// Capacity in which an actor may perform a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    Admin,
    BoundAgent,
    OwningCustomer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub authorities: &'static [Authority],
}

pub const TRANSITIONS: &[TransitionRule] = &[
    TransitionRule {
        from: BookingStatus::Pending,
        to: BookingStatus::Confirmed,
        authorities: &[Authority::Admin],
    },
    TransitionRule {
        from: BookingStatus::Pending,
        to: BookingStatus::Cancelled,
        authorities: &[Authority::Admin, Authority::OwningCustomer],
    },
    TransitionRule {
        from: BookingStatus::Confirmed,
        to: BookingStatus::Assigned,
        authorities: &[Authority::Admin],
    },
    TransitionRule {
        from: BookingStatus::Confirmed,
        to: BookingStatus::Cancelled,
        authorities: &[Authority::Admin, Authority::OwningCustomer],
    },
    // Reassignment
    TransitionRule {
        from: BookingStatus::Assigned,
        to: BookingStatus::Assigned,
        authorities: &[Authority::Admin],
    },
    TransitionRule {
        from: BookingStatus::Assigned,
        to: BookingStatus::OutForPickup,
        authorities: &[Authority::BoundAgent],
    },
    TransitionRule {
        from: BookingStatus::Assigned,
        to: BookingStatus::Cancelled,
        authorities: &[Authority::Admin, Authority::OwningCustomer],
    },
    TransitionRule {
        from: BookingStatus::OutForPickup,
        to: BookingStatus::Completed,
        authorities: &[Authority::BoundAgent],
    },
];

pub fn find_rule(from: BookingStatus, to: BookingStatus) -> Option<&'static TransitionRule> {
    TRANSITIONS.iter().find(|r| r.from == from && r.to == to)
}

/// A requested status change with the data it carries
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionCommand {
    Confirm { note: Option<String> },
    Assign { agent_id: Uuid, note: Option<String> },
    StartPickup,
    Complete(CompletionInput),
    Cancel { reason: Option<String> },
}

impl TransitionCommand {
    pub fn target(&self) -> BookingStatus {
        match self {
            TransitionCommand::Confirm { .. } => BookingStatus::Confirmed,
            TransitionCommand::Assign { .. } => BookingStatus::Assigned,
            TransitionCommand::StartPickup => BookingStatus::OutForPickup,
            TransitionCommand::Complete(_) => BookingStatus::Completed,
            TransitionCommand::Cancel { .. } => BookingStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LifecycleError {
    #[error("{0}")]
    Forbidden(String),

    #[error("Cannot move booking from '{from}' to '{to}'")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("{0}")]
    Settlement(#[from] SettlementError),

    #[error("Only completed bookings can be rated")]
    NotRateable,

    #[error("Booking has already been rated")]
    AlreadyRated,

    #[error("Rating must be between 1 and 5")]
    RatingOutOfRange,
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Forbidden(msg) => AppError::Forbidden(msg),
            e @ (LifecycleError::InvalidTransition { .. } | LifecycleError::NotRateable) => {
                AppError::InvalidTransition(e.to_string())
            }
            e @ (LifecycleError::Settlement(_) | LifecycleError::RatingOutOfRange) => {
                AppError::Validation(e.to_string())
            }
            e @ LifecycleError::AlreadyRated => AppError::Conflict(e.to_string()),
        }
    }
}

impl Actor {
    fn holds(&self, authority: Authority, booking: &Booking) -> bool {
        match authority {
            Authority::Admin => self.role == UserRole::Admin,
            Authority::BoundAgent => {
                self.role == UserRole::Agent && booking.agent_id == Some(self.user_id)
            }
            Authority::OwningCustomer => {
                self.role == UserRole::Customer && booking.customer_id == self.user_id
            }
        }
    }

    /// Agents only see bookings bound to them, customers only their own
    fn check_ownership(&self, booking: &Booking) -> Result<(), LifecycleError> {
        match self.role {
            UserRole::Agent if booking.agent_id != Some(self.user_id) => Err(
                LifecycleError::Forbidden("Booking is not assigned to you".to_string()),
            ),
            UserRole::Customer if booking.customer_id != self.user_id => Err(
                LifecycleError::Forbidden("Not authorized to access this booking".to_string()),
            ),
            _ => Ok(()),
        }
    }
}

/// Read access follows the same ownership rule as mutations
pub fn ensure_can_view(booking: &Booking, actor: &Actor) -> Result<(), LifecycleError> {
    actor.check_ownership(booking)
}

/// History for a freshly created booking
pub fn initial_history(now: DateTime<Utc>) -> Vec<StatusHistoryEntry> {
    vec![StatusHistoryEntry {
        status: BookingStatus::Pending,
        timestamp: now,
        note: Some("Booking created".to_string()),
    }]
}

/// Apply a transition to `booking`.
///
/// Returns the settlement when the booking was completed so the caller can
/// record it in the earnings ledger within the same write.
pub fn apply(
    booking: &mut Booking,
    actor: &Actor,
    command: TransitionCommand,
    now: DateTime<Utc>,
) -> Result<Option<Settlement>, LifecycleError> {
    actor.check_ownership(booking)?;

    let from = booking.status;
    let to = command.target();
    let rule = find_rule(from, to).ok_or(LifecycleError::InvalidTransition { from, to })?;

    if !rule.authorities.iter().any(|a| actor.holds(*a, booking)) {
        return Err(LifecycleError::Forbidden(format!(
            "Role '{}' may not move a booking from '{}' to '{}'",
            actor.role, from, to
        )));
    }

    let mut settled = None;
    let note = match command {
        TransitionCommand::Confirm { note } => note,
        TransitionCommand::Assign { agent_id, note } => {
            booking.agent_id = Some(agent_id);
            note
        }
        TransitionCommand::StartPickup => None,
        TransitionCommand::Complete(input) => {
            let s = settlement::settle(
                &booking.items,
                booking.payment_method,
                booking.payment_status,
                &input,
            )?;
            booking.items.0 = s.items.clone();
            booking.final_amount = Some(s.final_amount);
            booking.payment_status = s.payment_status;
            booking.completed_at = Some(now);
            settled = Some(s);
            None
        }
        TransitionCommand::Cancel { reason } => {
            let reason = reason
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| DEFAULT_CANCEL_REASON.to_string());
            booking.cancel_reason = Some(reason.clone());
            Some(reason)
        }
    };

    booking.status = to;
    booking.status_history.0.push(StatusHistoryEntry {
        status: to,
        timestamp: now,
        note,
    });

    Ok(settled)
}

/// Record the customer's one-time rating of a completed booking
pub fn rate(
    booking: &mut Booking,
    actor: &Actor,
    rating: i16,
    feedback: Option<String>,
) -> Result<(), LifecycleError> {
    if booking.customer_id != actor.user_id {
        return Err(LifecycleError::Forbidden(
            "Only the customer who booked the pickup can rate it".to_string(),
        ));
    }
    if booking.status != BookingStatus::Completed {
        return Err(LifecycleError::NotRateable);
    }
    if booking.rating.is_some() {
        return Err(LifecycleError::AlreadyRated);
    }
    if !(1..=5).contains(&rating) {
        return Err(LifecycleError::RatingOutOfRange);
    }

    booking.rating = Some(rating);
    booking.feedback = feedback;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::bookings::models::PaymentStatus;
    use crate::shared::test_helpers::{sample_booking, test_actor};
    use rust_decimal::Decimal;

    fn actor(role: UserRole) -> Actor {
        test_actor(role)
    }

    fn booking(customer: &Actor) -> Booking {
        sample_booking(customer.user_id)
    }

    fn assert_history_matches(b: &Booking) {
        let last = b.status_history.0.last().expect("history is never empty");
        assert_eq!(last.status, b.status);
    }

    fn confirm() -> TransitionCommand {
        TransitionCommand::Confirm { note: None }
    }

    fn assign(agent: &Actor) -> TransitionCommand {
        TransitionCommand::Assign {
            agent_id: agent.user_id,
            note: None,
        }
    }

    #[test]
    fn test_table_has_no_exit_from_terminal_states() {
        assert!(TRANSITIONS.iter().all(|r| !r.from.is_terminal()));
        assert!(find_rule(BookingStatus::OutForPickup, BookingStatus::Cancelled).is_none());
    }

    #[test]
    fn test_confirm_then_assign() {
        let admin = actor(UserRole::Admin);
        let agent = actor(UserRole::Agent);
        let mut b = booking(&actor(UserRole::Customer));

        apply(&mut b, &admin, confirm(), Utc::now()).unwrap();
        apply(&mut b, &admin, assign(&agent), Utc::now()).unwrap();

        assert_eq!(b.status, BookingStatus::Assigned);
        assert_eq!(b.agent_id, Some(agent.user_id));
        assert_eq!(b.status_history.0.len(), 3);
        assert_history_matches(&b);
    }

    #[test]
    fn test_reassignment_replaces_agent() {
        let admin = actor(UserRole::Admin);
        let first = actor(UserRole::Agent);
        let second = actor(UserRole::Agent);
        let mut b = booking(&actor(UserRole::Customer));

        apply(&mut b, &admin, confirm(), Utc::now()).unwrap();
        apply(&mut b, &admin, assign(&first), Utc::now()).unwrap();
        apply(&mut b, &admin, assign(&second), Utc::now()).unwrap();

        assert_eq!(b.agent_id, Some(second.user_id));
        assert_eq!(b.status, BookingStatus::Assigned);
    }

    #[test]
    fn test_assign_requires_confirmation() {
        let admin = actor(UserRole::Admin);
        let mut b = booking(&actor(UserRole::Customer));

        let err = apply(&mut b, &admin, assign(&actor(UserRole::Agent)), Utc::now()).unwrap_err();
        assert_eq!(
            err,
            LifecycleError::InvalidTransition {
                from: BookingStatus::Pending,
                to: BookingStatus::Assigned
            }
        );
        assert_eq!(b.agent_id, None);
        assert_eq!(b.status_history.0.len(), 1);
    }

    #[test]
    fn test_only_bound_agent_starts_pickup() {
        let admin = actor(UserRole::Admin);
        let agent_a = actor(UserRole::Agent);
        let agent_b = actor(UserRole::Agent);
        let mut b = booking(&actor(UserRole::Customer));
        apply(&mut b, &admin, confirm(), Utc::now()).unwrap();
        apply(&mut b, &admin, assign(&agent_a), Utc::now()).unwrap();

        let err = apply(&mut b, &agent_b, TransitionCommand::StartPickup, Utc::now()).unwrap_err();
        assert!(matches!(err, LifecycleError::Forbidden(_)));
        assert_eq!(b.status, BookingStatus::Assigned);

        apply(&mut b, &agent_a, TransitionCommand::StartPickup, Utc::now()).unwrap();
        assert_eq!(b.status, BookingStatus::OutForPickup);

        // Agent B is still rejected on ownership, before the table is consulted
        let err = apply(&mut b, &agent_b, TransitionCommand::StartPickup, Utc::now()).unwrap_err();
        assert!(matches!(err, LifecycleError::Forbidden(_)));
    }

    #[test]
    fn test_admin_cannot_start_pickup() {
        let admin = actor(UserRole::Admin);
        let mut b = booking(&actor(UserRole::Customer));
        apply(&mut b, &admin, confirm(), Utc::now()).unwrap();
        apply(&mut b, &admin, assign(&actor(UserRole::Agent)), Utc::now()).unwrap();

        let err = apply(&mut b, &admin, TransitionCommand::StartPickup, Utc::now()).unwrap_err();
        assert!(matches!(err, LifecycleError::Forbidden(_)));
    }

    #[test]
    fn test_completion_settles_booking() {
        let admin = actor(UserRole::Admin);
        let agent = actor(UserRole::Agent);
        let mut b = booking(&actor(UserRole::Customer));
        apply(&mut b, &admin, confirm(), Utc::now()).unwrap();
        apply(&mut b, &admin, assign(&agent), Utc::now()).unwrap();
        apply(&mut b, &agent, TransitionCommand::StartPickup, Utc::now()).unwrap();

        let now = Utc::now();
        let input = CompletionInput {
            actual_weights: Some(vec![Decimal::from(4)]),
            final_amount: None,
        };
        let settlement = apply(&mut b, &agent, TransitionCommand::Complete(input), now)
            .unwrap()
            .expect("completion yields a settlement");

        assert_eq!(b.status, BookingStatus::Completed);
        assert_eq!(b.items.0[0].amount, Decimal::from(56));
        assert_eq!(b.final_amount, Some(Decimal::from(56)));
        assert_eq!(b.payment_status, PaymentStatus::Completed);
        assert_eq!(b.completed_at, Some(now));
        assert_eq!(settlement.final_amount, Decimal::from(56));
        assert_eq!(settlement.loyalty_points, 5);
        assert_eq!(b.status_history.0.len(), 5);
        assert_history_matches(&b);
    }

    #[test]
    fn test_completed_booking_cannot_settle_again() {
        let admin = actor(UserRole::Admin);
        let agent = actor(UserRole::Agent);
        let mut b = booking(&actor(UserRole::Customer));
        apply(&mut b, &admin, confirm(), Utc::now()).unwrap();
        apply(&mut b, &admin, assign(&agent), Utc::now()).unwrap();
        apply(&mut b, &agent, TransitionCommand::StartPickup, Utc::now()).unwrap();
        let complete = || TransitionCommand::Complete(CompletionInput::default());
        apply(&mut b, &agent, complete(), Utc::now()).unwrap();
        let settled_history = b.status_history.0.len();

        let err = apply(&mut b, &agent, complete(), Utc::now()).unwrap_err();

        assert_eq!(
            err,
            LifecycleError::InvalidTransition {
                from: BookingStatus::Completed,
                to: BookingStatus::Completed
            }
        );
        assert_eq!(b.final_amount, Some(Decimal::from(70)));
        assert_eq!(b.status_history.0.len(), settled_history);
    }

    #[test]
    fn test_bad_weights_leave_booking_untouched() {
        let admin = actor(UserRole::Admin);
        let agent = actor(UserRole::Agent);
        let mut b = booking(&actor(UserRole::Customer));
        apply(&mut b, &admin, confirm(), Utc::now()).unwrap();
        apply(&mut b, &admin, assign(&agent), Utc::now()).unwrap();
        apply(&mut b, &agent, TransitionCommand::StartPickup, Utc::now()).unwrap();

        let input = CompletionInput {
            actual_weights: Some(vec![]),
            final_amount: None,
        };
        let err = apply(&mut b, &agent, TransitionCommand::Complete(input), Utc::now()).unwrap_err();

        assert!(matches!(err, LifecycleError::Settlement(_)));
        assert_eq!(b.status, BookingStatus::OutForPickup);
        assert_eq!(b.final_amount, None);
        assert_history_matches(&b);
    }

    #[test]
    fn test_customer_cancels_pending_booking() {
        let customer = actor(UserRole::Customer);
        let mut b = booking(&customer);

        apply(
            &mut b,
            &customer,
            TransitionCommand::Cancel { reason: None },
            Utc::now(),
        )
        .unwrap();

        assert_eq!(b.status, BookingStatus::Cancelled);
        assert_eq!(b.cancel_reason.as_deref(), Some(DEFAULT_CANCEL_REASON));
        assert_history_matches(&b);
    }

    #[test]
    fn test_cancel_rejected_once_out_for_pickup() {
        let customer = actor(UserRole::Customer);
        let admin = actor(UserRole::Admin);
        let agent = actor(UserRole::Agent);
        let mut b = booking(&customer);
        apply(&mut b, &admin, confirm(), Utc::now()).unwrap();
        apply(&mut b, &admin, assign(&agent), Utc::now()).unwrap();
        apply(&mut b, &agent, TransitionCommand::StartPickup, Utc::now()).unwrap();

        for who in [&customer, &admin] {
            let err = apply(
                &mut b,
                who,
                TransitionCommand::Cancel {
                    reason: Some("Changed my mind".to_string()),
                },
                Utc::now(),
            )
            .unwrap_err();
            assert_eq!(
                err,
                LifecycleError::InvalidTransition {
                    from: BookingStatus::OutForPickup,
                    to: BookingStatus::Cancelled
                }
            );
        }
        assert_eq!(b.cancel_reason, None);
    }

    #[test]
    fn test_other_customer_is_forbidden() {
        let owner = actor(UserRole::Customer);
        let stranger = actor(UserRole::Customer);
        let mut b = booking(&owner);

        let err = apply(
            &mut b,
            &stranger,
            TransitionCommand::Cancel { reason: None },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, LifecycleError::Forbidden(_)));
        assert!(ensure_can_view(&b, &stranger).is_err());
        assert!(ensure_can_view(&b, &owner).is_ok());
    }

    #[test]
    fn test_customer_cannot_confirm_own_booking() {
        let customer = actor(UserRole::Customer);
        let mut b = booking(&customer);
        let err = apply(&mut b, &customer, confirm(), Utc::now()).unwrap_err();
        assert!(matches!(err, LifecycleError::Forbidden(_)));
    }

    #[test]
    fn test_agent_cannot_cancel() {
        let admin = actor(UserRole::Admin);
        let agent = actor(UserRole::Agent);
        let mut b = booking(&actor(UserRole::Customer));
        apply(&mut b, &admin, confirm(), Utc::now()).unwrap();
        apply(&mut b, &admin, assign(&agent), Utc::now()).unwrap();

        let err = apply(
            &mut b,
            &agent,
            TransitionCommand::Cancel { reason: None },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, LifecycleError::Forbidden(_)));
    }

    #[test]
    fn test_rating_rules() {
        let customer = actor(UserRole::Customer);
        let mut b = booking(&customer);

        assert_eq!(
            rate(&mut b, &customer, 5, None),
            Err(LifecycleError::NotRateable)
        );

        b.status = BookingStatus::Completed;
        assert!(matches!(
            rate(&mut b, &actor(UserRole::Customer), 5, None),
            Err(LifecycleError::Forbidden(_))
        ));
        assert_eq!(
            rate(&mut b, &customer, 6, None),
            Err(LifecycleError::RatingOutOfRange)
        );

        rate(&mut b, &customer, 4, Some("On time".to_string())).unwrap();
        assert_eq!(b.rating, Some(4));
        assert_eq!(
            rate(&mut b, &customer, 5, None),
            Err(LifecycleError::AlreadyRated)
        );
    }

    #[test]
    fn test_error_mapping() {
        let forbidden: AppError = LifecycleError::Forbidden("x".to_string()).into();
        assert!(matches!(forbidden, AppError::Forbidden(_)));

        let invalid: AppError = LifecycleError::InvalidTransition {
            from: BookingStatus::Completed,
            to: BookingStatus::Cancelled,
        }
        .into();
        assert!(matches!(invalid, AppError::InvalidTransition(_)));

        let rated: AppError = LifecycleError::AlreadyRated.into();
        assert!(matches!(rated, AppError::Conflict(_)));

        let settlement: AppError = LifecycleError::Settlement(SettlementError::NegativeFinalAmount).into();
        assert!(matches!(settlement, AppError::Validation(_)));
    }
}
