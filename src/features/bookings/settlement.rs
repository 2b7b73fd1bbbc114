//! Settlement arithmetic for completed pickups.
//!
//! Amounts are recomputed from actual weights against the unit price captured
//! when the booking was created. All money is `Decimal`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::core::error::AppError;
use crate::features::bookings::models::{BookingItem, PaymentMethod, PaymentStatus};
use crate::shared::constants::{LOYALTY_POINT_DIVISOR, MAX_FINAL_AMOUNT, MAX_ITEM_WEIGHT};

/// What the agent reports when completing a pickup
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
pub struct CompletionInput {
    /// Actual weights aligned with the booking's items by index
    pub actual_weights: Option<Vec<Decimal>>,
    /// Explicit total overriding the computed sum
    pub final_amount: Option<Decimal>,
}

/// Result of settling a booking
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub items: Vec<BookingItem>,
    pub final_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub loyalty_points: i64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettlementError {
    #[error("Expected {expected} actual weights, got {actual}")]
    WeightCountMismatch { expected: usize, actual: usize },

    #[error("Actual weight for item {index} must not be negative")]
    NegativeWeight { index: usize },

    #[error("Weight for item {index} exceeds {}", MAX_ITEM_WEIGHT)]
    WeightTooLarge { index: usize },

    #[error("Final amount must not be negative")]
    NegativeFinalAmount,

    #[error("Final amount exceeds {}", MAX_FINAL_AMOUNT)]
    FinalAmountTooLarge,

    #[error("Amount is too large to settle")]
    AmountOverflow,
}

impl From<SettlementError> for AppError {
    fn from(err: SettlementError) -> Self {
        AppError::Validation(err.to_string())
    }
}

pub fn line_amount(weight: Decimal, unit_price: Decimal) -> Result<Decimal, SettlementError> {
    weight
        .checked_mul(unit_price)
        .ok_or(SettlementError::AmountOverflow)
}

/// Total of a set of priced items
pub fn estimate(items: &[BookingItem]) -> Result<Decimal, SettlementError> {
    items.iter().try_fold(Decimal::ZERO, |total, item| {
        total
            .checked_add(item.amount)
            .ok_or(SettlementError::AmountOverflow)
    })
}

/// Rejects weights above [`MAX_ITEM_WEIGHT`]
pub fn check_weight(index: usize, weight: Decimal) -> Result<(), SettlementError> {
    if weight > Decimal::from(MAX_ITEM_WEIGHT) {
        return Err(SettlementError::WeightTooLarge { index });
    }
    Ok(())
}

/// Points earned for a settled amount, always rounded down
pub fn loyalty_points(final_amount: Decimal) -> Result<i64, SettlementError> {
    let points = (final_amount / Decimal::from(LOYALTY_POINT_DIVISOR)).floor();
    points
        .to_i64()
        .map(|p| p.max(0))
        .ok_or(SettlementError::AmountOverflow)
}

/// Settle a booking's items.
///
/// Missing weights default to the estimated weight of each item. An explicit
/// final amount is taken as-is once it is within `0..=MAX_FINAL_AMOUNT`.
pub fn settle(
    items: &[BookingItem],
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    input: &CompletionInput,
) -> Result<Settlement, SettlementError> {
    if let Some(weights) = &input.actual_weights {
        if weights.len() != items.len() {
            return Err(SettlementError::WeightCountMismatch {
                expected: items.len(),
                actual: weights.len(),
            });
        }
        for (index, weight) in weights.iter().enumerate() {
            if *weight < Decimal::ZERO {
                return Err(SettlementError::NegativeWeight { index });
            }
            check_weight(index, *weight)?;
        }
    }

    let settled = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let actual = input
                .actual_weights
                .as_ref()
                .map_or(item.estimated_weight, |weights| weights[i]);
            Ok(BookingItem {
                actual_weight: Some(actual),
                amount: line_amount(actual, item.unit_price)?,
                ..item.clone()
            })
        })
        .collect::<Result<Vec<BookingItem>, SettlementError>>()?;

    let final_amount = match input.final_amount {
        Some(amount) if amount < Decimal::ZERO => {
            return Err(SettlementError::NegativeFinalAmount)
        }
        Some(amount) if amount > Decimal::from(MAX_FINAL_AMOUNT) => {
            return Err(SettlementError::FinalAmountTooLarge)
        }
        Some(amount) => amount,
        None => estimate(&settled)?,
    };

    let payment_status = match payment_method {
        PaymentMethod::Cash => PaymentStatus::Completed,
        _ => payment_status,
    };

    Ok(Settlement {
        items: settled,
        final_amount,
        payment_status,
        loyalty_points: loyalty_points(final_amount)?,
    })
}

/// Mean of an agent's booking ratings, rounded half away from zero to one
/// decimal place. `None` when nothing has been rated yet.
pub fn agent_rating(ratings: &[i16]) -> Option<Decimal> {
    if ratings.is_empty() {
        return None;
    }
    let sum: Decimal = ratings.iter().map(|r| Decimal::from(*r)).sum();
    let mean = sum / Decimal::from(ratings.len());
    Some(mean.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero))
}
