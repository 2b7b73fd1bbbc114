use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// One settled booking credited to a customer. Rows are never updated or
/// deleted; user totals are sums over this table.
#[derive(Debug, Clone, FromRow)]
pub struct EarningEvent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub booking_id: Uuid,
    pub amount: Decimal,
    pub loyalty_points: i64,
    pub created_at: DateTime<Utc>,
}

/// Data for appending a ledger entry
#[derive(Debug, Clone, PartialEq)]
pub struct CreateEarningEvent {
    pub user_id: Uuid,
    pub booking_id: Uuid,
    pub amount: Decimal,
    pub loyalty_points: i64,
}

/// Aggregates derived from the ledger
#[derive(Debug, Clone, Default, PartialEq, FromRow)]
pub struct EarningTotals {
    pub total_earnings: Decimal,
    pub loyalty_points: i64,
    pub total_pickups: i64,
}
