use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::core::database::is_unique_violation;
use crate::core::error::{AppError, Result};
use crate::features::users::models::{CreateEarningEvent, EarningEvent, EarningTotals};

const EARNING_COLUMNS: &str = "id, user_id, booking_id, amount, loyalty_points, created_at";
const ONE_EVENT_PER_BOOKING: &str = "earning_events_booking_id_key";

/// Append-only earnings ledger.
///
/// Settlement appends one event per completed booking; profile aggregates are
/// computed from the events instead of being kept as counters on the user row.
pub struct EarningLedger;

impl EarningLedger {
    /// Append an event inside the caller's transaction
    pub async fn append(
        conn: &mut PgConnection,
        event: &CreateEarningEvent,
    ) -> Result<EarningEvent> {
        let sql = format!(
            "INSERT INTO earning_events (user_id, booking_id, amount, loyalty_points) \
             VALUES ($1, $2, $3, $4) RETURNING {EARNING_COLUMNS}"
        );

        sqlx::query_as::<_, EarningEvent>(&sql)
            .bind(event.user_id)
            .bind(event.booking_id)
            .bind(event.amount)
            .bind(event.loyalty_points)
            .fetch_one(conn)
            .await
            .map_err(|e| append_error(e, event.booking_id))
    }

    /// Sum of a customer's ledger
    pub async fn totals(pool: &PgPool, user_id: Uuid) -> Result<EarningTotals> {
        sqlx::query_as::<_, EarningTotals>(
            r#"
            SELECT
                COALESCE(SUM(amount), 0) AS total_earnings,
                COALESCE(SUM(loyalty_points), 0)::BIGINT AS loyalty_points,
                COUNT(*) AS total_pickups
            FROM earning_events
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to sum earnings for {}: {:?}", user_id, e);
            AppError::Database(e)
        })
    }

    /// A customer's ledger entries, newest first
    pub async fn list(
        pool: &PgPool,
        user_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<EarningEvent>, i64)> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM earning_events WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to count earnings: {:?}", e);
                    AppError::Database(e)
                })?;

        let sql = format!(
            "SELECT {EARNING_COLUMNS} FROM earning_events WHERE user_id = $1 \
             ORDER BY created_at DESC OFFSET $2 LIMIT $3"
        );
        let events = sqlx::query_as::<_, EarningEvent>(&sql)
            .bind(user_id)
            .bind(offset)
            .bind(limit)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list earnings: {:?}", e);
                AppError::Database(e)
            })?;

        Ok((events, total))
    }
}

/// A second event for the same booking means it was already settled
fn append_error(e: sqlx::Error, booking_id: Uuid) -> AppError {
    if is_unique_violation(&e, ONE_EVENT_PER_BOOKING) {
        AppError::Conflict(format!("Booking {} has already been settled", booking_id))
    } else {
        tracing::error!("Failed to append earning event: {:?}", e);
        AppError::Database(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::unique_violation;

    #[test]
    fn test_second_settlement_is_a_conflict() {
        let booking_id = Uuid::new_v4();
        let err = append_error(unique_violation(ONE_EVENT_PER_BOOKING), booking_id);

        match err {
            AppError::Conflict(message) => assert!(message.contains(&booking_id.to_string())),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_other_failures_stay_database_errors() {
        let err = append_error(unique_violation("users_phone_key"), Uuid::new_v4());
        assert!(matches!(err, AppError::Database(_)));

        let err = append_error(sqlx::Error::RowNotFound, Uuid::new_v4());
        assert!(matches!(err, AppError::Database(_)));
    }
}
