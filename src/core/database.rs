use crate::core::config::DatabaseConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .connect(&config.url)
        .await
}

/// Returns true when the error is a unique violation on the named constraint
pub fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db) => db.is_unique_violation() && db.constraint() == Some(constraint),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::unique_violation;

    #[test]
    fn test_unique_violation_matches_constraint_name() {
        let err = unique_violation("categories_slug_key");
        assert!(is_unique_violation(&err, "categories_slug_key"));
        assert!(!is_unique_violation(&err, "bookings_booking_code_key"));
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound, "categories_slug_key"));
    }
}
