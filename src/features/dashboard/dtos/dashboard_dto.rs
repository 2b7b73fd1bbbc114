use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::features::bookings::dtos::BookingResponseDto;
use crate::features::bookings::models::BookingStatus;

// ============================================================================
// Dashboard
// ============================================================================

/// Admin dashboard counters, revenue and trends
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardStatsDto {
    pub total_bookings: i64,
    pub today_bookings: i64,
    pub pending_bookings: i64,
    pub completed_bookings: i64,
    pub total_customers: i64,
    pub total_agents: i64,
    /// Settled today, from the earnings ledger
    pub today_revenue: Decimal,
    /// Settled since the first of the month, from the earnings ledger
    pub monthly_revenue: Decimal,
    pub status_distribution: Vec<StatusCountDto>,
    pub weekly_trend: Vec<DailyTrendDto>,
    pub category_revenue: Vec<CategoryRevenueDto>,
    pub recent_bookings: Vec<BookingResponseDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct StatusCountDto {
    pub status: BookingStatus,
    pub count: i64,
}

/// Bookings created on one day and what they settled for
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct DailyTrendDto {
    pub date: NaiveDate,
    pub bookings: i64,
    pub revenue: Decimal,
}

/// Settled line items grouped by category snapshot name
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct CategoryRevenueDto {
    pub category_name: String,
    pub revenue: Decimal,
    pub total_weight: Decimal,
}

// ============================================================================
// Revenue
// ============================================================================

/// Bucket size for the revenue report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RevenuePeriod {
    Daily,
    Weekly,
    #[default]
    Monthly,
}

impl RevenuePeriod {
    /// Unit understood by Postgres `date_trunc`
    pub fn trunc_unit(self) -> &'static str {
        match self {
            RevenuePeriod::Daily => "day",
            RevenuePeriod::Weekly => "week",
            RevenuePeriod::Monthly => "month",
        }
    }
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct RevenueQuery {
    /// `daily`, `weekly` or `monthly` (default)
    #[serde(default)]
    pub period: RevenuePeriod,
}

/// Settlements in one period, keyed by the period's first day
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct RevenueBucketDto {
    pub period_start: NaiveDate,
    pub revenue: Decimal,
    pub bookings: i64,
    pub average_amount: Decimal,
}

/// Revenue per period, newest first, plus revenue per category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RevenueReportDto {
    pub period: RevenuePeriod,
    pub series: Vec<RevenueBucketDto>,
    pub category_revenue: Vec<CategoryRevenueDto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_defaults_to_monthly() {
        let query: RevenueQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.period, RevenuePeriod::Monthly);

        let query: RevenueQuery = serde_json::from_str(r#"{"period":"weekly"}"#).unwrap();
        assert_eq!(query.period.trunc_unit(), "week");
    }

    #[test]
    fn test_unknown_period_is_rejected() {
        assert!(serde_json::from_str::<RevenueQuery>(r#"{"period":"hourly"}"#).is_err());
    }
}
