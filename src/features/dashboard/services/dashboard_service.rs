use std::sync::Arc;

use chrono::{FixedOffset, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::bookings::services::{BookingFilter, BookingService};
use crate::features::dashboard::calendar::{offset_seconds, report_window};
use crate::features::dashboard::dtos::*;
use crate::shared::types::PaginationQuery;

const RECENT_BOOKINGS: i64 = 10;
const REVENUE_PERIODS: i64 = 30;

#[derive(sqlx::FromRow)]
struct BookingCounts {
    total_bookings: i64,
    today_bookings: i64,
    pending_bookings: i64,
    completed_bookings: i64,
}

#[derive(sqlx::FromRow)]
struct UserCounts {
    total_customers: i64,
    total_agents: i64,
}

#[derive(sqlx::FromRow)]
struct Revenue {
    today_revenue: Decimal,
    monthly_revenue: Decimal,
}

/// Service for admin dashboard aggregates.
///
/// "Today" and "this month" start at local midnight in `offset`, the same
/// offset that dates booking codes.
pub struct DashboardService {
    pool: PgPool,
    bookings: Arc<BookingService>,
    offset: FixedOffset,
}

impl DashboardService {
    pub fn new(pool: PgPool, bookings: Arc<BookingService>, offset: FixedOffset) -> Self {
        Self {
            pool,
            bookings,
            offset,
        }
    }

    pub async fn get_stats(&self) -> Result<DashboardStatsDto> {
        let window = report_window(Utc::now(), self.offset);

        let counts = sqlx::query_as::<_, BookingCounts>(
            r#"
            SELECT
                COUNT(*) AS total_bookings,
                COUNT(*) FILTER (WHERE created_at >= $1) AS today_bookings,
                COUNT(*) FILTER (WHERE status = 'pending') AS pending_bookings,
                COUNT(*) FILTER (WHERE status = 'completed') AS completed_bookings
            FROM bookings
            "#,
        )
        .bind(window.today_start)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get booking counts: {:?}", e);
            AppError::Database(e)
        })?;

        let users = sqlx::query_as::<_, UserCounts>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE role = 'customer') AS total_customers,
                COUNT(*) FILTER (WHERE role = 'agent') AS total_agents
            FROM users
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get user counts: {:?}", e);
            AppError::Database(e)
        })?;

        let revenue = sqlx::query_as::<_, Revenue>(
            r#"
            SELECT
                COALESCE(SUM(amount) FILTER (WHERE created_at >= $1), 0) AS today_revenue,
                COALESCE(SUM(amount) FILTER (WHERE created_at >= $2), 0) AS monthly_revenue
            FROM earning_events
            "#,
        )
        .bind(window.today_start)
        .bind(window.month_start)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get revenue: {:?}", e);
            AppError::Database(e)
        })?;

        let status_distribution = sqlx::query_as::<_, StatusCountDto>(
            "SELECT status, COUNT(*) AS count FROM bookings GROUP BY status ORDER BY status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get status distribution: {:?}", e);
            AppError::Database(e)
        })?;

        let weekly_trend = sqlx::query_as::<_, DailyTrendDto>(
            r#"
            SELECT
                ((created_at AT TIME ZONE 'UTC') + make_interval(secs => $1))::date AS date,
                COUNT(*) AS bookings,
                COALESCE(SUM(final_amount), 0) AS revenue
            FROM bookings
            WHERE created_at >= $2
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(offset_seconds(self.offset))
        .bind(window.trend_start)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get weekly trend: {:?}", e);
            AppError::Database(e)
        })?;

        let category_revenue = self.category_revenue().await?;

        let (recent, _) = self
            .bookings
            .list_all(
                &BookingFilter::default(),
                &PaginationQuery::new(1, RECENT_BOOKINGS),
            )
            .await?;

        Ok(DashboardStatsDto {
            total_bookings: counts.total_bookings,
            today_bookings: counts.today_bookings,
            pending_bookings: counts.pending_bookings,
            completed_bookings: counts.completed_bookings,
            total_customers: users.total_customers,
            total_agents: users.total_agents,
            today_revenue: revenue.today_revenue,
            monthly_revenue: revenue.monthly_revenue,
            status_distribution,
            weekly_trend,
            category_revenue,
            recent_bookings: recent.into_iter().map(Into::into).collect(),
        })
    }

    /// Ledger revenue bucketed by local day, week or month
    pub async fn get_revenue(&self, period: RevenuePeriod) -> Result<RevenueReportDto> {
        let series = sqlx::query_as::<_, RevenueBucketDto>(
            r#"
            SELECT
                date_trunc($1, (created_at AT TIME ZONE 'UTC') + make_interval(secs => $2))::date
                    AS period_start,
                SUM(amount) AS revenue,
                COUNT(*) AS bookings,
                ROUND(AVG(amount), 2) AS average_amount
            FROM earning_events
            GROUP BY 1
            ORDER BY 1 DESC
            LIMIT $3
            "#,
        )
        .bind(period.trunc_unit())
        .bind(offset_seconds(self.offset))
        .bind(REVENUE_PERIODS)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get {:?} revenue: {:?}", period, e);
            AppError::Database(e)
        })?;

        Ok(RevenueReportDto {
            period,
            series,
            category_revenue: self.category_revenue().await?,
        })
    }

    async fn category_revenue(&self) -> Result<Vec<CategoryRevenueDto>> {
        sqlx::query_as::<_, CategoryRevenueDto>(
            r#"
            SELECT
                item->>'category_name' AS category_name,
                COALESCE(SUM((item->>'amount')::numeric), 0) AS revenue,
                COALESCE(SUM((item->>'actual_weight')::numeric), 0) AS total_weight
            FROM bookings, jsonb_array_elements(items) AS item
            WHERE status = 'completed'
            GROUP BY item->>'category_name'
            ORDER BY revenue DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get category revenue: {:?}", e);
            AppError::Database(e)
        })
    }
}
