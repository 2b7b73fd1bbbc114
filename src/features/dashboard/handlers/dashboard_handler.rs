use axum::{extract::State, Json};
use std::sync::Arc;

use crate::core::error::AppError;
use crate::core::extractor::AppQuery;
use crate::features::auth::guards::RequireAdmin;
use crate::features::dashboard::dtos::*;
use crate::features::dashboard::services::DashboardService;
use crate::shared::types::ApiResponse;

/// Admin dashboard
#[utoipa::path(
    get,
    path = "/api/analytics/dashboard",
    tag = "analytics",
    responses(
        (status = 200, description = "Dashboard statistics", body = ApiResponse<DashboardStatsDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_dashboard(
    RequireAdmin(_admin): RequireAdmin,
    State(service): State<Arc<DashboardService>>,
) -> Result<Json<ApiResponse<DashboardStatsDto>>, AppError> {
    let stats = service.get_stats().await?;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}

/// Revenue per day, week or month (admin)
#[utoipa::path(
    get,
    path = "/api/analytics/revenue",
    tag = "analytics",
    params(RevenueQuery),
    responses(
        (status = 200, description = "Revenue report", body = ApiResponse<RevenueReportDto>),
        (status = 400, description = "Unknown period"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_revenue(
    RequireAdmin(_admin): RequireAdmin,
    State(service): State<Arc<DashboardService>>,
    AppQuery(query): AppQuery<RevenueQuery>,
) -> Result<Json<ApiResponse<RevenueReportDto>>, AppError> {
    let report = service.get_revenue(query.period).await?;
    Ok(Json(ApiResponse::success(Some(report), None, None)))
}
