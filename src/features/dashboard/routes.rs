use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::dashboard::handlers;
use crate::features::dashboard::services::DashboardService;

/// Admin analytics routes
pub fn routes(dashboard_service: Arc<DashboardService>) -> Router {
    Router::new()
        .route("/api/analytics/dashboard", get(handlers::get_dashboard))
        .route("/api/analytics/revenue", get(handlers::get_revenue))
        .with_state(dashboard_service)
}
