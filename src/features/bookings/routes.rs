use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::features::bookings::handlers;
use crate::features::bookings::services::BookingService;

pub fn routes(service: Arc<BookingService>) -> Router {
    Router::new()
        .route(
            "/api/bookings",
            post(handlers::create_booking).get(handlers::list_bookings),
        )
        .route("/api/bookings/my", get(handlers::list_my_bookings))
        .route("/api/bookings/{id}", get(handlers::get_booking))
        .route(
            "/api/bookings/{id}/status",
            put(handlers::update_booking_status),
        )
        .route("/api/bookings/{id}/assign", put(handlers::assign_agent))
        .route("/api/bookings/{id}/cancel", put(handlers::cancel_booking))
        .route("/api/bookings/{id}/rate", put(handlers::rate_booking))
        .route("/api/agents/pickups", get(handlers::list_pickups))
        .route(
            "/api/agents/pickups/{id}/start",
            put(handlers::start_pickup),
        )
        .route(
            "/api/agents/pickups/{id}/complete",
            put(handlers::complete_pickup),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::BookingConfig;
    use crate::features::categories::CategoryService;
    use crate::features::notifications::NotificationService;
    use crate::features::users::models::UserRole;
    use crate::features::users::services::UserService;
    use crate::shared::test_helpers::{lazy_pool, test_user, with_user};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;
    use uuid::Uuid;

    fn service() -> Arc<BookingService> {
        let pool = lazy_pool();
        Arc::new(BookingService::new(
            pool.clone(),
            Arc::new(CategoryService::new(pool.clone())),
            Arc::new(UserService::new(pool.clone())),
            Arc::new(NotificationService::new(pool)),
            BookingConfig::default(),
        ))
    }

    fn server_as(role: UserRole) -> TestServer {
        TestServer::new(with_user(routes(service()), test_user(role))).unwrap()
    }

    #[tokio::test]
    async fn test_create_booking_requires_items() {
        let server = server_as(UserRole::Customer);

        let response = server
            .post("/api/bookings")
            .json(&json!({
                "items": [],
                "address": { "full_address": "Flat 4B, Green Residency" },
                "scheduled_date": "2026-03-08",
                "time_slot": "10AM-12PM"
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_create_booking_rejects_unknown_time_slot() {
        let server = server_as(UserRole::Customer);

        let response = server
            .post("/api/bookings")
            .json(&json!({
                "items": [{ "category_id": Uuid::new_v4(), "estimated_weight": 5 }],
                "address": { "full_address": "Flat 4B, Green Residency" },
                "scheduled_date": "2026-03-08",
                "time_slot": "9PM-11PM"
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_customer_cannot_assign_agent() {
        let server = server_as(UserRole::Customer);

        let response = server
            .put(&format!("/api/bookings/{}/assign", Uuid::new_v4()))
            .json(&json!({ "agent_id": Uuid::new_v4() }))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_customer_cannot_change_status() {
        let server = server_as(UserRole::Customer);

        let response = server
            .put(&format!("/api/bookings/{}/status", Uuid::new_v4()))
            .json(&json!({ "status": "confirmed" }))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_status_back_to_pending_is_rejected() {
        let server = server_as(UserRole::Admin);

        let response = server
            .put(&format!("/api/bookings/{}/status", Uuid::new_v4()))
            .json(&json!({ "status": "pending" }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_pickups_are_agent_only() {
        let server = server_as(UserRole::Customer);

        let response = server.get("/api/agents/pickups").await;

        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_rating_out_of_range() {
        let server = server_as(UserRole::Customer);

        let response = server
            .put(&format!("/api/bookings/{}/rate", Uuid::new_v4()))
            .json(&json!({ "rating": 6 }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_admin_listing_rejects_unknown_status() {
        let server = server_as(UserRole::Admin);

        let response = server
            .get("/api/bookings")
            .add_query_param("status", "lost")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized() {
        let server = TestServer::new(routes(service())).unwrap();

        let response = server.get("/api/bookings/my").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
