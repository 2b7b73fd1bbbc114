use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::features::notifications::handlers;
use crate::features::notifications::services::NotificationService;

pub fn routes(service: Arc<NotificationService>) -> Router {
    Router::new()
        .route("/api/notifications", get(handlers::list_notifications))
        .route(
            "/api/notifications/send",
            post(handlers::send_notification),
        )
        .route(
            "/api/notifications/read-all",
            put(handlers::mark_all_notifications_read),
        )
        .route(
            "/api/notifications/{id}/read",
            put(handlers::mark_notification_read),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::users::models::UserRole;
    use crate::shared::test_helpers::{lazy_pool, test_user, with_user};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;

    #[tokio::test]
    async fn test_inbox_requires_identity() {
        let service = Arc::new(NotificationService::new(lazy_pool()));
        let server = TestServer::new(routes(service)).unwrap();

        server
            .get("/api/notifications")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_mark_read_rejects_malformed_id() {
        let service = Arc::new(NotificationService::new(lazy_pool()));
        let router = with_user(routes(service), test_user(UserRole::Customer));
        let server = TestServer::new(router).unwrap();

        server
            .put("/api/notifications/not-a-uuid/read")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_only_admins_send_announcements() {
        let service = Arc::new(NotificationService::new(lazy_pool()));
        let router = with_user(routes(service), test_user(UserRole::Customer));
        let server = TestServer::new(router).unwrap();

        server
            .post("/api/notifications/send")
            .json(&json!({ "title": "Hello", "body": "World" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_announcement_needs_a_title() {
        let service = Arc::new(NotificationService::new(lazy_pool()));
        let router = with_user(routes(service), test_user(UserRole::Admin));
        let server = TestServer::new(router).unwrap();

        server
            .post("/api/notifications/send")
            .json(&json!({ "title": " ", "body": "Metal prices are up" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
