use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::features::categories::handlers;
use crate::features::categories::services::CategoryService;

/// Public category catalogue (no authentication required)
pub fn public_routes(service: Arc<CategoryService>) -> Router {
    Router::new()
        .route("/api/categories", get(handlers::list_categories))
        .route("/api/categories/{id}", get(handlers::get_category))
        .with_state(service)
}

/// Category management; mounted behind the auth middleware
pub fn admin_routes(service: Arc<CategoryService>) -> Router {
    Router::new()
        .route(
            "/api/categories",
            post(handlers::create_category),
        )
        .route("/api/categories/all", get(handlers::list_all_categories))
        .route(
            "/api/categories/{id}",
            put(handlers::update_category).delete(handlers::delete_category),
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
    use uuid::Uuid;

    fn server_as(role: UserRole) -> TestServer {
        let service = Arc::new(CategoryService::new(lazy_pool()));
        TestServer::new(with_user(admin_routes(service), test_user(role))).unwrap()
    }

    #[tokio::test]
    async fn test_agent_cannot_create_category() {
        let server = server_as(UserRole::Agent);

        let response = server
            .post("/api/categories")
            .json(&json!({ "name": "Copper", "price_per_unit": 425 }))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_create_category_validates_price_and_color() {
        let server = server_as(UserRole::Admin);

        let response = server
            .post("/api/categories")
            .json(&json!({ "name": "Copper", "price_per_unit": 0, "color": "green" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_customer_cannot_delete_category() {
        let server = server_as(UserRole::Customer);

        let response = server
            .delete(&format!("/api/categories/{}", Uuid::new_v4()))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
    }
}
