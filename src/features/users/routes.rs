use crate::features::users::handlers;
use crate::features::users::services::UserService;
use axum::{
    routing::{get, put},
    Router,
};
use std::sync::Arc;

pub fn routes(service: Arc<UserService>) -> Router {
    Router::new()
        .route("/api/users/me", get(handlers::get_me))
        .route("/api/users/me/earnings", get(handlers::list_my_earnings))
        .route("/api/users", get(handlers::list_users))
        .route("/api/users/{id}", get(handlers::get_user))
        .route(
            "/api/users/{id}/toggle-active",
            put(handlers::toggle_user_active),
        )
        .route(
            "/api/agents",
            get(handlers::list_agents).post(handlers::create_agent),
        )
        .route(
            "/api/agents/me/availability",
            put(handlers::update_my_availability),
        )
        .with_state(service)
}
