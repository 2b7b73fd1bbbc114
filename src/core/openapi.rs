use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth;
use crate::features::bookings::{
    dtos as bookings_dtos, handlers as bookings_handlers, models as bookings_models,
    settlement::CompletionInput,
};
use crate::features::categories::{
    dtos as categories_dtos, handlers as categories_handlers, models as categories_models,
};
use crate::features::dashboard::{dtos as dashboard_dtos, handlers as dashboard_handlers};
use crate::features::notifications::{
    dtos as notifications_dtos, handlers as notifications_handlers,
    models as notifications_models,
};
use crate::features::users::{dtos as users_dtos, handlers as users_handlers, models as users_models};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Users
        users_handlers::get_me,
        users_handlers::list_my_earnings,
        users_handlers::list_users,
        users_handlers::get_user,
        users_handlers::toggle_user_active,
        // Agents
        users_handlers::list_agents,
        users_handlers::create_agent,
        users_handlers::update_my_availability,
        // Categories
        categories_handlers::list_categories,
        categories_handlers::get_category,
        categories_handlers::list_all_categories,
        categories_handlers::create_category,
        categories_handlers::update_category,
        categories_handlers::delete_category,
        // Bookings
        bookings_handlers::create_booking,
        bookings_handlers::list_my_bookings,
        bookings_handlers::list_bookings,
        bookings_handlers::get_booking,
        bookings_handlers::update_booking_status,
        bookings_handlers::assign_agent,
        bookings_handlers::cancel_booking,
        bookings_handlers::rate_booking,
        // Agent pickups
        bookings_handlers::list_pickups,
        bookings_handlers::start_pickup,
        bookings_handlers::complete_pickup,
        // Notifications
        notifications_handlers::list_notifications,
        notifications_handlers::mark_notification_read,
        notifications_handlers::mark_all_notifications_read,
        notifications_handlers::send_notification,
        // Analytics
        dashboard_handlers::get_dashboard,
        dashboard_handlers::get_revenue,
    ),
    components(
        schemas(
            // Shared
            Meta,
            auth::model::AuthenticatedUser,
            // Users
            users_models::UserRole,
            users_dtos::UserResponseDto,
            users_dtos::AgentDetailsDto,
            users_dtos::UserProfileDto,
            users_dtos::EarningEventDto,
            users_dtos::CreateAgentDto,
            users_dtos::UpdateAvailabilityDto,
            ApiResponse<users_dtos::UserResponseDto>,
            ApiResponse<users_dtos::UserProfileDto>,
            ApiResponse<Vec<users_dtos::UserResponseDto>>,
            ApiResponse<Vec<users_dtos::EarningEventDto>>,
            // Categories
            categories_models::CategoryUnit,
            categories_models::PriceHistoryEntry,
            categories_dtos::CategoryResponseDto,
            categories_dtos::CreateCategoryDto,
            categories_dtos::UpdateCategoryDto,
            ApiResponse<categories_dtos::CategoryResponseDto>,
            ApiResponse<Vec<categories_dtos::CategoryResponseDto>>,
            // Bookings
            bookings_models::BookingStatus,
            bookings_models::TimeSlot,
            bookings_models::PaymentMethod,
            bookings_models::PaymentStatus,
            bookings_models::BookingItem,
            bookings_models::PickupAddress,
            bookings_models::StatusHistoryEntry,
            bookings_dtos::BookingItemRequest,
            bookings_dtos::CreateBookingDto,
            bookings_dtos::UpdateStatusDto,
            bookings_dtos::AssignAgentDto,
            bookings_dtos::CancelBookingDto,
            bookings_dtos::RateBookingDto,
            bookings_dtos::PartyDto,
            bookings_dtos::BookingResponseDto,
            CompletionInput,
            ApiResponse<bookings_dtos::BookingResponseDto>,
            ApiResponse<Vec<bookings_dtos::BookingResponseDto>>,
            // Notifications
            notifications_models::NotificationKind,
            notifications_dtos::NotificationResponseDto,
            notifications_dtos::NotificationInboxDto,
            notifications_dtos::BroadcastNotificationDto,
            notifications_dtos::BroadcastResultDto,
            ApiResponse<notifications_dtos::BroadcastResultDto>,
            ApiResponse<notifications_dtos::NotificationInboxDto>,
            ApiResponse<notifications_dtos::NotificationResponseDto>,
            // Analytics
            dashboard_dtos::StatusCountDto,
            dashboard_dtos::DailyTrendDto,
            dashboard_dtos::CategoryRevenueDto,
            dashboard_dtos::DashboardStatsDto,
            ApiResponse<dashboard_dtos::DashboardStatsDto>,
            dashboard_dtos::RevenuePeriod,
            dashboard_dtos::RevenueBucketDto,
            dashboard_dtos::RevenueReportDto,
            ApiResponse<dashboard_dtos::RevenueReportDto>,
        )
    ),
    tags(
        (name = "users", description = "User accounts and earnings"),
        (name = "agents", description = "Pickup agents and their pickup workflow"),
        (name = "categories", description = "Scrap categories and prices"),
        (name = "bookings", description = "Pickup bookings and their lifecycle"),
        (name = "notifications", description = "In-app notifications"),
        (name = "analytics", description = "Admin dashboard and revenue"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "GreenCycle API",
        version = "0.1.0",
        description = "API documentation for GreenCycle scrap pickups",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_registers_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }

    #[test]
    fn test_openapi_lists_booking_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/bookings"));
        assert!(doc.paths.paths.contains_key("/api/agents/pickups/{id}/complete"));
    }

    #[test]
    fn test_openapi_lists_admin_tools() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/analytics/revenue"));
        assert!(doc.paths.paths.contains_key("/api/notifications/send"));
        assert!(doc.paths.paths.contains_key("/api/agents/me/availability"));
    }
}
