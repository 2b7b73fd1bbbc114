use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::{AppJson, AppQuery};
use crate::features::auth::guards::RequireAgent;
use crate::features::bookings::dtos::{AgentPickupsQuery, BookingResponseDto};
use crate::features::bookings::lifecycle::TransitionCommand;
use crate::features::bookings::services::BookingService;
use crate::features::bookings::settlement::CompletionInput;
use crate::shared::types::{ApiResponse, Meta};

/// Agent's assigned pickups
#[utoipa::path(
    get,
    path = "/api/agents/pickups",
    params(AgentPickupsQuery),
    responses(
        (status = 200, description = "Pickups ordered by schedule", body = ApiResponse<Vec<BookingResponseDto>>),
        (status = 403, description = "Forbidden - Agent access required")
    ),
    tag = "agents",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_pickups(
    RequireAgent(agent): RequireAgent,
    State(service): State<Arc<BookingService>>,
    AppQuery(query): AppQuery<AgentPickupsQuery>,
) -> Result<Json<ApiResponse<Vec<BookingResponseDto>>>> {
    let pickups: Vec<BookingResponseDto> = service
        .list_agent_pickups(agent.user_id, query.status)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let total = pickups.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(pickups),
        None,
        Some(Meta::total(total)),
    )))
}

/// Head out for a pickup
#[utoipa::path(
    put,
    path = "/api/agents/pickups/{id}/start",
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Pickup started", body = ApiResponse<BookingResponseDto>),
        (status = 403, description = "Booking is not assigned to you"),
        (status = 404, description = "Booking not found"),
        (status = 422, description = "Booking is not assigned")
    ),
    tag = "agents",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn start_pickup(
    RequireAgent(agent): RequireAgent,
    State(service): State<Arc<BookingService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookingResponseDto>>> {
    let booking = service
        .transition(id, &agent.actor(), TransitionCommand::StartPickup)
        .await?;
    Ok(Json(ApiResponse::success(Some(booking.into()), None, None)))
}

/// Complete a pickup and settle it
///
/// Actual weights are aligned with the booking's items by index. Omitted
/// weights default to the estimates; an explicit final amount overrides the
/// computed total.
#[utoipa::path(
    put,
    path = "/api/agents/pickups/{id}/complete",
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    request_body = CompletionInput,
    responses(
        (status = 200, description = "Pickup completed", body = ApiResponse<BookingResponseDto>),
        (status = 400, description = "Weights do not match the items"),
        (status = 403, description = "Booking is not assigned to you"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking changed concurrently"),
        (status = 422, description = "Booking is not out for pickup")
    ),
    tag = "agents",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn complete_pickup(
    RequireAgent(agent): RequireAgent,
    State(service): State<Arc<BookingService>>,
    Path(id): Path<Uuid>,
    AppJson(input): AppJson<CompletionInput>,
) -> Result<Json<ApiResponse<BookingResponseDto>>> {
    let booking = service
        .transition(id, &agent.actor(), TransitionCommand::Complete(input))
        .await?;
    Ok(Json(ApiResponse::success(
        Some(booking.into()),
        Some("Pickup completed".to_string()),
        None,
    )))
}
