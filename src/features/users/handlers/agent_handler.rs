use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::guards::{RequireAdmin, RequireAgent};
use crate::features::users::dtos::{CreateAgentDto, UpdateAvailabilityDto, UserResponseDto};
use crate::features::users::models::UpsertAgent;
use crate::features::users::services::UserService;
use crate::shared::types::{ApiResponse, Meta};

/// List agents (admin)
#[utoipa::path(
    get,
    path = "/api/agents",
    responses(
        (status = 200, description = "List of agents", body = ApiResponse<Vec<UserResponseDto>>),
        (status = 403, description = "Forbidden - Admin access required")
    ),
    tag = "agents",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_agents(
    RequireAdmin(_admin): RequireAdmin,
    State(service): State<Arc<UserService>>,
) -> Result<Json<ApiResponse<Vec<UserResponseDto>>>> {
    let agents: Vec<UserResponseDto> = service
        .list_agents()
        .await?
        .into_iter()
        .map(UserResponseDto::from)
        .collect();
    let total = agents.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(agents),
        None,
        Some(Meta::total(total)),
    )))
}

/// Onboard an agent (admin)
///
/// An existing user with the same phone is promoted to agent instead of
/// creating a duplicate account.
#[utoipa::path(
    post,
    path = "/api/agents",
    request_body = CreateAgentDto,
    responses(
        (status = 201, description = "Agent created", body = ApiResponse<UserResponseDto>),
        (status = 200, description = "Existing user promoted to agent", body = ApiResponse<UserResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - Admin access required")
    ),
    tag = "agents",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_agent(
    RequireAdmin(_admin): RequireAdmin,
    State(service): State<Arc<UserService>>,
    AppJson(dto): AppJson<CreateAgentDto>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let (agent, inserted) = service
        .upsert_agent(&UpsertAgent {
            name: dto.name,
            phone: dto.phone,
            agent_area: dto.agent_area,
            agent_vehicle: dto.agent_vehicle,
        })
        .await?;

    let (status, message) = if inserted {
        (StatusCode::CREATED, "Agent created")
    } else {
        (StatusCode::OK, "Existing user promoted to agent")
    };

    Ok((
        status,
        Json(ApiResponse::success(
            Some(agent.into()),
            Some(message.to_string()),
            None,
        )),
    ))
}

/// Set whether the current agent takes new pickups
#[utoipa::path(
    put,
    path = "/api/agents/me/availability",
    request_body = UpdateAvailabilityDto,
    responses(
        (status = 200, description = "Availability updated", body = ApiResponse<UserResponseDto>),
        (status = 400, description = "Invalid body"),
        (status = 403, description = "Forbidden - Agent access required")
    ),
    tag = "agents",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_my_availability(
    RequireAgent(agent): RequireAgent,
    State(service): State<Arc<UserService>>,
    AppJson(dto): AppJson<UpdateAvailabilityDto>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let agent = service
        .set_availability(agent.user_id, dto.is_available)
        .await?;
    Ok(Json(ApiResponse::success(Some(agent.into()), None, None)))
}
