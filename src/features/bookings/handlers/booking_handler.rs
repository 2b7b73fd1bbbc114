use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppQuery};
use crate::features::auth::guards::RequireAdmin;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::bookings::dtos::{
    AssignAgentDto, BookingResponseDto, CancelBookingDto, CreateBookingDto, ListBookingsQuery,
    ListMyBookingsQuery, RateBookingDto, UpdateStatusDto,
};
use crate::features::bookings::lifecycle::TransitionCommand;
use crate::features::bookings::services::{BookingFilter, BookingService};
use crate::shared::types::{ApiResponse, Meta};

/// Create a booking
#[utoipa::path(
    post,
    path = "/api/bookings",
    request_body = CreateBookingDto,
    responses(
        (status = 201, description = "Booking created", body = ApiResponse<BookingResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Category not found or inactive")
    ),
    tag = "bookings",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_booking(
    user: AuthenticatedUser,
    State(service): State<Arc<BookingService>>,
    AppJson(dto): AppJson<CreateBookingDto>,
) -> Result<(StatusCode, Json<ApiResponse<BookingResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let booking = service.create(user.user_id, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(booking.into()),
            Some("Booking created successfully".to_string()),
            None,
        )),
    ))
}

/// Current user's bookings
#[utoipa::path(
    get,
    path = "/api/bookings/my",
    params(ListMyBookingsQuery),
    responses(
        (status = 200, description = "Bookings, newest first", body = ApiResponse<Vec<BookingResponseDto>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "bookings",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_my_bookings(
    user: AuthenticatedUser,
    State(service): State<Arc<BookingService>>,
    AppQuery(query): AppQuery<ListMyBookingsQuery>,
) -> Result<Json<ApiResponse<Vec<BookingResponseDto>>>> {
    let pagination = query.pagination();
    let (bookings, total) = service
        .list_for_customer(user.user_id, query.status, &pagination)
        .await?;

    Ok(Json(ApiResponse::success(
        Some(bookings.into_iter().map(Into::into).collect()),
        None,
        Some(Meta::paged(total, &pagination)),
    )))
}

/// List all bookings (admin)
#[utoipa::path(
    get,
    path = "/api/bookings",
    params(ListBookingsQuery),
    responses(
        (status = 200, description = "Bookings, newest first", body = ApiResponse<Vec<BookingResponseDto>>),
        (status = 400, description = "Unknown status filter"),
        (status = 403, description = "Forbidden - Admin access required")
    ),
    tag = "bookings",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_bookings(
    RequireAdmin(_admin): RequireAdmin,
    State(service): State<Arc<BookingService>>,
    AppQuery(query): AppQuery<ListBookingsQuery>,
) -> Result<Json<ApiResponse<Vec<BookingResponseDto>>>> {
    let filter = BookingFilter {
        status: query.status_filter()?,
        scheduled_date: query.date,
        search: query.search.clone(),
    };
    let pagination = query.pagination();
    let (bookings, total) = service.list_all(&filter, &pagination).await?;

    Ok(Json(ApiResponse::success(
        Some(bookings.into_iter().map(Into::into).collect()),
        None,
        Some(Meta::paged(total, &pagination)),
    )))
}

/// Get a booking
///
/// Customers can only read their own bookings and agents only the ones
/// assigned to them.
#[utoipa::path(
    get,
    path = "/api/bookings/{id}",
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking found", body = ApiResponse<BookingResponseDto>),
        (status = 403, description = "Not your booking"),
        (status = 404, description = "Booking not found")
    ),
    tag = "bookings",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_booking(
    user: AuthenticatedUser,
    State(service): State<Arc<BookingService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookingResponseDto>>> {
    let booking = service.get_for_actor(id, &user.actor()).await?;
    Ok(Json(ApiResponse::success(Some(booking.into()), None, None)))
}

/// Move a booking to a new status (admin or bound agent)
#[utoipa::path(
    put,
    path = "/api/bookings/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    request_body = UpdateStatusDto,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<BookingResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not allowed for this actor"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking changed concurrently"),
        (status = 422, description = "Transition not allowed from the current status")
    ),
    tag = "bookings",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_booking_status(
    user: AuthenticatedUser,
    State(service): State<Arc<BookingService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateStatusDto>,
) -> Result<Json<ApiResponse<BookingResponseDto>>> {
    if !(user.is_admin() || user.is_agent()) {
        return Err(AppError::Forbidden(format!(
            "Role '{}' is not authorized to access this route",
            user.role
        )));
    }
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let booking = service
        .transition(id, &user.actor(), dto.into_command()?)
        .await?;
    Ok(Json(ApiResponse::success(Some(booking.into()), None, None)))
}

/// Assign an agent (admin)
///
/// Works on confirmed bookings and, for reassignment, on assigned ones.
#[utoipa::path(
    put,
    path = "/api/bookings/{id}/assign",
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    request_body = AssignAgentDto,
    responses(
        (status = 200, description = "Agent assigned", body = ApiResponse<BookingResponseDto>),
        (status = 400, description = "User is not an active agent"),
        (status = 403, description = "Forbidden - Admin access required"),
        (status = 404, description = "Booking or agent not found"),
        (status = 422, description = "Booking is not confirmed or assigned")
    ),
    tag = "bookings",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn assign_agent(
    RequireAdmin(admin): RequireAdmin,
    State(service): State<Arc<BookingService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<AssignAgentDto>,
) -> Result<Json<ApiResponse<BookingResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let command = TransitionCommand::Assign {
        agent_id: dto.agent_id,
        note: dto.note,
    };
    let booking = service.transition(id, &admin.actor(), command).await?;
    Ok(Json(ApiResponse::success(
        Some(booking.into()),
        Some("Agent assigned".to_string()),
        None,
    )))
}

/// Cancel a booking (owner or admin)
#[utoipa::path(
    put,
    path = "/api/bookings/{id}/cancel",
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    request_body = CancelBookingDto,
    responses(
        (status = 200, description = "Booking cancelled", body = ApiResponse<BookingResponseDto>),
        (status = 403, description = "Not your booking"),
        (status = 404, description = "Booking not found"),
        (status = 422, description = "Booking can no longer be cancelled")
    ),
    tag = "bookings",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn cancel_booking(
    user: AuthenticatedUser,
    State(service): State<Arc<BookingService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<CancelBookingDto>,
) -> Result<Json<ApiResponse<BookingResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let command = TransitionCommand::Cancel { reason: dto.reason };
    let booking = service.transition(id, &user.actor(), command).await?;
    Ok(Json(ApiResponse::success(
        Some(booking.into()),
        Some("Booking cancelled".to_string()),
        None,
    )))
}

/// Rate a completed booking (owner, once)
#[utoipa::path(
    put,
    path = "/api/bookings/{id}/rate",
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    request_body = RateBookingDto,
    responses(
        (status = 200, description = "Rating recorded", body = ApiResponse<BookingResponseDto>),
        (status = 400, description = "Rating out of range"),
        (status = 403, description = "Not your booking"),
        (status = 409, description = "Already rated"),
        (status = 422, description = "Booking is not completed")
    ),
    tag = "bookings",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn rate_booking(
    user: AuthenticatedUser,
    State(service): State<Arc<BookingService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<RateBookingDto>,
) -> Result<Json<ApiResponse<BookingResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let booking = service
        .rate(id, &user.actor(), dto.rating, dto.feedback)
        .await?;
    Ok(Json(ApiResponse::success(
        Some(booking.into()),
        Some("Thank you for your feedback".to_string()),
        None,
    )))
}
