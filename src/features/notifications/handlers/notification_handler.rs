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
use crate::features::notifications::dtos::{
    BroadcastNotificationDto, BroadcastResultDto, NotificationInboxDto, NotificationResponseDto,
};
use crate::features::notifications::services::NotificationService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// Current user's notifications
#[utoipa::path(
    get,
    path = "/api/notifications",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Inbox, newest first", body = ApiResponse<NotificationInboxDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "notifications",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_notifications(
    user: AuthenticatedUser,
    State(service): State<Arc<NotificationService>>,
    AppQuery(params): AppQuery<PaginationQuery>,
) -> Result<Json<ApiResponse<NotificationInboxDto>>> {
    let (notifications, total, unread_count) = service
        .list_for_user(user.user_id, params.offset(), params.limit())
        .await?;

    let inbox = NotificationInboxDto {
        unread_count,
        notifications: notifications
            .into_iter()
            .map(NotificationResponseDto::from)
            .collect(),
    };

    Ok(Json(ApiResponse::success(
        Some(inbox),
        None,
        Some(Meta::paged(total, &params)),
    )))
}

/// Mark one notification as read
#[utoipa::path(
    put,
    path = "/api/notifications/{id}/read",
    params(
        ("id" = Uuid, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Marked as read"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Notification not found")
    ),
    tag = "notifications",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn mark_notification_read(
    user: AuthenticatedUser,
    State(service): State<Arc<NotificationService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.mark_read(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(None, None, None)))
}

/// Mark all of the current user's notifications as read
#[utoipa::path(
    put,
    path = "/api/notifications/read-all",
    responses(
        (status = 200, description = "All marked as read"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "notifications",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn mark_all_notifications_read(
    user: AuthenticatedUser,
    State(service): State<Arc<NotificationService>>,
) -> Result<Json<ApiResponse<()>>> {
    let updated = service.mark_all_read(user.user_id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some(format!("{} notifications marked as read", updated)),
        None,
    )))
}

/// Send an announcement (admin)
///
/// Goes to one user when `user_id` is set, else to every active user with
/// `target_role`, else to every active user.
#[utoipa::path(
    post,
    path = "/api/notifications/send",
    request_body = BroadcastNotificationDto,
    responses(
        (status = 201, description = "Announcement recorded", body = ApiResponse<BroadcastResultDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - Admin access required"),
        (status = 404, description = "Recipient not found")
    ),
    tag = "notifications",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn send_notification(
    RequireAdmin(_admin): RequireAdmin,
    State(service): State<Arc<NotificationService>>,
    AppJson(dto): AppJson<BroadcastNotificationDto>,
) -> Result<(StatusCode, Json<ApiResponse<BroadcastResultDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let recipients = service
        .broadcast(dto.audience(), dto.title.trim(), dto.body.trim())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(BroadcastResultDto { recipients }),
            Some("Notification sent".to_string()),
            None,
        )),
    ))
}
