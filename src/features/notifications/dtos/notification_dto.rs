use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::features::notifications::models::{Audience, Notification, NotificationKind};
use crate::features::users::models::UserRole;

/// Response DTO for notification
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotificationResponseDto {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
    pub booking_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponseDto {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            title: n.title,
            body: n.body,
            kind: n.kind,
            booking_id: n.booking_id,
            is_read: n.is_read,
            created_at: n.created_at,
        }
    }
}

/// Inbox page with the unread count
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotificationInboxDto {
    pub unread_count: i64,
    pub notifications: Vec<NotificationResponseDto>,
}

/// Request DTO for an admin announcement
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BroadcastNotificationDto {
    #[validate(
        length(min = 1, max = 120, message = "Title must be 1-120 characters"),
        custom(function = "validate_not_blank")
    )]
    pub title: String,

    #[validate(
        length(min = 1, max = 1000, message = "Body must be 1-1000 characters"),
        custom(function = "validate_not_blank")
    )]
    pub body: String,

    /// Send to one user only
    pub user_id: Option<Uuid>,

    /// Send to every active user with this role
    pub target_role: Option<UserRole>,
}

impl BroadcastNotificationDto {
    /// A single recipient wins over a role; neither means every active user
    pub fn audience(&self) -> Audience {
        match (self.user_id, self.target_role) {
            (Some(user_id), _) => Audience::User(user_id),
            (None, Some(role)) => Audience::Role(role),
            (None, None) => Audience::Everyone,
        }
    }
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// How many inboxes received an announcement
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BroadcastResultDto {
    pub recipients: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto() -> BroadcastNotificationDto {
        BroadcastNotificationDto {
            title: "Diwali bonus".to_string(),
            body: "Extra 10% on all metal pickups this week".to_string(),
            user_id: None,
            target_role: None,
        }
    }

    #[test]
    fn test_blank_title_is_rejected() {
        assert!(dto().validate().is_ok());

        let blank = BroadcastNotificationDto {
            title: "   ".to_string(),
            ..dto()
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_audience_prefers_single_user() {
        assert_eq!(dto().audience(), Audience::Everyone);

        let by_role = BroadcastNotificationDto {
            target_role: Some(UserRole::Customer),
            ..dto()
        };
        assert_eq!(by_role.audience(), Audience::Role(UserRole::Customer));

        let user_id = Uuid::new_v4();
        let single = BroadcastNotificationDto {
            user_id: Some(user_id),
            ..by_role
        };
        assert_eq!(single.audience(), Audience::User(user_id));
    }
}
