use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::notifications::models::{Audience, NewNotification, Notification};

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, title, body, kind, booking_id, is_read, created_at";

/// Service for inbox notifications
pub struct NotificationService {
    pool: PgPool,
}

impl NotificationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record notifications in the background. Failures are logged and
    /// never reach the caller.
    pub fn dispatch(&self, notifications: Vec<NewNotification>) {
        if notifications.is_empty() {
            return;
        }

        let pool = self.pool.clone();
        tokio::spawn(async move {
            for notification in notifications {
                if let Err(e) = insert(&pool, &notification).await {
                    tracing::warn!(
                        "Failed to record notification for user {}: {:?}",
                        notification.user_id,
                        e
                    );
                }
            }
        });
    }

    /// Announcement from an admin, fanned out to one inbox per active
    /// recipient. Returns the number of recipients.
    pub async fn broadcast(&self, audience: Audience, title: &str, body: &str) -> Result<u64> {
        let (user_id, role) = match audience {
            Audience::User(id) => (Some(id), None),
            Audience::Role(role) => (None, Some(role)),
            Audience::Everyone => (None, None),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO notifications (user_id, title, body, kind)
            SELECT id, $1, $2, 'general'
            FROM users
            WHERE is_active
              AND ($3::uuid IS NULL OR id = $3)
              AND ($4::user_role IS NULL OR role = $4)
            "#,
        )
        .bind(title)
        .bind(body)
        .bind(user_id)
        .bind(role)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to broadcast notification: {:?}", e);
            AppError::Database(e)
        })?;

        let recipients = result.rows_affected();
        if recipients == 0 && user_id.is_some() {
            return Err(AppError::NotFound("Recipient not found".to_string()));
        }

        tracing::info!("Announcement '{}' sent to {} users ({:?})", title, recipients, audience);
        Ok(recipients)
    }

    /// A user's inbox, newest first, with the total and unread counts
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Notification>, i64, i64)> {
        let (total, unread): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE NOT is_read)
            FROM notifications
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count notifications: {:?}", e);
            AppError::Database(e)
        })?;

        let sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE user_id = $1 \
             ORDER BY created_at DESC OFFSET $2 LIMIT $3"
        );
        let notifications = sqlx::query_as::<_, Notification>(&sql)
            .bind(user_id)
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list notifications: {:?}", e);
                AppError::Database(e)
            })?;

        Ok((notifications, total, unread))
    }

    pub async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to mark notification read: {:?}", e);
                    AppError::Database(e)
                })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Notification not found".to_string()));
        }
        Ok(())
    }

    /// Returns how many notifications changed
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to mark notifications read: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(result.rows_affected())
    }
}

async fn insert(pool: &PgPool, notification: &NewNotification) -> std::result::Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO notifications (user_id, title, body, kind, booking_id) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(notification.user_id)
    .bind(&notification.title)
    .bind(&notification.body)
    .bind(notification.kind)
    .bind(notification.booking_id)
    .execute(pool)
    .await?;
    Ok(())
}
