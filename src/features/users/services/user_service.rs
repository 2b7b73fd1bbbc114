use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::users::dtos::{ListUsersQuery, UserProfileDto};
use crate::features::users::models::{
    EarningEvent, EarningTotals, UpsertAgent, User, UserRole, USER_COLUMNS,
};
use crate::features::users::services::EarningLedger;

/// Service for user and agent directory operations
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: Uuid) -> Result<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get user: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Profile with aggregates derived from the ledger (customers) or from
    /// completed assignments (agents)
    pub async fn get_profile(&self, id: Uuid) -> Result<UserProfileDto> {
        let user = self.get_by_id(id).await?;

        let totals = match user.role {
            UserRole::Agent => EarningTotals {
                total_pickups: self.count_completed_pickups(id).await?,
                ..EarningTotals::default()
            },
            _ => EarningLedger::totals(&self.pool, id).await?,
        };

        Ok(UserProfileDto::new(user, totals))
    }

    async fn count_completed_pickups(&self, agent_id: Uuid) -> Result<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings WHERE agent_id = $1 AND status = 'completed'",
        )
        .bind(agent_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count agent pickups: {:?}", e);
            AppError::Database(e)
        })
    }

    pub async fn list_earnings(
        &self,
        user_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<EarningEvent>, i64)> {
        EarningLedger::list(&self.pool, user_id, offset, limit).await
    }

    /// List users with optional role filter and name/phone search
    pub async fn list(&self, query: &ListUsersQuery) -> Result<(Vec<User>, i64)> {
        let pagination = query.pagination();
        let search = search_pattern(query.search.as_deref());

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM users
            WHERE ($1::user_role IS NULL OR role = $1)
              AND ($2::text IS NULL OR name ILIKE $2 OR phone ILIKE $2)
            "#,
        )
        .bind(query.role)
        .bind(search.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count users: {:?}", e);
            AppError::Database(e)
        })?;

        let sql = format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE ($1::user_role IS NULL OR role = $1)
              AND ($2::text IS NULL OR name ILIKE $2 OR phone ILIKE $2)
            ORDER BY created_at DESC
            OFFSET $3 LIMIT $4
            "#
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(query.role)
            .bind(search.as_deref())
            .bind(pagination.offset())
            .bind(pagination.limit())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list users: {:?}", e);
                AppError::Database(e)
            })?;

        Ok((users, total))
    }

    /// Flip a user's active flag
    pub async fn toggle_active(&self, id: Uuid) -> Result<User> {
        let sql = format!(
            "UPDATE users SET is_active = NOT is_active, updated_at = NOW() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to toggle user: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        tracing::info!("User {} is_active set to {}", user.id, user.is_active);
        Ok(user)
    }

    /// All agents, newest first
    pub async fn list_agents(&self) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = 'agent' ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list agents: {:?}", e);
                AppError::Database(e)
            })
    }

    /// Create an agent, or promote the existing user with the same phone.
    /// Returns the agent and whether a new row was inserted.
    pub async fn upsert_agent(&self, data: &UpsertAgent) -> Result<(User, bool)> {
        let sql = format!(
            r#"
            INSERT INTO users (name, phone, role, agent_area, agent_vehicle)
            VALUES ($1, $2, 'agent', $3, $4)
            ON CONFLICT (phone) DO UPDATE SET
                role = 'agent',
                name = COALESCE(EXCLUDED.name, users.name),
                agent_area = EXCLUDED.agent_area,
                agent_vehicle = EXCLUDED.agent_vehicle,
                updated_at = NOW()
            RETURNING {USER_COLUMNS}, (xmax = 0) AS inserted
            "#
        );

        let row = sqlx::query_as::<_, AgentUpsertRow>(&sql)
            .bind(data.name.as_deref())
            .bind(&data.phone)
            .bind(data.agent_area.as_deref())
            .bind(data.agent_vehicle.as_deref())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to upsert agent: {:?}", e);
                AppError::Database(e)
            })?;

        tracing::info!(
            "Agent {} {} ({})",
            row.user.id,
            if row.inserted { "created" } else { "promoted" },
            row.user.phone
        );
        Ok((row.user, row.inserted))
    }

    /// Resolve an agent that may receive new assignments
    pub async fn get_assignable_agent(&self, id: Uuid) -> Result<User> {
        let user = self
            .get_by_id(id)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => AppError::NotFound("Agent not found".to_string()),
                other => other,
            })?;
        ensure_assignable(&user)?;
        Ok(user)
    }

    /// Agent's own switch for taking new pickups
    pub async fn set_availability(&self, agent_id: Uuid, is_available: bool) -> Result<User> {
        let sql = format!(
            "UPDATE users SET agent_is_available = $2, updated_at = NOW() \
             WHERE id = $1 AND role = 'agent' RETURNING {USER_COLUMNS}"
        );
        let agent = sqlx::query_as::<_, User>(&sql)
            .bind(agent_id)
            .bind(is_available)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update agent availability: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound("Agent not found".to_string()))?;

        tracing::info!(
            "Agent {} is now {}",
            agent.id,
            if agent.agent_is_available { "available" } else { "unavailable" }
        );
        Ok(agent)
    }

    pub async fn set_agent_rating(&self, agent_id: Uuid, rating: Decimal) -> Result<()> {
        sqlx::query("UPDATE users SET agent_rating = $2, updated_at = NOW() WHERE id = $1")
            .bind(agent_id)
            .bind(rating)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update agent rating: {:?}", e);
                AppError::Database(e)
            })?;

        tracing::info!("Agent {} rating updated to {}", agent_id, rating);
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct AgentUpsertRow {
    #[sqlx(flatten)]
    user: User,
    inserted: bool,
}

/// Only active agents can be bound to a booking
pub fn ensure_assignable(user: &User) -> Result<()> {
    if user.role != UserRole::Agent {
        return Err(AppError::Validation(format!(
            "User {} is not an agent",
            user.id
        )));
    }
    if !user.is_active {
        return Err(AppError::Validation(format!(
            "Agent {} is deactivated",
            user.id
        )));
    }
    Ok(())
}

/// ILIKE pattern for a free-text search, escaping wildcards
pub fn search_pattern(search: Option<&str>) -> Option<String> {
    let term = search.map(str::trim).filter(|s| !s.is_empty())?;
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{}%", escaped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(role: UserRole, is_active: bool) -> User {
        User {
            id: Uuid::new_v4(),
            name: None,
            phone: "+919876543211".to_string(),
            email: None,
            role,
            is_active,
            agent_area: None,
            agent_vehicle: None,
            agent_rating: Decimal::new(50, 1),
            agent_is_available: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_only_active_agents_are_assignable() {
        assert!(ensure_assignable(&user(UserRole::Agent, true)).is_ok());
        assert!(matches!(
            ensure_assignable(&user(UserRole::Agent, false)),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            ensure_assignable(&user(UserRole::Customer, true)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_search_pattern() {
        assert_eq!(search_pattern(None), None);
        assert_eq!(search_pattern(Some("   ")), None);
        assert_eq!(search_pattern(Some(" raju ")), Some("%raju%".to_string()));
        assert_eq!(search_pattern(Some("50%")), Some("%50\\%%".to_string()));
    }
}
