use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use sqlx::{types::Json, PgConnection, PgPool};
use uuid::Uuid;

use crate::core::config::BookingConfig;
use crate::core::database::is_unique_violation;
use crate::core::error::{AppError, Result};
use crate::features::bookings::booking_code::{self, CodeAttempt};
use crate::features::bookings::dtos::CreateBookingDto;
use crate::features::bookings::lifecycle::{self, Actor, TransitionCommand};
use crate::features::bookings::models::{
    Booking, BookingDetails, BookingItem, BookingStatus, NewBooking, BOOKING_COLUMNS,
};
use crate::features::bookings::settlement::{self, SettlementError};
use crate::features::categories::models::Category;
use crate::features::categories::CategoryService;
use crate::features::notifications::{templates, NotificationService};
use crate::features::users::models::CreateEarningEvent;
use crate::features::users::services::{search_pattern, EarningLedger, UserService};
use crate::shared::types::PaginationQuery;

const BOOKING_CODE_CONSTRAINT: &str = "bookings_booking_code_key";

/// Filters for the admin booking listing
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub scheduled_date: Option<NaiveDate>,
    pub search: Option<String>,
}

/// Service for the booking lifecycle
pub struct BookingService {
    pool: PgPool,
    categories: Arc<CategoryService>,
    users: Arc<UserService>,
    notifications: Arc<NotificationService>,
    config: BookingConfig,
}

impl BookingService {
    pub fn new(
        pool: PgPool,
        categories: Arc<CategoryService>,
        users: Arc<UserService>,
        notifications: Arc<NotificationService>,
        config: BookingConfig,
    ) -> Self {
        Self {
            pool,
            categories,
            users,
            notifications,
            config,
        }
    }

    /// Price the requested items against the registry and store a pending
    /// booking under a fresh booking code
    pub async fn create(&self, customer_id: Uuid, dto: CreateBookingDto) -> Result<Booking> {
        let mut items = Vec::with_capacity(dto.items.len());
        for requested in &dto.items {
            let category = self.categories.lookup_active(requested.category_id).await?;
            items.push(price_item(&category, requested.estimated_weight)?);
        }

        let now = Utc::now();
        let new_booking = NewBooking {
            customer_id,
            estimated_amount: settlement::estimate(&items)?,
            items,
            address: dto.address,
            scheduled_date: dto.scheduled_date,
            time_slot: dto.time_slot,
            notes: dto.notes,
            payment_method: dto.payment_method,
            status_history: lifecycle::initial_history(now),
        };

        let pool = &self.pool;
        let mut rng = StdRng::from_entropy();
        let booking = booking_code::with_fresh_code(
            &mut rng,
            now,
            self.config.code_offset,
            self.config.code_max_attempts,
            |code| {
                let new_booking = &new_booking;
                async move { code_attempt(insert_booking(pool, &code, new_booking).await) }
            },
        )
        .await?;

        tracing::info!(
            "Booking {} created for customer {} (estimated {})",
            booking.booking_code,
            customer_id,
            booking.estimated_amount
        );
        self.notifications
            .dispatch(vec![templates::booking_placed(&booking)]);
        Ok(booking)
    }

    async fn fetch(&self, id: Uuid) -> Result<Booking> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.id = $1");
        sqlx::query_as::<_, Booking>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get booking: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
    }

    /// Get a booking with party details, enforcing read ownership
    pub async fn get_for_actor(&self, id: Uuid, actor: &Actor) -> Result<BookingDetails> {
        let sql = format!("{} WHERE b.id = $1", details_select());
        let details = sqlx::query_as::<_, BookingDetails>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get booking details: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        lifecycle::ensure_can_view(&details.booking, actor)?;
        Ok(details)
    }

    /// A customer's bookings, newest first
    pub async fn list_for_customer(
        &self,
        customer_id: Uuid,
        status: Option<BookingStatus>,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<BookingDetails>, i64)> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM bookings b
            WHERE b.customer_id = $1 AND ($2::booking_status IS NULL OR b.status = $2)
            "#,
        )
        .bind(customer_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count customer bookings: {:?}", e);
            AppError::Database(e)
        })?;

        let sql = format!(
            r#"
            {}
            WHERE b.customer_id = $1 AND ($2::booking_status IS NULL OR b.status = $2)
            ORDER BY b.created_at DESC
            OFFSET $3 LIMIT $4
            "#,
            details_select()
        );
        let bookings = sqlx::query_as::<_, BookingDetails>(&sql)
            .bind(customer_id)
            .bind(status)
            .bind(pagination.offset())
            .bind(pagination.limit())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list customer bookings: {:?}", e);
                AppError::Database(e)
            })?;

        Ok((bookings, total))
    }

    /// All bookings for the admin console, newest first
    pub async fn list_all(
        &self,
        filter: &BookingFilter,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<BookingDetails>, i64)> {
        const WHERE: &str = r#"
            WHERE ($1::booking_status IS NULL OR b.status = $1)
              AND ($2::date IS NULL OR b.scheduled_date = $2)
              AND ($3::text IS NULL
                   OR b.booking_code ILIKE $3
                   OR b.address->>'full_address' ILIKE $3
                   OR c.name ILIKE $3
                   OR c.phone ILIKE $3)
        "#;
        let search = search_pattern(filter.search.as_deref());

        let count_sql = format!(
            "SELECT COUNT(*) FROM bookings b JOIN users c ON c.id = b.customer_id {WHERE}"
        );
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(filter.status)
            .bind(filter.scheduled_date)
            .bind(search.as_deref())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count bookings: {:?}", e);
                AppError::Database(e)
            })?;

        let sql = format!(
            "{} {WHERE} ORDER BY b.created_at DESC OFFSET $4 LIMIT $5",
            details_select()
        );
        let bookings = sqlx::query_as::<_, BookingDetails>(&sql)
            .bind(filter.status)
            .bind(filter.scheduled_date)
            .bind(search.as_deref())
            .bind(pagination.offset())
            .bind(pagination.limit())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list bookings: {:?}", e);
                AppError::Database(e)
            })?;

        Ok((bookings, total))
    }

    /// An agent's work queue ordered by pickup date and slot
    pub async fn list_agent_pickups(
        &self,
        agent_id: Uuid,
        status: Option<BookingStatus>,
    ) -> Result<Vec<BookingDetails>> {
        let statuses: Vec<String> = pickup_statuses(status)
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        let sql = format!(
            r#"
            {}
            WHERE b.agent_id = $1 AND b.status::text = ANY($2)
            ORDER BY b.scheduled_date, b.time_slot
            "#,
            details_select()
        );
        sqlx::query_as::<_, BookingDetails>(&sql)
            .bind(agent_id)
            .bind(statuses)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list agent pickups: {:?}", e);
                AppError::Database(e)
            })
    }

    /// Run one lifecycle transition.
    ///
    /// The write is conditional on the revision that was read, so a
    /// concurrent change surfaces as `Conflict`. A completion appends to the
    /// customer's earnings ledger in the same transaction.
    pub async fn transition(
        &self,
        id: Uuid,
        actor: &Actor,
        command: TransitionCommand,
    ) -> Result<Booking> {
        let mut booking = self.fetch(id).await?;
        let expected_revision = booking.revision;
        let assigned_agent = match &command {
            TransitionCommand::Assign { agent_id, .. } => Some(*agent_id),
            _ => None,
        };

        let settled = lifecycle::apply(&mut booking, actor, command, Utc::now())?;

        if let Some(agent_id) = assigned_agent {
            self.users.get_assignable_agent(agent_id).await?;
        }

        let mut tx = self.pool.begin().await.map_err(|e| {
            tracing::error!("Failed to begin transaction: {:?}", e);
            AppError::Database(e)
        })?;

        let updated = persist(&mut tx, &booking, expected_revision).await?;

        if let Some(settlement) = &settled {
            EarningLedger::append(
                &mut tx,
                &CreateEarningEvent {
                    user_id: updated.customer_id,
                    booking_id: updated.id,
                    amount: settlement.final_amount,
                    loyalty_points: settlement.loyalty_points,
                },
            )
            .await?;
        }

        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit booking transition: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!(
            "Booking {} moved to '{}' by {} {}",
            updated.booking_code,
            updated.status,
            actor.role,
            actor.user_id
        );

        self.notifications
            .dispatch(templates::status_changed(&updated));
        Ok(updated)
    }

    /// Record the customer's rating and refresh the agent's average
    pub async fn rate(
        &self,
        id: Uuid,
        actor: &Actor,
        rating: i16,
        feedback: Option<String>,
    ) -> Result<Booking> {
        let mut booking = self.fetch(id).await?;
        let expected_revision = booking.revision;
        lifecycle::rate(&mut booking, actor, rating, feedback)?;

        let sql = format!(
            r#"
            UPDATE bookings AS b
            SET rating = $3, feedback = $4, revision = b.revision + 1, updated_at = NOW()
            WHERE b.id = $1 AND b.revision = $2 AND b.rating IS NULL
            RETURNING {BOOKING_COLUMNS}
            "#
        );
        let updated = sqlx::query_as::<_, Booking>(&sql)
            .bind(booking.id)
            .bind(expected_revision)
            .bind(booking.rating)
            .bind(booking.feedback.as_deref())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to rate booking: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(stale_revision)?;

        if let Some(agent_id) = updated.agent_id {
            self.refresh_agent_rating(agent_id).await?;
        }

        Ok(updated)
    }

    async fn refresh_agent_rating(&self, agent_id: Uuid) -> Result<()> {
        let ratings: Vec<i16> = sqlx::query_scalar(
            "SELECT rating FROM bookings WHERE agent_id = $1 AND rating IS NOT NULL",
        )
        .bind(agent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load agent ratings: {:?}", e);
            AppError::Database(e)
        })?;

        if let Some(average) = settlement::agent_rating(&ratings) {
            self.users.set_agent_rating(agent_id, average).await?;
        }
        Ok(())
    }
}

async fn insert_booking(
    pool: &PgPool,
    code: &str,
    new_booking: &NewBooking,
) -> std::result::Result<Booking, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO bookings AS b (
            booking_code, customer_id, items, address, scheduled_date, time_slot,
            notes, payment_method, estimated_amount, status_history
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {BOOKING_COLUMNS}
        "#
    );

    sqlx::query_as::<_, Booking>(&sql)
        .bind(code)
        .bind(new_booking.customer_id)
        .bind(Json(&new_booking.items))
        .bind(Json(&new_booking.address))
        .bind(new_booking.scheduled_date)
        .bind(new_booking.time_slot)
        .bind(new_booking.notes.as_deref())
        .bind(new_booking.payment_method)
        .bind(new_booking.estimated_amount)
        .bind(Json(&new_booking.status_history))
        .fetch_one(pool)
        .await
}

/// A unique violation on the code column means the code is taken
fn code_attempt(
    inserted: std::result::Result<Booking, sqlx::Error>,
) -> Result<CodeAttempt<Booking>> {
    match inserted {
        Ok(booking) => Ok(CodeAttempt::Stored(booking)),
        Err(e) if is_unique_violation(&e, BOOKING_CODE_CONSTRAINT) => Ok(CodeAttempt::Taken),
        Err(e) => {
            tracing::error!("Failed to create booking: {:?}", e);
            Err(AppError::Database(e))
        }
    }
}

fn details_select() -> String {
    format!(
        r#"
        SELECT {BOOKING_COLUMNS},
            c.name AS customer_name, c.phone AS customer_phone,
            a.name AS agent_name, a.phone AS agent_phone
        FROM bookings b
        JOIN users c ON c.id = b.customer_id
        LEFT JOIN users a ON a.id = b.agent_id
        "#
    )
}

async fn persist(
    conn: &mut PgConnection,
    booking: &Booking,
    expected_revision: i64,
) -> Result<Booking> {
    let sql = format!(
        r#"
        UPDATE bookings AS b SET
            status = $3, agent_id = $4, items = $5, final_amount = $6,
            payment_status = $7, status_history = $8, completed_at = $9,
            cancel_reason = $10, revision = b.revision + 1, updated_at = NOW()
        WHERE b.id = $1 AND b.revision = $2
        RETURNING {BOOKING_COLUMNS}
        "#
    );

    sqlx::query_as::<_, Booking>(&sql)
        .bind(booking.id)
        .bind(expected_revision)
        .bind(booking.status)
        .bind(booking.agent_id)
        .bind(&booking.items)
        .bind(booking.final_amount)
        .bind(booking.payment_status)
        .bind(&booking.status_history)
        .bind(booking.completed_at)
        .bind(booking.cancel_reason.as_deref())
        .fetch_optional(conn)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update booking: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(stale_revision)
}

fn stale_revision() -> AppError {
    AppError::Conflict("Booking was modified by another request, reload and retry".to_string())
}

/// Snapshot a category into a line item at its current price
pub fn price_item(
    category: &Category,
    estimated_weight: Decimal,
) -> std::result::Result<BookingItem, SettlementError> {
    Ok(BookingItem {
        category_id: category.id,
        category_name: category.name.clone(),
        unit: category.unit,
        estimated_weight,
        actual_weight: None,
        unit_price: category.price_per_unit,
        amount: settlement::line_amount(estimated_weight, category.price_per_unit)?,
    })
}

/// Statuses shown in an agent's task list
pub fn pickup_statuses(status: Option<BookingStatus>) -> Vec<BookingStatus> {
    match status {
        Some(status) => vec![status],
        None => vec![BookingStatus::Assigned, BookingStatus::OutForPickup],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::categories::models::{CategoryUnit, PriceHistoryEntry};
    use crate::shared::test_helpers::{sample_booking, unique_violation};

    fn newspaper() -> Category {
        let now = Utc::now();
        Category {
            id: Uuid::new_v4(),
            name: "Newspaper".to_string(),
            slug: "newspaper".to_string(),
            icon: "📰".to_string(),
            image: None,
            price_per_unit: Decimal::from(14),
            unit: CategoryUnit::Kg,
            description: None,
            is_active: true,
            sort_order: 1,
            color: "#6B7280".to_string(),
            min_quantity: Decimal::ONE,
            price_history: Json(vec![PriceHistoryEntry {
                price: Decimal::from(14),
                date: now,
            }]),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_price_item_snapshots_category() {
        let category = newspaper();
        let item = price_item(&category, Decimal::from(5)).unwrap();

        assert_eq!(item.category_id, category.id);
        assert_eq!(item.category_name, "Newspaper");
        assert_eq!(item.unit_price, Decimal::from(14));
        assert_eq!(item.amount, Decimal::from(70));
        assert_eq!(item.actual_weight, None);
        assert_eq!(settlement::estimate(&[item]), Ok(Decimal::from(70)));
    }

    #[test]
    fn test_price_item_rejects_overflowing_amount() {
        let mut category = newspaper();
        category.price_per_unit = Decimal::MAX;

        assert_eq!(
            price_item(&category, Decimal::from(2)).unwrap_err(),
            SettlementError::AmountOverflow
        );
    }

    #[test]
    fn test_code_collision_is_reported_as_taken() {
        let taken = code_attempt(Err(unique_violation(BOOKING_CODE_CONSTRAINT))).unwrap();
        assert!(matches!(taken, CodeAttempt::Taken));

        let other = code_attempt(Err(unique_violation("some_other_key")));
        assert!(matches!(other, Err(AppError::Database(_))));

        let stored = code_attempt(Ok(sample_booking(Uuid::new_v4()))).unwrap();
        assert!(matches!(stored, CodeAttempt::Stored(_)));
    }

    #[test]
    fn test_stale_revision_is_a_conflict() {
        assert!(matches!(stale_revision(), AppError::Conflict(_)));
    }

    #[test]
    fn test_pickup_statuses_default_to_open_work() {
        assert_eq!(
            pickup_statuses(None),
            vec![BookingStatus::Assigned, BookingStatus::OutForPickup]
        );
        assert_eq!(
            pickup_statuses(Some(BookingStatus::Completed)),
            vec![BookingStatus::Completed]
        );
    }

    fn new_booking_from(booking: &Booking) -> NewBooking {
        NewBooking {
            customer_id: booking.customer_id,
            items: booking.items.0.clone(),
            address: booking.address.0.clone(),
            scheduled_date: booking.scheduled_date,
            time_slot: booking.time_slot,
            notes: None,
            payment_method: booking.payment_method,
            estimated_amount: booking.estimated_amount,
            status_history: booking.status_history.0.clone(),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_concurrent_writes_and_settlements_conflict(pool: PgPool) {
        let customer_id: Uuid =
            sqlx::query_scalar("INSERT INTO users (phone) VALUES ('+919800000001') RETURNING id")
                .fetch_one(&pool)
                .await
                .unwrap();
        let new_booking = new_booking_from(&sample_booking(customer_id));

        let stored = insert_booking(&pool, "GC260307AB12C", &new_booking)
            .await
            .unwrap();
        let duplicate = code_attempt(insert_booking(&pool, "GC260307AB12C", &new_booking).await);
        assert!(matches!(duplicate, Ok(CodeAttempt::Taken)));

        let mut conn = pool.acquire().await.unwrap();
        let updated = persist(&mut conn, &stored, stored.revision).await.unwrap();
        assert_eq!(updated.revision, stored.revision + 1);

        // A writer still holding the old revision loses
        let stale = persist(&mut conn, &stored, stored.revision).await;
        assert!(matches!(stale, Err(AppError::Conflict(_))));

        let event = CreateEarningEvent {
            user_id: customer_id,
            booking_id: stored.id,
            amount: Decimal::from(70),
            loyalty_points: 7,
        };
        EarningLedger::append(&mut conn, &event).await.unwrap();
        let again = EarningLedger::append(&mut conn, &event).await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }
}
