use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::core::database::is_unique_violation;
use crate::core::error::{AppError, Result};
use crate::features::categories::dtos::{CreateCategoryDto, UpdateCategoryDto};
use crate::features::categories::models::{Category, PriceHistoryEntry, CATEGORY_COLUMNS};
use crate::features::categories::slug::slugify;

const DEFAULT_ICON: &str = "📦";
const DEFAULT_COLOR: &str = "#10B981";

/// Service for category operations
pub struct CategoryService {
    pool: PgPool,
}

impl CategoryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List active categories by sort order
    pub async fn list_active(&self) -> Result<Vec<Category>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE is_active = TRUE \
             ORDER BY sort_order, name"
        );
        sqlx::query_as::<_, Category>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list categories: {:?}", e);
                AppError::Database(e)
            })
    }

    /// List all categories including inactive ones
    pub async fn list_all(&self) -> Result<Vec<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY sort_order, name");
        sqlx::query_as::<_, Category>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list all categories: {:?}", e);
                AppError::Database(e)
            })
    }

    /// Get category by ID regardless of its active flag
    pub async fn get(&self, id: Uuid) -> Result<Category> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1");
        sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get category: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
    }

    /// Resolve a category that may be booked. Inactive categories are
    /// reported the same as missing ones.
    pub async fn lookup_active(&self, id: Uuid) -> Result<Category> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1 AND is_active = TRUE"
        );
        sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to look up category: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    /// Create a category; its slug and first price history entry are derived
    pub async fn create(&self, dto: CreateCategoryDto) -> Result<Category> {
        let now = Utc::now();
        let slug = slugify(&dto.name);
        let history = vec![PriceHistoryEntry {
            price: dto.price_per_unit,
            date: now,
        }];

        let sql = format!(
            r#"
            INSERT INTO categories (
                name, slug, icon, image, price_per_unit, unit, description,
                is_active, sort_order, color, min_quantity, price_history
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {CATEGORY_COLUMNS}
            "#
        );

        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(&dto.name)
            .bind(&slug)
            .bind(dto.icon.as_deref().unwrap_or(DEFAULT_ICON))
            .bind(dto.image.as_deref())
            .bind(dto.price_per_unit)
            .bind(dto.unit)
            .bind(dto.description.as_deref())
            .bind(dto.is_active.unwrap_or(true))
            .bind(dto.sort_order.unwrap_or(0))
            .bind(dto.color.as_deref().unwrap_or(DEFAULT_COLOR))
            .bind(dto.min_quantity.unwrap_or(Decimal::ONE))
            .bind(Json(history))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| slug_conflict_or_database(e, &slug))?;

        tracing::info!("Category '{}' created ({})", category.slug, category.id);
        Ok(category)
    }

    /// Apply a partial update, re-deriving the slug and extending the price
    /// history as needed
    pub async fn update(&self, id: Uuid, dto: UpdateCategoryDto) -> Result<Category> {
        let mut category = self.get(id).await?;
        apply_update(&mut category, dto, Utc::now());

        let sql = format!(
            r#"
            UPDATE categories SET
                name = $2, slug = $3, icon = $4, image = $5, price_per_unit = $6,
                unit = $7, description = $8, is_active = $9, sort_order = $10,
                color = $11, min_quantity = $12, price_history = $13, updated_at = NOW()
            WHERE id = $1
            RETURNING {CATEGORY_COLUMNS}
            "#
        );

        let updated = sqlx::query_as::<_, Category>(&sql)
            .bind(category.id)
            .bind(&category.name)
            .bind(&category.slug)
            .bind(&category.icon)
            .bind(category.image.as_deref())
            .bind(category.price_per_unit)
            .bind(category.unit)
            .bind(category.description.as_deref())
            .bind(category.is_active)
            .bind(category.sort_order)
            .bind(&category.color)
            .bind(category.min_quantity)
            .bind(&category.price_history)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| slug_conflict_or_database(e, &category.slug))?
            .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

        tracing::info!("Category '{}' updated ({})", updated.slug, updated.id);
        Ok(updated)
    }

    /// Hard delete
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete category: {:?}", e);
                AppError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Category not found".to_string()));
        }

        tracing::info!("Category {} deleted", id);
        Ok(())
    }
}

fn slug_conflict_or_database(e: sqlx::Error, slug: &str) -> AppError {
    if is_unique_violation(&e, "categories_slug_key") {
        AppError::Conflict(format!("A category with slug '{}' already exists", slug))
    } else {
        tracing::error!("Failed to save category: {:?}", e);
        AppError::Database(e)
    }
}

/// Merge an update into a category. A changed name re-derives the slug; a
/// changed price appends to the history.
pub fn apply_update(category: &mut Category, dto: UpdateCategoryDto, now: DateTime<Utc>) {
    if let Some(name) = dto.name {
        if name != category.name {
            category.slug = slugify(&name);
            category.name = name;
        }
    }

    if let Some(price) = dto.price_per_unit {
        if price != category.price_per_unit {
            category.price_per_unit = price;
            category.price_history.0.push(PriceHistoryEntry { price, date: now });
        }
    }

    if let Some(icon) = dto.icon {
        category.icon = icon;
    }
    if let Some(image) = dto.image {
        category.image = Some(image);
    }
    if let Some(unit) = dto.unit {
        category.unit = unit;
    }
    if let Some(description) = dto.description {
        category.description = Some(description);
    }
    if let Some(is_active) = dto.is_active {
        category.is_active = is_active;
    }
    if let Some(sort_order) = dto.sort_order {
        category.sort_order = sort_order;
    }
    if let Some(color) = dto.color {
        category.color = color;
    }
    if let Some(min_quantity) = dto.min_quantity {
        category.min_quantity = min_quantity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::categories::models::CategoryUnit;

    fn category() -> Category {
        let created = Utc::now();
        Category {
            id: Uuid::new_v4(),
            name: "Plastic".to_string(),
            slug: "plastic".to_string(),
            icon: "🧴".to_string(),
            image: None,
            price_per_unit: Decimal::from(10),
            unit: CategoryUnit::Kg,
            description: None,
            is_active: true,
            sort_order: 3,
            color: "#3B82F6".to_string(),
            min_quantity: Decimal::ONE,
            price_history: Json(vec![PriceHistoryEntry {
                price: Decimal::from(10),
                date: created,
            }]),
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_rename_rederives_slug() {
        let mut c = category();
        apply_update(
            &mut c,
            UpdateCategoryDto {
                name: Some("Hard Plastic".to_string()),
                ..Default::default()
            },
            Utc::now(),
        );
        assert_eq!(c.name, "Hard Plastic");
        assert_eq!(c.slug, "hard-plastic");
        assert_eq!(c.price_history.0.len(), 1);
    }

    #[test]
    fn test_price_change_appends_history() {
        let mut c = category();
        let now = Utc::now();
        apply_update(
            &mut c,
            UpdateCategoryDto {
                price_per_unit: Some(Decimal::from(12)),
                ..Default::default()
            },
            now,
        );

        assert_eq!(c.price_per_unit, Decimal::from(12));
        assert_eq!(c.price_history.0.len(), 2);
        assert_eq!(
            c.price_history.0.last(),
            Some(&PriceHistoryEntry {
                price: Decimal::from(12),
                date: now
            })
        );
    }

    #[test]
    fn test_unchanged_price_and_name_are_noops() {
        let mut c = category();
        apply_update(
            &mut c,
            UpdateCategoryDto {
                name: Some("Plastic".to_string()),
                price_per_unit: Some(Decimal::from(10)),
                sort_order: Some(9),
                ..Default::default()
            },
            Utc::now(),
        );
        assert_eq!(c.slug, "plastic");
        assert_eq!(c.price_history.0.len(), 1);
        assert_eq!(c.sort_order, 9);
    }
}
