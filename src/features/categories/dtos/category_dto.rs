use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::features::categories::models::{Category, CategoryUnit, PriceHistoryEntry};
use crate::shared::constants::MAX_UNIT_PRICE;
use crate::shared::validation::HEX_COLOR_REGEX;

/// Response DTO for category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponseDto {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub icon: String,
    pub image: Option<String>,
    pub price_per_unit: Decimal,
    pub unit: CategoryUnit,
    pub description: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
    pub color: String,
    pub min_quantity: Decimal,
    pub price_history: Vec<PriceHistoryEntry>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponseDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
            icon: c.icon,
            image: c.image,
            price_per_unit: c.price_per_unit,
            unit: c.unit,
            description: c.description,
            is_active: c.is_active,
            sort_order: c.sort_order,
            color: c.color,
            min_quantity: c.min_quantity,
            price_history: c.price_history.0,
            updated_at: c.updated_at,
        }
    }
}

fn validate_positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("must_be_positive"));
    }
    Ok(())
}

fn validate_unit_price(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO || *value > Decimal::from(MAX_UNIT_PRICE) {
        return Err(ValidationError::new("price_out_of_range"));
    }
    Ok(())
}

/// Request DTO for creating a category
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryDto {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 16, message = "Icon must be 1-16 characters"))]
    pub icon: Option<String>,

    pub image: Option<String>,

    #[validate(custom(
        function = "validate_unit_price",
        message = "Price must be greater than 0 and at most 1000000"
    ))]
    pub price_per_unit: Decimal,

    #[serde(default)]
    pub unit: CategoryUnit,

    #[validate(length(max = 500, message = "Description must not exceed 500 characters"))]
    pub description: Option<String>,

    pub is_active: Option<bool>,

    pub sort_order: Option<i32>,

    #[validate(regex(path = *HEX_COLOR_REGEX, message = "Color must be in #RRGGBB form"))]
    pub color: Option<String>,

    #[validate(custom(
        function = "validate_positive",
        message = "Minimum quantity must be greater than 0"
    ))]
    pub min_quantity: Option<Decimal>,
}

/// Request DTO for updating a category. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryDto {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 16, message = "Icon must be 1-16 characters"))]
    pub icon: Option<String>,

    pub image: Option<String>,

    #[validate(custom(
        function = "validate_unit_price",
        message = "Price must be greater than 0 and at most 1000000"
    ))]
    pub price_per_unit: Option<Decimal>,

    pub unit: Option<CategoryUnit>,

    #[validate(length(max = 500, message = "Description must not exceed 500 characters"))]
    pub description: Option<String>,

    pub is_active: Option<bool>,

    pub sort_order: Option<i32>,

    #[validate(regex(path = *HEX_COLOR_REGEX, message = "Color must be in #RRGGBB form"))]
    pub color: Option<String>,

    #[validate(custom(
        function = "validate_positive",
        message = "Minimum quantity must be greater than 0"
    ))]
    pub min_quantity: Option<Decimal>,
}
