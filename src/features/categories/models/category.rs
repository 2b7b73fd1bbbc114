use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Unit a category is priced by
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema,
)]
#[sqlx(type_name = "category_unit", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CategoryUnit {
    #[default]
    Kg,
    Piece,
    Unit,
}

/// One price point in a category's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PriceHistoryEntry {
    pub price: Decimal,
    pub date: DateTime<Utc>,
}

/// Database model for category
#[derive(Debug, Clone, FromRow)]
pub struct Category {
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
    pub price_history: Json<Vec<PriceHistoryEntry>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) const CATEGORY_COLUMNS: &str = "id, name, slug, icon, image, price_per_unit, unit, \
     description, is_active, sort_order, color, min_quantity, price_history, created_at, updated_at";
