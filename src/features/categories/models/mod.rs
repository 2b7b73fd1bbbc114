mod category;

pub(crate) use category::CATEGORY_COLUMNS;
pub use category::{Category, CategoryUnit, PriceHistoryEntry};
