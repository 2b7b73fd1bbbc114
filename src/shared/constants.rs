/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

/// Currency symbol used in customer-facing notification text
pub const CURRENCY_SYMBOL: &str = "₹";

/// Loyalty points are earned per this many currency units settled
pub const LOYALTY_POINT_DIVISOR: i64 = 10;

/// Reason stored when a cancellation does not carry one
pub const DEFAULT_CANCEL_REASON: &str = "Cancelled by user";

/// Largest weight accepted for a single line item
pub const MAX_ITEM_WEIGHT: i64 = 100_000;

/// Largest price per unit a category may carry
pub const MAX_UNIT_PRICE: i64 = 1_000_000;

/// Largest explicit final amount an agent may record
pub const MAX_FINAL_AMOUNT: i64 = 1_000_000_000;
