use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub meta: Option<Meta>,
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Meta {
    pub total: i64,
    /// Number of pages at the requested page size (absent for unpaged lists)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<i64>,
}

impl Meta {
    pub fn total(total: i64) -> Self {
        Self { total, pages: None }
    }

    pub fn paged(total: i64, pagination: &PaginationQuery) -> Self {
        let limit = pagination.limit();
        Self {
            total,
            pages: Some((total + limit - 1) / limit),
        }
    }
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Standard pagination query parameters for list endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct PaginationQuery {
    /// Page number (1-indexed, default: 1)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,

    /// Number of items per page (default: 20, max: 100)
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,
}

pub fn default_page() -> i64 {
    1
}

pub fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaginationQuery {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self { page, page_size }
    }

    /// Calculate SQL OFFSET from page number
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit()
    }

    /// Get clamped page_size (respects MAX_PAGE_SIZE)
    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: Option<T>, message: Option<String>, meta: Option<Meta>) -> Self {
        Self {
            success: true,
            data,
            message,
            meta,
            errors: None,
        }
    }

    pub fn error(message: Option<String>, errors: Option<Vec<String>>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message,
            meta: None,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_offset_and_clamp() {
        assert_eq!(PaginationQuery::new(1, 20).offset(), 0);
        assert_eq!(PaginationQuery::new(3, 20).offset(), 40);
        assert_eq!(PaginationQuery::new(0, 20).offset(), 0);
        assert_eq!(PaginationQuery::new(1, 500).limit(), MAX_PAGE_SIZE);
        assert_eq!(PaginationQuery::new(1, 0).limit(), 1);
    }

    #[test]
    fn test_meta_pages_rounds_up() {
        let pagination = PaginationQuery::new(1, 20);
        assert_eq!(Meta::paged(0, &pagination).pages, Some(0));
        assert_eq!(Meta::paged(20, &pagination).pages, Some(1));
        assert_eq!(Meta::paged(21, &pagination).pages, Some(2));
    }
}
