//! Pagination utilities for list endpoints

use serde::{Deserialize, Serialize};

/// Page size when the client does not ask for one
pub const DEFAULT_LIMIT: i64 = 20;

/// Largest page a client may request
pub const MAX_LIMIT: i64 = 100;

/// `page` / `limit` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Rows per page
    pub limit: i64,
    /// Total number of rows
    pub total: i64,
    /// Total number of pages
    pub total_pages: i64,
    /// Offset for SQL LIMIT/OFFSET query
    #[serde(skip)]
    pub offset: i64,
}

/// Calculate pagination metadata from total results and requested page
///
/// `limit` is clamped to [1, MAX_LIMIT] and `page` to [1, total_pages].
///
/// # Examples
/// ```
/// use lico_api::pagination::calculate_pagination;
///
/// // 45 results at 20 per page = 3 pages
/// let p = calculate_pagination(45, Some(2), Some(20));
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 20);
///
/// // Requesting out-of-bounds page gets clamped
/// let p = calculate_pagination(45, Some(99), Some(20));
/// assert_eq!(p.page, 3);
/// assert_eq!(p.offset, 40);
/// ```
pub fn calculate_pagination(total: i64, page: Option<i64>, limit: Option<i64>) -> Pagination {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let total_pages = (total + limit - 1) / limit;
    let page = page.unwrap_or(1).max(1).min(total_pages.max(1));
    let offset = (page - 1) * limit;

    Pagination {
        page,
        limit,
        total,
        total_pages,
        offset,
    }
}

impl PageQuery {
    pub fn paginate(&self, total: i64) -> Pagination {
        calculate_pagination(total, self.page, self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let p = calculate_pagination(150, None, None);
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, DEFAULT_LIMIT);
        assert_eq!(p.total_pages, 8);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_pagination_last_page() {
        let p = calculate_pagination(250, Some(3), Some(100));
        assert_eq!(p.page, 3);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.offset, 200);
    }

    #[test]
    fn test_pagination_out_of_bounds_low() {
        let p = calculate_pagination(150, Some(0), Some(100));
        assert_eq!(p.page, 1);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_pagination_limit_clamped() {
        assert_eq!(calculate_pagination(10, None, Some(1000)).limit, MAX_LIMIT);
        assert_eq!(calculate_pagination(10, None, Some(-5)).limit, 1);
    }

    #[test]
    fn test_pagination_empty() {
        let p = calculate_pagination(0, Some(1), None);
        assert_eq!(p.page, 1);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_pagination_serializes_camel_case_without_offset() {
        let json = serde_json::to_value(calculate_pagination(45, Some(2), Some(20))).unwrap();
        assert_eq!(json["totalPages"], 3);
        assert!(json.get("offset").is_none());
    }
}
