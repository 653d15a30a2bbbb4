//! Pagination metadata, as the backend sends it and as the table reads it.

use serde::{Deserialize, Serialize};

/// Pagination state read by the table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl PaginationInfo {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        Self {
            page,
            limit,
            total,
            total_pages: total_pages(total, limit),
        }
    }

    /// One-based index of the first row on this page, 0 when there are no rows.
    pub fn first_row(&self) -> u64 {
        let offset = u64::from(self.page.saturating_sub(1)) * u64::from(self.limit);
        (offset + 1).min(self.total)
    }

    /// One-based index of the last row on this page.
    pub fn last_row(&self) -> u64 {
        (u64::from(self.page) * u64::from(self.limit)).min(self.total)
    }
}

/// `ceil(total / limit)`; a zero limit yields zero pages.
pub fn total_pages(total: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    let pages = total.div_ceil(u64::from(limit));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Pagination block of a backend list response.
///
/// The robots endpoint answers `{currentPage, totalPages, totalCount, limit,
/// hasNext, hasPrev}`; the users endpoint answers `{page, limit, total,
/// totalPages}`. Both deserialize here.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendPagination {
    #[serde(alias = "page")]
    pub current_page: u32,
    pub limit: u32,
    #[serde(alias = "total")]
    pub total_count: u64,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub has_next: Option<bool>,
    #[serde(default)]
    pub has_prev: Option<bool>,
}

impl From<BackendPagination> for PaginationInfo {
    fn from(p: BackendPagination) -> Self {
        Self {
            page: p.current_page,
            limit: p.limit,
            total: p.total_count,
            total_pages: p
                .total_pages
                .unwrap_or_else(|| total_pages(p.total_count, p.limit)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(42, 10), 5);
        assert_eq!(total_pages(40, 10), 4);
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(7, 0), 0);
    }

    #[test]
    fn test_robot_pagination_shape() {
        let backend: BackendPagination = serde_json::from_value(serde_json::json!({
            "currentPage": 2,
            "totalPages": 5,
            "totalCount": 42,
            "limit": 10,
            "hasNext": true,
            "hasPrev": true
        }))
        .unwrap();

        let info = PaginationInfo::from(backend);
        assert_eq!(info, PaginationInfo::new(2, 10, 42));
    }

    #[test]
    fn test_user_pagination_shape_derives_total_pages() {
        let backend: BackendPagination = serde_json::from_value(serde_json::json!({
            "page": 1,
            "limit": 25,
            "total": 51
        }))
        .unwrap();

        let info = PaginationInfo::from(backend);
        assert_eq!(info.total_pages, 3);
        assert_eq!(info.total, 51);
    }

    #[test]
    fn test_row_range() {
        let info = PaginationInfo::new(5, 10, 42);
        assert_eq!(info.first_row(), 41);
        assert_eq!(info.last_row(), 42);

        let empty = PaginationInfo::new(1, 10, 0);
        assert_eq!(empty.first_row(), 0);
        assert_eq!(empty.last_row(), 0);
    }
}
