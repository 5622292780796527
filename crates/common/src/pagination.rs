//! Offset pagination shared by every list operation.

use serde::{Deserialize, Serialize};

/// Default page size.
pub const DEFAULT_LIMIT: u64 = 20;
/// Largest page size a client may request.
pub const MAX_LIMIT: u64 = 100;
/// Largest row offset handed to the database.
pub const MAX_OFFSET: u64 = i64::MAX.unsigned_abs();

/// A normalized page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u64,
    /// Page size.
    pub limit: u64,
}

impl PageRequest {
    /// Clamps raw client input: page to at least 1, limit to `1..=MAX_LIMIT`.
    #[must_use]
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    /// Number of rows to skip, capped at the largest value a SQL `BIGINT` holds.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        let offset = (self.page - 1).saturating_mul(self.limit);
        if offset > MAX_OFFSET { MAX_OFFSET } else { offset }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Pagination metadata returned alongside list data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// 1-based page number.
    pub current_page: u64,
    /// Page size.
    pub limit: u64,
    /// Rows matching the query across all pages.
    pub total_results: u64,
    /// `ceil(total_results / limit)`.
    pub total_pages: u64,
}

/// One page of results.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Rows on this page.
    pub items: Vec<T>,
    /// Envelope metadata.
    pub info: PageInfo,
}

impl<T> Page<T> {
    /// Builds a page from its items and the total number of matching rows.
    #[must_use]
    pub const fn new(items: Vec<T>, request: PageRequest, total_results: u64) -> Self {
        Self {
            items,
            info: PageInfo {
                current_page: request.page,
                limit: request.limit,
                total_results,
                total_pages: total_results.div_ceil(request.limit),
            },
        }
    }

    /// Maps the items, keeping the metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            info: self.info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults_and_clamps() {
        let req = PageRequest::new(None, None);
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, DEFAULT_LIMIT);

        let req = PageRequest::new(Some(0), Some(1000));
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, MAX_LIMIT);

        let req = PageRequest::new(Some(3), Some(10));
        assert_eq!(req.offset(), 20);
    }

    #[test]
    fn test_offset_saturates_on_huge_page() {
        let req = PageRequest::new(Some(u64::MAX), None);
        assert_eq!(req.offset(), MAX_OFFSET);

        let req = PageRequest::new(Some(u64::MAX / 2), Some(MAX_LIMIT));
        assert_eq!(req.offset(), MAX_OFFSET);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page = Page::new(vec![1, 2], PageRequest::new(Some(1), Some(20)), 41);
        assert_eq!(page.info.total_pages, 3);

        let empty: Page<i32> = Page::new(vec![], PageRequest::default(), 0);
        assert_eq!(empty.info.total_pages, 0);
    }
}
