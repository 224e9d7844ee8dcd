//! Paged listing of applications and instances
//!
//! `?page=&page_size=` arrives as a `PageQuery`, is clamped into
//! `PageParams`, and turns into SQL `LIMIT`/`OFFSET` binds. Pages are
//! 1-indexed.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Raw query string; either field may be missing or out of range
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Normalized page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: u32,
    pub page_size: u32,
}

impl PageParams {
    /// Page 0 becomes 1; the size defaults to `DEFAULT_PAGE_SIZE` and is
    /// clamped to `1..=MAX_PAGE_SIZE`.
    ///
    /// ```
    /// use inventory_core::models::PageParams;
    ///
    /// let params = PageParams::new(Some(0), Some(500));
    /// assert_eq!((params.page, params.page_size), (1, 100));
    /// assert_eq!(params.offset(), 0);
    /// ```
    #[must_use]
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// `OFFSET` bind
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }

    /// `LIMIT` bind
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl From<PageQuery> for PageParams {
    fn from(query: PageQuery) -> Self {
        Self::new(query.page, query.page_size)
    }
}

/// One page of rows plus the totals a client needs to keep paging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Rows across all pages
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Wrap a page of rows with the `COUNT(*)` of the whole listing
    #[must_use]
    pub fn new(items: Vec<T>, total: i64, params: PageParams) -> Self {
        let total = u64::try_from(total).unwrap_or_default();
        let total_pages = total.div_ceil(u64::from(params.page_size));

        Self {
            items,
            total,
            page: params.page,
            page_size: params.page_size,
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults() {
        let params = PageParams::from(PageQuery::default());
        assert_eq!(params, PageParams { page: 1, page_size: DEFAULT_PAGE_SIZE });
        assert_eq!((params.limit(), params.offset()), (20, 0));
    }

    #[test]
    fn test_zero_page_size_is_one() {
        let params = PageParams::from(PageQuery { page: Some(3), page_size: Some(0) });
        assert_eq!(params.page_size, 1);
        assert_eq!(params.offset(), 2);
    }

    #[test]
    fn test_offset_of_last_page_does_not_overflow() {
        let params = PageParams::new(Some(u32::MAX), Some(MAX_PAGE_SIZE));
        assert_eq!(params.offset(), i64::from(u32::MAX - 1) * 100);
    }

    #[test]
    fn test_query_string_shape() {
        let query: PageQuery = serde_json::from_str(r#"{"page": 2}"#).unwrap();
        let params = PageParams::from(query);
        assert_eq!((params.page, params.page_size), (2, DEFAULT_PAGE_SIZE));
    }

    #[test]
    fn test_page_totals() {
        let page = Page::new(vec!["orders"; 5], 45, PageParams::new(Some(3), Some(20)));
        assert_eq!(page.total, 45);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 3);

        let empty: Page<()> = Page::new(Vec::new(), 0, PageParams::default());
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn test_negative_count_is_zero() {
        let page: Page<()> = Page::new(Vec::new(), -1, PageParams::default());
        assert_eq!(page.total, 0);
    }
}
