//! Pagination query parameters.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

const DEFAULT_PAGE_SIZE: u32 = 25;
const MAX_PAGE_SIZE: u32 = 100;

/// Pagination query parameters.
///
/// Uses `serde_with` to parse page numbers from query strings as integers.
#[serde_as]
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page: Option<u32>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page_size: Option<u32>,
}

/// Resolved page position, echoed back in list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
}

impl Page {
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

impl PaginationParams {
    /// Applies defaults and bounds.
    ///
    /// Defaults to page 1 of 25. Page must be at least 1 and page size 1-100.
    pub fn resolve(&self) -> Result<Page, String> {
        let page = self.page.unwrap_or(1);
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);

        if page == 0 {
            return Err("Page must be greater than 0".to_string());
        }

        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(format!("Page size must be between 1 and {}", MAX_PAGE_SIZE));
        }

        Ok(Page { page, page_size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<u32>, page_size: Option<u32>) -> PaginationParams {
        PaginationParams { page, page_size }
    }

    #[test]
    fn test_defaults() {
        let page = params(None, None).resolve().unwrap();
        assert_eq!(page.offset(), 0);
        assert_eq!(page.limit(), 25);
    }

    #[test]
    fn test_custom_page_and_size() {
        let page = params(Some(3), Some(50)).resolve().unwrap();
        assert_eq!(page.offset(), 100);
        assert_eq!(page.limit(), 50);
    }

    #[test]
    fn test_page_zero_is_error() {
        assert!(params(Some(0), None).resolve().is_err());
    }

    #[test]
    fn test_page_size_bounds() {
        assert!(params(None, Some(0)).resolve().is_err());
        assert!(params(None, Some(1)).resolve().is_ok());
        assert!(params(None, Some(100)).resolve().is_ok());
        assert!(params(None, Some(101)).resolve().is_err());
    }

    #[test]
    fn test_parses_query_strings() {
        let p: PaginationParams =
            serde_json::from_value(serde_json::json!({ "page": "2", "page_size": "10" })).unwrap();
        assert_eq!(p.resolve().unwrap(), Page { page: 2, page_size: 10 });
    }
}
