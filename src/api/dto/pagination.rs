//! Pagination query parameters.

use serde::Deserialize;
use serde_json::json;
use serde_with::{DisplayFromStr, serde_as};

use crate::error::AppError;

const DEFAULT_PAGE_SIZE: u32 = 5;
const MIN_PAGE_SIZE: u32 = 5;
const MAX_PAGE_SIZE: u32 = 10;

/// Pagination query parameters.
///
/// Uses `serde_with` to parse page numbers from query strings as integers.
#[serde_as]
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page_id: Option<u32>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl PaginationParams {
    /// Validates pagination parameters.
    ///
    /// # Defaults
    ///
    /// - `page_id`: 1
    /// - `page_size`: 5
    ///
    /// # Validation
    ///
    /// - Page id must be > 0
    /// - Page size must be between 5 and 10
    ///
    /// # Returns
    ///
    /// `(page_id, page_size)` as database integers.
    pub fn validate(&self) -> Result<(i64, i64), AppError> {
        let page_id = self.page_id.unwrap_or(1);
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);

        if page_id == 0 {
            return Err(AppError::bad_request(
                "Page id must be greater than 0",
                json!({ "page_id": page_id }),
            ));
        }

        if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(AppError::bad_request(
                format!("Page size must be between {MIN_PAGE_SIZE} and {MAX_PAGE_SIZE}"),
                json!({ "page_size": page_size }),
            ));
        }

        Ok((i64::from(page_id), i64::from(page_size)))
    }

    /// Database `(offset, limit)` for a validated page.
    pub fn offset_limit(&self) -> Result<(i64, i64), AppError> {
        let (page_id, page_size) = self.validate()?;
        Ok(((page_id - 1) * page_size, page_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page_id: Option<u32>, page_size: Option<u32>) -> PaginationParams {
        PaginationParams { page_id, page_size }
    }

    #[test]
    fn test_defaults() {
        assert_eq!(params(None, None).validate().unwrap(), (1, 5));
        assert_eq!(params(None, None).offset_limit().unwrap(), (0, 5));
    }

    #[test]
    fn test_custom_page_and_size() {
        assert_eq!(params(Some(3), Some(10)).offset_limit().unwrap(), (20, 10));
    }

    #[test]
    fn test_page_zero_is_error() {
        assert!(params(Some(0), None).validate().is_err());
    }

    #[test]
    fn test_page_size_bounds() {
        assert!(params(None, Some(4)).validate().is_err());
        assert!(params(None, Some(5)).validate().is_ok());
        assert!(params(None, Some(10)).validate().is_ok());
        assert!(params(None, Some(11)).validate().is_err());
    }

    #[test]
    fn test_parses_query_strings() {
        let p: PaginationParams =
            serde_json::from_str(r#"{"page_id": "2", "page_size": "7"}"#).unwrap();
        assert_eq!(p.page_id, Some(2));
        assert_eq!(p.page_size, Some(7));
    }

    #[test]
    fn test_non_numeric_is_error() {
        assert!(serde_json::from_str::<PaginationParams>(r#"{"page_id": "abc"}"#).is_err());
    }
}
