//! Common API utilities and shared types

use serde::{Deserialize, Serialize};

use crate::api::middleware::ApiError;
use crate::models::{ContentStatus, ListParams};

/// Page size for back-office listings
pub const ADMIN_PER_PAGE: u32 = 20;

/// Clamp optional `page`/`per_page` query values into list parameters
pub fn list_params(page: Option<u32>, per_page: Option<u32>, default_per_page: u32) -> ListParams {
    ListParams::new(page.unwrap_or(1), per_page.unwrap_or(default_per_page))
}

/// Plain pagination query
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PageQuery {
    pub fn admin_params(&self) -> ListParams {
        list_params(self.page, self.per_page, ADMIN_PER_PAGE)
    }
}

/// Pagination plus a status filter
#[derive(Debug, Deserialize)]
pub struct StatusPageQuery<S> {
    pub status: Option<S>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl<S> StatusPageQuery<S> {
    pub fn admin_params(&self) -> ListParams {
        list_params(self.page, self.per_page, ADMIN_PER_PAGE)
    }
}

pub type ContentListQuery = StatusPageQuery<ContentStatus>;

/// Body for endpoints that only change a status
#[derive(Debug, Deserialize)]
pub struct StatusBody<S> {
    pub status: S,
}

/// `{ "success": true }`
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Parse an optional enum-like query value, mapping failure to a 400
pub fn parse_filter<T>(value: Option<&str>, field: &str) -> Result<Option<T>, ApiError>
where
    T: std::str::FromStr,
{
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| ApiError::validation_error(format!("Invalid {}: {}", field, v))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentKind;

    #[test]
    fn test_list_params_defaults_and_clamps() {
        let p = list_params(None, None, ADMIN_PER_PAGE);
        assert_eq!((p.page, p.per_page), (1, 20));

        let p = list_params(Some(0), Some(1000), 10);
        assert_eq!((p.page, p.per_page), (1, 100));
    }

    #[test]
    fn test_parse_filter() {
        let kind: Option<ContentKind> = parse_filter(Some("speeches"), "type").unwrap();
        assert_eq!(kind, Some(ContentKind::Speech));

        let none: Option<ContentKind> = parse_filter(Some("  "), "type").unwrap();
        assert!(none.is_none());

        let err = parse_filter::<ContentKind>(Some("poems"), "type").unwrap_err();
        assert_eq!(err.error.code, "VALIDATION_ERROR");
    }
}
