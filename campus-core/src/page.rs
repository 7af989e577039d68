//! Page schema of the paged list endpoints.
//!
//! Wire contract (version 1):
//!
//! ```text
//! GET /api/v1/<collection>?page=<n>&limit=<n>[&filters]
//! { "data": [...], "pagination": { "currentPage", "totalPages", "totalCount",
//!                                  "limit", "hasNextPage", "hasPrevPage" } }
//! ```
//!
//! A response is accepted only through [`Page::from_response`]; anything that
//! violates the schema is rejected rather than guessed at.

use crate::error::SchemaViolation;
use crate::filter::Collection;
use serde::{Deserialize, Serialize};

/// Version of the page-response schema this crate validates.
pub const PAGE_SCHEMA_VERSION: u32 = 1;

/// Pagination metadata echoed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PageMeta {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub limit: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PageMeta {
    /// Check the structural invariants of the metadata.
    pub fn validate(&self) -> Result<(), SchemaViolation> {
        if self.limit == 0 {
            return Err(SchemaViolation::ZeroLimit);
        }
        if self.current_page == 0 {
            return Err(SchemaViolation::ZeroCurrentPage);
        }
        if self.has_next_page != (self.current_page < self.total_pages) {
            return Err(SchemaViolation::NextPageMismatch {
                current_page: self.current_page,
                total_pages: self.total_pages,
                has_next_page: self.has_next_page,
            });
        }
        Ok(())
    }

    /// Page number to request after this one, if any.
    pub fn next_page(&self) -> Option<u32> {
        if self.has_next_page {
            self.current_page.checked_add(1)
        } else {
            None
        }
    }
}

/// Version 1 of the page-response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResponseV1<T> {
    pub data: Vec<T>,
    pub pagination: PageMeta,
}

pub type PageResponse<T> = PageResponseV1<T>;

/// A validated page of items. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    items: Vec<T>,
    pagination: PageMeta,
}

impl<T> Page<T> {
    /// Build a page without validation. Intended for fixtures.
    pub fn new(items: Vec<T>, pagination: PageMeta) -> Self {
        Self { items, pagination }
    }

    /// Validate a decoded body against the schema and the requested page.
    pub fn from_response(
        response: PageResponse<T>,
        requested_page: u32,
    ) -> Result<Self, SchemaViolation> {
        let PageResponseV1 { data, pagination } = response;
        pagination.validate()?;
        if data.len() > pagination.limit as usize {
            return Err(SchemaViolation::Oversized {
                items: data.len(),
                limit: pagination.limit,
            });
        }
        if pagination.current_page != requested_page {
            return Err(SchemaViolation::PageMismatch {
                requested: requested_page,
                received: pagination.current_page,
            });
        }
        Ok(Self::new(data, pagination))
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn pagination(&self) -> &PageMeta {
        &self.pagination
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_parts(self) -> (Vec<T>, PageMeta) {
        (self.items, self.pagination)
    }
}

/// One "fetch page N of collection C" request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub collection: Collection,
    pub page: u32,
    pub limit: u32,
    /// Canonical server-side filter parameters.
    pub params: Vec<(String, String)>,
}

impl PageRequest {
    pub fn new(collection: Collection, page: u32, limit: u32, params: Vec<(String, String)>) -> Self {
        Self {
            collection,
            page,
            limit,
            params,
        }
    }

    /// Endpoint path relative to the API base URL.
    pub fn path(&self) -> String {
        format!("/api/v1/{}", self.collection.as_path())
    }

    /// Full query string pairs: `page`, `limit`, then the filters.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ];
        pairs.extend(self.params.iter().cloned());
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(current_page: u32, total_pages: u32, limit: u32) -> PageMeta {
        PageMeta {
            current_page,
            total_pages,
            total_count: u64::from(total_pages) * u64::from(limit),
            limit,
            has_next_page: current_page < total_pages,
            has_prev_page: current_page > 1,
        }
    }

    #[test]
    fn test_decode_camel_case_body() {
        let body = r#"{
            "data": [1, 2],
            "pagination": {
                "currentPage": 1, "totalPages": 3, "totalCount": 25,
                "limit": 10, "hasNextPage": true, "hasPrevPage": false
            }
        }"#;
        let response: PageResponse<u32> = serde_json::from_str(body).unwrap();
        let page = Page::from_response(response, 1).unwrap();
        assert_eq!(page.items(), &[1, 2]);
        assert_eq!(page.pagination().next_page(), Some(2));
    }

    #[test]
    fn test_missing_pagination_is_rejected_by_decoder() {
        let body = r#"{ "data": [] }"#;
        assert!(serde_json::from_str::<PageResponse<u32>>(body).is_err());
    }

    #[test]
    fn test_has_next_must_agree_with_totals() {
        let mut bad = meta(3, 3, 10);
        bad.has_next_page = true;
        assert!(matches!(
            bad.validate(),
            Err(SchemaViolation::NextPageMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_collection_is_valid() {
        let empty = PageMeta {
            current_page: 1,
            total_pages: 0,
            total_count: 0,
            limit: 10,
            has_next_page: false,
            has_prev_page: false,
        };
        let page = Page::from_response(
            PageResponse::<u32> {
                data: vec![],
                pagination: empty,
            },
            1,
        )
        .unwrap();
        assert!(page.is_empty());
        assert_eq!(page.pagination().next_page(), None);
    }

    #[test]
    fn test_echo_mismatch_is_rejected() {
        let response = PageResponse {
            data: vec![1u32],
            pagination: meta(2, 3, 10),
        };
        assert_eq!(
            Page::from_response(response, 3),
            Err(SchemaViolation::PageMismatch {
                requested: 3,
                received: 2
            })
        );
    }

    #[test]
    fn test_oversized_page_is_rejected() {
        let response = PageResponse {
            data: vec![1u32, 2, 3],
            pagination: meta(1, 2, 2),
        };
        assert!(matches!(
            Page::from_response(response, 1),
            Err(SchemaViolation::Oversized { items: 3, limit: 2 })
        ));
    }

    #[test]
    fn test_zero_limit_is_rejected() {
        let mut bad = meta(1, 1, 10);
        bad.limit = 0;
        assert_eq!(bad.validate(), Err(SchemaViolation::ZeroLimit));
    }

    #[test]
    fn test_query_pairs_lead_with_page_and_limit() {
        let request = PageRequest::new(
            Collection::Payments,
            4,
            5,
            vec![("status".to_string(), "pending".to_string())],
        );
        assert_eq!(request.path(), "/api/v1/payments");
        let pairs = request.query_pairs();
        assert_eq!(pairs[0], ("page".to_string(), "4".to_string()));
        assert_eq!(pairs[1], ("limit".to_string(), "5".to_string()));
        assert_eq!(pairs[2], ("status".to_string(), "pending".to_string()));
    }
}
