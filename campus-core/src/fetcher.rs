//! Page fetcher contract.
//!
//! The engine consumes the network as one operation: fetch page N of a
//! collection under a set of server filters. Implementations must surface
//! failures as [`FetchError`] and never as an empty page.

use crate::entities::ListEntity;
use crate::error::FetchError;
use crate::page::{Page, PageRequest};
use async_trait::async_trait;

#[async_trait]
pub trait PageFetcher<E: ListEntity>: Send + Sync {
    /// Perform one request. On success the page echoes `request.page`.
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<E>, FetchError>;
}

