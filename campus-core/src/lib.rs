//! Campus Core - Paginated List Engine
//!
//! Domain types of the institute console (students, payments) and the
//! engine that streams their paged collections into list screens:
//! filter-scoped cache keys, the page schema, the pagination cursor state
//! machine, the session query cache and the filter/dedup reducer.
//!
//! Nothing here performs I/O. The network is reached through the
//! [`PageFetcher`] trait, implemented by the console's REST client.

pub mod aggregate;
pub mod cache;
pub mod cursor;
pub mod entities;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod identity;
pub mod page;

pub use aggregate::{reduce, Aggregate, ReduceStats};
pub use cache::{Acquisition, QueryCache, DEFAULT_CACHE_TTL};
pub use cursor::{ApplyOutcome, CursorState, FetchTicket, PaginationCursor};
pub use entities::{
    ListEntity, Payment, PaymentMethod, PaymentStatus, Student, StudentStatus,
};
pub use error::{FetchError, ParseEnumError, SchemaViolation, StaleResponse, GENERIC_SERVER_MESSAGE};
pub use fetcher::PageFetcher;
pub use filter::{
    build_key, CacheKey, CanonicalFilters, Collection, FilterParam, FilterScope, FilterSet,
    PaymentFilter, StudentFilter,
};
pub use identity::{CenterId, EntityIdType, PaymentId, StudentId, Timestamp};
pub use page::{Page, PageMeta, PageRequest, PageResponse, PageResponseV1, PAGE_SCHEMA_VERSION};
