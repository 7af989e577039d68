//! Pagination cursor: the state machine behind every list screen.
//!
//! One cursor owns the pages fetched for a single [`CacheKey`]. Requests are
//! handed out as [`FetchTicket`]s and at most one ticket is outstanding at a
//! time; a completion is applied only if it carries the outstanding ticket.
//!
//! # State Transition Diagram
//!
//! ```text
//! Idle ── fetch_next() ──→ Loading ── ok ──→ Ready ⇄ FetchingNext
//!                            │                 │          │
//!                            │                 └── ok, last page ──→ Exhausted
//!                            └── err ──→ Error ←── err ───┘
//!                                          │
//!                                      retry() ──→ Loading | FetchingNext
//!
//! restart() from any state ──→ Loading (page 1, new generation)
//! ```

use crate::aggregate::{Aggregate, ReduceStats};
use crate::entities::ListEntity;
use crate::error::{FetchError, SchemaViolation, StaleResponse};
use crate::filter::{build_key, CacheKey, FilterSet};
use crate::page::{Page, PageMeta, PageRequest};
use std::time::Instant;

/// Observable state of a cursor, derived from its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// No page fetched yet.
    Idle,
    /// First page in flight.
    Loading,
    /// At least one page present and more are available.
    Ready,
    /// A subsequent page is in flight; earlier pages stay visible.
    FetchingNext,
    /// The last page reported no next page.
    Exhausted,
    /// The last fetch failed; earlier pages stay visible.
    Error,
}

/// Permission to fetch one page for one key and generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub key: CacheKey,
    pub page: u32,
    pub generation: u64,
}

/// Result of applying a completion to a cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied { page: u32, stats: ReduceStats },
    Failed { page: u32, error: FetchError },
    Discarded(StaleResponse),
}

#[derive(Debug, Clone)]
struct Failure {
    page: u32,
    error: FetchError,
}

#[derive(Debug, Clone)]
pub struct PaginationCursor<E: ListEntity> {
    key: CacheKey,
    filter: E::Filter,
    page_size: u32,
    pages: Vec<Page<E>>,
    aggregate: Aggregate<E>,
    in_flight: Option<FetchTicket>,
    failure: Option<Failure>,
    generation: u64,
    loaded_at: Option<Instant>,
}

impl<E: ListEntity> PaginationCursor<E> {
    /// Create an idle cursor. `page_size` must be > 0.
    pub fn new(filter: E::Filter, page_size: u32) -> Self {
        Self::with_generation(filter, page_size, 0)
    }

    /// Create an idle cursor whose tickets start at `generation`.
    pub fn with_generation(filter: E::Filter, page_size: u32, generation: u64) -> Self {
        Self {
            key: build_key(E::COLLECTION, &filter),
            filter,
            page_size: page_size.max(1),
            pages: Vec::new(),
            aggregate: Aggregate::new(),
            in_flight: None,
            failure: None,
            generation,
            loaded_at: None,
        }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn filter(&self) -> &E::Filter {
        &self.filter
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn in_flight(&self) -> Option<&FetchTicket> {
        self.in_flight.as_ref()
    }

    /// When page 1 of the current sequence landed.
    pub fn loaded_at(&self) -> Option<Instant> {
        self.loaded_at
    }

    pub fn state(&self) -> CursorState {
        if self.in_flight.is_some() {
            return if self.pages.is_empty() {
                CursorState::Loading
            } else {
                CursorState::FetchingNext
            };
        }
        if self.failure.is_some() {
            return CursorState::Error;
        }
        match self.last_meta() {
            None => CursorState::Idle,
            Some(meta) if meta.has_next_page => CursorState::Ready,
            Some(_) => CursorState::Exhausted,
        }
    }

    pub fn items(&self) -> &[E] {
        self.aggregate.items()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn last_meta(&self) -> Option<&PageMeta> {
        self.pages.last().map(Page::pagination)
    }

    pub fn current_page(&self) -> Option<u32> {
        self.last_meta().map(|meta| meta.current_page)
    }

    pub fn total_count(&self) -> Option<u64> {
        self.last_meta().map(|meta| meta.total_count)
    }

    pub fn has_next_page(&self) -> bool {
        self.last_meta().is_some_and(|meta| meta.has_next_page)
    }

    pub fn is_loading(&self) -> bool {
        self.state() == CursorState::Loading
    }

    pub fn is_fetching_next_page(&self) -> bool {
        self.state() == CursorState::FetchingNext
    }

    pub fn is_error(&self) -> bool {
        self.failure.is_some()
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.failure.as_ref().map(|failure| &failure.error)
    }

    /// Page number the last failure was for.
    pub fn failed_page(&self) -> Option<u32> {
        self.failure.as_ref().map(|failure| failure.page)
    }

    /// Request the next page in sequence.
    ///
    /// No-op (returns `None`) while a fetch is in flight, after exhaustion and
    /// in the error state.
    pub fn fetch_next(&mut self) -> Option<FetchTicket> {
        match self.state() {
            CursorState::Idle => Some(self.begin(1)),
            CursorState::Ready => {
                let next = self.last_meta().and_then(PageMeta::next_page)?;
                Some(self.begin(next))
            }
            CursorState::Loading
            | CursorState::FetchingNext
            | CursorState::Exhausted
            | CursorState::Error => None,
        }
    }

    /// Re-attempt the page that failed.
    pub fn retry(&mut self) -> Option<FetchTicket> {
        if self.in_flight.is_some() {
            return None;
        }
        let page = self.failed_page()?;
        Some(self.begin(page))
    }

    /// Drop every page and start over at page 1 under a new generation.
    ///
    /// Any request still in flight belongs to the old generation and will be
    /// discarded when it completes.
    pub fn restart(&mut self) -> FetchTicket {
        self.generation += 1;
        self.pages.clear();
        self.aggregate = Aggregate::new();
        self.loaded_at = None;
        self.in_flight = None;
        self.begin(1)
    }

    /// Logically cancel the outstanding request and forget a pending failure.
    pub fn suspend(&mut self) {
        if self.in_flight.take().is_some() {
            self.generation += 1;
        }
        self.failure = None;
    }

    /// Build the wire request for `ticket`.
    pub fn request_for(&self, ticket: &FetchTicket) -> PageRequest {
        PageRequest::new(
            E::COLLECTION,
            ticket.page,
            self.page_size,
            self.filter.server_params(),
        )
    }

    /// Apply a fetch completion. `now` stamps the sequence when page 1 lands.
    pub fn apply(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Page<E>, FetchError>,
        now: Instant,
    ) -> ApplyOutcome {
        if ticket.key != self.key {
            return ApplyOutcome::Discarded(StaleResponse::FilterMismatch {
                expected: self.key.clone(),
                received: ticket.key.clone(),
            });
        }
        if ticket.generation != self.generation {
            return ApplyOutcome::Discarded(StaleResponse::Superseded {
                generation: ticket.generation,
            });
        }
        if self.in_flight.as_ref() != Some(ticket) {
            return ApplyOutcome::Discarded(StaleResponse::NotInFlight { page: ticket.page });
        }
        self.in_flight = None;

        let page = match result {
            Ok(page) if page.pagination().current_page == ticket.page => page,
            Ok(page) => {
                let error = FetchError::from(SchemaViolation::PageMismatch {
                    requested: ticket.page,
                    received: page.pagination().current_page,
                });
                return self.fail(ticket.page, error);
            }
            Err(error) => return self.fail(ticket.page, error),
        };

        let stats = self.aggregate.extend_from_page(&page, &self.filter);
        if self.pages.is_empty() {
            self.loaded_at = Some(now);
        }
        self.pages.push(page);
        ApplyOutcome::Applied {
            page: ticket.page,
            stats,
        }
    }

    fn fail(&mut self, page: u32, error: FetchError) -> ApplyOutcome {
        self.failure = Some(Failure {
            page,
            error: error.clone(),
        });
        ApplyOutcome::Failed { page, error }
    }

    fn begin(&mut self, page: u32) -> FetchTicket {
        let ticket = FetchTicket {
            key: self.key.clone(),
            page,
            generation: self.generation,
        };
        self.failure = None;
        self.in_flight = Some(ticket.clone());
        ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Payment, PaymentMethod, PaymentStatus};
    use crate::filter::PaymentFilter;
    use crate::identity::{EntityIdType, PaymentId, StudentId};
    use chrono::Utc;
    use uuid::Uuid;

    fn payment(n: u128) -> Payment {
        Payment {
            payment_id: PaymentId::new(Uuid::from_u128(n)),
            receipt_number: format!("RCPT-{:05}", n),
            student_id: StudentId::new(Uuid::from_u128(1)),
            student_name: "Asha Verma".to_string(),
            amount_minor: 50_000,
            currency: "INR".to_string(),
            method: PaymentMethod::Cash,
            status: PaymentStatus::Completed,
            paid_at: Utc::now(),
        }
    }

    /// Server page `page` of `total` payments, `limit` per page.
    fn server_page(page: u32, limit: u32, total: u32) -> Page<Payment> {
        let total_pages = total.div_ceil(limit);
        let start = (page - 1) * limit;
        let end = (start + limit).min(total);
        let items = (start..end).map(|n| payment(u128::from(n) + 1)).collect();
        Page::new(
            items,
            PageMeta {
                current_page: page,
                total_pages,
                total_count: u64::from(total),
                limit,
                has_next_page: page < total_pages,
                has_prev_page: page > 1,
            },
        )
    }

    fn cursor() -> PaginationCursor<Payment> {
        PaginationCursor::new(PaymentFilter::default(), 10)
    }

    #[test]
    fn test_idle_cursor_starts_at_page_one() {
        let mut cursor = cursor();
        assert_eq!(cursor.state(), CursorState::Idle);
        assert!(!cursor.has_next_page());
        let ticket = cursor.fetch_next().unwrap();
        assert_eq!(ticket.page, 1);
        assert_eq!(cursor.state(), CursorState::Loading);
        assert!(cursor.is_loading());
    }

    #[test]
    fn test_second_request_while_in_flight_is_ignored() {
        let mut cursor = cursor();
        let ticket = cursor.fetch_next().unwrap();
        assert!(cursor.fetch_next().is_none());
        cursor.apply(&ticket, Ok(server_page(1, 10, 25)), Instant::now());

        let next = cursor.fetch_next().unwrap();
        assert_eq!(next.page, 2);
        assert!(cursor.is_fetching_next_page());
        assert!(cursor.fetch_next().is_none());
        assert_eq!(cursor.items().len(), 10);
    }

    #[test]
    fn test_three_pages_exhaust_twenty_five_items() {
        let mut cursor = cursor();
        for page in 1..=3 {
            let ticket = cursor.fetch_next().unwrap();
            assert_eq!(ticket.page, page);
            let outcome = cursor.apply(&ticket, Ok(server_page(page, 10, 25)), Instant::now());
            assert!(matches!(outcome, ApplyOutcome::Applied { .. }));
        }
        assert_eq!(cursor.items().len(), 25);
        assert_eq!(cursor.state(), CursorState::Exhausted);
        assert!(!cursor.has_next_page());
        assert!(cursor.fetch_next().is_none());
    }

    #[test]
    fn test_failure_keeps_prior_pages_and_retry_targets_same_page() {
        let mut cursor = cursor();
        let first = cursor.fetch_next().unwrap();
        cursor.apply(&first, Ok(server_page(1, 10, 25)), Instant::now());

        let second = cursor.fetch_next().unwrap();
        let outcome = cursor.apply(
            &second,
            Err(FetchError::network("connection reset")),
            Instant::now(),
        );
        assert!(matches!(outcome, ApplyOutcome::Failed { page: 2, .. }));
        assert_eq!(cursor.state(), CursorState::Error);
        assert_eq!(cursor.items().len(), 10);
        assert!(cursor.fetch_next().is_none());

        let retry = cursor.retry().unwrap();
        assert_eq!(retry.page, 2);
        assert!(!cursor.is_error());
        cursor.apply(&retry, Ok(server_page(2, 10, 25)), Instant::now());
        assert_eq!(cursor.items().len(), 20);
        assert_eq!(cursor.state(), CursorState::Ready);
    }

    #[test]
    fn test_restart_discards_late_response() {
        let mut cursor = cursor();
        let stale = cursor.fetch_next().unwrap();
        let fresh = cursor.restart();
        assert_eq!(fresh.page, 1);
        assert_ne!(stale.generation, fresh.generation);

        let outcome = cursor.apply(&stale, Ok(server_page(1, 10, 25)), Instant::now());
        assert!(matches!(
            outcome,
            ApplyOutcome::Discarded(StaleResponse::Superseded { .. })
        ));
        assert!(cursor.items().is_empty());
        assert!(cursor.is_loading());

        cursor.apply(&fresh, Ok(server_page(1, 10, 25)), Instant::now());
        assert_eq!(cursor.items().len(), 10);
    }

    #[test]
    fn test_ticket_for_other_key_is_rejected() {
        let mut cursor = cursor();
        let _ticket = cursor.fetch_next().unwrap();
        let mut other = PaginationCursor::<Payment>::new(
            PaymentFilter {
                status: Some(PaymentStatus::Pending),
                ..PaymentFilter::default()
            },
            10,
        );
        let foreign = other.fetch_next().unwrap();
        let outcome = cursor.apply(&foreign, Ok(server_page(1, 10, 25)), Instant::now());
        assert!(matches!(
            outcome,
            ApplyOutcome::Discarded(StaleResponse::FilterMismatch { .. })
        ));
        assert!(cursor.is_loading());
    }

    #[test]
    fn test_echo_mismatch_becomes_server_error() {
        let mut cursor = cursor();
        let ticket = cursor.fetch_next().unwrap();
        let outcome = cursor.apply(&ticket, Ok(server_page(2, 10, 25)), Instant::now());
        assert!(matches!(
            outcome,
            ApplyOutcome::Failed {
                page: 1,
                error: FetchError::Server { .. }
            }
        ));
        assert!(cursor.items().is_empty());
    }

    #[test]
    fn test_suspend_cancels_in_flight_and_clears_failure() {
        let mut cursor = cursor();
        let first = cursor.fetch_next().unwrap();
        cursor.apply(&first, Ok(server_page(1, 10, 25)), Instant::now());
        let second = cursor.fetch_next().unwrap();
        cursor.suspend();
        assert_eq!(cursor.state(), CursorState::Ready);
        let outcome = cursor.apply(&second, Ok(server_page(2, 10, 25)), Instant::now());
        assert!(matches!(outcome, ApplyOutcome::Discarded(_)));
        assert_eq!(cursor.items().len(), 10);
    }

    #[test]
    fn test_request_carries_server_filters_only() {
        let mut cursor = PaginationCursor::<Payment>::new(
            PaymentFilter {
                status: Some(PaymentStatus::Failed),
                search: Some("asha".to_string()),
                ..PaymentFilter::default()
            },
            5,
        );
        let ticket = cursor.fetch_next().unwrap();
        let request = cursor.request_for(&ticket);
        assert_eq!(request.limit, 5);
        assert_eq!(
            request.params,
            vec![("status".to_string(), "failed".to_string())]
        );
    }

    #[test]
    fn test_loaded_at_is_stamped_by_first_page() {
        let mut cursor = cursor();
        let now = Instant::now();
        let ticket = cursor.fetch_next().unwrap();
        cursor.apply(&ticket, Ok(server_page(1, 10, 25)), now);
        assert_eq!(cursor.loaded_at(), Some(now));
    }
}
