//! Infinite query: the subscription a list screen reads from.
//!
//! Fetches run on spawned tasks and report back through a per-query channel.
//! Completions are applied only from the event loop (via [`InfiniteQuery::drain`]
//! or [`InfiniteQuery::settle`]), so the cache is never written concurrently.
//! A completion whose key is no longer the active one is dropped.

use crate::events::ConsoleEvent;
use crate::nav::Screen;
use campus_core::{
    build_key, Acquisition, ApplyOutcome, CacheKey, CursorState, FetchError, FetchTicket,
    ListEntity, Page, PageFetcher, PageRequest, PaginationCursor, QueryCache, StaleResponse,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// A finished fetch waiting to be applied.
#[derive(Debug)]
pub struct FetchCompletion<E: ListEntity> {
    pub ticket: FetchTicket,
    pub result: Result<Page<E>, FetchError>,
}

pub struct InfiniteQuery<E: ListEntity> {
    screen: Screen,
    fetcher: Arc<dyn PageFetcher<E>>,
    cache: QueryCache<E>,
    filter: E::Filter,
    active: CacheKey,
    page_size: u32,
    mounted: bool,
    completions_tx: mpsc::UnboundedSender<FetchCompletion<E>>,
    completions_rx: mpsc::UnboundedReceiver<FetchCompletion<E>>,
    events: Option<mpsc::Sender<ConsoleEvent>>,
}

impl<E: ListEntity> InfiniteQuery<E> {
    pub fn new<P>(
        screen: Screen,
        fetcher: Arc<P>,
        filter: E::Filter,
        page_size: u32,
        ttl: Duration,
    ) -> Self
    where
        P: PageFetcher<E> + 'static,
    {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            screen,
            fetcher,
            cache: QueryCache::new(ttl),
            active: build_key(E::COLLECTION, &filter),
            filter,
            page_size: page_size.max(1),
            mounted: false,
            completions_tx,
            completions_rx,
            events: None,
        }
    }

    /// Wake the event loop with [`ConsoleEvent::FetchSettled`] on completion.
    pub fn with_events(mut self, events: mpsc::Sender<ConsoleEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn key(&self) -> &CacheKey {
        &self.active
    }

    pub fn filter(&self) -> &E::Filter {
        &self.filter
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn cache(&self) -> &QueryCache<E> {
        &self.cache
    }

    // === Subscription surface ===

    pub fn items(&self) -> &[E] {
        self.cursor().map(PaginationCursor::items).unwrap_or(&[])
    }

    pub fn state(&self) -> CursorState {
        self.cursor()
            .map(PaginationCursor::state)
            .unwrap_or(CursorState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        self.state() == CursorState::Loading
    }

    pub fn is_fetching_next_page(&self) -> bool {
        self.state() == CursorState::FetchingNext
    }

    pub fn is_error(&self) -> bool {
        self.cursor().is_some_and(PaginationCursor::is_error)
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.cursor().and_then(PaginationCursor::error)
    }

    pub fn has_next_page(&self) -> bool {
        self.cursor().is_some_and(PaginationCursor::has_next_page)
    }

    pub fn is_in_flight(&self) -> bool {
        self.cursor().is_some_and(|c| c.in_flight().is_some())
    }

    pub fn current_page(&self) -> Option<u32> {
        self.cursor().and_then(PaginationCursor::current_page)
    }

    pub fn total_count(&self) -> Option<u64> {
        self.cursor().and_then(PaginationCursor::total_count)
    }

    // === Lifecycle ===

    /// Attach the screen. Starts page 1 unless a fresh sequence is cached.
    pub fn mount(&mut self) -> bool {
        if self.mounted {
            return false;
        }
        self.mounted = true;
        self.start_active()
    }

    /// Detach the screen, logically cancelling its in-flight request.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.cache.release(&self.active);
        let evicted = self.cache.evict_expired(now(), None);
        tracing::debug!(screen = ?self.screen, key = %self.active, evicted, "query unmounted");
    }

    /// Switch to a new filter set. A different key starts a fresh sequence.
    pub fn set_filter(&mut self, filter: E::Filter) -> bool {
        let key = build_key(E::COLLECTION, &filter);
        self.filter = filter;
        if key == self.active {
            return false;
        }
        tracing::debug!(screen = ?self.screen, from = %self.active, to = %key, "filter changed");
        if self.mounted {
            self.cache.release(&self.active);
        }
        self.active = key;
        self.cache.evict_expired(now(), Some(&self.active));
        if self.mounted {
            self.start_active()
        } else {
            false
        }
    }

    /// Request the next page. No-op while loading, exhausted or failed.
    pub fn fetch_next_page(&mut self) -> bool {
        if !self.mounted {
            return false;
        }
        let Some(cursor) = self.cache.get_mut(&self.active) else {
            return false;
        };
        match cursor.fetch_next() {
            Some(ticket) => {
                let request = cursor.request_for(&ticket);
                self.spawn(ticket, request);
                true
            }
            None => false,
        }
    }

    /// Drop every page of the active key and reload from page 1.
    pub fn refetch(&mut self) -> bool {
        if !self.mounted {
            return false;
        }
        let Some(cursor) = self.cache.get_mut(&self.active) else {
            return self.start_active();
        };
        let ticket = cursor.restart();
        let request = cursor.request_for(&ticket);
        self.spawn(ticket, request);
        true
    }

    /// Re-attempt the page that failed.
    pub fn retry(&mut self) -> bool {
        if !self.mounted {
            return false;
        }
        let Some(cursor) = self.cache.get_mut(&self.active) else {
            return false;
        };
        match cursor.retry() {
            Some(ticket) => {
                let request = cursor.request_for(&ticket);
                self.spawn(ticket, request);
                true
            }
            None => false,
        }
    }

    // === Completion handling ===

    /// Wait for the next completion and apply it.
    pub async fn settle(&mut self) -> Option<ApplyOutcome> {
        let completion = self.completions_rx.recv().await?;
        Some(self.apply(completion))
    }

    /// Apply every completion that has already arrived.
    pub fn drain(&mut self) -> Vec<ApplyOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(completion) = self.completions_rx.try_recv() {
            outcomes.push(self.apply(completion));
        }
        outcomes
    }

    fn apply(&mut self, completion: FetchCompletion<E>) -> ApplyOutcome {
        let FetchCompletion { ticket, result } = completion;
        let outcome = if ticket.key != self.active {
            ApplyOutcome::Discarded(StaleResponse::FilterMismatch {
                expected: self.active.clone(),
                received: ticket.key.clone(),
            })
        } else {
            match self.cache.get_mut(&ticket.key) {
                Some(cursor) => cursor.apply(&ticket, result, now()),
                None => ApplyOutcome::Discarded(StaleResponse::NotInFlight { page: ticket.page }),
            }
        };

        match &outcome {
            ApplyOutcome::Applied { page, stats } => tracing::debug!(
                screen = ?self.screen,
                key = %ticket.key,
                page,
                accepted = stats.accepted,
                duplicates = stats.duplicates,
                filtered = stats.filtered,
                "page applied"
            ),
            ApplyOutcome::Failed { page, error } => tracing::warn!(
                screen = ?self.screen,
                key = %ticket.key,
                page,
                error = %error,
                "page fetch failed"
            ),
            ApplyOutcome::Discarded(reason) => tracing::debug!(
                screen = ?self.screen,
                key = %ticket.key,
                page = ticket.page,
                reason = %reason,
                "stale response discarded"
            ),
        }
        outcome
    }

    fn cursor(&self) -> Option<&PaginationCursor<E>> {
        self.cache.get(&self.active)
    }

    fn start_active(&mut self) -> bool {
        let (cursor, acquisition) = self.cache.acquire(self.filter.clone(), self.page_size, now());
        tracing::debug!(screen = ?self.screen, key = %cursor.key(), ?acquisition, "sequence acquired");
        if acquisition == Acquisition::Reused {
            return false;
        }
        let Some(ticket) = cursor.fetch_next() else {
            return false;
        };
        let request = cursor.request_for(&ticket);
        self.spawn(ticket, request);
        true
    }

    fn spawn(&self, ticket: FetchTicket, request: PageRequest) {
        tracing::debug!(
            screen = ?self.screen,
            key = %ticket.key,
            page = ticket.page,
            generation = ticket.generation,
            "fetch issued"
        );
        let fetcher = Arc::clone(&self.fetcher);
        let completions = self.completions_tx.clone();
        let events = self.events.clone();
        let screen = self.screen;
        tokio::spawn(async move {
            let result = fetcher.fetch_page(&request).await;
            if completions.send(FetchCompletion { ticket, result }).is_err() {
                return;
            }
            if let Some(events) = events {
                let _ = events.try_send(ConsoleEvent::FetchSettled { screen });
            }
        });
    }
}

fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}
