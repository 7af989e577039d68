//! Session-scoped query cache keyed by filter-scoped [`CacheKey`]s.

use crate::cursor::PaginationCursor;
use crate::entities::ListEntity;
use crate::filter::{build_key, CacheKey};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Default time-to-live of a cached sequence.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// How [`QueryCache::acquire`] satisfied a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    /// No entry existed; a fresh idle cursor was created.
    Created,
    /// A fresh-enough (or still loading) entry was handed back as is.
    Reused,
    /// A stale entry was discarded and replaced by an idle cursor.
    Replaced,
}

#[derive(Debug)]
pub struct QueryCache<E: ListEntity> {
    entries: HashMap<CacheKey, PaginationCursor<E>>,
    ttl: Duration,
    /// Lowest generation no ticket handed out so far can carry. New cursors
    /// start here so a dropped sequence's late responses never match.
    next_generation: u64,
}

impl<E: ListEntity> QueryCache<E> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            next_generation: 0,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &CacheKey) -> Option<&PaginationCursor<E>> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &CacheKey) -> Option<&mut PaginationCursor<E>> {
        self.entries.get_mut(key)
    }

    /// Whether `cursor` may be reused at `now` without refetching.
    pub fn is_fresh(&self, cursor: &PaginationCursor<E>, now: Instant) -> bool {
        fresh_at(cursor, now, self.ttl)
    }

    /// Hand out the cursor for `filter`, reusing it when fresh enough.
    pub fn acquire(
        &mut self,
        filter: E::Filter,
        page_size: u32,
        now: Instant,
    ) -> (&mut PaginationCursor<E>, Acquisition) {
        let key = build_key(E::COLLECTION, &filter);
        let ttl = self.ttl;
        let page_size = page_size.max(1);
        let next_generation = &mut self.next_generation;
        match self.entries.entry(key) {
            Entry::Vacant(slot) => {
                tracing::trace!(key = %slot.key(), "starting pagination sequence");
                let generation = take_generation(next_generation);
                (
                    slot.insert(PaginationCursor::with_generation(filter, page_size, generation)),
                    Acquisition::Created,
                )
            }
            Entry::Occupied(slot) => {
                let reusable = {
                    let cursor = slot.get();
                    cursor.page_size() == page_size
                        && (cursor.in_flight().is_some() || fresh_at(cursor, now, ttl))
                };
                let cursor = slot.into_mut();
                if reusable {
                    (cursor, Acquisition::Reused)
                } else {
                    tracing::trace!(key = %cursor.key(), "replacing stale pagination sequence");
                    retire(next_generation, cursor);
                    let generation = take_generation(next_generation);
                    *cursor = PaginationCursor::with_generation(filter, page_size, generation);
                    (cursor, Acquisition::Replaced)
                }
            }
        }
    }

    /// Detach the screen from `key`: cancel its in-flight request and keep the
    /// pages only if some were fetched.
    pub fn release(&mut self, key: &CacheKey) {
        let Some(cursor) = self.entries.get_mut(key) else {
            return;
        };
        cursor.suspend();
        if cursor.page_count() == 0 {
            retire(&mut self.next_generation, cursor);
            self.entries.remove(key);
        }
    }

    /// Drop idle entries older than the TTL, except `active`.
    pub fn evict_expired(&mut self, now: Instant, active: Option<&CacheKey>) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        let next_generation = &mut self.next_generation;
        self.entries.retain(|key, cursor| {
            if Some(key) == active || cursor.in_flight().is_some() {
                return true;
            }
            let keep = fresh_at(cursor, now, ttl);
            if !keep {
                tracing::trace!(key = %key, "evicting expired sequence");
                retire(next_generation, cursor);
            }
            keep
        });
        before - self.entries.len()
    }
}

impl<E: ListEntity> Default for QueryCache<E> {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

fn take_generation(next: &mut u64) -> u64 {
    let generation = *next;
    *next += 1;
    generation
}

// Tickets of a dropped cursor may still be in flight; stay above them.
fn retire<E: ListEntity>(next: &mut u64, cursor: &PaginationCursor<E>) {
    *next = (*next).max(cursor.generation() + 1);
}

fn fresh_at<E: ListEntity>(cursor: &PaginationCursor<E>, now: Instant, ttl: Duration) -> bool {
    cursor
        .loaded_at()
        .is_some_and(|loaded| now.saturating_duration_since(loaded) <= ttl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{ApplyOutcome, CursorState};
    use crate::error::StaleResponse;
    use crate::entities::{Student, StudentStatus};
    use crate::filter::StudentFilter;
    use crate::identity::{CenterId, EntityIdType, StudentId};
    use crate::page::{Page, PageMeta};
    use chrono::Utc;
    use uuid::Uuid;

    fn page_one() -> Page<Student> {
        let student = Student {
            student_id: StudentId::new(Uuid::from_u128(1)),
            registration_number: "REG-0001".to_string(),
            first_name: "Asha".to_string(),
            last_name: "Verma".to_string(),
            email: None,
            phone: None,
            center_id: CenterId::new(Uuid::from_u128(2)),
            course: "Spoken English".to_string(),
            status: StudentStatus::Active,
            enrolled_at: Utc::now(),
        };
        Page::new(
            vec![student],
            PageMeta {
                current_page: 1,
                total_pages: 2,
                total_count: 2,
                limit: 1,
                has_next_page: true,
                has_prev_page: false,
            },
        )
    }

    fn load_first_page(cache: &mut QueryCache<Student>, filter: StudentFilter, now: Instant) -> CacheKey {
        let (cursor, _) = cache.acquire(filter, 1, now);
        let ticket = cursor.fetch_next().unwrap();
        cursor.apply(&ticket, Ok(page_one()), now);
        cursor.key().clone()
    }

    #[test]
    fn test_reuse_within_ttl_skips_refetch() {
        let mut cache = QueryCache::<Student>::new(Duration::from_secs(60));
        let start = Instant::now();
        let key = load_first_page(&mut cache, StudentFilter::default(), start);
        cache.release(&key);

        let (cursor, acquisition) =
            cache.acquire(StudentFilter::default(), 1, start + Duration::from_secs(30));
        assert_eq!(acquisition, Acquisition::Reused);
        assert_eq!(cursor.state(), CursorState::Ready);
        assert_eq!(cursor.items().len(), 1);
    }

    #[test]
    fn test_reuse_past_ttl_restarts() {
        let mut cache = QueryCache::<Student>::new(Duration::from_secs(60));
        let start = Instant::now();
        let key = load_first_page(&mut cache, StudentFilter::default(), start);
        cache.release(&key);

        let (cursor, acquisition) =
            cache.acquire(StudentFilter::default(), 1, start + Duration::from_secs(61));
        assert_eq!(acquisition, Acquisition::Replaced);
        assert_eq!(cursor.state(), CursorState::Idle);
        assert!(cursor.items().is_empty());
    }

    #[test]
    fn test_release_without_pages_drops_entry() {
        let mut cache = QueryCache::<Student>::default();
        let now = Instant::now();
        let (cursor, acquisition) = cache.acquire(StudentFilter::default(), 10, now);
        assert_eq!(acquisition, Acquisition::Created);
        let _ticket = cursor.fetch_next().unwrap();
        let key = cursor.key().clone();
        cache.release(&key);
        assert!(!cache.contains(&key));
    }

    #[test]
    fn test_recreated_sequence_rejects_dropped_ticket() {
        let mut cache = QueryCache::<Student>::default();
        let now = Instant::now();
        let (cursor, _) = cache.acquire(StudentFilter::default(), 1, now);
        let abandoned = cursor.fetch_next().unwrap();
        let key = cursor.key().clone();
        cache.release(&key);

        let (cursor, acquisition) = cache.acquire(StudentFilter::default(), 1, now);
        assert_eq!(acquisition, Acquisition::Created);
        let live = cursor.fetch_next().unwrap();
        assert_eq!(live.page, abandoned.page);
        assert_ne!(live.generation, abandoned.generation);

        let outcome = cursor.apply(&abandoned, Ok(page_one()), now);
        assert!(matches!(
            outcome,
            ApplyOutcome::Discarded(StaleResponse::Superseded { .. })
        ));
        assert!(matches!(
            cursor.apply(&live, Ok(page_one()), now),
            ApplyOutcome::Applied { page: 1, .. }
        ));
        assert_eq!(cursor.items().len(), 1);
    }

    #[test]
    fn test_distinct_filters_get_distinct_entries() {
        let mut cache = QueryCache::<Student>::default();
        let now = Instant::now();
        load_first_page(&mut cache, StudentFilter::default(), now);
        let searched = StudentFilter {
            search: Some("asha".to_string()),
            ..StudentFilter::default()
        };
        let (cursor, acquisition) = cache.acquire(searched, 1, now);
        assert_eq!(acquisition, Acquisition::Created);
        assert!(cursor.items().is_empty());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_evict_expired_spares_active_key() {
        let mut cache = QueryCache::<Student>::new(Duration::from_secs(10));
        let start = Instant::now();
        let active = load_first_page(&mut cache, StudentFilter::default(), start);
        load_first_page(
            &mut cache,
            StudentFilter {
                status: Some(StudentStatus::Graduated),
                ..StudentFilter::default()
            },
            start,
        );
        let evicted = cache.evict_expired(start + Duration::from_secs(11), Some(&active));
        assert_eq!(evicted, 1);
        assert!(cache.contains(&active));
    }
}
