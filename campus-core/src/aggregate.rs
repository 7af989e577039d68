//! Aggregate item list and the per-page filter/dedup pass.
//!
//! Only the incoming page is filtered; accepted items are never revisited, so
//! the aggregate only grows and keeps its order. Duplicate identities keep the
//! first-seen entry in place.

use crate::entities::ListEntity;
use crate::page::Page;
use std::collections::HashSet;

/// Counters reported by one reduce pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReduceStats {
    pub accepted: usize,
    pub duplicates: usize,
    pub filtered: usize,
}

/// Deduplicated, flattened items of all pages fetched for one cache key.
#[derive(Debug, Clone)]
pub struct Aggregate<E: ListEntity> {
    items: Vec<E>,
    seen: HashSet<E::Key>,
}

impl<E: ListEntity> Default for Aggregate<E> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
        }
    }
}

impl<E: ListEntity> Aggregate<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[E] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, key: &E::Key) -> bool {
        self.seen.contains(key)
    }

    /// Append the items of one page that pass `filter` and are not yet present.
    pub fn extend_from_page(&mut self, page: &Page<E>, filter: &E::Filter) -> ReduceStats {
        let mut stats = ReduceStats::default();
        for item in page.items() {
            if !item.matches_client_filters(filter) {
                stats.filtered += 1;
                continue;
            }
            if !self.seen.insert(item.identity()) {
                stats.duplicates += 1;
                continue;
            }
            self.items.push(item.clone());
            stats.accepted += 1;
        }
        stats
    }
}

/// Fold `page` into `existing` under `filter`.
pub fn reduce<E: ListEntity>(
    mut existing: Aggregate<E>,
    page: &Page<E>,
    filter: &E::Filter,
) -> Aggregate<E> {
    existing.extend_from_page(page, filter);
    existing
}
