//! Property-Based Tests for the Pagination Cursor
//!
//! **Property 1: Monotonic page order** - for a fixed key, the pages handed
//! out by `fetch_next` form 1, 2, 3, ... with no gaps or repeats.
//!
//! **Property 2: Dedup invariant** - no two aggregate items share an identity,
//! whatever overlap the server introduces between pages.
//!
//! **Property 3: Exhaustion terminality** - once the last page has landed no
//! further ticket is issued until `restart`.
//!
//! **Property 4: Canonical keys** - filter pair order never changes the key.

use campus_core::{
    build_key, ApplyOutcome, CacheKey, CanonicalFilters, Collection, CursorState, EntityIdType,
    Page, PageMeta, PaginationCursor, Payment, PaymentFilter, PaymentId, PaymentMethod,
    PaymentStatus, StudentId,
};
use chrono::Utc;
use proptest::prelude::*;
use std::collections::HashSet;
use std::time::Instant;
use uuid::Uuid;

// ============================================================================
// FIXTURES
// ============================================================================

fn payment(n: u128) -> Payment {
    Payment {
        payment_id: PaymentId::new(Uuid::from_u128(n)),
        receipt_number: format!("RCPT-{:05}", n),
        student_id: StudentId::new(Uuid::from_u128(1)),
        student_name: format!("Student {}", n),
        amount_minor: 10_000,
        currency: "INR".to_string(),
        method: PaymentMethod::Card,
        status: PaymentStatus::Completed,
        paid_at: Utc::now(),
    }
}

/// Server page where each page re-sends the last `overlap` items of the
/// previous page, as happens when rows are deleted between requests.
fn overlapping_page(page: u32, limit: u32, total: u32, overlap: u32) -> Page<Payment> {
    let total_pages = total.div_ceil(limit);
    let start = ((page - 1) * limit).saturating_sub(if page > 1 { overlap } else { 0 });
    let end = ((page - 1) * limit + limit).min(total);
    let items = (start..end).map(|n| payment(u128::from(n))).collect();
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

fn drain(cursor: &mut PaginationCursor<Payment>, limit: u32, total: u32, overlap: u32) -> Vec<u32> {
    let mut requested = Vec::new();
    while let Some(ticket) = cursor.fetch_next() {
        requested.push(ticket.page);
        let page = overlapping_page(ticket.page, limit, total, overlap);
        let outcome = cursor.apply(&ticket, Ok(page), Instant::now());
        assert!(matches!(outcome, ApplyOutcome::Applied { .. }));
    }
    requested
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #[test]
    fn prop_pages_are_requested_in_order(limit in 1u32..20, total in 0u32..200) {
        let mut cursor = PaginationCursor::<Payment>::new(PaymentFilter::default(), limit);
        let requested = drain(&mut cursor, limit, total, 0);

        let expected_pages = total.div_ceil(limit).max(1);
        let expected: Vec<u32> = (1..=expected_pages).collect();
        prop_assert_eq!(requested, expected);
        prop_assert_eq!(cursor.items().len() as u32, total);
    }

    #[test]
    fn prop_aggregate_never_repeats_identity(
        limit in 2u32..15,
        total in 1u32..120,
        overlap in 0u32..5,
    ) {
        let overlap = overlap.min(limit - 1);
        let mut cursor = PaginationCursor::<Payment>::new(PaymentFilter::default(), limit);
        drain(&mut cursor, limit, total, overlap);

        let ids: HashSet<PaymentId> = cursor.items().iter().map(|p| p.payment_id).collect();
        prop_assert_eq!(ids.len(), cursor.items().len());
        prop_assert_eq!(cursor.items().len() as u32, total);
    }

    #[test]
    fn prop_exhausted_cursor_issues_nothing(limit in 1u32..10, total in 0u32..60, extra in 1usize..5) {
        let mut cursor = PaginationCursor::<Payment>::new(PaymentFilter::default(), limit);
        drain(&mut cursor, limit, total, 0);
        prop_assert_eq!(cursor.state(), CursorState::Exhausted);
        for _ in 0..extra {
            prop_assert!(cursor.fetch_next().is_none());
        }
        let restarted = cursor.restart();
        prop_assert_eq!(restarted.page, 1);
    }

    #[test]
    fn prop_filter_order_is_irrelevant(
        pairs in proptest::collection::btree_map("[a-z]{1,6}", "[a-z0-9]{1,6}", 0..6),
    ) {
        let forward: Vec<(String, String)> = pairs.clone().into_iter().collect();
        let mut backward = forward.clone();
        backward.reverse();

        let a = CacheKey::new(Collection::Students, CanonicalFilters::from_pairs(forward));
        let b = CacheKey::new(Collection::Students, CanonicalFilters::from_pairs(backward));
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_differing_status_gives_different_keys(a in 0usize..4, b in 0usize..4) {
        prop_assume!(a != b);
        let left = PaymentFilter { status: Some(PaymentStatus::ALL[a]), ..PaymentFilter::default() };
        let right = PaymentFilter { status: Some(PaymentStatus::ALL[b]), ..PaymentFilter::default() };
        prop_assert_ne!(
            build_key(Collection::Payments, &left),
            build_key(Collection::Payments, &right)
        );
    }
}

#[test]
fn test_twenty_five_items_over_three_pages() {
    let mut cursor = PaginationCursor::<Payment>::new(PaymentFilter::default(), 10);
    let requested = drain(&mut cursor, 10, 25, 0);
    assert_eq!(requested, vec![1, 2, 3]);
    assert_eq!(cursor.items().len(), 25);
    assert!(!cursor.has_next_page());
    assert!(cursor.fetch_next().is_none());
}
