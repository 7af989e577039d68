//! Campus Test Utilities
//!
//! Shared test infrastructure for the campus workspace:
//! - A scripted [`PageFetcher`] that serves pages from an in-memory dataset
//! - Proptest generators for the list entities and filters
//! - Fixtures for common scenarios

pub use campus_core::{
    CenterId, EntityIdType, FetchError, ListEntity, Page, PageFetcher, PageMeta, PageRequest,
    Payment, PaymentFilter, PaymentId, PaymentMethod, PaymentStatus, Student, StudentFilter,
    StudentId, StudentStatus, Timestamp,
};

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Semaphore;
use uuid::Uuid;

// ============================================================================
// SCRIPTED FETCHER
// ============================================================================

type Responder<E> = dyn Fn(&PageRequest) -> Result<Page<E>, FetchError> + Send + Sync;

/// Slice `items` into page `page` of size `limit` with consistent metadata.
pub fn paginate<E: Clone>(items: &[E], page: u32, limit: u32) -> Page<E> {
    let limit = limit.max(1);
    let total = items.len() as u64;
    let total_pages = u32::try_from(total.div_ceil(u64::from(limit))).unwrap_or(u32::MAX);
    let start = (page.saturating_sub(1) as usize).saturating_mul(limit as usize);
    let data = items
        .iter()
        .skip(start)
        .take(limit as usize)
        .cloned()
        .collect();
    Page::new(
        data,
        PageMeta {
            current_page: page,
            total_pages,
            total_count: total,
            limit,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        },
    )
}

/// In-memory [`PageFetcher`] driven by a responder closure.
///
/// Every request is recorded before it is served. Scripted failures take
/// precedence over the responder for the page they name. When built with
/// [`ScriptedFetcher::held`], each request waits for a permit granted by
/// [`ScriptedFetcher::release`], which lets tests observe in-flight state.
pub struct ScriptedFetcher<E: ListEntity> {
    responder: Box<Responder<E>>,
    failures: Mutex<HashMap<u32, VecDeque<FetchError>>>,
    requests: Mutex<Vec<PageRequest>>,
    gate: Option<Arc<Semaphore>>,
}

impl<E: ListEntity> ScriptedFetcher<E> {
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&PageRequest) -> Result<Page<E>, FetchError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            failures: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Serve `dataset` page by page, ignoring filters.
    pub fn paged(dataset: Vec<E>) -> Self {
        Self::from_fn(move |request| Ok(paginate(&dataset, request.page, request.limit)))
    }

    /// Hold every request until a permit is released.
    pub fn held(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Let `count` held requests proceed.
    pub fn release(&self, count: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(count);
        }
    }

    /// Fail the next request for `page` with `error`.
    pub fn fail_next(&self, page: u32, error: FetchError) {
        lock(&self.failures)
            .entry(page)
            .or_default()
            .push_back(error);
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        lock(&self.requests).clone()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Page numbers requested so far, in order.
    pub fn requested_pages(&self) -> Vec<u32> {
        lock(&self.requests).iter().map(|r| r.page).collect()
    }
}

#[async_trait]
impl<E: ListEntity> PageFetcher<E> for ScriptedFetcher<E> {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<E>, FetchError> {
        lock(&self.requests).push(request.clone());
        if let Some(gate) = &self.gate {
            match gate.acquire().await {
                Ok(permit) => permit.forget(),
                Err(_) => return Err(FetchError::network("fetcher closed")),
            }
        }
        let scripted = lock(&self.failures)
            .get_mut(&request.page)
            .and_then(VecDeque::pop_front);
        match scripted {
            Some(error) => Err(error),
            None => (self.responder)(request),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for the campus list entities.

    use super::*;
    use proptest::prelude::*;

    /// Generate a random UUID.
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    pub fn arb_student_id() -> impl Strategy<Value = StudentId> {
        arb_uuid().prop_map(StudentId::new)
    }

    pub fn arb_payment_id() -> impl Strategy<Value = PaymentId> {
        arb_uuid().prop_map(PaymentId::new)
    }

    pub fn arb_center_id() -> impl Strategy<Value = CenterId> {
        arb_uuid().prop_map(CenterId::new)
    }

    /// Generate a Timestamp within 2020-2030.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1577836800i64..1893456000i64).prop_map(|secs| {
            chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
        })
    }

    // === Enum Generators ===

    pub fn arb_student_status() -> impl Strategy<Value = StudentStatus> {
        prop::sample::select(StudentStatus::ALL.to_vec())
    }

    pub fn arb_payment_status() -> impl Strategy<Value = PaymentStatus> {
        prop::sample::select(PaymentStatus::ALL.to_vec())
    }

    pub fn arb_payment_method() -> impl Strategy<Value = PaymentMethod> {
        prop::sample::select(PaymentMethod::ALL.to_vec())
    }

    // === Struct Generators ===

    pub fn arb_student() -> impl Strategy<Value = Student> {
        (
            arb_student_id(),
            0u32..100_000,
            "[A-Z][a-z]{2,10}",
            "[A-Z][a-z]{2,10}",
            arb_center_id(),
            prop::sample::select(vec!["Tally", "Spoken English", "DCA", "Web Design"]),
            arb_student_status(),
            arb_timestamp(),
        )
            .prop_map(
                |(student_id, reg, first_name, last_name, center_id, course, status, enrolled_at)| {
                    Student {
                        student_id,
                        registration_number: format!("REG-{:05}", reg),
                        email: Some(format!("{}@example.com", first_name.to_lowercase())),
                        first_name,
                        last_name,
                        phone: None,
                        center_id,
                        course: course.to_string(),
                        status,
                        enrolled_at,
                    }
                },
            )
    }

    pub fn arb_payment() -> impl Strategy<Value = Payment> {
        (
            arb_payment_id(),
            0u32..100_000,
            arb_student_id(),
            "[A-Z][a-z]{2,10} [A-Z][a-z]{2,10}",
            1i64..10_000_000,
            arb_payment_method(),
            arb_payment_status(),
            arb_timestamp(),
        )
            .prop_map(
                |(payment_id, receipt, student_id, student_name, amount_minor, method, status, paid_at)| {
                    Payment {
                        payment_id,
                        receipt_number: format!("RCPT-{:05}", receipt),
                        student_id,
                        student_name,
                        amount_minor,
                        currency: "INR".to_string(),
                        method,
                        status,
                        paid_at,
                    }
                },
            )
    }

    pub fn arb_student_filter() -> impl Strategy<Value = StudentFilter> {
        (
            prop::option::of(arb_center_id()),
            prop::option::of("[A-Za-z ]{1,12}"),
            prop::option::of(arb_student_status()),
            prop::option::of("[a-z]{1,8}"),
        )
            .prop_map(|(center_id, course, status, search)| StudentFilter {
                center_id,
                course,
                status,
                search,
            })
    }

    pub fn arb_payment_filter() -> impl Strategy<Value = PaymentFilter> {
        (
            prop::option::of(arb_student_id()),
            prop::option::of(arb_payment_status()),
            prop::option::of(arb_payment_method()),
            prop::option::of("[a-z]{1,8}"),
        )
            .prop_map(|(student_id, status, method, search)| PaymentFilter {
                student_id,
                status,
                method,
                search,
            })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Deterministic fixtures. Item `n` always has the same identity.

    use super::*;

    const COURSES: [&str; 3] = ["Tally", "Spoken English", "DCA"];
    const NAMES: [&str; 6] = ["Asha", "Ravi", "Meena", "Kiran", "Farhan", "Lakshmi"];

    pub fn center() -> CenterId {
        CenterId::new(Uuid::from_u128(0xC0))
    }

    pub fn student(n: u32) -> Student {
        let index = n as usize;
        Student {
            student_id: StudentId::new(Uuid::from_u128(u128::from(n) + 1)),
            registration_number: format!("REG-{:05}", n),
            first_name: NAMES[index % NAMES.len()].to_string(),
            last_name: format!("Learner{}", n),
            email: Some(format!("learner{}@example.com", n)),
            phone: None,
            center_id: center(),
            course: COURSES[index % COURSES.len()].to_string(),
            status: StudentStatus::Active,
            enrolled_at: Utc::now(),
        }
    }

    /// `count` distinct students, numbered from 0.
    pub fn students(count: u32) -> Vec<Student> {
        (0..count).map(student).collect()
    }

    pub fn payment(n: u32) -> Payment {
        let index = n as usize;
        Payment {
            payment_id: PaymentId::new(Uuid::from_u128(u128::from(n) + 0x1_0000)),
            receipt_number: format!("RCPT-{:05}", n),
            student_id: StudentId::new(Uuid::from_u128(u128::from(n % 7) + 1)),
            student_name: format!("{} Learner{}", NAMES[index % NAMES.len()], n % 7),
            amount_minor: 100_000 + i64::from(n) * 25,
            currency: "INR".to_string(),
            method: PaymentMethod::ALL[index % PaymentMethod::ALL.len()],
            status: PaymentStatus::Completed,
            paid_at: Utc::now(),
        }
    }

    /// `count` distinct payments, numbered from 0.
    pub fn payments(count: u32) -> Vec<Payment> {
        (0..count).map(payment).collect()
    }

    /// Fetcher serving `count` students.
    pub fn paged_students(count: u32) -> ScriptedFetcher<Student> {
        ScriptedFetcher::paged(students(count))
    }

    /// Fetcher serving `count` payments.
    pub fn paged_payments(count: u32) -> ScriptedFetcher<Payment> {
        ScriptedFetcher::paged(payments(count))
    }
}
