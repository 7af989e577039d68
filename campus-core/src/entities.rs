//! Core entity structures listed by the console

use crate::error::ParseEnumError;
use crate::filter::{Collection, FilterSet, PaymentFilter, StudentFilter};
use crate::identity::{CenterId, PaymentId, StudentId, Timestamp};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

// ============================================================================
// ENUMS
// ============================================================================

/// Enrollment status of a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentStatus {
    Active,
    Inactive,
    Graduated,
    Suspended,
}

impl StudentStatus {
    pub const ALL: [StudentStatus; 4] = [
        StudentStatus::Active,
        StudentStatus::Inactive,
        StudentStatus::Graduated,
        StudentStatus::Suspended,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StudentStatus::Active => "active",
            StudentStatus::Inactive => "inactive",
            StudentStatus::Graduated => "graduated",
            StudentStatus::Suspended => "suspended",
        }
    }
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudentStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError {
                kind: "student status",
                value: s.to_string(),
            })
    }
}

/// Settlement status of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 4] = [
        PaymentStatus::Pending,
        PaymentStatus::Completed,
        PaymentStatus::Failed,
        PaymentStatus::Refunded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError {
                kind: "payment status",
                value: s.to_string(),
            })
    }
}

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Upi,
    BankTransfer,
    Cheque,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::Upi,
        PaymentMethod::BankTransfer,
        PaymentMethod::Cheque,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Upi => "upi",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Cheque => "cheque",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError {
                kind: "payment method",
                value: s.to_string(),
            })
    }
}

// ============================================================================
// LIST ENTITY CONTRACT
// ============================================================================

/// An entity that can be streamed page by page into a list screen.
pub trait ListEntity: Clone + fmt::Debug + Send + Sync + DeserializeOwned + 'static {
    /// Unique identity used for deduplication.
    type Key: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    /// Tagged filter set of this collection.
    type Filter: FilterSet;

    const COLLECTION: Collection;

    fn identity(&self) -> Self::Key;

    /// Text fields inspected by free-text search.
    fn search_fields(&self) -> Vec<&str>;

    /// Every whitespace-separated term of `query` must occur, case
    /// insensitively, in at least one search field.
    fn matches_search(&self, query: &str) -> bool {
        let fields: Vec<String> = self
            .search_fields()
            .into_iter()
            .map(str::to_lowercase)
            .collect();
        query
            .split_whitespace()
            .map(str::to_lowercase)
            .all(|term| fields.iter().any(|field| field.contains(&term)))
    }

    /// Apply the client-side part of `filter` to this item.
    fn matches_client_filters(&self, filter: &Self::Filter) -> bool {
        match filter.search() {
            Some(query) if !query.trim().is_empty() => self.matches_search(query),
            _ => true,
        }
    }
}

// ============================================================================
// ENTITIES
// ============================================================================

/// Student - a registered learner attached to a center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub student_id: StudentId,
    pub registration_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub center_id: CenterId,
    pub course: String,
    pub status: StudentStatus,
    pub enrolled_at: Timestamp,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl ListEntity for Student {
    type Key = StudentId;
    type Filter = StudentFilter;

    const COLLECTION: Collection = Collection::Students;

    fn identity(&self) -> StudentId {
        self.student_id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.registration_number.as_str(),
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.course.as_str(),
        ];
        fields.extend(self.email.as_deref());
        fields.extend(self.phone.as_deref());
        fields
    }
}

/// Payment - one fee receipt recorded against a student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub payment_id: PaymentId,
    pub receipt_number: String,
    pub student_id: StudentId,
    pub student_name: String,
    /// Amount in minor currency units.
    pub amount_minor: i64,
    pub currency: String,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub paid_at: Timestamp,
}

impl Payment {
    /// Amount formatted with two decimals, e.g. `INR 1250.00`.
    pub fn display_amount(&self) -> String {
        let sign = if self.amount_minor < 0 { "-" } else { "" };
        let abs = self.amount_minor.unsigned_abs();
        format!("{} {}{}.{:02}", self.currency, sign, abs / 100, abs % 100)
    }
}

impl ListEntity for Payment {
    type Key = PaymentId;
    type Filter = PaymentFilter;

    const COLLECTION: Collection = Collection::Payments;

    fn identity(&self) -> PaymentId {
        self.payment_id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.receipt_number.as_str(),
            self.student_name.as_str(),
            self.method.as_str(),
        ]
    }
}
