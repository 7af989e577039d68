//! Filter sets and filter-scoped cache keys
//!
//! Every list screen owns a tagged filter type. Canonicalization turns it into
//! an ordered name/value map with absent and blank values removed, so two
//! logically identical filter sets always collide on the same [`CacheKey`]
//! and any difference in a recognized field yields a different one.

use crate::entities::{PaymentMethod, PaymentStatus, StudentStatus};
use crate::identity::{CenterId, StudentId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Paged collections exposed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Students,
    Payments,
}

impl Collection {
    /// Path segment of the list endpoint.
    pub fn as_path(&self) -> &'static str {
        match self {
            Collection::Students => "students",
            Collection::Payments => "payments",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

/// Where a filter is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterScope {
    /// Sent as a query parameter; the server narrows the page.
    Server,
    /// Applied to each fetched page by the reducer.
    Client,
}

/// One named filter value produced by a [`FilterSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterParam {
    pub name: &'static str,
    pub value: Option<String>,
    pub scope: FilterScope,
}

impl FilterParam {
    pub fn server(name: &'static str, value: Option<String>) -> Self {
        Self {
            name,
            value,
            scope: FilterScope::Server,
        }
    }

    pub fn client(name: &'static str, value: Option<String>) -> Self {
        Self {
            name,
            value,
            scope: FilterScope::Client,
        }
    }
}

/// A per-collection, explicitly typed filter set.
pub trait FilterSet: Clone + Default + fmt::Debug + PartialEq + Send + Sync + 'static {
    /// All recognized filter fields with their current values.
    fn params(&self) -> Vec<FilterParam>;

    /// Free-text search applied on the client, if any.
    fn search(&self) -> Option<&str>;

    /// Replace the free-text search.
    fn set_search(&mut self, search: Option<String>);

    /// Canonical form over every field, used for cache identity.
    fn canonical(&self) -> CanonicalFilters {
        CanonicalFilters::from_params(self.params())
    }

    /// Canonical query parameters the server is expected to apply.
    fn server_params(&self) -> Vec<(String, String)> {
        let server: Vec<FilterParam> = self
            .params()
            .into_iter()
            .filter(|param| param.scope == FilterScope::Server)
            .collect();
        CanonicalFilters::from_params(server).into_pairs()
    }
}

/// Canonicalized filter values: trimmed, non-empty, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalFilters(BTreeMap<String, String>);

impl CanonicalFilters {
    /// Canonicalize arbitrary name/value pairs. Later duplicates win.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut map = BTreeMap::new();
        for (name, value) in pairs {
            let name = name.into();
            let value = value.as_ref().trim();
            if name.trim().is_empty() || value.is_empty() {
                continue;
            }
            map.insert(name.trim().to_string(), value.to_string());
        }
        Self(map)
    }

    pub fn from_params(params: Vec<FilterParam>) -> Self {
        Self::from_pairs(
            params
                .into_iter()
                .filter_map(|param| param.value.map(|value| (param.name, value))),
        )
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.0.into_iter().collect()
    }
}

impl fmt::Display for CanonicalFilters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (name, value)) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("&")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        Ok(())
    }
}

/// Identity of one pagination sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    collection: Collection,
    filters: CanonicalFilters,
}

impl CacheKey {
    pub fn new(collection: Collection, filters: CanonicalFilters) -> Self {
        Self {
            collection,
            filters,
        }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn filters(&self) -> &CanonicalFilters {
        &self.filters
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.filters.is_empty() {
            write!(f, "{}", self.collection)
        } else {
            write!(f, "{}?{}", self.collection, self.filters)
        }
    }
}

/// Derive the cache key of `collection` under `filters`.
pub fn build_key<F: FilterSet>(collection: Collection, filters: &F) -> CacheKey {
    CacheKey::new(collection, filters.canonical())
}

// ============================================================================
// PER-COLLECTION FILTERS
// ============================================================================

/// Filters of the student register.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentFilter {
    pub center_id: Option<CenterId>,
    pub course: Option<String>,
    pub status: Option<StudentStatus>,
    pub search: Option<String>,
}

impl FilterSet for StudentFilter {
    fn params(&self) -> Vec<FilterParam> {
        vec![
            FilterParam::server("centerId", self.center_id.map(|id| id.to_string())),
            FilterParam::server("course", self.course.clone()),
            FilterParam::server("status", self.status.map(|s| s.as_str().to_string())),
            FilterParam::client("search", self.search.clone()),
        ]
    }

    fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    fn set_search(&mut self, search: Option<String>) {
        self.search = search;
    }
}

/// Filters of the payment ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentFilter {
    pub student_id: Option<StudentId>,
    pub status: Option<PaymentStatus>,
    pub method: Option<PaymentMethod>,
    pub search: Option<String>,
}

impl FilterSet for PaymentFilter {
    fn params(&self) -> Vec<FilterParam> {
        vec![
            FilterParam::server("studentId", self.student_id.map(|id| id.to_string())),
            FilterParam::server("status", self.status.map(|s| s.as_str().to_string())),
            FilterParam::server("method", self.method.map(|m| m.as_str().to_string())),
            FilterParam::client("search", self.search.clone()),
        ]
    }

    fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    fn set_search(&mut self, search: Option<String>) {
        self.search = search;
    }
}
