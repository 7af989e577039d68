//! Error types for the paginated list engine

use crate::filter::CacheKey;
use thiserror::Error;

/// Fallback shown when a server failure carries no readable message.
pub const GENERIC_SERVER_MESSAGE: &str = "The server could not complete the request";

/// A failed page fetch, as seen by the pagination cursor and the UI.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The request never reached the server or no response came back.
    #[error("Network error: {reason}")]
    Network { reason: String },

    /// The server answered with a failure status, or with a body that does
    /// not satisfy the page schema (`status` is `None` in that case).
    #[error("{message}")]
    Server { status: Option<u16>, message: String },
}

impl FetchError {
    pub fn network(reason: impl Into<String>) -> Self {
        Self::Network {
            reason: reason.into(),
        }
    }

    pub fn server(status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            GENERIC_SERVER_MESSAGE.to_string()
        } else {
            message
        };
        Self::Server { status, message }
    }

    /// Whether the transport layer may retry this failure on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Text suitable for the inline error line of a list screen.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network { .. } => "Unable to reach the server. Check your connection.".to_string(),
            Self::Server { message, .. } => message.clone(),
        }
    }
}

impl From<SchemaViolation> for FetchError {
    fn from(err: SchemaViolation) -> Self {
        Self::server(None, format!("Invalid page response: {}", err))
    }
}

/// Page-response schema failures detected at the fetcher boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaViolation {
    #[error("limit must be > 0")]
    ZeroLimit,

    #[error("currentPage must be >= 1")]
    ZeroCurrentPage,

    #[error("hasNextPage={has_next_page} contradicts currentPage={current_page} of totalPages={total_pages}")]
    NextPageMismatch {
        current_page: u32,
        total_pages: u32,
        has_next_page: bool,
    },

    #[error("page carries {items} items but limit is {limit}")]
    Oversized { items: usize, limit: u32 },

    #[error("requested page {requested} but server returned page {received}")]
    PageMismatch { requested: u32, received: u32 },

    #[error("malformed body: {0}")]
    Malformed(String),
}

/// A fetch completion that no longer belongs to the live sequence.
///
/// Never shown to the user; the response is dropped and logged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StaleResponse {
    #[error("response for {received} arrived while {expected} is active")]
    FilterMismatch { expected: CacheKey, received: CacheKey },

    #[error("response belongs to superseded generation {generation}")]
    Superseded { generation: u64 },

    #[error("no request for page {page} is in flight")]
    NotInFlight { page: u32 },
}

/// Error when parsing an invalid enum string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}
