//! Shared primitives for all Rust crates in Shiftledger.

#![forbid(unsafe_code)]

/// Request-scoped tenant context.
pub mod tenant_context;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use tenant_context::TenantContext;

/// Result type used across Shiftledger crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    ///
    /// Surrounding whitespace is trimmed before it is stored.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Tenant identifier used as the partition key for every persisted resource.
///
/// Tenants are end-user accounts keyed by the chat platform's numeric user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantId(i64);

impl TenantId {
    /// Creates a tenant identifier, rejecting zero and negative values.
    pub fn new(value: i64) -> AppResult<Self> {
        if value <= 0 {
            return Err(AppError::Validation(format!(
                "tenant id must be a positive integer, got {value}"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the underlying integer value.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl FromStr for TenantId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parsed = value.trim().parse::<i64>().map_err(|error| {
            AppError::Validation(format!("invalid tenant id '{value}': {error}"))
        })?;

        Self::new(parsed)
    }
}

impl Display for TenantId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist for the calling tenant.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller could not be authenticated or resolved to a tenant.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Free-tier creation limit for the period has been reached.
    #[error("quota exceeded: limit {limit}, current {current}; upgrade required")]
    QuotaExceeded {
        /// Configured number of free records per period.
        limit: u32,
        /// Records already stored in the period.
        current: u32,
    },

    /// Storage failure such as a constraint violation or a lost connection.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Storage failure caused by waiting too long for a tenant's lock.
    #[error("persistence error: lock timeout: {0}")]
    LockTimeout(String),

    /// External calendar synchronization failed.
    #[error("sync failure: {0}")]
    SyncFailure(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
