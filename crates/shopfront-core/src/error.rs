//! # Error Types
//!
//! Domain errors for shopfront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  shopfront-core (this file)                                             │
//! │  ├── CoreError        - cart, tab and tender rule violations            │
//! │  ├── ValidationError  - malformed operator input                        │
//! │  └── StoreError       - key-value persistence port failures             │
//! │                                                                         │
//! │  shopfront-db                                                           │
//! │  └── DbError          - SQLite collaborator failures                    │
//! │                                                                         │
//! │  register app                                                           │
//! │  └── ApiError         - what the cashier's screen receives              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                   │
//! │                             DbError ─┴──► ApiError → Front end          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reconciliation outcomes (`Reject`, `NeedsConfirmation`) are *values*
//! returned by [`crate::reconcile`], not errors.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by cart, tab and split-tender operations.
///
/// Every variant is recoverable: the attempted mutation was not applied and
/// the session is unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Catalog has no item for the scanned SKU or id.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Item has no stock at all, so no line was created.
    #[error("{name} is out of stock")]
    OutOfStock { item_id: String, name: String },

    /// Requested quantity is above the stock snapshot taken when the item
    /// was added.
    ///
    /// ## User Workflow
    /// ```text
    /// Scan "RICE-5KG" again (line qty 3, ceiling 3)
    ///      │
    ///      ▼
    /// StockExceeded { available: 3, requested: 4 }
    ///      │
    ///      ▼
    /// Line stays at 3; UI shows "Only 3 in stock"
    /// ```
    #[error("Only {available} of {name} in stock, requested {requested}")]
    StockExceeded {
        item_id: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// The cart has no line for this item.
    #[error("Item {0} is not in the cart")]
    LineNotFound(String),

    #[error("Cart session not found: {0}")]
    SessionNotFound(String),

    #[error("Parked order not found: {0}")]
    ParkedOrderNotFound(String),

    /// Operation needs at least one line (parking, checkout).
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Split tenders do not add up to the amount due.
    #[error("Split tenders total {actual}, amount due is {expected}")]
    SplitMismatch { expected: Money, actual: Money },

    #[error("No tender at position {0}")]
    TenderNotFound(usize),

    #[error("Invalid tender: {reason}")]
    InvalidTender { reason: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before any business rule runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Store Error
// =============================================================================

/// Failures of the client-local key-value store.
///
/// Reads never produce these: a missing or unreadable blob is "no saved
/// state". Only writes can fail.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O failed for key {key}: {message}")]
    Io { key: String, message: String },

    #[error("Could not encode {key}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
