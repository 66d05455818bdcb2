//! # API Error Type
//!
//! Unified error type for register commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Shopfront POS                          │
//! │                                                                         │
//! │  Front end                   Register                                   │
//! │  ─────────                   ────────                                   │
//! │                                                                         │
//! │  scan RICE-5KG                                                          │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Gateway Error? ─── GatewayError::Db(QueryFailed) ──┐           │  │
//! │  │         │                                           │           │  │
//! │  │         ▼                                           ▼           │  │
//! │  │  Cart Rule? ─── CoreError::StockExceeded ────────► ApiError ───►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  { "code": "STOCK_EXCEEDED", "message": "Only 3 of Rice in stock..." }  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A refused or unconfirmed checkout is not an error: the finalizer returns
//! it as a [`crate::checkout::CheckoutOutcome`] value.

use serde::Serialize;
use shopfront_core::{CoreError, StoreError, ValidationError};
use shopfront_db::DbError;

use crate::gateway::GatewayError;

/// API error returned from register commands.
///
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Item not found: RICE-5KG"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,

    ValidationError,

    DatabaseError,

    /// A cart rule refused the edit (cart too large, empty cart, ...)
    CartError,

    /// Snapshot stock ceiling hit while editing the cart
    StockExceeded,

    /// Stock ran out between adding to the cart and checkout
    InsufficientStock,

    /// Split tenders do not add up, or a tender row is invalid
    PaymentError,

    /// A checkout for this tab is already being submitted
    CheckoutInFlight,

    /// The tab was already invoiced with different contents
    InvoiceConflict,

    /// An external collaborator could not be reached
    GatewayUnavailable,

    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn in_flight(session_id: &str) -> Self {
        ApiError::new(
            ErrorCode::CheckoutInFlight,
            format!("Checkout for tab {} is already in progress", session_id),
        )
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { .. } => ApiError::validation(err.to_string()),
            DbError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            DbError::InvoiceConflict { .. } => {
                tracing::warn!("{}", err);
                ApiError::new(ErrorCode::InvoiceConflict, err.to_string())
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::ItemNotFound(_)
            | CoreError::LineNotFound(_)
            | CoreError::SessionNotFound(_)
            | CoreError::ParkedOrderNotFound(_)
            | CoreError::TenderNotFound(_) => ErrorCode::NotFound,
            CoreError::OutOfStock { .. } | CoreError::StockExceeded { .. } => {
                ErrorCode::StockExceeded
            }
            CoreError::EmptyCart | CoreError::CartTooLarge { .. } => ErrorCode::CartError,
            CoreError::SplitMismatch { .. } | CoreError::InvalidTender { .. } => {
                ErrorCode::PaymentError
            }
            CoreError::Validation(_) => ErrorCode::ValidationError,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!("Session storage failed: {}", err);
        ApiError::internal("Could not save register state")
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Db(e) => ApiError::from(e),
            GatewayError::Unavailable(reason) => {
                tracing::error!(reason = %reason, "Collaborator unavailable");
                ApiError::new(ErrorCode::GatewayUnavailable, reason)
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use shopfront_core::Money;

    #[test]
    fn test_core_errors_map_to_codes() {
        let err: ApiError = CoreError::StockExceeded {
            item_id: "i-1".to_string(),
            name: "Rice".to_string(),
            available: 3,
            requested: 4,
        }
        .into();
        assert_eq!(err.code, ErrorCode::StockExceeded);
        assert_eq!(err.message, "Only 3 of Rice in stock, requested 4");

        let err: ApiError = CoreError::SplitMismatch {
            expected: Money::from_cents(500),
            actual: Money::from_cents(400),
        }
        .into();
        assert_eq!(err.code, ErrorCode::PaymentError);

        let err: ApiError = CoreError::EmptyCart.into();
        assert_eq!(err.code, ErrorCode::CartError);
    }

    #[test]
    fn test_insufficient_stock_keeps_message() {
        let err: ApiError = DbError::InsufficientStock {
            item_id: "i-1".to_string(),
            name: "Rice".to_string(),
            available: 1,
            requested: 3,
        }
        .into();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(err.message.contains("Only 1 of Rice"));
    }

    #[test]
    fn test_invoice_conflict_has_its_own_code() {
        let err: ApiError = DbError::InvoiceConflict {
            session_id: "tab-1".to_string(),
            invoice_number: "INV-000003".to_string(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::InvoiceConflict);
        assert!(err.message.contains("INV-000003"));
    }

    #[test]
    fn test_serializes_screaming_code() {
        let err = ApiError::in_flight("tab-1");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "CHECKOUT_IN_FLIGHT");
        assert_eq!(
            json["message"],
            "Checkout for tab tab-1 is already in progress"
        );
    }
}
