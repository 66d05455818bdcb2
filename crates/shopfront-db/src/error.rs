//! # Database Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sqlx::Error                                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← what went wrong for the register: missing      │
//! │       │                  record, duplicate SKU, stock gone, conflict    │
//! │       ▼                                                                 │
//! │  GatewayError / ApiError (register app) ← what the cashier sees        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::error::ErrorKind;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index refused the row (duplicate SKU, invoice number, ...).
    #[error("{field} '{value}' is already taken")]
    UniqueViolation { field: String, value: String },

    /// Stock on hand fell below the quantity being sold since the cart
    /// snapshot was taken. The invoice transaction was rolled back.
    ///
    /// ```text
    /// Tab 1 adds 3× RICE (stock 3) ──┐
    /// Tab 2 sells 2× RICE ───────────┼──► stock now 1
    /// Tab 1 checks out ──────────────┘    InsufficientStock { available: 1, requested: 3 }
    /// ```
    #[error("Only {available} of {name} left in stock, invoice needs {requested}")]
    InsufficientStock {
        item_id: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// The session already has an invoice, and the new draft sells
    /// something different. Nothing was written.
    #[error("Tab {session_id} was already invoiced as {invoice_number} with different contents")]
    InvoiceConflict {
        session_id: String,
        invoice_number: String,
    },

    #[error("Could not reach the shop database: {0}")]
    ConnectionFailed(String),

    #[error("Could not bring the schema up to date: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// ```text
/// RowNotFound                    → NotFound
/// Database, unique violation     → UniqueViolation { field: "<table>.<column>" }
/// Database, anything else        → QueryFailed (foreign key and CHECK
///                                  failures are bugs: repositories check
///                                  references before writing)
/// PoolTimedOut / PoolClosed      → ConnectionFailed
/// Other                          → Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => match db_err.kind() {
                ErrorKind::UniqueViolation => {
                    // "UNIQUE constraint failed: items.sku"
                    let field = db_err
                        .message()
                        .rsplit(": ")
                        .next()
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::duplicate(field, "unknown")
                }
                _ => DbError::QueryFailed(db_err.message().to_string()),
            },

            sqlx::Error::PoolTimedOut => {
                DbError::ConnectionFailed("timed out waiting for a free connection".to_string())
            }
            sqlx::Error::PoolClosed => {
                DbError::ConnectionFailed("the connection pool is closed".to_string())
            }

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
