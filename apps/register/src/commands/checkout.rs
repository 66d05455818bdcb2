//! # Checkout Commands
//!
//! ```text
//! checkout(None) ──► NeedsConfirmation(UnpaidBalance { due: 200.00 })
//!                         │
//!              cashier confirms in the dialog
//!                         │
//!                         ▼
//! checkout(Some(UnpaidBalance { due: 200.00 })) ──► Completed(INV-000042)
//! ```

use tracing::debug;

use shopfront_core::{ConfirmationKind, Invoice};

use crate::checkout::{CheckoutFinalizer, CheckoutOutcome};
use crate::error::ApiError;
use crate::gateway::InvoiceGateway;
use crate::state::RegisterState;

/// Checks out the active tab.
///
/// `acknowledged` is the confirmation the cashier accepted on the previous
/// attempt, if any.
pub async fn checkout(
    finalizer: &CheckoutFinalizer,
    register: &RegisterState,
    acknowledged: Option<ConfirmationKind>,
) -> Result<CheckoutOutcome, ApiError> {
    let session_id = register.with_manager(|m| m.active_id().to_string());
    debug!(session_id = %session_id, "checkout command");
    finalizer.checkout(register, &session_id, acknowledged).await
}

/// Fetches an invoice by number (`INV-000042`) or id.
pub async fn get_invoice(
    invoices: &dyn InvoiceGateway,
    id_or_number: &str,
) -> Result<Invoice, ApiError> {
    debug!(id = %id_or_number, "get_invoice command");
    invoices
        .get_invoice(id_or_number.trim())
        .await?
        .ok_or_else(|| ApiError::not_found("Invoice", id_or_number))
}
