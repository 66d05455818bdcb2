//! # Checkout Finalizer
//!
//! Turns a reconciled tab into an invoice.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        checkout(tab, ack)                               │
//! │                                                                         │
//! │  claim in-flight slot ──── already claimed? ──► CheckoutInFlight error  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  lock ─► clone tab ─► unlock                                            │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  reconcile(tab) ─┬─ Reject(r) ──────────────────────► Rejected(r)       │
//! │                  ├─ NeedsConfirmation(k), ack ≠ k ──► NeedsConfirmation │
//! │                  └─ Proceed, or ack = k                                 │
//! │                          │                                              │
//! │                          ▼                                              │
//! │                 InvoiceDraft::from_session                              │
//! │                          │                                              │
//! │                          ▼                                              │
//! │                 await create_invoice ──── Err ──► error, tab untouched  │
//! │                          │                                              │
//! │                          ▼ Ok                                           │
//! │                 lock ─► retire tab ─► unlock ───► Completed(invoice)    │
//! │                                                                         │
//! │  in-flight slot released on every path (drop guard)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The acknowledgement is compared against a *fresh* reconciliation. If the
//! cart changed after the cashier saw the dialog, the old acknowledgement no
//! longer matches and the new confirmation is returned instead.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use shopfront_core::{
    reconcile, ConfirmationKind, CoreError, Invoice, InvoiceDraft, ReconciliationOutcome,
    RejectReason,
};

use crate::error::ApiError;
use crate::gateway::InvoiceGateway;
use crate::state::RegisterState;

/// What the cashier sees after pressing "Complete sale".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum CheckoutOutcome {
    /// Invoice created, tab retired.
    Completed(Invoice),

    /// Ask the cashier, then call again with this kind as the acknowledgement.
    NeedsConfirmation(ConfirmationKind),

    /// Cannot go through as entered; fix the payment panel.
    Rejected(RejectReason),
}

#[derive(Clone)]
pub struct CheckoutFinalizer {
    invoices: Arc<dyn InvoiceGateway>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

/// Holds a session's in-flight slot until dropped.
struct InFlightGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
    session_id: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.session_id);
    }
}

impl CheckoutFinalizer {
    pub fn new(invoices: Arc<dyn InvoiceGateway>) -> Self {
        CheckoutFinalizer {
            invoices,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Whether a submission for `session_id` is outstanding.
    pub fn is_in_flight(&self, session_id: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(session_id)
    }

    fn claim(&self, session_id: &str) -> Result<InFlightGuard, ApiError> {
        let mut set = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !set.insert(session_id.to_string()) {
            warn!(session_id = %session_id, "Duplicate checkout submission refused");
            return Err(ApiError::in_flight(session_id));
        }
        Ok(InFlightGuard {
            in_flight: Arc::clone(&self.in_flight),
            session_id: session_id.to_string(),
        })
    }

    /// Checks out `session_id`.
    ///
    /// ## Returns
    /// * `Ok(Completed)` - invoice created, tab retired (a fresh tab is
    ///   opened if it was the last one)
    /// * `Ok(NeedsConfirmation)` / `Ok(Rejected)` - nothing submitted
    /// * `Err(CheckoutInFlight)` - this tab is already being submitted
    /// * `Err(..)` - the invoice gateway failed; the tab is unchanged and may
    ///   be retried by the cashier
    pub async fn checkout(
        &self,
        register: &RegisterState,
        session_id: &str,
        acknowledged: Option<ConfirmationKind>,
    ) -> Result<CheckoutOutcome, ApiError> {
        debug!(session_id = %session_id, ack = ?acknowledged, "checkout");

        let _guard = self.claim(session_id)?;

        let session = register
            .with_manager(|m| m.get(session_id).cloned())
            .ok_or_else(|| CoreError::SessionNotFound(session_id.to_string()))?;

        match reconcile(&session) {
            ReconciliationOutcome::Reject(reason) => {
                warn!(session_id = %session_id, reason = ?reason, "Checkout rejected");
                return Ok(CheckoutOutcome::Rejected(reason));
            }
            ReconciliationOutcome::NeedsConfirmation(kind) if acknowledged != Some(kind) => {
                if acknowledged.is_some() {
                    warn!(session_id = %session_id, "Stale checkout acknowledgement");
                }
                return Ok(CheckoutOutcome::NeedsConfirmation(kind));
            }
            _ => {}
        }

        let draft = InvoiceDraft::from_session(&session);
        let invoice = match self.invoices.create_invoice(&draft).await {
            Ok(invoice) => invoice,
            Err(e) => {
                error!(session_id = %session_id, error = %e, "Invoice submission failed");
                return Err(e.into());
            }
        };

        info!(
            session_id = %session_id,
            invoice = %invoice.invoice_number,
            total = %invoice.total_amount,
            dues_delta = %draft.dues_delta,
            "Invoice created"
        );

        // The cashier may have closed the tab while we waited; the sale stands.
        if let Err(e) = register.with_manager_mut(|m| m.retire(session_id)) {
            warn!(session_id = %session_id, error = %e, "Tab gone before it could be retired");
        }

        Ok(CheckoutOutcome::Completed(invoice))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
