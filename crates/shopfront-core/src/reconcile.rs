//! # Payment Reconciliation
//!
//! Decides whether a cart may be finalized into an invoice.
//!
//! ## Decision Sequence (first match wins)
//! ```text
//! ┌──────┬──────────────────────────────────────────┬───────────────────────────────┐
//! │ Rule │ Condition                                │ Outcome                       │
//! ├──────┼──────────────────────────────────────────┼───────────────────────────────┤
//! │  1   │ no lines                                 │ Reject(EmptyCart)             │
//! │  2   │ tendered < 0 or change_returned < 0      │ Reject(InvalidAmount)         │
//! │      │ discount outside [0, subtotal]           │ Reject(InvalidDiscount)       │
//! │  3   │ change_returned > change_required        │ Reject(ExcessChangeReturned)  │
//! │  4   │ walk-in, tendered < due                  │ Reject(WalkInMustPayFull)     │
//! │  5   │ walk-in, overpaid, change short          │ Confirm(WalkInPartialChange)  │
//! │  6   │ customer, tendered < due                 │ Confirm(UnpaidBalance)        │
//! │  7   │ customer, overpaid, change short         │ Confirm(PartialChangeAsCredit)│
//! │  8   │ otherwise                                │ Proceed                       │
//! └──────┴──────────────────────────────────────────┴───────────────────────────────┘
//! ```
//!
//! Every confirmation gate guards against money silently disappearing:
//! change the cashier kept, or debt nobody recorded. Walk-ins cannot carry a
//! due because there is nobody to collect it from.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::cart::CartSession;
use crate::money::Money;
use crate::settlement::SettlementProposal;

// =============================================================================
// Outcome Types
// =============================================================================

/// Why a checkout was refused. The session is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum RejectReason {
    EmptyCart,
    InvalidAmount,
    InvalidDiscount,
    ExcessChangeReturned,
    WalkInMustPayFull,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            RejectReason::EmptyCart => "Cart is empty",
            RejectReason::InvalidAmount => "Amounts cannot be negative",
            RejectReason::InvalidDiscount => "Discount must be between zero and the subtotal",
            RejectReason::ExcessChangeReturned => "Change returned is more than the change owed",
            RejectReason::WalkInMustPayFull => "Walk-in customers must pay the full amount",
        };
        f.write_str(msg)
    }
}

/// A consequence the cashier must acknowledge before the sale goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum ConfirmationKind {
    /// Walk-in overpaid and was not given all change back. No ledger entry.
    WalkInPartialChange { unreturned: Money },

    /// Customer leaves owing `due`.
    UnpaidBalance { due: Money },

    /// Unreturned change becomes store credit of `credit` (always > 0).
    PartialChangeAsCredit { credit: Money },
}

impl fmt::Display for ConfirmationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfirmationKind::WalkInPartialChange { unreturned } => {
                write!(f, "{} change not returned to walk-in customer", unreturned)
            }
            ConfirmationKind::UnpaidBalance { due } => {
                write!(f, "{} will be added to the customer's dues", due)
            }
            ConfirmationKind::PartialChangeAsCredit { credit } => {
                write!(f, "{} will be kept as store credit", credit)
            }
        }
    }
}

/// Result of reconciling a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
#[ts(export)]
pub enum ReconciliationOutcome {
    Proceed,
    NeedsConfirmation(ConfirmationKind),
    Reject(RejectReason),
}

impl ReconciliationOutcome {
    #[inline]
    pub fn is_proceed(&self) -> bool {
        matches!(self, ReconciliationOutcome::Proceed)
    }

    /// Whether the finalizer may run given the cashier's acknowledgement.
    ///
    /// `Proceed` needs none; `NeedsConfirmation` needs an acknowledgement of
    /// exactly that kind; `Reject` can never be overridden.
    pub fn permits(&self, acknowledged: Option<&ConfirmationKind>) -> bool {
        match self {
            ReconciliationOutcome::Proceed => true,
            ReconciliationOutcome::NeedsConfirmation(kind) => acknowledged == Some(kind),
            ReconciliationOutcome::Reject(_) => false,
        }
    }
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Reconciles a session against its own settlement.
pub fn reconcile(session: &CartSession) -> ReconciliationOutcome {
    let proposal = SettlementProposal::from_session(session);
    reconcile_proposal(session.is_empty(), session.customer.is_some(), &proposal)
}

/// Rule table over the raw inputs, for callers that already hold a proposal.
///
/// Rule 3 (`ExcessChangeReturned`) covers more than the
/// overpayment case: any change returned beyond `change_required` is
/// refused, including change on an exact or short payment.
pub fn reconcile_proposal(
    cart_empty: bool,
    has_customer: bool,
    p: &SettlementProposal,
) -> ReconciliationOutcome {
    use ReconciliationOutcome::{NeedsConfirmation, Proceed, Reject};

    if cart_empty {
        return Reject(RejectReason::EmptyCart);
    }

    if p.amount_tendered.is_negative() || p.change_returned.is_negative() {
        return Reject(RejectReason::InvalidAmount);
    }
    if p.discount.is_negative() || p.discount > p.subtotal {
        return Reject(RejectReason::InvalidDiscount);
    }

    // change_required is zero unless overpaid, so this also refuses change
    // handed out on an exact or short payment.
    if p.change_returned > p.change_required {
        return Reject(RejectReason::ExcessChangeReturned);
    }

    let change_short = p.change_returned < p.change_required;

    if !has_customer {
        if p.is_underpaid() {
            return Reject(RejectReason::WalkInMustPayFull);
        }
        if p.is_overpaid() && change_short {
            return NeedsConfirmation(ConfirmationKind::WalkInPartialChange {
                unreturned: p.unreturned_change(),
            });
        }
        return Proceed;
    }

    if p.is_underpaid() {
        return NeedsConfirmation(ConfirmationKind::UnpaidBalance {
            due: p.amount_due - p.amount_tendered,
        });
    }
    if p.is_overpaid() && change_short {
        return NeedsConfirmation(ConfirmationKind::PartialChangeAsCredit {
            credit: p.unreturned_change(),
        });
    }

    Proceed
}

// =============================================================================
// Unit Tests
// =============================================================================
