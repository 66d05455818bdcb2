//! # Settlement Calculator
//!
//! Turns a cart session into the numbers the payment panel shows and the
//! reconciliation stage judges.
//!
//! ```text
//! subtotal        = Σ line_total
//! total           = subtotal − discount
//! amount_due      = total − credit_applied
//! change_required = max(0, amount_tendered − amount_due)
//! balance_due     = amount_due − amount_tendered      (negative = overpaid)
//! ```
//!
//! Pure and cheap; recompute it after every mutation instead of caching it.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::CartSession;
use crate::money::Money;

/// Derived settlement figures for one cart session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SettlementProposal {
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
    pub credit_applied: Money,
    pub amount_due: Money,
    pub amount_tendered: Money,
    pub change_required: Money,
    pub change_returned: Money,
    pub balance_due: Money,
}

impl SettlementProposal {
    /// Computes the proposal from the session's current state.
    pub fn from_session(session: &CartSession) -> Self {
        let subtotal = session.subtotal();
        let discount = session.discount;
        let total = subtotal - discount;
        let credit_applied = session.credit_requested;
        let amount_due = total - credit_applied;
        let amount_tendered = session.amount_tendered;

        SettlementProposal {
            subtotal,
            discount,
            total,
            credit_applied,
            amount_due,
            amount_tendered,
            change_required: (amount_tendered - amount_due).non_negative(),
            change_returned: session.change_returned,
            balance_due: amount_due - amount_tendered,
        }
    }

    #[inline]
    pub fn is_overpaid(&self) -> bool {
        self.amount_tendered > self.amount_due
    }

    #[inline]
    pub fn is_underpaid(&self) -> bool {
        self.amount_tendered < self.amount_due
    }

    /// Money the shop actually keeps from the hand-over.
    #[inline]
    pub fn net_received(&self) -> Money {
        self.amount_tendered - self.change_returned
    }

    /// Change owed but not handed back (zero when nothing is owed).
    #[inline]
    pub fn unreturned_change(&self) -> Money {
        (self.change_required - self.change_returned).non_negative()
    }

    /// Signed adjustment to the customer's dues if this settlement is
    /// finalized: `total − (amount_tendered − change_returned)`.
    ///
    /// Positive: a new due. Negative: new store credit. Spent credit counts
    /// as a positive move because it is included in `total` but not paid in
    /// cash.
    ///
    /// ```rust
    /// use shopfront_core::{CartSession, Money, SettlementProposal};
    ///
    /// let mut s = CartSession::new("Tab 1");
    /// s.amount_tendered = Money::from_cents(30000);
    /// let mut p = SettlementProposal::from_session(&s);
    /// p.total = Money::from_cents(50000);
    /// assert_eq!(p.dues_delta().cents(), 20000);
    /// ```
    #[inline]
    pub fn dues_delta(&self) -> Money {
        self.total - self.net_received()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
