//! # Split-Payment Composer
//!
//! Lets the cashier express one payment as several tenders ("200 cash +
//! 300 UPI") and then collapses them into a single `amount_tendered`.
//!
//! ```text
//!  ┌──────────────────────────┐
//!  │ SplitComposer            │
//!  │  0: cash   200.00        │      apply()       ┌─────────────────────────┐
//!  │  1: upi    300.00        │ ─────────────────► │ CartSession             │
//!  │  ───────────────         │  total == due ?    │  amount_tendered 500.00 │
//!  │  total     500.00        │                    │  payment_method  split  │
//!  └──────────────────────────┘                    │  tenders [..]           │
//!                                                  └─────────────────────────┘
//! ```
//!
//! Reconciliation never sees the individual tenders. The breakdown is only
//! copied onto the session so it can travel with the invoice.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::CartSession;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{PaymentMethod, Tender};

/// A single field edit on one tender row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
#[ts(export)]
pub enum TenderField {
    Method(PaymentMethod),
    Amount(Money),
}

/// Ordered list of tenders being composed for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SplitComposer {
    tenders: Vec<Tender>,
}

impl SplitComposer {
    pub fn new() -> Self {
        SplitComposer::default()
    }

    /// Starts from the breakdown already applied to `session`, if any.
    pub fn from_session(session: &CartSession) -> Self {
        SplitComposer {
            tenders: session.tenders.clone(),
        }
    }

    pub fn tenders(&self) -> &[Tender] {
        &self.tenders
    }

    /// Appends an empty row and returns its index.
    ///
    /// The row's method is the first tender method not yet used, so adding
    /// two rows gives "cash, upi" rather than "cash, cash".
    pub fn add_tender(&mut self) -> usize {
        let method = PaymentMethod::TENDER_METHODS
            .into_iter()
            .find(|m| !self.tenders.iter().any(|t| t.method == *m))
            .unwrap_or(PaymentMethod::Cash);

        self.tenders.push(Tender {
            method,
            amount: Money::zero(),
        });
        self.tenders.len() - 1
    }

    pub fn remove_tender(&mut self, index: usize) -> CoreResult<Tender> {
        if index >= self.tenders.len() {
            return Err(CoreError::TenderNotFound(index));
        }
        Ok(self.tenders.remove(index))
    }

    /// Edits one field of the tender at `index`.
    pub fn set_tender(&mut self, index: usize, field: TenderField) -> CoreResult<()> {
        let tender = self
            .tenders
            .get_mut(index)
            .ok_or(CoreError::TenderNotFound(index))?;

        match field {
            TenderField::Method(method) => {
                if !method.is_tender_method() {
                    return Err(CoreError::InvalidTender {
                        reason: format!("{} cannot be used inside a split payment", method),
                    });
                }
                tender.method = method;
            }
            TenderField::Amount(amount) => {
                if amount.is_negative() {
                    return Err(CoreError::InvalidTender {
                        reason: "tender amount cannot be negative".to_string(),
                    });
                }
                tender.amount = amount;
            }
        }
        Ok(())
    }

    /// Sum of all tender amounts.
    pub fn total(&self) -> Money {
        self.tenders.iter().map(|t| t.amount).sum()
    }

    /// What is still missing (negative when the tenders overshoot).
    pub fn remaining(&self, amount_due: Money) -> Money {
        amount_due - self.total()
    }

    /// Writes the composed payment into `session`.
    ///
    /// Only succeeds when the tenders add up to the session's amount due
    /// exactly. On success the session carries `amount_tendered = total`,
    /// `payment_method = Split`, no change returned, and a copy of the
    /// breakdown. On failure the session is untouched.
    pub fn apply(&self, session: &mut CartSession) -> CoreResult<Money> {
        if self.tenders.is_empty() {
            return Err(CoreError::InvalidTender {
                reason: "add at least one tender".to_string(),
            });
        }

        let expected = session.settlement().amount_due;
        let actual = self.total();
        if actual != expected {
            return Err(CoreError::SplitMismatch { expected, actual });
        }

        session.set_amount_tendered(actual);
        session.set_change_returned(Money::zero());
        session.payment_method = PaymentMethod::Split;
        session.tenders = self.tenders.clone();
        Ok(actual)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
