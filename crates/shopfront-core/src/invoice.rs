//! # Invoice Payload
//!
//! The pure half of checkout: turning a reconciled cart session into the
//! payload handed to the invoicing collaborator, and the immutable invoice
//! it hands back.
//!
//! ```text
//! CartSession ──► InvoiceDraft::from_session ──► create_invoice(draft) ──► Invoice
//!   (mutable)          (pure, replayable)          (one fallible call)     (immutable)
//! ```
//!
//! The draft carries the ledger effects the collaborator must apply in the
//! same all-or-nothing step: stock decrements per line and `dues_delta` on
//! the customer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::{CartLine, CartSession};
use crate::money::Money;
use crate::settlement::SettlementProposal;
use crate::types::{PaymentMethod, Tender};

/// A sold line. No stock snapshot; that is cart-only state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceLine {
    pub item_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

impl From<&CartLine> for InvoiceLine {
    fn from(line: &CartLine) -> Self {
        InvoiceLine {
            item_id: line.item_id.clone(),
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_total: line.line_total(),
        }
    }
}

/// Payload for invoice creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceDraft {
    /// Cart session the sale came from. Stable across retries of the same
    /// checkout, so a collaborator can use it as an idempotency key.
    pub session_id: String,

    pub customer_id: Option<String>,
    pub lines: Vec<InvoiceLine>,
    pub discount: Money,
    pub paid_amount: Money,
    pub payment_method: PaymentMethod,
    pub change_returned: Money,
    pub credit_applied: Money,
    pub total_amount: Money,

    /// Split breakdown, present only for split payments.
    pub tenders: Option<Vec<Tender>>,

    /// Signed change to the customer's dues (zero for walk-ins).
    pub dues_delta: Money,
}

impl InvoiceDraft {
    /// Builds the payload from the session as it stands.
    ///
    /// Does not reconcile; the finalizer only calls this after
    /// [`crate::reconcile`] permitted the sale.
    pub fn from_session(session: &CartSession) -> Self {
        let p = SettlementProposal::from_session(session);

        let dues_delta = if session.customer.is_some() {
            p.dues_delta()
        } else {
            Money::zero()
        };

        let tenders = (session.payment_method == PaymentMethod::Split
            && !session.tenders.is_empty())
        .then(|| session.tenders.clone());

        InvoiceDraft {
            session_id: session.id.clone(),
            customer_id: session.customer.as_ref().map(|c| c.id.clone()),
            lines: session.lines.iter().map(InvoiceLine::from).collect(),
            discount: p.discount,
            paid_amount: p.amount_tendered,
            payment_method: session.payment_method,
            change_returned: p.change_returned,
            credit_applied: p.credit_applied,
            total_amount: p.total,
            tenders,
            dues_delta,
        }
    }
}

/// A persisted invoice. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Invoice {
    pub id: String,

    /// Human-readable number printed on the bill.
    pub invoice_number: String,

    pub customer_id: Option<String>,
    pub lines: Vec<InvoiceLine>,
    pub discount: Money,
    pub paid_amount: Money,
    pub payment_method: PaymentMethod,
    pub change_returned: Money,
    pub credit_applied: Money,
    pub total_amount: Money,
    pub tenders: Option<Vec<Tender>>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    /// Materializes a draft once the collaborator has assigned identity.
    pub fn from_draft(
        draft: InvoiceDraft,
        id: String,
        invoice_number: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Invoice {
            id,
            invoice_number,
            customer_id: draft.customer_id,
            lines: draft.lines,
            discount: draft.discount,
            paid_amount: draft.paid_amount,
            payment_method: draft.payment_method,
            change_returned: draft.change_returned,
            credit_applied: draft.credit_applied,
            total_amount: draft.total_amount,
            tenders: draft.tenders,
            created_at,
        }
    }

    /// Whether this invoice records exactly the sale `draft` describes.
    ///
    /// `dues_delta` is not stored; it follows from the customer and the
    /// amounts compared here.
    pub fn matches_draft(&self, draft: &InvoiceDraft) -> bool {
        self.customer_id == draft.customer_id
            && self.lines == draft.lines
            && self.discount == draft.discount
            && self.paid_amount == draft.paid_amount
            && self.payment_method == draft.payment_method
            && self.change_returned == draft.change_returned
            && self.credit_applied == draft.credit_applied
            && self.total_amount == draft.total_amount
            && self.tenders == draft.tenders
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::tests::item;
    use crate::split::{SplitComposer, TenderField};
    use crate::types::Customer;

    fn cents(c: i64) -> Money {
        Money::from_cents(c)
    }

    fn registered() -> Customer {
        Customer {
            id: "cust-4".into(),
            name: "Imran".into(),
            phone: None,
            dues: Money::zero(),
        }
    }

    #[test]
    fn test_walk_in_exact_payment_draft() {
        let mut s = CartSession::new("Tab 1");
        s.add_line(&item("a", 200, 5)).unwrap();
        s.add_line(&item("b", 300, 5)).unwrap();
        s.set_amount_tendered(cents(500));

        let d = InvoiceDraft::from_session(&s);

        assert_eq!(d.session_id, s.id);
        assert_eq!(d.customer_id, None);
        assert_eq!(d.lines.len(), 2);
        assert_eq!(d.lines[1].line_total, cents(300));
        assert_eq!(d.paid_amount, cents(500));
        assert_eq!(d.total_amount, cents(500));
        assert!(d.change_returned.is_zero());
        assert!(d.dues_delta.is_zero());
        assert!(d.tenders.is_none());
    }

    #[test]
    fn test_invoice_matches_only_its_own_draft() {
        let mut s = CartSession::new("Tab 1");
        s.add_line(&item("a", 500, 5)).unwrap();
        s.set_amount_tendered(cents(500));
        let draft = InvoiceDraft::from_session(&s);
        let invoice = Invoice::from_draft(draft.clone(), "inv-1".into(), "INV-000001".into(), Utc::now());

        assert!(invoice.matches_draft(&draft));

        // same tab, one more line rung up afterwards
        s.add_line(&item("b", 250, 5)).unwrap();
        s.set_amount_tendered(cents(750));
        assert!(!invoice.matches_draft(&InvoiceDraft::from_session(&s)));
    }

    #[test]
    fn test_walk_in_never_touches_dues() {
        let mut s = CartSession::new("Tab 1");
        s.add_line(&item("a", 500, 5)).unwrap();
        s.set_amount_tendered(cents(600));
        s.set_change_returned(cents(40));

        assert!(InvoiceDraft::from_session(&s).dues_delta.is_zero());
    }

    #[test]
    fn test_customer_underpayment_delta() {
        let mut s = CartSession::new("Tab 1");
        s.add_line(&item("a", 500, 5)).unwrap();
        s.set_customer(Some(registered()));
        s.set_amount_tendered(cents(300));

        let d = InvoiceDraft::from_session(&s);
        assert_eq!(d.customer_id.as_deref(), Some("cust-4"));
        assert_eq!(d.dues_delta, cents(200));
    }

    #[test]
    fn test_customer_partial_change_becomes_credit() {
        let mut s = CartSession::new("Tab 1");
        s.add_line(&item("a", 500, 5)).unwrap();
        s.set_customer(Some(registered()));
        s.set_amount_tendered(cents(600));
        s.set_change_returned(cents(50));

        let d = InvoiceDraft::from_session(&s);
        assert_eq!(d.dues_delta, cents(-50));
        assert_eq!(d.paid_amount, cents(600));
        assert_eq!(d.change_returned, cents(50));
    }

    #[test]
    fn test_split_breakdown_travels_with_draft() {
        let mut s = CartSession::new("Tab 1");
        s.add_line(&item("a", 500, 5)).unwrap();

        let mut split = SplitComposer::new();
        let a = split.add_tender();
        let b = split.add_tender();
        split.set_tender(a, TenderField::Amount(cents(200))).unwrap();
        split.set_tender(b, TenderField::Amount(cents(300))).unwrap();
        split.apply(&mut s).unwrap();

        let d = InvoiceDraft::from_session(&s);
        assert_eq!(d.payment_method, PaymentMethod::Split);
        assert_eq!(d.tenders.as_ref().map(Vec::len), Some(2));

        let invoice = Invoice::from_draft(d, "inv-1".into(), "INV-0001".into(), Utc::now());
        assert_eq!(invoice.paid_amount, cents(500));
        assert_eq!(invoice.tenders.unwrap()[1].amount, cents(300));
    }
}
