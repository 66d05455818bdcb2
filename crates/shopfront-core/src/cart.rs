//! # Cart Session
//!
//! One in-progress sale: the lines on the counter, the selected customer,
//! the discount and the cashier's payment inputs.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cashier action            Operation                 Effect             │
//! │  ──────────────            ─────────                 ──────             │
//! │  Scan / click item ──────► add_line(item) ─────────► qty 1 or qty + 1   │
//! │  Edit quantity ──────────► set_quantity(id, n) ────► n ≤ 0 removes      │
//! │  Trash icon ─────────────► remove_line(id)                              │
//! │  Discount field ─────────► set_discount(amount) ───► not clamped here   │
//! │  Pick customer ──────────► set_customer(c) ────────► credit refreshed   │
//! │  "Use credit" field ─────► set_credit_requested ───► clamped            │
//! │  Payment panel ──────────► set_amount_tendered / set_change_returned    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `item_id`, kept in insertion order.
//! - `1 <= quantity <= stock_ceiling` for every line. A rejected change
//!   leaves the previous quantity in place.
//! - `subtotal = Σ line_total` and `total = subtotal - discount` are
//!   computed on demand, so they hold after every mutation.
//! - `credit_requested` never exceeds `min(credit_available, total)`; it is
//!   re-clamped whenever the total moves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::settlement::SettlementProposal;
use crate::types::{CatalogItem, Customer, PaymentMethod, Tender};
use crate::MAX_CART_LINES;

// =============================================================================
// Cart Line
// =============================================================================

/// A line in the cart.
///
/// Name, price and stock ceiling are frozen when the item is first added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    pub item_id: String,
    pub sku: String,
    pub name: String,
    pub unit: String,
    pub unit_price: Money,
    pub quantity: i64,

    /// Stock available when the item was added.
    pub stock_ceiling: i64,
}

impl CartLine {
    fn from_item(item: &CatalogItem) -> Self {
        CartLine {
            item_id: item.id.clone(),
            sku: item.sku.clone(),
            name: item.name.clone(),
            unit: item.unit.clone(),
            unit_price: item.unit_price,
            quantity: 1,
            stock_ceiling: item.stock_qty,
        }
    }

    /// `quantity × unit_price`.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    fn stock_exceeded(&self, requested: i64) -> CoreError {
        CoreError::StockExceeded {
            item_id: self.item_id.clone(),
            name: self.name.clone(),
            available: self.stock_ceiling,
            requested,
        }
    }
}

// =============================================================================
// Cart Session
// =============================================================================

/// One tab on the POS screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartSession {
    pub id: String,

    /// "Tab 1", "Tab 2", ...
    pub display_name: String,

    /// Snapshot of the selected customer; `None` is a walk-in.
    pub customer: Option<Customer>,

    pub lines: Vec<CartLine>,

    pub discount: Money,
    pub payment_method: PaymentMethod,
    pub amount_tendered: Money,
    pub change_returned: Money,
    pub credit_requested: Money,

    /// `max(0, -dues)` of the customer at selection time.
    pub credit_available: Money,

    /// Split breakdown written by the split composer; empty otherwise.
    #[serde(default)]
    pub tenders: Vec<Tender>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl CartSession {
    /// Creates an empty session with a fresh UUID.
    pub fn new(display_name: impl Into<String>) -> Self {
        CartSession {
            id: Uuid::new_v4().to_string(),
            display_name: display_name.into(),
            customer: None,
            lines: Vec::new(),
            discount: Money::zero(),
            payment_method: PaymentMethod::default(),
            amount_tendered: Money::zero(),
            change_returned: Money::zero(),
            credit_requested: Money::zero(),
            credit_available: Money::zero(),
            tenders: Vec::new(),
            created_at: Utc::now(),
        }
    }

    // -------------------------------------------------------------------------
    // Lines
    // -------------------------------------------------------------------------

    /// Adds one unit of `item`.
    ///
    /// ## Behavior
    /// - Already in the cart: quantity + 1, unless that passes the line's
    ///   stock ceiling (`StockExceeded`, quantity unchanged).
    /// - Not in the cart and no stock: `OutOfStock`, nothing created.
    /// - Otherwise a new line at quantity 1.
    pub fn add_line(&mut self, item: &CatalogItem) -> CoreResult<()> {
        if let Some(line) = self.lines.iter_mut().find(|l| l.item_id == item.id) {
            let requested = line.quantity + 1;
            if requested > line.stock_ceiling {
                return Err(line.stock_exceeded(requested));
            }
            line.quantity = requested;
            self.reclamp_credit();
            return Ok(());
        }

        if !item.in_stock() {
            return Err(CoreError::OutOfStock {
                item_id: item.id.clone(),
                name: item.name.clone(),
            });
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        self.lines.push(CartLine::from_item(item));
        self.reclamp_credit();
        Ok(())
    }

    /// Sets a line's quantity. `qty <= 0` removes the line.
    pub fn set_quantity(&mut self, item_id: &str, qty: i64) -> CoreResult<()> {
        if qty <= 0 {
            return self.remove_line(item_id);
        }

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.item_id == item_id)
            .ok_or_else(|| CoreError::LineNotFound(item_id.to_string()))?;

        if qty > line.stock_ceiling {
            return Err(line.stock_exceeded(qty));
        }

        line.quantity = qty;
        self.reclamp_credit();
        Ok(())
    }

    pub fn remove_line(&mut self, item_id: &str) -> CoreResult<()> {
        let before = self.lines.len();
        self.lines.retain(|l| l.item_id != item_id);

        if self.lines.len() == before {
            return Err(CoreError::LineNotFound(item_id.to_string()));
        }

        self.reclamp_credit();
        Ok(())
    }

    pub fn line(&self, item_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.item_id == item_id)
    }

    // -------------------------------------------------------------------------
    // Discount, customer, credit
    // -------------------------------------------------------------------------

    /// Stores the discount as entered. Range checks happen at checkout.
    pub fn set_discount(&mut self, amount: Money) {
        self.discount = amount;
        self.reclamp_credit();
    }

    /// Attaches (or detaches, with `None`) a customer.
    ///
    /// Refreshes `credit_available` from the customer's dues and resets any
    /// credit the previous customer had requested.
    pub fn set_customer(&mut self, customer: Option<Customer>) {
        self.credit_available = customer
            .as_ref()
            .map(Customer::available_credit)
            .unwrap_or_default();
        self.customer = customer;
        self.credit_requested = Money::zero();
    }

    /// Requests store credit, clamped to `[0, min(credit_available, total)]`.
    ///
    /// ## Returns
    /// The amount actually applied after clamping.
    pub fn set_credit_requested(&mut self, amount: Money) -> Money {
        self.credit_requested = amount.clamp_between(Money::zero(), self.credit_ceiling());
        self.credit_requested
    }

    fn credit_ceiling(&self) -> Money {
        self.credit_available.min(self.total())
    }

    fn reclamp_credit(&mut self) {
        let requested = self.credit_requested;
        self.set_credit_requested(requested);
    }

    // -------------------------------------------------------------------------
    // Payment inputs
    // -------------------------------------------------------------------------

    /// Picks a payment method. Anything but `Split` drops a split breakdown.
    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        if method != PaymentMethod::Split {
            self.tenders.clear();
        }
        self.payment_method = method;
    }

    /// Records what the customer handed over. A manual edit invalidates any
    /// split breakdown.
    pub fn set_amount_tendered(&mut self, amount: Money) {
        self.tenders.clear();
        self.amount_tendered = amount;
    }

    pub fn set_change_returned(&mut self, amount: Money) {
        self.change_returned = amount;
    }

    /// Resets cart, customer, discount and payment inputs. Id, label and
    /// creation time are kept.
    pub fn clear(&mut self) {
        let fresh = CartSession {
            id: std::mem::take(&mut self.id),
            display_name: std::mem::take(&mut self.display_name),
            created_at: self.created_at,
            ..CartSession::new(String::new())
        };
        *self = fresh;
    }

    // -------------------------------------------------------------------------
    // Derived values
    // -------------------------------------------------------------------------

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// `Σ line_total`.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// `subtotal - discount`. Negative when the discount is out of range.
    pub fn total(&self) -> Money {
        self.subtotal() - self.discount
    }

    /// The settlement this session would check out with right now.
    pub fn settlement(&self) -> SettlementProposal {
        SettlementProposal::from_session(self)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
