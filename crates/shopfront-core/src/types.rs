//! # Domain Types
//!
//! Values the checkout engine reads from its collaborators (catalog items,
//! customers) and the payment vocabulary shared by every layer.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │  CatalogItem    │   │    Customer     │   │ PaymentMethod   │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  id / sku       │   │  id             │   │  Cash           │        │
//! │  │  name           │   │  name, phone    │   │  Upi            │        │
//! │  │  unit_price     │   │  dues (signed)  │   │  Card           │        │
//! │  │  stock_qty      │   │                 │   │  Split          │        │
//! │  │  unit           │   │  +  owes shop   │   │  CreditDue      │        │
//! │  └─────────────────┘   │  −  store credit│   └─────────────────┘        │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Rule
//! A `CatalogItem` or `Customer` copied into a cart is a snapshot. Price,
//! stock ceiling and credit are trusted until the next explicit refresh; a
//! stock change made elsewhere while a cart is open is only noticed when the
//! invoice is submitted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Catalog Item
// =============================================================================

/// An item as returned by the catalog lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CatalogItem {
    pub id: String,

    /// Business identifier printed on the shelf label / barcode.
    pub sku: String,

    pub name: String,

    pub unit_price: Money,

    /// Quantity on hand when the catalog was read.
    pub stock_qty: i64,

    /// Display unit ("pcs", "kg", "box").
    pub unit: String,
}

impl CatalogItem {
    /// Checks whether the catalog reports any stock.
    #[inline]
    pub fn in_stock(&self) -> bool {
        self.stock_qty > 0
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A registered customer from the customer directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,

    /// Signed running balance. Positive: the customer owes the shop.
    /// Negative: the shop owes the customer (store credit).
    pub dues: Money,
}

impl Customer {
    /// Store credit the customer can spend: `max(0, -dues)`.
    ///
    /// ```rust
    /// use shopfront_core::{Customer, Money};
    ///
    /// let mut c = Customer {
    ///     id: "c-1".into(),
    ///     name: "Asha".into(),
    ///     phone: None,
    ///     dues: Money::from_cents(-2500),
    /// };
    /// assert_eq!(c.available_credit().cents(), 2500);
    ///
    /// c.dues = Money::from_cents(4000);
    /// assert!(c.available_credit().is_zero());
    /// ```
    pub fn available_credit(&self) -> Money {
        (-self.dues).non_negative()
    }
}

/// Fields for registering a customer at the counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewCustomer {
    pub name: String,
    pub phone: Option<String>,
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale was settled.
///
/// `Split` is only ever set by the split-payment composer; `CreditDue`
/// marks a sale the customer will pay later.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentMethod {
    #[default]
    Cash,
    Upi,
    Card,
    Split,
    CreditDue,
}

impl PaymentMethod {
    /// Methods a single split tender may use.
    pub const TENDER_METHODS: [PaymentMethod; 3] =
        [PaymentMethod::Cash, PaymentMethod::Upi, PaymentMethod::Card];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Upi => "upi",
            PaymentMethod::Card => "card",
            PaymentMethod::Split => "split",
            PaymentMethod::CreditDue => "credit_due",
        }
    }

    /// Whether this method can appear as one leg of a split payment.
    pub fn is_tender_method(&self) -> bool {
        Self::TENDER_METHODS.contains(self)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "upi" => Ok(PaymentMethod::Upi),
            "card" | "credit" | "debit" => Ok(PaymentMethod::Card),
            "split" => Ok(PaymentMethod::Split),
            "credit_due" | "credit-due" | "due" => Ok(PaymentMethod::CreditDue),
            _ => Err(ValidationError::NotAllowed {
                field: "payment method".to_string(),
                allowed: ["cash", "upi", "card", "split", "credit_due"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }
}

// =============================================================================
// Tender
// =============================================================================

/// One leg of a split payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Tender {
    pub method: PaymentMethod,
    pub amount: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_parse() {
        assert_eq!("UPI".parse::<PaymentMethod>().unwrap(), PaymentMethod::Upi);
        assert_eq!(
            "credit-due".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::CreditDue
        );
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_payment_method_serde_names() {
        let json = serde_json::to_string(&PaymentMethod::CreditDue).unwrap();
        assert_eq!(json, "\"credit_due\"");
        assert_eq!(PaymentMethod::CreditDue.to_string(), "credit_due");
    }

    #[test]
    fn test_tender_methods() {
        assert!(PaymentMethod::Cash.is_tender_method());
        assert!(PaymentMethod::Card.is_tender_method());
        assert!(!PaymentMethod::Split.is_tender_method());
        assert!(!PaymentMethod::CreditDue.is_tender_method());
    }

    #[test]
    fn test_catalog_item_in_stock() {
        let item = CatalogItem {
            id: "i-1".into(),
            sku: "SOAP-100".into(),
            name: "Soap 100g".into(),
            unit_price: Money::from_cents(4500),
            stock_qty: 0,
            unit: "pcs".into(),
        };
        assert!(!item.in_stock());
    }
}
