//! # shopfront-core: Checkout Logic for Shopfront POS
//!
//! Everything the register decides about a sale lives here, as plain data
//! and pure functions. No database, no network, no filesystem.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Shopfront POS Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 shopfront-register (apps/register)              │   │
//! │  │   commands ──► CheckoutFinalizer ──► gateways (catalog, ...)    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shopfront-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌────────────┐ ┌───────────┐ ┌──────────────┐   │   │
//! │  │   │   cart   │ │ settlement │ │ reconcile │ │    split     │   │   │
//! │  │   │ session  │ │  figures   │ │  outcome  │ │   tenders    │   │   │
//! │  │   └──────────┘ └────────────┘ └───────────┘ └──────────────┘   │   │
//! │  │   ┌──────────┐ ┌────────────┐ ┌───────────┐ ┌──────────────┐   │   │
//! │  │   │ session  │ │  invoice   │ │   money   │ │  validation  │   │   │
//! │  │   │ manager  │ │   draft    │ │   types   │ │              │   │   │
//! │  │   └──────────┘ └────────────┘ └───────────┘ └──────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            shopfront-db (SQLite collaborators)                  │   │
//! │  │         items, customers, invoices (one transaction)            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Checkout in one picture
//! ```text
//! CartSession ─► SettlementProposal ─► reconcile() ─┬─ Proceed ───────────┐
//!                                                   ├─ NeedsConfirmation ─┤ (ack)
//!                                                   └─ Reject (final)     ▼
//!                                                              InvoiceDraft
//! ```
//!
//! ## Example
//!
//! ```rust
//! use shopfront_core::{reconcile, CartSession, CatalogItem, Money, ReconciliationOutcome};
//!
//! let rice = CatalogItem {
//!     id: "i-1".into(),
//!     sku: "RICE-5KG".into(),
//!     name: "Basmati Rice 5kg".into(),
//!     unit_price: Money::from_major(500),
//!     stock_qty: 10,
//!     unit: "bag".into(),
//! };
//!
//! let mut tab = CartSession::new("Tab 1");
//! tab.add_line(&rice).unwrap();
//! tab.set_amount_tendered(Money::from_major(500));
//!
//! assert_eq!(reconcile(&tab), ReconciliationOutcome::Proceed);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod invoice;
pub mod money;
pub mod reconcile;
pub mod session;
pub mod settlement;
pub mod split;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports
// =============================================================================

pub use cart::{CartLine, CartSession};
pub use error::{CoreError, CoreResult, StoreError, ValidationError};
pub use invoice::{Invoice, InvoiceDraft, InvoiceLine};
pub use money::Money;
pub use reconcile::{reconcile, ConfirmationKind, ReconciliationOutcome, RejectReason};
pub use session::{
    KeyValueStore, KvSessionStore, MemoryKeyValueStore, ParkedOrder, SessionManager, SessionStore,
};
pub use settlement::SettlementProposal;
pub use split::{SplitComposer, TenderField};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines in one cart session.
pub const MAX_CART_LINES: usize = 100;

/// Largest quantity a cashier may type for one line.
///
/// Stops slips like 1000 for 10 before the stock ceiling is even consulted.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest amount, in whole units, a cashier may type into any money field.
pub const MAX_TYPED_AMOUNT: i64 = 100_000_000;

/// Tabs are labelled "Tab 1", "Tab 2", ...
pub const TAB_LABEL_PREFIX: &str = "Tab";
