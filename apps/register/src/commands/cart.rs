//! # Cart Commands
//!
//! Commands that edit the active tab's lines and discount.
//!
//! ## User Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Tab 2 · Ravi Kumar                                                     │
//! │  ┌────────────────────────────────────────────────────────────────┐    │
//! │  │  Basmati Rice 5kg       x2   @ 950.00        1900.00           │    │
//! │  │  Sugar 1kg              x1   @  45.00          45.00           │    │
//! │  ├────────────────────────────────────────────────────────────────┤    │
//! │  │  Subtotal                                    1945.00           │    │
//! │  │  Discount                                     -45.00           │    │
//! │  │  TOTAL                                       1900.00           │    │
//! │  │  Checkout preview: 1900.00 will be added to the customer's dues│    │
//! │  └────────────────────────────────────────────────────────────────┘    │
//! │                                                                         │
//! │  scan_item("RICE-5KG") → CartResponse { session, settlement, preview }  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Catalog lookups are awaited before the register lock is taken.

use serde::Serialize;
use tracing::debug;

use shopfront_core::validation::{
    parse_amount, validate_quantity, validate_search_query, validate_sku,
};
use shopfront_core::{
    reconcile, CartSession, CatalogItem, CoreError, ReconciliationOutcome, SettlementProposal,
};

use crate::error::ApiError;
use crate::gateway::CatalogLookup;
use crate::state::RegisterState;

/// Default number of hits for catalog search.
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;

/// The active tab with everything derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub session: CartSession,
    pub settlement: SettlementProposal,

    /// What checkout would answer right now
    pub preview: ReconciliationOutcome,
}

impl From<&CartSession> for CartResponse {
    fn from(session: &CartSession) -> Self {
        CartResponse {
            session: session.clone(),
            settlement: session.settlement(),
            preview: reconcile(session),
        }
    }
}

/// Runs `f` on the active tab and answers with the updated cart.
pub(crate) fn edit_active<F>(register: &RegisterState, f: F) -> Result<CartResponse, ApiError>
where
    F: FnOnce(&mut CartSession) -> Result<(), ApiError>,
{
    register.with_manager_mut(|m| {
        m.with_active_mut(|s| {
            f(s)?;
            Ok::<_, ApiError>(CartResponse::from(&*s))
        })
    })
}

pub fn get_cart(register: &RegisterState) -> CartResponse {
    debug!("get_cart command");
    register.with_manager(|m| CartResponse::from(m.active()))
}

/// Scans an item by SKU (or id) into the active tab.
///
/// ## Behavior
/// - Already in the cart: quantity + 1, up to the stock seen when the line
///   was first added
/// - New and in stock: added at quantity 1 with price and stock frozen
/// - New and out of stock: refused, cart unchanged
pub async fn scan_item(
    catalog: &dyn CatalogLookup,
    register: &RegisterState,
    sku_or_id: &str,
) -> Result<CartResponse, ApiError> {
    let key = validate_sku(sku_or_id)?;
    debug!(key = %key, "scan_item command");

    let item = catalog
        .find_item(&key)
        .await?
        .ok_or_else(|| CoreError::ItemNotFound(key.clone()))?;

    edit_active(register, |s| Ok(s.add_line(&item)?))
}

pub async fn search_items(
    catalog: &dyn CatalogLookup,
    query: &str,
    limit: Option<u32>,
) -> Result<Vec<CatalogItem>, ApiError> {
    let query = validate_search_query(query)?;
    let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    debug!(query = %query, limit = %limit, "search_items command");

    Ok(catalog.search_items(&query, limit).await?)
}

/// Sets a line's quantity. Zero or less removes the line.
pub fn set_quantity(
    register: &RegisterState,
    item_id: &str,
    quantity: i64,
) -> Result<CartResponse, ApiError> {
    debug!(item_id = %item_id, quantity = %quantity, "set_quantity command");
    let quantity = validate_quantity(quantity)?;
    edit_active(register, |s| Ok(s.set_quantity(item_id, quantity)?))
}

pub fn remove_item(register: &RegisterState, item_id: &str) -> Result<CartResponse, ApiError> {
    debug!(item_id = %item_id, "remove_item command");
    edit_active(register, |s| Ok(s.remove_line(item_id)?))
}

/// Sets the discount as typed. A discount outside `[0, subtotal]` is
/// reported by the checkout preview, not refused here; only amounts past
/// the typed-amount limit are.
pub fn set_discount(register: &RegisterState, amount: &str) -> Result<CartResponse, ApiError> {
    debug!(amount = %amount, "set_discount command");
    let amount = parse_amount("discount", amount)?;
    edit_active(register, |s| {
        s.set_discount(amount);
        Ok(())
    })
}

/// Empties the active tab (lines, customer, discount, payment inputs).
pub fn clear_cart(register: &RegisterState) -> CartResponse {
    debug!("clear_cart command");
    register.with_manager_mut(|m| {
        m.with_active_mut(|s| {
            s.clear();
            CartResponse::from(&*s)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures::{item, FakeStore};
    use crate::error::ErrorCode;
    use shopfront_core::{Money, RejectReason};

    fn store() -> FakeStore {
        FakeStore::with_items(vec![
            item("RICE-5KG", 95000, 2),
            item("DAL-1KG", 11000, 0),
        ])
    }

    #[tokio::test]
    async fn test_scan_until_stock_runs_out() {
        let store = store();
        let register = RegisterState::in_memory();

        scan_item(&store, &register, "RICE-5KG").await.unwrap();
        let cart = scan_item(&store, &register, " RICE-5KG ").await.unwrap();
        assert_eq!(cart.session.lines[0].quantity, 2);
        assert_eq!(cart.settlement.subtotal, Money::from_cents(190000));

        let err = scan_item(&store, &register, "RICE-5KG").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::StockExceeded);
        assert_eq!(get_cart(&register).session.lines[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_out_of_stock_item_never_lands() {
        let store = store();
        let register = RegisterState::in_memory();

        let err = scan_item(&store, &register, "DAL-1KG").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::StockExceeded);
        assert!(get_cart(&register).session.is_empty());

        let err = scan_item(&store, &register, "NOPE").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = scan_item(&store, &register, "").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_quantity_discount_and_preview() {
        let store = store();
        let register = RegisterState::in_memory();
        let cart = scan_item(&store, &register, "RICE-5KG").await.unwrap();
        let item_id = cart.session.lines[0].item_id.clone();

        assert_eq!(
            cart.preview,
            ReconciliationOutcome::Reject(RejectReason::WalkInMustPayFull)
        );

        let cart = set_discount(&register, "2000").unwrap();
        assert_eq!(cart.settlement.total, Money::from_cents(95000 - 200000));
        assert_eq!(
            cart.preview,
            ReconciliationOutcome::Reject(RejectReason::InvalidDiscount)
        );

        let cart = set_discount(&register, "50").unwrap();
        assert_eq!(cart.settlement.total, Money::from_cents(90000));

        let err = set_quantity(&register, &item_id, 3).unwrap_err();
        assert_eq!(err.code, ErrorCode::StockExceeded);

        let cart = set_quantity(&register, &item_id, 0).unwrap();
        assert!(cart.session.is_empty());
        assert_eq!(cart.preview, ReconciliationOutcome::Reject(RejectReason::EmptyCart));

        let err = remove_item(&register, &item_id).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_huge_discount_is_refused_and_register_survives() {
        let store = store();
        let register = RegisterState::in_memory();
        scan_item(&store, &register, "RICE-5KG").await.unwrap();
        crate::commands::payment::set_tendered(&register, "600").unwrap();

        for typed in ["-92233720368547758.07", "92233720368547758.07"] {
            let err = set_discount(&register, typed).unwrap_err();
            assert_eq!(err.code, ErrorCode::ValidationError);
        }

        // the largest accepted amount still only previews a reject
        let cart = set_discount(&register, "-100000000").unwrap();
        assert_eq!(
            cart.preview,
            ReconciliationOutcome::Reject(RejectReason::InvalidDiscount)
        );
        let cart = set_discount(&register, "100000000").unwrap();
        assert_eq!(
            cart.preview,
            ReconciliationOutcome::Reject(RejectReason::InvalidDiscount)
        );

        assert_eq!(get_cart(&register).session.lines.len(), 1);
    }

    #[tokio::test]
    async fn test_search_and_clear() {
        let store = store();
        let register = RegisterState::in_memory();

        let hits = search_items(&store, "rice", None).await.unwrap();
        assert_eq!(hits.len(), 1);

        scan_item(&store, &register, "RICE-5KG").await.unwrap();
        set_discount(&register, "10").unwrap();
        let cart = clear_cart(&register);
        assert!(cart.session.is_empty());
        assert!(cart.session.discount.is_zero());
    }
}
