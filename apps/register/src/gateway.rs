//! # Collaborator Gateways
//!
//! The three outside services the register talks to, as object-safe async
//! traits. The SQLite [`Database`] implements all of them; tests swap in
//! in-memory fakes.
//!
//! ```text
//! ┌──────────────────────┐   find_item / search_items
//! │    CatalogLookup     │◄──────────────────────────── scan, search
//! └──────────────────────┘
//! ┌──────────────────────┐   find / get / create
//! │  CustomerDirectory   │◄──────────────────────────── attach customer
//! └──────────────────────┘
//! ┌──────────────────────┐   create_invoice(draft)
//! │    InvoiceGateway    │◄──────────────────────────── CheckoutFinalizer
//! └──────────────────────┘
//! ```

use async_trait::async_trait;
use thiserror::Error;

use shopfront_core::{CatalogItem, Customer, Invoice, InvoiceDraft, NewCustomer};
use shopfront_db::{DbError, Database};

/// Most customers a directory search returns.
pub const CUSTOMER_SEARCH_LIMIT: u32 = 20;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// SKU first, then id.
    async fn find_item(&self, sku_or_id: &str) -> GatewayResult<Option<CatalogItem>>;

    async fn search_items(&self, query: &str, limit: u32) -> GatewayResult<Vec<CatalogItem>>;
}

#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn find_customers(&self, query: &str) -> GatewayResult<Vec<Customer>>;

    async fn get_customer(&self, id: &str) -> GatewayResult<Option<Customer>>;

    async fn create_customer(&self, fields: &NewCustomer) -> GatewayResult<Customer>;
}

/// Persists a finished sale.
///
/// Implementations must be atomic: the invoice row, stock decrements and the
/// customer's `dues_delta` either all land or none do.
#[async_trait]
pub trait InvoiceGateway: Send + Sync {
    async fn create_invoice(&self, draft: &InvoiceDraft) -> GatewayResult<Invoice>;

    /// Looks an invoice up by id or invoice number.
    async fn get_invoice(&self, id_or_number: &str) -> GatewayResult<Option<Invoice>>;
}

// =============================================================================
// SQLite Implementations
// =============================================================================

#[async_trait]
impl CatalogLookup for Database {
    async fn find_item(&self, sku_or_id: &str) -> GatewayResult<Option<CatalogItem>> {
        Ok(self.items().find(sku_or_id).await?)
    }

    async fn search_items(&self, query: &str, limit: u32) -> GatewayResult<Vec<CatalogItem>> {
        Ok(self.items().search(query, limit).await?)
    }
}

#[async_trait]
impl CustomerDirectory for Database {
    async fn find_customers(&self, query: &str) -> GatewayResult<Vec<Customer>> {
        Ok(self
            .customers()
            .search(query, CUSTOMER_SEARCH_LIMIT)
            .await?)
    }

    async fn get_customer(&self, id: &str) -> GatewayResult<Option<Customer>> {
        Ok(self.customers().get_by_id(id).await?)
    }

    async fn create_customer(&self, fields: &NewCustomer) -> GatewayResult<Customer> {
        Ok(self.customers().create(fields).await?)
    }
}

#[async_trait]
impl InvoiceGateway for Database {
    async fn create_invoice(&self, draft: &InvoiceDraft) -> GatewayResult<Invoice> {
        Ok(self.invoices().create_invoice(draft).await?)
    }

    async fn get_invoice(&self, id_or_number: &str) -> GatewayResult<Option<Invoice>> {
        let invoices = self.invoices();
        if let Some(invoice) = invoices.get_by_number(id_or_number).await? {
            return Ok(Some(invoice));
        }
        Ok(invoices.get_by_id(id_or_number).await?)
    }
}
