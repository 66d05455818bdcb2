//! # Register Commands
//!
//! Every operation the front end can invoke.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (exports)
//! ├── tabs.rs      ◄─── Open/close/switch/reorder tabs, park and retrieve
//! ├── cart.rs      ◄─── Scan, quantities, discount, catalog search
//! ├── customer.rs  ◄─── Attach, detach, create customers
//! ├── payment.rs   ◄─── Method, tendered, change, credit, split tenders
//! └── checkout.rs  ◄─── Finalize the active tab, look up invoices
//! ```
//!
//! ## State Injection
//! Each command declares only the state it needs:
//! ```rust,ignore
//! // Only needs tabs
//! fn get_cart(register: &RegisterState) -> CartResponse
//!
//! // Needs the catalog and tabs
//! async fn scan_item(catalog: &dyn CatalogLookup, register: &RegisterState, sku: &str)
//!
//! // Needs the finalizer
//! async fn checkout(finalizer: &CheckoutFinalizer, register: &RegisterState, ack)
//! ```
//!
//! Cart and payment commands act on the active tab and answer with a
//! [`cart::CartResponse`], so the screen can redraw totals and the live
//! checkout preview after every keystroke.

pub mod cart;
pub mod checkout;
pub mod customer;
pub mod payment;
pub mod tabs;

#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use shopfront_core::{CatalogItem, Customer, Money, NewCustomer};

    use crate::gateway::{CatalogLookup, CustomerDirectory, GatewayResult};

    pub(crate) fn item(sku: &str, price_cents: i64, stock: i64) -> CatalogItem {
        CatalogItem {
            id: format!("id-{}", sku),
            sku: sku.to_string(),
            name: format!("Item {}", sku),
            unit_price: Money::from_cents(price_cents),
            stock_qty: stock,
            unit: "pcs".to_string(),
        }
    }

    /// In-memory catalog and customer directory.
    #[derive(Default)]
    pub(crate) struct FakeStore {
        pub items: Vec<CatalogItem>,
        pub customers: Mutex<HashMap<String, Customer>>,
    }

    impl FakeStore {
        pub(crate) fn with_items(items: Vec<CatalogItem>) -> Self {
            FakeStore {
                items,
                ..FakeStore::default()
            }
        }

        pub(crate) fn add_customer(&self, id: &str, name: &str, dues_cents: i64) {
            self.customers.lock().unwrap().insert(
                id.to_string(),
                Customer {
                    id: id.to_string(),
                    name: name.to_string(),
                    phone: None,
                    dues: Money::from_cents(dues_cents),
                },
            );
        }
    }

    #[async_trait]
    impl CatalogLookup for FakeStore {
        async fn find_item(&self, sku_or_id: &str) -> GatewayResult<Option<CatalogItem>> {
            Ok(self
                .items
                .iter()
                .find(|i| i.sku == sku_or_id || i.id == sku_or_id)
                .cloned())
        }

        async fn search_items(&self, query: &str, limit: u32) -> GatewayResult<Vec<CatalogItem>> {
            let query = query.to_lowercase();
            Ok(self
                .items
                .iter()
                .filter(|i| i.name.to_lowercase().contains(&query) || i.sku.to_lowercase().contains(&query))
                .take(limit as usize)
                .cloned()
                .collect())
        }
    }

    #[async_trait]
    impl CustomerDirectory for FakeStore {
        async fn find_customers(&self, query: &str) -> GatewayResult<Vec<Customer>> {
            let query = query.to_lowercase();
            Ok(self
                .customers
                .lock()
                .unwrap()
                .values()
                .filter(|c| c.name.to_lowercase().contains(&query))
                .cloned()
                .collect())
        }

        async fn get_customer(&self, id: &str) -> GatewayResult<Option<Customer>> {
            Ok(self.customers.lock().unwrap().get(id).cloned())
        }

        async fn create_customer(&self, fields: &NewCustomer) -> GatewayResult<Customer> {
            let id = format!("c-{}", self.customers.lock().unwrap().len() + 1);
            let customer = Customer {
                id: id.clone(),
                name: fields.name.clone(),
                phone: fields.phone.clone(),
                dues: Money::zero(),
            };
            self.customers.lock().unwrap().insert(id, customer.clone());
            Ok(customer)
        }
    }
}
