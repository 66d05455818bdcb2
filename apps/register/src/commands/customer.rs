//! # Customer Commands
//!
//! Attaching a customer turns a walk-in sale into one that may leave dues
//! or spend store credit. The customer is a snapshot: balances are read when
//! attached and not refreshed until attached again.

use tracing::{debug, info};

use shopfront_core::validation::{validate_customer_name, validate_phone, validate_search_query};
use shopfront_core::{Customer, NewCustomer};

use super::cart::{edit_active, CartResponse};
use crate::error::ApiError;
use crate::gateway::CustomerDirectory;
use crate::state::RegisterState;

pub async fn search_customers(
    directory: &dyn CustomerDirectory,
    query: &str,
) -> Result<Vec<Customer>, ApiError> {
    let query = validate_search_query(query)?;
    debug!(query = %query, "search_customers command");

    Ok(directory.find_customers(&query).await?)
}

/// Attaches customer `id` to the active tab. Any credit requested for the
/// previous customer is dropped.
pub async fn attach_customer(
    directory: &dyn CustomerDirectory,
    register: &RegisterState,
    id: &str,
) -> Result<CartResponse, ApiError> {
    debug!(id = %id, "attach_customer command");

    let customer = directory
        .get_customer(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", id))?;

    edit_active(register, |s| {
        s.set_customer(Some(customer));
        Ok(())
    })
}

/// Back to a walk-in sale.
pub fn detach_customer(register: &RegisterState) -> Result<CartResponse, ApiError> {
    debug!("detach_customer command");
    edit_active(register, |s| {
        s.set_customer(None);
        Ok(())
    })
}

/// Creates a customer at the counter and attaches them to the active tab.
pub async fn create_customer(
    directory: &dyn CustomerDirectory,
    register: &RegisterState,
    name: &str,
    phone: Option<&str>,
) -> Result<CartResponse, ApiError> {
    let fields = NewCustomer {
        name: validate_customer_name(name)?,
        phone: validate_phone(phone)?,
    };
    debug!(name = %fields.name, "create_customer command");

    let customer = directory.create_customer(&fields).await?;
    info!(customer_id = %customer.id, "Customer created at the counter");

    edit_active(register, |s| {
        s.set_customer(Some(customer));
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures::{item, FakeStore};
    use crate::error::ErrorCode;
    use shopfront_core::Money;

    #[tokio::test]
    async fn test_attach_snapshots_credit() {
        let store = FakeStore::with_items(vec![item("TEA-1", 10000, 5)]);
        store.add_customer("c-1", "Meera Shah", -20000);
        let register = RegisterState::in_memory();

        let cart = attach_customer(&store, &register, "c-1").await.unwrap();
        assert_eq!(cart.session.credit_available, Money::from_cents(20000));

        let err = attach_customer(&store, &register, "c-9").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let cart = detach_customer(&register).unwrap();
        assert!(cart.session.customer.is_none());
        assert!(cart.session.credit_available.is_zero());
    }

    #[tokio::test]
    async fn test_create_and_search() {
        let store = FakeStore::default();
        let register = RegisterState::in_memory();

        let err = create_customer(&store, &register, "  ", None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let cart = create_customer(&store, &register, "Asha Verma", Some("98111 22233"))
            .await
            .unwrap();
        assert_eq!(
            cart.session.customer.as_ref().map(|c| c.name.as_str()),
            Some("Asha Verma")
        );

        let hits = search_customers(&store, "asha").await.unwrap();
        assert_eq!(hits.len(), 1);
    }
}
