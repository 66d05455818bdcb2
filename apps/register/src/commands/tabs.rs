//! # Tab Commands
//!
//! Tabs let one cashier serve several customers at once; parking holds a
//! sale (customer went to fetch their wallet) and frees the tab.
//!
//! ## Tab Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  open_tab ──► ┌─────────┐ ── checkout ──► retired (invoice created)     │
//! │               │  Tab N  │ ── close_tab ─► removed (unless last tab)     │
//! │               └────┬────┘                                               │
//! │                    │ park_active                                        │
//! │                    ▼                                                    │
//! │               ┌─────────┐ ── retrieve_parked ──► new tab, same contents │
//! │               │ Parked  │ ── discard_parked ───► dropped                │
//! │               └─────────┘                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use shopfront_core::{Money, ParkedOrder, PaymentMethod};

use crate::error::ApiError;
use crate::state::{Manager, RegisterState};

/// One entry of the tab strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabSummary {
    pub id: String,
    pub label: String,
    pub customer_name: Option<String>,
    pub item_count: usize,
    pub total: Money,
    pub active: bool,
}

/// One entry of the parked-orders list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkedSummary {
    pub id: String,
    pub label: String,
    pub customer_name: Option<String>,
    pub total: Money,
    pub parked_at: DateTime<Utc>,
}

impl From<&ParkedOrder> for ParkedSummary {
    fn from(parked: &ParkedOrder) -> Self {
        ParkedSummary {
            id: parked.id.clone(),
            label: parked.session.display_name.clone(),
            customer_name: parked.session.customer.as_ref().map(|c| c.name.clone()),
            total: parked.session.total(),
            parked_at: parked.parked_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabsResponse {
    pub tabs: Vec<TabSummary>,
    pub parked: Vec<ParkedSummary>,
}

impl From<&Manager> for TabsResponse {
    fn from(m: &Manager) -> Self {
        let tabs = m
            .sessions()
            .iter()
            .map(|s| TabSummary {
                id: s.id.clone(),
                label: s.display_name.clone(),
                customer_name: s.customer.as_ref().map(|c| c.name.clone()),
                item_count: s.item_count(),
                total: s.total(),
                active: s.id == m.active_id(),
            })
            .collect();

        TabsResponse {
            tabs,
            parked: m.parked().iter().map(ParkedSummary::from).collect(),
        }
    }
}

pub fn list_tabs(register: &RegisterState) -> TabsResponse {
    register.with_manager(|m| TabsResponse::from(m))
}

/// Opens a new tab, preselecting `default_method`, and switches to it.
pub fn open_tab(register: &RegisterState, default_method: PaymentMethod) -> TabsResponse {
    debug!("open_tab command");
    register.with_manager_mut(|m| {
        m.open_tab();
        m.with_active_mut(|s| s.set_payment_method(default_method));
        TabsResponse::from(&*m)
    })
}

/// Closes a tab. Closing the last tab does nothing.
pub fn close_tab(register: &RegisterState, id: &str) -> Result<TabsResponse, ApiError> {
    debug!(id = %id, "close_tab command");
    register.with_manager_mut(|m| {
        m.close_tab(id)?;
        Ok::<_, ApiError>(TabsResponse::from(&*m))
    })
}

pub fn switch_tab(register: &RegisterState, id: &str) -> Result<TabsResponse, ApiError> {
    debug!(id = %id, "switch_tab command");
    register.with_manager_mut(|m| {
        m.switch_to(id)?;
        Ok::<_, ApiError>(TabsResponse::from(&*m))
    })
}

/// Moves tab `id` in front of `before_id`, or to the end when `None`.
pub fn reorder_tab(
    register: &RegisterState,
    id: &str,
    before_id: Option<&str>,
) -> Result<TabsResponse, ApiError> {
    debug!(id = %id, before = ?before_id, "reorder_tab command");
    register.with_manager_mut(|m| {
        m.reorder(id, before_id)?;
        Ok::<_, ApiError>(TabsResponse::from(&*m))
    })
}

/// Holds the active sale; the tab is cleared for the next customer.
pub fn park_active(register: &RegisterState) -> Result<TabsResponse, ApiError> {
    debug!("park_active command");
    register.with_manager_mut(|m| {
        m.park_active()?;
        Ok::<_, ApiError>(TabsResponse::from(&*m))
    })
}

/// Reopens a parked sale in a new tab and switches to it.
pub fn retrieve_parked(register: &RegisterState, parked_id: &str) -> Result<TabsResponse, ApiError> {
    debug!(parked_id = %parked_id, "retrieve_parked command");
    register.with_manager_mut(|m| {
        m.retrieve_parked(parked_id)?;
        Ok::<_, ApiError>(TabsResponse::from(&*m))
    })
}

pub fn discard_parked(register: &RegisterState, parked_id: &str) -> Result<TabsResponse, ApiError> {
    debug!(parked_id = %parked_id, "discard_parked command");
    register.with_manager_mut(|m| {
        m.discard_parked(parked_id)?;
        Ok::<_, ApiError>(TabsResponse::from(&*m))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures::item;
    use crate::error::ErrorCode;

    #[test]
    fn test_open_switch_close() {
        let register = RegisterState::in_memory();

        let tabs = open_tab(&register, PaymentMethod::Upi);
        assert_eq!(tabs.tabs.len(), 2);
        assert_eq!(tabs.tabs[1].label, "Tab 2");
        assert!(tabs.tabs[1].active);
        assert_eq!(
            register.with_manager(|m| m.active().payment_method),
            PaymentMethod::Upi
        );

        let first = tabs.tabs[0].id.clone();
        let tabs = switch_tab(&register, &first).unwrap();
        assert!(tabs.tabs[0].active);

        let tabs = close_tab(&register, &first).unwrap();
        assert_eq!(tabs.tabs.len(), 1);

        // Last tab cannot be closed
        let last = tabs.tabs[0].id.clone();
        let tabs = close_tab(&register, &last).unwrap();
        assert_eq!(tabs.tabs.len(), 1);

        let err = switch_tab(&register, "ghost").unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_reorder() {
        let register = RegisterState::in_memory();
        open_tab(&register, PaymentMethod::Cash);
        let tabs = open_tab(&register, PaymentMethod::Cash);
        let ids: Vec<String> = tabs.tabs.iter().map(|t| t.id.clone()).collect();

        let tabs = reorder_tab(&register, &ids[2], Some(&ids[0])).unwrap();
        let labels: Vec<&str> = tabs.tabs.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, ["Tab 3", "Tab 1", "Tab 2"]);
    }

    #[test]
    fn test_park_and_retrieve() {
        let register = RegisterState::in_memory();

        let err = park_active(&register).unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);

        register
            .with_manager_mut(|m| m.with_active_mut(|s| s.add_line(&item("TEA-1", 1000, 5))))
            .unwrap();

        let tabs = park_active(&register).unwrap();
        assert_eq!(tabs.parked.len(), 1);
        assert_eq!(tabs.parked[0].total, Money::from_cents(1000));
        assert_eq!(tabs.tabs[0].item_count, 0);

        let parked_id = tabs.parked[0].id.clone();
        let tabs = retrieve_parked(&register, &parked_id).unwrap();
        assert!(tabs.parked.is_empty());
        assert_eq!(tabs.tabs.len(), 2);
        assert!(tabs.tabs[1].active);
        assert_eq!(tabs.tabs[1].total, Money::from_cents(1000));

        let err = discard_parked(&register, &parked_id).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
