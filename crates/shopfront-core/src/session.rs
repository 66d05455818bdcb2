//! # Session Manager
//!
//! Owns every open tab, which one is active, and the parked (held) orders.
//!
//! ## State
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │ SessionManager                                                       │
//! │                                                                      │
//! │  sessions   [Tab 1] [Tab 2]* [Tab 4]        * = active_id            │
//! │                │                                                     │
//! │   park_active  │  snapshot + clear              retrieve_parked      │
//! │                ▼                                      │              │
//! │  parked     [{ id, session, parked_at }, ...] ────────┘ new tab      │
//! │                                                                      │
//! │  store ── save(sessions) / save(active_id) / save(parked)            │
//! │           after every mutation; failures are logged, not raised      │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - There is always at least one session.
//! - `active_id` names a session in `sessions`.
//!
//! Sessions are only mutated through [`SessionManager::with_active_mut`] and
//! [`SessionManager::with_session_mut`], so every change is persisted.
//!
//! ## Persistence port
//! [`SessionStore`] loads and saves the three blobs. [`KvSessionStore`] maps
//! them onto any [`KeyValueStore`] as JSON under the keys below. A missing or
//! unreadable blob loads as "no saved state".

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use crate::cart::CartSession;
use crate::error::{CoreError, CoreResult, StoreError};
use crate::TAB_LABEL_PREFIX;

/// Key for the ordered list of open sessions.
pub const SESSIONS_KEY: &str = "shopfront.sessions";

/// Key for the active session id.
pub const ACTIVE_SESSION_KEY: &str = "shopfront.active_session";

/// Key for the parked orders.
pub const PARKED_KEY: &str = "shopfront.parked";

// =============================================================================
// Key-Value Port
// =============================================================================

/// A client-local string store (browser local storage, a directory of
/// files, ...).
pub trait KeyValueStore: Send {
    /// Returns `None` when the key is absent or cannot be read.
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-process store. Used in tests and when no data directory is available.
#[derive(Debug, Default, Clone)]
pub struct MemoryKeyValueStore {
    entries: HashMap<String, String>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

// =============================================================================
// Session Store Port
// =============================================================================

/// Load/save for the session manager's three blobs.
pub trait SessionStore: Send {
    fn load_sessions(&self) -> Option<Vec<CartSession>>;
    fn load_active_id(&self) -> Option<String>;
    fn load_parked(&self) -> Option<Vec<ParkedOrder>>;

    fn save_sessions(&mut self, sessions: &[CartSession]) -> Result<(), StoreError>;
    fn save_active_id(&mut self, id: &str) -> Result<(), StoreError>;
    fn save_parked(&mut self, parked: &[ParkedOrder]) -> Result<(), StoreError>;
}

impl<S: SessionStore + ?Sized> SessionStore for Box<S> {
    fn load_sessions(&self) -> Option<Vec<CartSession>> {
        (**self).load_sessions()
    }

    fn load_active_id(&self) -> Option<String> {
        (**self).load_active_id()
    }

    fn load_parked(&self) -> Option<Vec<ParkedOrder>> {
        (**self).load_parked()
    }

    fn save_sessions(&mut self, sessions: &[CartSession]) -> Result<(), StoreError> {
        (**self).save_sessions(sessions)
    }

    fn save_active_id(&mut self, id: &str) -> Result<(), StoreError> {
        (**self).save_active_id(id)
    }

    fn save_parked(&mut self, parked: &[ParkedOrder]) -> Result<(), StoreError> {
        (**self).save_parked(parked)
    }
}

/// JSON-over-key-value implementation of [`SessionStore`].
#[derive(Debug, Default, Clone)]
pub struct KvSessionStore<K> {
    kv: K,
}

impl<K: KeyValueStore> KvSessionStore<K> {
    pub fn new(kv: K) -> Self {
        KvSessionStore { kv }
    }

    pub fn into_inner(self) -> K {
        self.kv
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.kv.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(key, error = %e, "Ignoring unreadable saved state");
                None
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string(value).map_err(|source| StoreError::Serialization {
            key: key.to_string(),
            source,
        })?;
        self.kv.set(key, &json)
    }
}

impl<K: KeyValueStore> SessionStore for KvSessionStore<K> {
    fn load_sessions(&self) -> Option<Vec<CartSession>> {
        self.read(SESSIONS_KEY)
    }

    fn load_active_id(&self) -> Option<String> {
        self.read(ACTIVE_SESSION_KEY)
    }

    fn load_parked(&self) -> Option<Vec<ParkedOrder>> {
        self.read(PARKED_KEY)
    }

    fn save_sessions(&mut self, sessions: &[CartSession]) -> Result<(), StoreError> {
        self.write(SESSIONS_KEY, sessions)
    }

    fn save_active_id(&mut self, id: &str) -> Result<(), StoreError> {
        self.write(ACTIVE_SESSION_KEY, id)
    }

    fn save_parked(&mut self, parked: &[ParkedOrder]) -> Result<(), StoreError> {
        self.write(PARKED_KEY, parked)
    }
}

// =============================================================================
// Parked Order
// =============================================================================

/// A held sale: a full snapshot of the session at the time it was parked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ParkedOrder {
    pub id: String,
    pub session: CartSession,

    #[ts(as = "String")]
    pub parked_at: DateTime<Utc>,
}

// =============================================================================
// Session Manager
// =============================================================================

pub struct SessionManager<S> {
    sessions: Vec<CartSession>,
    active_id: String,
    parked: Vec<ParkedOrder>,
    store: S,
}

impl SessionManager<KvSessionStore<MemoryKeyValueStore>> {
    /// A manager with nothing saved and nowhere durable to save to.
    pub fn in_memory() -> Self {
        SessionManager::load(KvSessionStore::new(MemoryKeyValueStore::new()))
    }
}

impl<S: SessionStore> SessionManager<S> {
    /// Restores saved state from `store`, repairing it where needed.
    ///
    /// - No saved sessions (or an empty list): one fresh "Tab 1".
    /// - Saved active id missing or unknown: the first session is active.
    /// - No saved parked orders: none.
    pub fn load(store: S) -> Self {
        let mut sessions = store.load_sessions().unwrap_or_default();
        if sessions.is_empty() {
            sessions.push(CartSession::new(format!("{} 1", TAB_LABEL_PREFIX)));
        }

        let active_id = store
            .load_active_id()
            .filter(|id| sessions.iter().any(|s| &s.id == id))
            .unwrap_or_else(|| sessions[0].id.clone());

        let parked = store.load_parked().unwrap_or_default();

        info!(
            tabs = sessions.len(),
            parked = parked.len(),
            "Register sessions loaded"
        );

        let mut manager = SessionManager {
            sessions,
            active_id,
            parked,
            store,
        };
        manager.persist();
        manager
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Open sessions in tab order.
    pub fn sessions(&self) -> &[CartSession] {
        &self.sessions
    }

    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    pub fn active(&self) -> &CartSession {
        &self.sessions[self.active_index()]
    }

    pub fn get(&self, id: &str) -> Option<&CartSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn parked(&self) -> &[ParkedOrder] {
        &self.parked
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // -------------------------------------------------------------------------
    // Tabs
    // -------------------------------------------------------------------------

    /// Opens an empty tab with the smallest unused "Tab N" label and makes
    /// it active. Returns the new session id.
    pub fn open_tab(&mut self) -> String {
        let session = CartSession::new(self.next_label());
        let id = session.id.clone();

        info!(session_id = %id, label = %session.display_name, "Tab opened");
        self.sessions.push(session);
        self.active_id = id.clone();
        self.persist();
        id
    }

    /// Closes a tab.
    ///
    /// Closing the only remaining tab does nothing and returns `Ok(false)`.
    /// If the closed tab was active, the first remaining tab becomes active.
    pub fn close_tab(&mut self, id: &str) -> CoreResult<bool> {
        let index = self.index_of(id)?;

        if self.sessions.len() == 1 {
            debug!(session_id = %id, "Ignoring close of the last tab");
            return Ok(false);
        }

        let closed = self.sessions.remove(index);
        if closed.id == self.active_id {
            self.active_id = self.sessions[0].id.clone();
        }

        info!(session_id = %closed.id, label = %closed.display_name, "Tab closed");
        self.persist();
        Ok(true)
    }

    pub fn switch_to(&mut self, id: &str) -> CoreResult<()> {
        self.index_of(id)?;
        self.active_id = id.to_string();
        self.persist();
        Ok(())
    }

    /// Moves tab `id` so it sits just before `before_id`, or to the end
    /// when `before_id` is `None`.
    pub fn reorder(&mut self, id: &str, before_id: Option<&str>) -> CoreResult<()> {
        let from = self.index_of(id)?;
        if let Some(before) = before_id {
            self.index_of(before)?;
            if before == id {
                return Ok(());
            }
        }

        let moved = self.sessions.remove(from);
        let to = match before_id {
            Some(before) => self
                .sessions
                .iter()
                .position(|s| s.id == before)
                .unwrap_or(self.sessions.len()),
            None => self.sessions.len(),
        };
        self.sessions.insert(to, moved);

        self.persist();
        Ok(())
    }

    /// Removes a finished session, even if it is the last one. A fresh tab
    /// is opened when nothing would remain.
    pub fn retire(&mut self, id: &str) -> CoreResult<()> {
        let index = self.index_of(id)?;
        let retired = self.sessions.remove(index);

        if self.sessions.is_empty() {
            let fresh = CartSession::new(self.next_label());
            self.sessions.push(fresh);
        }
        if retired.id == self.active_id {
            self.active_id = self.sessions[0].id.clone();
        }

        info!(session_id = %retired.id, label = %retired.display_name, "Tab retired");
        self.persist();
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Runs `f` on the active session, then persists.
    pub fn with_active_mut<R>(&mut self, f: impl FnOnce(&mut CartSession) -> R) -> R {
        let index = self.active_index();
        let result = f(&mut self.sessions[index]);
        self.persist();
        result
    }

    /// Runs `f` on the session `id`, then persists.
    pub fn with_session_mut<R>(
        &mut self,
        id: &str,
        f: impl FnOnce(&mut CartSession) -> R,
    ) -> CoreResult<R> {
        let index = self.index_of(id)?;
        let result = f(&mut self.sessions[index]);
        self.persist();
        Ok(result)
    }

    // -------------------------------------------------------------------------
    // Parked orders
    // -------------------------------------------------------------------------

    /// Holds the active sale for later and clears the tab for the next
    /// customer. The tab itself stays open.
    pub fn park_active(&mut self) -> CoreResult<ParkedOrder> {
        let index = self.active_index();
        let session = &mut self.sessions[index];
        if session.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let order = ParkedOrder {
            id: Uuid::new_v4().to_string(),
            session: session.clone(),
            parked_at: Utc::now(),
        };
        session.clear();

        info!(
            parked_id = %order.id,
            label = %order.session.display_name,
            lines = order.session.item_count(),
            "Order parked"
        );
        self.parked.push(order.clone());
        self.persist();
        Ok(order)
    }

    /// Reopens a parked order in a new active tab and forgets the parked
    /// entry. Returns the new session id.
    ///
    /// The tab gets a fresh id and the smallest unused label. Lines,
    /// customer, discount and payment inputs come back as parked.
    pub fn retrieve_parked(&mut self, parked_id: &str) -> CoreResult<String> {
        let index = self.parked_index_of(parked_id)?;
        let order = self.parked.remove(index);

        let session = CartSession {
            id: Uuid::new_v4().to_string(),
            display_name: self.next_label(),
            created_at: Utc::now(),
            ..order.session
        };
        let id = session.id.clone();

        info!(parked_id = %order.id, session_id = %id, "Parked order retrieved");
        self.sessions.push(session);
        self.active_id = id.clone();
        self.persist();
        Ok(id)
    }

    pub fn discard_parked(&mut self, parked_id: &str) -> CoreResult<ParkedOrder> {
        let index = self.parked_index_of(parked_id)?;
        let order = self.parked.remove(index);

        info!(parked_id = %order.id, "Parked order discarded");
        self.persist();
        Ok(order)
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn active_index(&self) -> usize {
        self.sessions
            .iter()
            .position(|s| s.id == self.active_id)
            .unwrap_or(0)
    }

    fn index_of(&self, id: &str) -> CoreResult<usize> {
        self.sessions
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| CoreError::SessionNotFound(id.to_string()))
    }

    fn parked_index_of(&self, parked_id: &str) -> CoreResult<usize> {
        self.parked
            .iter()
            .position(|p| p.id == parked_id)
            .ok_or_else(|| CoreError::ParkedOrderNotFound(parked_id.to_string()))
    }

    /// Smallest N >= 1 such that "Tab N" is not an open tab's label.
    fn next_label(&self) -> String {
        let prefix = format!("{} ", TAB_LABEL_PREFIX);
        let used: Vec<u32> = self
            .sessions
            .iter()
            .filter_map(|s| s.display_name.strip_prefix(&prefix)?.parse().ok())
            .collect();

        let n = (1..).find(|n| !used.contains(n)).unwrap_or(1);
        format!("{}{}", prefix, n)
    }

    /// Saves each blob independently; one failed write does not skip the
    /// others.
    fn persist(&mut self) {
        let results = [
            ("sessions", self.store.save_sessions(&self.sessions)),
            ("active session", self.store.save_active_id(&self.active_id)),
            ("parked orders", self.store.save_parked(&self.parked)),
        ];

        for (blob, result) in results {
            if let Err(e) = result {
                warn!(blob, error = %e, "Failed to persist register state");
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::tests::item;
    use crate::money::Money;
    use crate::types::{Customer, PaymentMethod};

    fn labels<S: SessionStore>(m: &SessionManager<S>) -> Vec<String> {
        m.sessions().iter().map(|s| s.display_name.clone()).collect()
    }

    #[test]
    fn test_fresh_manager_has_one_tab() {
        let m = SessionManager::in_memory();
        assert_eq!(labels(&m), vec!["Tab 1"]);
        assert_eq!(m.active().id, m.sessions()[0].id);
        assert!(m.parked().is_empty());
    }

    #[test]
    fn test_open_tab_reuses_gaps() {
        let mut m = SessionManager::in_memory();
        let tab2 = m.open_tab();
        m.open_tab();
        assert_eq!(labels(&m), vec!["Tab 1", "Tab 2", "Tab 3"]);

        m.close_tab(&tab2).unwrap();
        let reopened = m.open_tab();

        assert_eq!(m.get(&reopened).unwrap().display_name, "Tab 2");
        assert_eq!(m.active_id(), reopened);
    }

    #[test]
    fn test_closing_last_tab_is_noop() {
        let mut m = SessionManager::in_memory();
        let only = m.active().id.clone();

        assert!(!m.close_tab(&only).unwrap());
        assert_eq!(m.sessions().len(), 1);
        assert_eq!(m.active_id(), only);
    }

    #[test]
    fn test_closing_active_tab_activates_first() {
        let mut m = SessionManager::in_memory();
        let first = m.active().id.clone();
        m.open_tab();
        let third = m.open_tab();

        assert!(m.close_tab(&third).unwrap());
        assert_eq!(m.active_id(), first);
        assert_eq!(
            m.close_tab("nope").unwrap_err(),
            CoreError::SessionNotFound("nope".into())
        );
    }

    #[test]
    fn test_switch_and_reorder() {
        let mut m = SessionManager::in_memory();
        let t1 = m.active().id.clone();
        let t2 = m.open_tab();
        let t3 = m.open_tab();

        m.switch_to(&t1).unwrap();
        assert_eq!(m.active_id(), t1);
        assert!(m.switch_to("missing").is_err());

        m.reorder(&t3, Some(&t1)).unwrap();
        assert_eq!(labels(&m), vec!["Tab 3", "Tab 1", "Tab 2"]);

        m.reorder(&t3, None).unwrap();
        assert_eq!(labels(&m), vec!["Tab 1", "Tab 2", "Tab 3"]);

        m.reorder(&t2, Some(&t2)).unwrap();
        assert_eq!(labels(&m), vec!["Tab 1", "Tab 2", "Tab 3"]);
    }

    #[test]
    fn test_park_requires_lines() {
        let mut m = SessionManager::in_memory();
        assert_eq!(m.park_active().unwrap_err(), CoreError::EmptyCart);
    }

    #[test]
    fn test_park_and_retrieve() {
        let mut m = SessionManager::in_memory();
        let tab1 = m.active().id.clone();
        m.with_active_mut(|s| {
            s.add_line(&item("rice", 25000, 4)).unwrap();
            s.set_customer(Some(Customer {
                id: "c-1".into(),
                name: "Asha".into(),
                phone: None,
                dues: Money::zero(),
            }));
            s.set_payment_method(PaymentMethod::Upi);
        });

        let parked = m.park_active().unwrap();

        // tab stays open, contents cleared
        assert_eq!(m.active_id(), tab1);
        assert!(m.active().is_empty());
        assert!(m.active().customer.is_none());
        assert_eq!(m.parked().len(), 1);

        let restored = m.retrieve_parked(&parked.id).unwrap();
        let session = m.get(&restored).unwrap();

        assert_ne!(restored, tab1);
        assert_eq!(session.display_name, "Tab 2");
        assert_eq!(session.line("rice").unwrap().quantity, 1);
        assert_eq!(session.customer.as_ref().unwrap().id, "c-1");
        assert_eq!(session.payment_method, PaymentMethod::Upi);
        assert_eq!(m.active_id(), restored);
        assert!(m.parked().is_empty());

        assert_eq!(
            m.retrieve_parked(&parked.id).unwrap_err(),
            CoreError::ParkedOrderNotFound(parked.id.clone())
        );
    }

    #[test]
    fn test_discard_parked() {
        let mut m = SessionManager::in_memory();
        m.with_active_mut(|s| s.add_line(&item("a", 100, 1))).unwrap();
        let parked = m.park_active().unwrap();

        m.discard_parked(&parked.id).unwrap();
        assert!(m.parked().is_empty());
        assert!(m.discard_parked(&parked.id).is_err());
    }

    #[test]
    fn test_retire_last_tab_opens_replacement() {
        let mut m = SessionManager::in_memory();
        let only = m.active().id.clone();

        m.retire(&only).unwrap();

        assert_eq!(m.sessions().len(), 1);
        assert_ne!(m.active_id(), only);
        assert_eq!(m.active().display_name, "Tab 1");
    }

    #[test]
    fn test_retire_background_tab_keeps_active() {
        let mut m = SessionManager::in_memory();
        let t1 = m.active().id.clone();
        let t2 = m.open_tab();
        m.switch_to(&t1).unwrap();

        m.retire(&t2).unwrap();
        assert_eq!(m.active_id(), t1);
        assert_eq!(m.sessions().len(), 1);
    }

    #[test]
    fn test_with_session_mut_unknown_id() {
        let mut m = SessionManager::in_memory();
        let err = m.with_session_mut("ghost", |_| ()).unwrap_err();
        assert_eq!(err, CoreError::SessionNotFound("ghost".into()));
    }

    #[test]
    fn test_state_survives_reload() {
        let mut m = SessionManager::in_memory();
        m.with_active_mut(|s| s.add_line(&item("a", 500, 3))).unwrap();
        let t2 = m.open_tab();
        m.with_active_mut(|s| s.add_line(&item("b", 700, 3))).unwrap();
        let parked = m.park_active().unwrap();

        let store = KvSessionStore::new(m.store().clone().into_inner());
        let reloaded = SessionManager::load(store);

        assert_eq!(labels(&reloaded), vec!["Tab 1", "Tab 2"]);
        assert_eq!(reloaded.active_id(), t2);
        assert_eq!(reloaded.sessions()[0].subtotal().cents(), 500);
        assert_eq!(reloaded.parked()[0].id, parked.id);
    }

    #[test]
    fn test_garbage_saved_state_is_ignored() {
        let mut kv = MemoryKeyValueStore::new();
        kv.set(SESSIONS_KEY, "{not json").unwrap();
        kv.set(ACTIVE_SESSION_KEY, "\"dangling\"").unwrap();
        kv.set(PARKED_KEY, "42").unwrap();

        let m = SessionManager::load(KvSessionStore::new(kv));

        assert_eq!(labels(&m), vec!["Tab 1"]);
        assert_eq!(m.active_id(), m.sessions()[0].id);
        assert!(m.parked().is_empty());
    }

    /// Refuses to save sessions; counts the other saves.
    #[derive(Default)]
    struct FailingStore {
        active_saves: usize,
        parked_saves: usize,
    }

    impl SessionStore for FailingStore {
        fn load_sessions(&self) -> Option<Vec<CartSession>> {
            None
        }
        fn load_active_id(&self) -> Option<String> {
            None
        }
        fn load_parked(&self) -> Option<Vec<ParkedOrder>> {
            None
        }
        fn save_sessions(&mut self, _: &[CartSession]) -> Result<(), StoreError> {
            Err(StoreError::Io {
                key: SESSIONS_KEY.into(),
                message: "disk full".into(),
            })
        }
        fn save_active_id(&mut self, _: &str) -> Result<(), StoreError> {
            self.active_saves += 1;
            Ok(())
        }
        fn save_parked(&mut self, _: &[ParkedOrder]) -> Result<(), StoreError> {
            self.parked_saves += 1;
            Ok(())
        }
    }

    #[test]
    fn test_persistence_failure_does_not_block_register() {
        let mut m = SessionManager::load(Box::new(FailingStore::default()) as Box<dyn SessionStore>);
        m.open_tab();
        m.with_active_mut(|s| s.add_line(&item("a", 100, 1))).unwrap();

        assert_eq!(m.sessions().len(), 2);
        assert_eq!(m.active().item_count(), 1);
    }

    #[test]
    fn test_failed_sessions_save_still_saves_the_rest() {
        let mut m = SessionManager::load(FailingStore::default());
        let before = m.store().active_saves;

        m.open_tab();
        m.with_active_mut(|s| s.add_line(&item("a", 100, 1))).unwrap();

        assert_eq!(m.store().active_saves, before + 2);
        assert_eq!(m.store().parked_saves, before + 2);
    }
}
