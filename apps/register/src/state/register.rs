//! # Register State
//!
//! Owns the [`SessionManager`]: every open tab and every parked order.
//!
//! ## Thread Safety
//! The manager is wrapped in `Arc<Mutex<T>>` because:
//! 1. Multiple commands may read or modify tabs
//! 2. Only one command should modify them at a time
//! 3. The checkout finalizer runs concurrently with other commands
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Command                      Lock held for                             │
//! │  ───────                      ─────────────                             │
//! │  scan_item     await catalog ──► lock ─► add_line ─► unlock            │
//! │  checkout      lock ─► clone tab ─► unlock                              │
//! │                await create_invoice                                     │
//! │                lock ─► retire tab ─► unlock                             │
//! │                                                                         │
//! │  NOTE: the lock is never held across an `.await`.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A panic while the lock was held leaves the mutex poisoned. The tabs are
//! still consistent at that point (every core mutation either fully applies
//! or returns an error first), so the guard is recovered rather than
//! propagated.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shopfront_core::{KvSessionStore, SessionManager, SessionStore};

use super::storage::FileKeyValueStore;

pub type Manager = SessionManager<Box<dyn SessionStore>>;

#[derive(Clone)]
pub struct RegisterState {
    manager: Arc<Mutex<Manager>>,
}

impl RegisterState {
    pub fn new<S: SessionStore + 'static>(store: S) -> Self {
        let store: Box<dyn SessionStore> = Box::new(store);
        RegisterState {
            manager: Arc::new(Mutex::new(SessionManager::load(store))),
        }
    }

    /// Restores tabs saved under `dir`.
    pub fn open(dir: &Path) -> Self {
        RegisterState::new(KvSessionStore::new(FileKeyValueStore::new(dir)))
    }

    /// No persistence beyond the process. Used by tests.
    pub fn in_memory() -> Self {
        RegisterState::new(KvSessionStore::new(shopfront_core::MemoryKeyValueStore::new()))
    }

    fn lock(&self) -> MutexGuard<'_, Manager> {
        self.manager.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Executes a function with read access to the tabs.
    pub fn with_manager<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Manager) -> R,
    {
        let manager = self.lock();
        f(&manager)
    }

    /// Executes a function with write access to the tabs.
    pub fn with_manager_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Manager) -> R,
    {
        let mut manager = self.lock();
        f(&mut manager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_tabs() {
        let state = RegisterState::in_memory();
        let other = state.clone();

        let opened = state.with_manager_mut(|m| m.open_tab());

        other.with_manager(|m| {
            assert_eq!(m.sessions().len(), 2);
            assert_eq!(m.active_id(), opened);
        });
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let state = RegisterState::in_memory();
        let clone = state.clone();

        let _ = std::thread::spawn(move || {
            clone.with_manager_mut(|m| {
                m.open_tab();
                panic!("boom");
            })
        })
        .join();

        assert_eq!(state.with_manager(|m| m.sessions().len()), 2);
    }

    #[test]
    fn test_open_restores_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let label = {
            let state = RegisterState::open(dir.path());
            state.with_manager_mut(|m| {
                m.open_tab();
                m.active().display_name.clone()
            })
        };

        let state = RegisterState::open(dir.path());
        assert_eq!(state.with_manager(|m| m.active().display_name.clone()), label);
    }
}
