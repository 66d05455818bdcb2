//! # State Module
//!
//! Long-lived register state, one focused type per concern.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────────────┐   │
//! │  │  AppConfig   │  │  RegisterState   │  │  FileKeyValueStore       │   │
//! │  │              │  │                  │  │                          │   │
//! │  │  store_name  │  │  Arc<Mutex<      │  │  data_dir/sessions/*.json│   │
//! │  │  data_dir    │  │   SessionManager │──►  (tabs, active, parked)  │   │
//! │  │  db path     │  │  >>              │  │                          │   │
//! │  └──────────────┘  └──────────────────┘  └──────────────────────────┘   │
//! │                                                                         │
//! │  THREAD SAFETY:                                                         │
//! │  • AppConfig: read-only after startup                                   │
//! │  • RegisterState: Arc<Mutex<T>>, never locked across an await           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod register;
mod storage;

pub use config::{AppConfig, ConfigError};
pub use register::{Manager, RegisterState};
pub use storage::FileKeyValueStore;
