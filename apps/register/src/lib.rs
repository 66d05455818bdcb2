//! # Shopfront Register
//!
//! The application layer of Shopfront POS: wires configuration, the SQLite
//! collaborators and the saved tabs together, and exposes the cashier's
//! commands to a front end.
//!
//! ## Module Organization
//! ```text
//! shopfront_register/
//! ├── lib.rs          ◄─── You are here (startup & tracing)
//! ├── state/
//! │   ├── config.rs   ◄─── AppConfig (defaults, toml, env)
//! │   ├── register.rs ◄─── RegisterState: Arc<Mutex<SessionManager>>
//! │   └── storage.rs  ◄─── FileKeyValueStore for saved tabs
//! ├── gateway.rs      ◄─── Catalog / customer / invoice traits
//! ├── checkout.rs     ◄─── CheckoutFinalizer (in-flight guard)
//! ├── commands/       ◄─── tabs, cart, customer, payment, checkout
//! ├── terminal.rs     ◄─── Line-oriented front end
//! └── error.rs        ◄─── API error type for commands
//! ```

pub mod checkout;
pub mod commands;
pub mod error;
pub mod gateway;
pub mod state;
pub mod terminal;

use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use checkout::CheckoutFinalizer;
use shopfront_db::{Database, DbConfig, DbError};
use state::{AppConfig, ConfigError, RegisterState};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Could not create data directory: {0}")]
    DataDir(#[from] std::io::Error),

    #[error(transparent)]
    Database(#[from] DbError),
}

/// Everything a running register holds.
pub struct Register {
    pub config: AppConfig,
    pub db: Arc<Database>,
    pub state: RegisterState,
    pub finalizer: CheckoutFinalizer,
}

impl Register {
    /// Starts a register from `config`.
    ///
    /// ## Startup Sequence
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────────┐
    /// │  1. Create data directory ────────────────────────────────────────────► │
    /// │     • Linux: ~/.local/share/shopfront/ (or SHOPFRONT_DATA_DIR)          │
    /// │                                                                         │
    /// │  2. Connect to Database ──────────────────────────────────────────────► │
    /// │     • SQLite with WAL mode                                              │
    /// │     • Run pending migrations                                            │
    /// │                                                                         │
    /// │  3. Restore Tabs ─────────────────────────────────────────────────────► │
    /// │     • data_dir/sessions/*.json, unreadable files ignored                │
    /// │                                                                         │
    /// │  4. Build Finalizer ──────────────────────────────────────────────────► │
    /// │     • Database as the invoice gateway                                   │
    /// └─────────────────────────────────────────────────────────────────────────┘
    /// ```
    pub async fn start(config: AppConfig) -> Result<Self, StartupError> {
        std::fs::create_dir_all(&config.data_dir)?;

        let db_path = config.database_path();
        info!(?db_path, "Database path determined");
        let db = Arc::new(Database::new(DbConfig::new(db_path)).await?);
        info!("Database connected and migrations applied");

        let state = RegisterState::open(&config.sessions_dir());
        let tabs = state.with_manager(|m| m.sessions().len());
        info!(tabs, store = %config.store_name, "Register state restored");

        let finalizer = CheckoutFinalizer::new(db.clone());

        Ok(Register {
            config,
            db,
            state,
            finalizer,
        })
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so they do not interleave with the terminal front end.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=shopfront=trace` - Show trace for shopfront crates only
/// - Default: `info,shopfront=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shopfront=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_start_creates_everything_under_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            data_dir: dir.path().join("shop"),
            ..AppConfig::default()
        };

        let register = Register::start(config).await.unwrap();

        assert!(dir.path().join("shop/shopfront.db").exists());
        assert!(register.db.health_check().await);
        assert_eq!(register.state.with_manager(|m| m.sessions().len()), 1);
    }
}
