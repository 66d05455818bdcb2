//! # shopfront-db: SQLite Collaborators for Shopfront POS
//!
//! The catalog, customer directory and invoice store behind the register,
//! on a local SQLite file through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CheckoutFinalizer / commands (apps/register)                           │
//! │       │  CatalogLookup, CustomerDirectory, InvoiceGateway               │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 shopfront-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐   ┌───────────┐  │   │
//! │  │   │   Database    │    │    Repositories    │   │ Migrations│  │   │
//! │  │   │   (pool.rs)   │◄───│ Item / Customer /  │   │ (embedded)│  │   │
//! │  │   │  SqlitePool   │    │ Invoice            │   │           │  │   │
//! │  │   └───────────────┘    └────────────────────┘   └───────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file in the register's data directory                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shopfront_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("shopfront.db")).await?;
//! let item = db.items().find("RICE-5KG").await?;
//! let invoice = db.invoices().create_invoice(&draft).await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::customer::CustomerRepository;
pub use repository::invoice::InvoiceRepository;
pub use repository::item::{ItemRepository, NewItem};
