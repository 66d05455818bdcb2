//! # Repository Module
//!
//! One repository per table family, each a cheap clone around the pool.
//!
//! ```text
//! Database ─┬─ items()     ─► ItemRepository      find / search / adjust_stock
//!           ├─ customers() ─► CustomerRepository  search / get / create / adjust_dues
//!           └─ invoices()  ─► InvoiceRepository   create_invoice (one tx) / get / recent
//! ```

pub mod customer;
pub mod invoice;
pub mod item;
