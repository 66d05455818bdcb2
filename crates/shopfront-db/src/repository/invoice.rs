//! # Invoice Repository
//!
//! Turns an [`InvoiceDraft`] into a stored, immutable [`Invoice`].
//!
//! ## One Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_invoice(draft)                                                  │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │   ├── invoice for draft.session_id already stored?                      │
//! │   │      same contents ──► return it   different ──► InvoiceConflict    │
//! │   ├── for each line: stock_qty >= quantity ? ─── no ──► ROLLBACK        │
//! │   │                  stock_qty -= quantity            InsufficientStock │
//! │   ├── customer dues += dues_delta                                       │
//! │   ├── INSERT invoices (number INV-000001, ...)                          │
//! │   └── INSERT invoice_lines                                              │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Either every ledger effect lands or none does. Resubmitting the same
//! draft for a session returns the stored invoice instead of selling the
//! goods twice; a changed draft for an invoiced session is refused.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use shopfront_core::{Invoice, InvoiceDraft, InvoiceLine, Money, PaymentMethod, Tender};

const INVOICE_COLUMNS: &str = "id, invoice_number, customer_id, discount_cents, \
     paid_amount_cents, payment_method, change_returned_cents, credit_applied_cents, \
     total_amount_cents, tenders_json, created_at";

#[derive(Debug, FromRow)]
struct InvoiceRow {
    id: String,
    invoice_number: String,
    customer_id: Option<String>,
    discount_cents: i64,
    paid_amount_cents: i64,
    payment_method: PaymentMethod,
    change_returned_cents: i64,
    credit_applied_cents: i64,
    total_amount_cents: i64,
    tenders_json: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct InvoiceLineRow {
    item_id: String,
    name: String,
    quantity: i64,
    unit_price_cents: i64,
    line_total_cents: i64,
}

impl From<InvoiceLineRow> for InvoiceLine {
    fn from(row: InvoiceLineRow) -> Self {
        InvoiceLine {
            item_id: row.item_id,
            name: row.name,
            quantity: row.quantity,
            unit_price: Money::from_cents(row.unit_price_cents),
            line_total: Money::from_cents(row.line_total_cents),
        }
    }
}

impl InvoiceRow {
    fn into_invoice(self, lines: Vec<InvoiceLine>) -> DbResult<Invoice> {
        let tenders = self
            .tenders_json
            .as_deref()
            .map(serde_json::from_str::<Vec<Tender>>)
            .transpose()
            .map_err(|e| DbError::Internal(format!("corrupt tenders on {}: {}", self.id, e)))?;

        Ok(Invoice {
            id: self.id,
            invoice_number: self.invoice_number,
            customer_id: self.customer_id,
            lines,
            discount: Money::from_cents(self.discount_cents),
            paid_amount: Money::from_cents(self.paid_amount_cents),
            payment_method: self.payment_method,
            change_returned: Money::from_cents(self.change_returned_cents),
            credit_applied: Money::from_cents(self.credit_applied_cents),
            total_amount: Money::from_cents(self.total_amount_cents),
            tenders,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Persists the invoice and applies its stock and dues effects
    /// atomically.
    ///
    /// ## Returns
    /// * `Ok(Invoice)` - stored (or previously stored for this session)
    /// * `Err(DbError::InsufficientStock)` - a line sells more than is on hand
    /// * `Err(DbError::InvoiceConflict)` - the session was invoiced with other contents
    /// * `Err(DbError::NotFound)` - an item or the customer no longer exists
    pub async fn create_invoice(&self, draft: &InvoiceDraft) -> DbResult<Invoice> {
        let mut tx = self.pool.begin().await?;

        if let Some(existing) = load_where(&mut tx, "session_id", &draft.session_id).await? {
            if !existing.matches_draft(draft) {
                warn!(
                    session_id = %draft.session_id,
                    invoice_number = %existing.invoice_number,
                    "Tab already invoiced with different contents"
                );
                return Err(DbError::InvoiceConflict {
                    session_id: draft.session_id.clone(),
                    invoice_number: existing.invoice_number,
                });
            }
            info!(
                session_id = %draft.session_id,
                invoice_number = %existing.invoice_number,
                "Invoice already recorded for session"
            );
            tx.commit().await?;
            return Ok(existing);
        }

        // Stock
        for line in &draft.lines {
            let on_hand: Option<(String, i64)> =
                sqlx::query_as("SELECT name, stock_qty FROM items WHERE id = ?1")
                    .bind(&line.item_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            let Some((name, stock_qty)) = on_hand else {
                return Err(DbError::not_found("Item", &line.item_id));
            };

            if stock_qty < line.quantity {
                warn!(
                    item_id = %line.item_id,
                    available = stock_qty,
                    requested = line.quantity,
                    "Insufficient stock at checkout"
                );
                return Err(DbError::InsufficientStock {
                    item_id: line.item_id.clone(),
                    name,
                    available: stock_qty,
                    requested: line.quantity,
                });
            }

            sqlx::query("UPDATE items SET stock_qty = stock_qty - ?2, updated_at = ?3 WHERE id = ?1")
                .bind(&line.item_id)
                .bind(line.quantity)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?;
        }

        // Dues
        if let Some(customer_id) = &draft.customer_id {
            let result = sqlx::query(
                "UPDATE customers SET dues_cents = dues_cents + ?2, updated_at = ?3 WHERE id = ?1",
            )
            .bind(customer_id)
            .bind(draft.dues_delta.cents())
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(DbError::not_found("Customer", customer_id));
            }
        }

        // Invoice
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let invoice_number = next_invoice_number(&mut tx).await?;
        let tenders_json = draft
            .tenders
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| DbError::Internal(e.to_string()))?;

        debug!(id = %id, invoice_number = %invoice_number, "Inserting invoice");

        sqlx::query(&format!(
            "INSERT INTO invoices ({INVOICE_COLUMNS}, session_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
        ))
        .bind(&id)
        .bind(&invoice_number)
        .bind(&draft.customer_id)
        .bind(draft.discount.cents())
        .bind(draft.paid_amount.cents())
        .bind(draft.payment_method)
        .bind(draft.change_returned.cents())
        .bind(draft.credit_applied.cents())
        .bind(draft.total_amount.cents())
        .bind(&tenders_json)
        .bind(created_at)
        .bind(&draft.session_id)
        .execute(&mut *tx)
        .await?;

        for (position, line) in draft.lines.iter().enumerate() {
            sqlx::query(
                "INSERT INTO invoice_lines \
                 (invoice_id, position, item_id, name, quantity, unit_price_cents, line_total_cents) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .bind(&id)
            .bind(position as i64)
            .bind(&line.item_id)
            .bind(&line.name)
            .bind(line.quantity)
            .bind(line.unit_price.cents())
            .bind(line.line_total.cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            invoice_number = %invoice_number,
            total = %draft.total_amount,
            dues_delta = %draft.dues_delta,
            "Invoice created"
        );

        Ok(Invoice::from_draft(draft.clone(), id, invoice_number, created_at))
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let mut conn = self.pool.acquire().await?;
        load_where(&mut conn, "id", id).await
    }

    pub async fn get_by_number(&self, invoice_number: &str) -> DbResult<Option<Invoice>> {
        let mut conn = self.pool.acquire().await?;
        load_where(&mut conn, "invoice_number", invoice_number).await
    }

    /// Newest first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<Invoice>> {
        let mut conn = self.pool.acquire().await?;

        let rows: Vec<InvoiceRow> = sqlx::query_as(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices ORDER BY created_at DESC, invoice_number DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&mut *conn)
        .await?;

        let mut invoices = Vec::with_capacity(rows.len());
        for row in rows {
            let lines = load_lines(&mut conn, &row.id).await?;
            invoices.push(row.into_invoice(lines)?);
        }
        Ok(invoices)
    }
}

// `column` is always one of the literals above, never caller input.
async fn load_where(
    conn: &mut SqliteConnection,
    column: &str,
    value: &str,
) -> DbResult<Option<Invoice>> {
    let row: Option<InvoiceRow> = sqlx::query_as(&format!(
        "SELECT {INVOICE_COLUMNS} FROM invoices WHERE {column} = ?1"
    ))
    .bind(value)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => {
            let lines = load_lines(conn, &row.id).await?;
            Ok(Some(row.into_invoice(lines)?))
        }
        None => Ok(None),
    }
}

async fn load_lines(conn: &mut SqliteConnection, invoice_id: &str) -> DbResult<Vec<InvoiceLine>> {
    let rows: Vec<InvoiceLineRow> = sqlx::query_as(
        "SELECT item_id, name, quantity, unit_price_cents, line_total_cents \
         FROM invoice_lines WHERE invoice_id = ?1 ORDER BY position",
    )
    .bind(invoice_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(InvoiceLine::from).collect())
}

/// `INV-000001`, `INV-000002`, ... Sequential per database.
async fn next_invoice_number(conn: &mut SqliteConnection) -> DbResult<String> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices")
        .fetch_one(&mut *conn)
        .await?;

    Ok(format!("INV-{:06}", count + 1))
}

// =============================================================================
// Unit Tests
// =============================================================================
