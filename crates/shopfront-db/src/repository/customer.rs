//! # Customer Repository
//!
//! The customer directory: lookup for the "attach customer" picker and
//! quick creation at the counter. Dues are only ever moved by invoices (see
//! [`super::invoice`]) or an explicit [`CustomerRepository::adjust_dues`].

use chrono::Utc;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use shopfront_core::{Customer, Money, NewCustomer};

const CUSTOMER_COLUMNS: &str = "id, name, phone, dues_cents";

#[derive(Debug, FromRow)]
struct CustomerRow {
    id: String,
    name: String,
    phone: Option<String>,
    dues_cents: i64,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            name: row.name,
            phone: row.phone,
            dues: Money::from_cents(row.dues_cents),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Substring match on name or phone, ordered by name.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Customer>> {
        let query = query.trim();
        debug!(query = %query, "Searching customers");

        let pattern = format!("%{}%", query);
        let rows: Vec<CustomerRow> = sqlx::query_as(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers \
             WHERE name LIKE ?1 OR phone LIKE ?1 \
             ORDER BY name \
             LIMIT ?2"
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Customer::from).collect())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let row: Option<CustomerRow> = sqlx::query_as(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Customer::from))
    }

    /// Creates a customer with zero dues.
    pub async fn create(&self, fields: &NewCustomer) -> DbResult<Customer> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        debug!(id = %id, name = %fields.name, "Creating customer");

        sqlx::query(
            "INSERT INTO customers (id, name, phone, dues_cents, created_at, updated_at) \
             VALUES (?1, ?2, ?3, 0, ?4, ?4)",
        )
        .bind(&id)
        .bind(&fields.name)
        .bind(&fields.phone)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Customer {
            id,
            name: fields.name.clone(),
            phone: fields.phone.clone(),
            dues: Money::zero(),
        })
    }

    /// Moves a customer's dues by `delta` (positive: owes more).
    pub async fn adjust_dues(&self, id: &str, delta: Money) -> DbResult<Customer> {
        debug!(id = %id, delta = %delta, "Adjusting customer dues");

        let result = sqlx::query(
            "UPDATE customers SET dues_cents = dues_cents + ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(delta.cents())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
