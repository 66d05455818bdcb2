//! # Item Repository
//!
//! The catalog lookup the register scans against.
//!
//! ```text
//! scan "RICE-5KG" ──► find("RICE-5KG") ──► sku match? ──► id match? ──► None
//!                                              │              │
//!                                              ▼              ▼
//!                                         CatalogItem    CatalogItem
//! ```
//!
//! Search is a plain `LIKE` over sku and name; catalogs here are a few
//! thousand rows at most.

use chrono::Utc;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use shopfront_core::{CatalogItem, Money};

const ITEM_COLUMNS: &str = "id, sku, name, unit_price_cents, stock_qty, unit";

#[derive(Debug, FromRow)]
struct ItemRow {
    id: String,
    sku: String,
    name: String,
    unit_price_cents: i64,
    stock_qty: i64,
    unit: String,
}

impl From<ItemRow> for CatalogItem {
    fn from(row: ItemRow) -> Self {
        CatalogItem {
            id: row.id,
            sku: row.sku,
            name: row.name,
            unit_price: Money::from_cents(row.unit_price_cents),
            stock_qty: row.stock_qty,
            unit: row.unit,
        }
    }
}

/// Fields for a new catalog item.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub sku: String,
    pub name: String,
    pub unit_price: Money,
    pub stock_qty: i64,
    pub unit: String,
}

#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Looks an item up by SKU first, then by id.
    pub async fn find(&self, sku_or_id: &str) -> DbResult<Option<CatalogItem>> {
        let key = sku_or_id.trim();
        debug!(key = %key, "Looking up catalog item");

        if let Some(item) = self.get_by_sku(key).await? {
            return Ok(Some(item));
        }
        self.get_by_id(key).await
    }

    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<CatalogItem>> {
        let row: Option<ItemRow> =
            sqlx::query_as(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE sku = ?1"))
                .bind(sku)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(CatalogItem::from))
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CatalogItem>> {
        let row: Option<ItemRow> =
            sqlx::query_as(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(CatalogItem::from))
    }

    /// Case-insensitive substring search over sku and name, ordered by name.
    /// An empty query lists the catalog.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<CatalogItem>> {
        let query = query.trim();
        debug!(query = %query, limit = %limit, "Searching catalog");

        let pattern = format!("%{}%", query);
        let rows: Vec<ItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM items \
             WHERE sku LIKE ?1 OR name LIKE ?1 \
             ORDER BY name \
             LIMIT ?2"
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Catalog search returned items");
        Ok(rows.into_iter().map(CatalogItem::from).collect())
    }

    /// Inserts a catalog item with a fresh id.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, item: &NewItem) -> DbResult<CatalogItem> {
        debug!(sku = %item.sku, "Inserting catalog item");

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO items (id, sku, name, unit_price_cents, stock_qty, unit, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        )
        .bind(&id)
        .bind(&item.sku)
        .bind(&item.name)
        .bind(item.unit_price.cents())
        .bind(item.stock_qty)
        .bind(&item.unit)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &item.sku),
            other => other,
        })?;

        Ok(CatalogItem {
            id,
            sku: item.sku.clone(),
            name: item.name.clone(),
            unit_price: item.unit_price,
            stock_qty: item.stock_qty,
            unit: item.unit.clone(),
        })
    }

    /// Adjusts stock by a delta (negative for sales, positive for restock).
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<()> {
        debug!(id = %id, delta = %delta, "Adjusting stock");

        let result = sqlx::query(
            "UPDATE items SET stock_qty = stock_qty + ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
