//! # Product Repository
//!
//! Database operations for products and the stock ledger.
//!
//! ## Stock Ledger Access
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Who touches products.stock                       │
//! │                                                                     │
//! │  READ   get_stock / get_stock_batch   ← checkout validation,       │
//! │                                          catalog views              │
//! │  WRITE  adjust_stock (+delta)         ← restock / adjustment        │
//! │  WRITE  conditional decrement         ← checkout coordinator ONLY,  │
//! │                                          inside its transaction     │
//! │                                                                     │
//! │  There is deliberately no absolute "SET stock = n" operation:       │
//! │  delta updates compose under concurrency, absolute writes don't.    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{QueryBuilder, SqlitePool};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use atlas_core::Product;

const PRODUCT_COLUMNS: &str =
    "id, name, category, price_cents, stock, is_active, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets several products in one round trip.
    ///
    /// Missing ids are simply absent from the result; the caller
    /// decides whether that is an error.
    pub async fn get_by_ids(&self, ids: &[String]) -> DbResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id IN ("
        ));
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        qb.push(")");

        let products = qb
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Reads the current stock-ledger value for a product.
    pub async fn get_stock(&self, id: &str) -> DbResult<i64> {
        let stock: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        stock.ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Reads stock for several products in one round trip.
    ///
    /// Missing ids are absent from the map.
    pub async fn get_stock_batch(&self, ids: &[String]) -> DbResult<HashMap<String, i64>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut qb = QueryBuilder::new("SELECT id, stock FROM products WHERE id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        qb.push(")");

        let rows: Vec<(String, i64)> = qb.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows.into_iter().collect())
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category, price_cents, stock, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Applies a stock delta (positive for restock, negative for
    /// manual shrink adjustments).
    ///
    /// ## Delta Pattern
    /// Delta updates compose when several writers adjust the same
    /// product; an absolute `SET stock = n` would silently drop one
    /// writer's change. The schema's CHECK constraint rejects any
    /// adjustment that would take stock negative.
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<()> {
        debug!(id = %id, delta = %delta, "Adjusting stock");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics and the seed binary).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn test_product(id: &str, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            category: "Grocery".to_string(),
            price_cents,
            stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&test_product("p1", 250, 8)).await.unwrap();

        let product = repo.get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(product.name, "Product p1");
        assert_eq!(product.price_cents, 250);
        assert_eq!(product.stock, 8);

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_stock_batch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&test_product("p1", 100, 3)).await.unwrap();
        repo.insert(&test_product("p2", 200, 0)).await.unwrap();

        let stock = repo
            .get_stock_batch(&[
                "p1".to_string(),
                "p2".to_string(),
                "missing".to_string(),
            ])
            .await
            .unwrap();

        assert_eq!(stock.get("p1"), Some(&3));
        assert_eq!(stock.get("p2"), Some(&0));
        assert!(!stock.contains_key("missing"));
    }

    #[tokio::test]
    async fn test_adjust_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&test_product("p1", 100, 5)).await.unwrap();

        repo.adjust_stock("p1", 7).await.unwrap();
        assert_eq!(repo.get_stock("p1").await.unwrap(), 12);

        repo.adjust_stock("p1", -2).await.unwrap();
        assert_eq!(repo.get_stock("p1").await.unwrap(), 10);

        // Unknown product
        assert!(matches!(
            repo.adjust_stock("missing", 1).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_adjust_stock_never_goes_negative() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&test_product("p1", 100, 2)).await.unwrap();

        // CHECK constraint rejects the write
        assert!(repo.adjust_stock("p1", -5).await.is_err());
        assert_eq!(repo.get_stock("p1").await.unwrap(), 2);
    }
}
