//! # Sale Repository
//!
//! Database reads for committed sales, plus the transaction-scoped
//! insert helpers the checkout coordinator uses.
//!
//! ## Immutability
//! There are no UPDATE or DELETE statements in this module, and there
//! never will be: a sale row is written exactly once inside the
//! coordinator's transaction. Refunds compensate with a new row
//! (kind = 'refund', `ref_sale_id` set) rather than editing history.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use atlas_core::{Sale, SaleItem};

const SALE_COLUMNS: &str = "id, branch_id, kind, ref_sale_id, subtotal_cents, tax_rate_bps, \
     tax_cents, flat_discount_cents, total_cents, payment_method, actor_id, created_at";

const SALE_ITEM_COLUMNS: &str = "id, sale_id, product_id, name_snapshot, unit_price_cents, \
     quantity, discount_bps, extended_cents, position, created_at";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets all items for a sale, in cart order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let sql = format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY position"
        );
        let items = sqlx::query_as::<_, SaleItem>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Finds the compensating refund for a sale, if one exists.
    ///
    /// At most one can exist: `ref_sale_id` carries a unique index.
    pub async fn find_refund_of(&self, sale_id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE ref_sale_id = ?1");
        let refund = sqlx::query_as::<_, Sale>(&sql)
            .bind(sale_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(refund)
    }
}

// =============================================================================
// Transaction-Scoped Inserts
// =============================================================================
// These take a bare connection so the coordinator can run them inside
// its own transaction alongside the stock decrements. They are not on
// SaleRepository on purpose: a sale insert outside that transaction
// would break the all-or-nothing commit contract.

/// Inserts a sale row. Must run inside the coordinator's transaction.
pub(crate) async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, total_cents = %sale.total_cents, "Inserting sale");

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, branch_id, kind, ref_sale_id,
            subtotal_cents, tax_rate_bps, tax_cents,
            flat_discount_cents, total_cents,
            payment_method, actor_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.branch_id)
    .bind(sale.kind)
    .bind(&sale.ref_sale_id)
    .bind(sale.subtotal_cents)
    .bind(sale.tax_rate_bps)
    .bind(sale.tax_cents)
    .bind(sale.flat_discount_cents)
    .bind(sale.total_cents)
    .bind(sale.payment_method)
    .bind(&sale.actor_id)
    .bind(sale.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Inserts a sale item row. Must run inside the coordinator's
/// transaction.
pub(crate) async fn insert_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, product_id, name_snapshot,
            unit_price_cents, quantity, discount_bps, extended_cents,
            position, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(&item.product_id)
    .bind(&item.name_snapshot)
    .bind(item.unit_price_cents)
    .bind(item.quantity)
    .bind(item.discount_bps)
    .bind(item.extended_cents)
    .bind(item.position)
    .bind(item.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Generates a new sale ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new sale item ID.
pub fn generate_sale_item_id() -> String {
    Uuid::new_v4().to_string()
}
