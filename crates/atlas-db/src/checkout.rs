//! # Checkout Coordinator
//!
//! Turns a candidate cart into a committed, immutable `Sale` - or fails
//! cleanly with no partial effect.
//!
//! ## State Machine (per checkout attempt)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                                                                     │
//! │  Validating ──► Pricing ──► Committing ──► Committed                │
//! │      │                          │                                   │
//! │      ├── InvalidInput           ├── ConcurrentStockConflict         │
//! │      └── StockInsufficient      └── PersistenceFailure              │
//! │                                                                     │
//! │  Every failure exit leaves ZERO observable state change.            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why One Transaction
//! The stock decrement and the sale insert must land together or not at
//! all: a crash between them would either strand decremented stock with
//! no sale, or record a sale that never consumed inventory. Sequential
//! read-then-write repository calls cannot give that guarantee, so the
//! commit step runs inside a single SQLite transaction.
//!
//! ## Why a Conditional Decrement
//! ```text
//!   UPDATE products SET stock = stock - ?qty
//!   WHERE id = ?id AND stock >= ?qty
//! ```
//! The predicate makes the check and the decrement one indivisible
//! operation. If a concurrent checkout consumed the stock after this
//! attempt's validation read, the update affects zero rows, the
//! transaction rolls back, and the caller gets
//! `ConcurrentStockConflict`. Stock can never go negative, and two
//! checkouts over disjoint products never contend on each other's rows.
//!
//! ## Cancellation
//! Dropping the checkout future before the commit step has no effect at
//! all; dropping it mid-commit drops the uncommitted transaction, which
//! SQLite rolls back. The bounded commit timeout relies on the same
//! property: on expiry the transaction future is dropped, nothing is
//! half-applied, and the caller sees `PersistenceFailure`.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::DbError;
use crate::pool::Database;
use crate::repository::sale::{generate_sale_id, generate_sale_item_id, insert_item, insert_sale};
use atlas_core::error::{InputViolation, PricingError};
use atlas_core::pricing::{compute_preview, PriceBreakdown};
use atlas_core::{Cart, Money, PaymentMethod, Product, Sale, SaleItem, SaleKind, TaxRate};

/// Default bound on the atomic commit step.
pub const DEFAULT_COMMIT_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// Request / Response Types
// =============================================================================

/// Everything the coordinator needs for one checkout attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// The candidate cart. Unit prices on the lines are the client's
    /// view and are NOT trusted; the coordinator reprices from the
    /// catalog.
    pub cart: Cart,
    pub tax_rate: TaxRate,
    /// Fixed amount subtracted after tax. Non-negative.
    pub flat_discount: Money,
    pub payment_method: PaymentMethod,
    /// Cashier committing the transaction.
    pub actor_id: String,
    pub branch_id: String,
}

/// Successful checkout: the committed sale id plus the authoritative
/// breakdown that was persisted with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    pub sale_id: String,
    pub breakdown: PriceBreakdown,
}

/// Successful refund: the compensating record's id and total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundReceipt {
    pub refund_id: String,
    pub ref_sale_id: String,
    /// Negative: the amount returned to the customer.
    pub total_cents: i64,
}

/// One line the stock ledger cannot cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockShortage {
    /// Zero-based cart position.
    pub line: usize,
    pub product_id: String,
    /// Quantity requested on this line.
    pub requested: i64,
    /// Ledger value at validation time.
    pub available: i64,
}

// =============================================================================
// Checkout Error
// =============================================================================

/// Checkout workflow rejection.
///
/// `InvalidInput` is a caller bug (not retryable as-is).
/// `StockInsufficient` is a business rejection (user edits the cart).
/// `ConcurrentStockConflict` is a transient race (resubmit after
/// re-validating). `PersistenceFailure` is infrastructure (retryable
/// with backoff; the source is retained for operator logs).
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("invalid cart input: {} violation(s)", .violations.len())]
    InvalidInput { violations: Vec<InputViolation> },

    /// Every offending line is reported, not just the first, so the
    /// caller can correct all of them in one round trip.
    #[error("insufficient stock on {} line(s)", .shortages.len())]
    StockInsufficient { shortages: Vec<StockShortage> },

    /// A concurrent checkout consumed the stock between validation and
    /// commit. Nothing was applied; resubmit with a fresh validation.
    #[error("concurrent checkout consumed stock for product {product_id}")]
    ConcurrentStockConflict { product_id: String },

    #[error("sale {sale_id} cannot be refunded: {reason}")]
    InvalidRefund { sale_id: String, reason: String },

    #[error("persistence failure: {0}")]
    PersistenceFailure(#[from] DbError),
}

impl From<PricingError> for CheckoutError {
    fn from(err: PricingError) -> Self {
        let PricingError::InvalidInput { violations } = err;
        CheckoutError::InvalidInput { violations }
    }
}

// =============================================================================
// Coordinator
// =============================================================================

/// Coordinates the validate → price → commit workflow.
///
/// Clone-cheap; many checkout attempts may run concurrently against the
/// same coordinator. The only shared mutable resource is the stock
/// ledger, and all mutation of it goes through the conditional
/// decrement inside [`CheckoutCoordinator::checkout`]'s transaction.
#[derive(Debug, Clone)]
pub struct CheckoutCoordinator {
    db: Database,
    commit_timeout: Duration,
}

impl CheckoutCoordinator {
    pub fn new(db: Database) -> Self {
        CheckoutCoordinator {
            db,
            commit_timeout: DEFAULT_COMMIT_TIMEOUT,
        }
    }

    /// Sets the bound on the atomic commit step.
    pub fn with_commit_timeout(mut self, timeout: Duration) -> Self {
        self.commit_timeout = timeout;
        self
    }

    /// Runs one checkout attempt.
    ///
    /// On success the sale and its stock decrements are durably
    /// committed; on any error, zero state changed.
    pub async fn checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        debug!(
            lines = request.cart.len(),
            actor_id = %request.actor_id,
            branch_id = %request.branch_id,
            "Checkout attempt"
        );

        // ---- Validating: structure ----------------------------------
        let mut violations = atlas_core::validation::validate_pricing_input(
            &request.cart,
            request.tax_rate,
            request.flat_discount,
        );
        if request.cart.is_empty() {
            violations.push(InputViolation::for_input("cart", "must have at least one line"));
        }
        if !violations.is_empty() {
            return Err(CheckoutError::InvalidInput { violations });
        }

        // ---- Validating: live stock ---------------------------------
        // Re-read the ledger now; the cart may have been built against
        // stock that has since changed.
        let products = self.load_products(&request.cart).await?;

        let shortages = find_shortages(&request.cart, &products);
        if !shortages.is_empty() {
            debug!(count = shortages.len(), "Checkout rejected: insufficient stock");
            return Err(CheckoutError::StockInsufficient { shortages });
        }

        // ---- Pricing ------------------------------------------------
        // Reprice from the catalog: the client's unit prices are a
        // display convenience, never the source of truth.
        let priced_cart = Cart::with_lines(
            request
                .cart
                .lines
                .iter()
                .map(|line| {
                    // load_products guarantees presence
                    let product = &products[line.product_id.as_str()];
                    line.with_unit_price(product.price_cents)
                })
                .collect(),
        );
        let breakdown = compute_preview(&priced_cart, request.tax_rate, request.flat_discount)?;

        // ---- Committing ---------------------------------------------
        let now = Utc::now();
        let sale_id = generate_sale_id();
        let sale = Sale {
            id: sale_id.clone(),
            branch_id: request.branch_id.clone(),
            kind: SaleKind::Sale,
            ref_sale_id: None,
            subtotal_cents: breakdown.subtotal_cents,
            tax_rate_bps: breakdown.tax_rate_bps,
            tax_cents: breakdown.tax_cents,
            flat_discount_cents: breakdown.flat_discount_cents,
            total_cents: breakdown.total_cents,
            payment_method: request.payment_method,
            actor_id: request.actor_id.clone(),
            created_at: now,
        };
        let items: Vec<SaleItem> = breakdown
            .lines
            .iter()
            .enumerate()
            .map(|(position, line)| SaleItem {
                id: generate_sale_item_id(),
                sale_id: sale_id.clone(),
                product_id: line.product_id.clone(),
                name_snapshot: products[line.product_id.as_str()].name.clone(),
                unit_price_cents: line.unit_price_cents,
                quantity: line.quantity,
                discount_bps: line.discount_bps,
                extended_cents: line.extended_cents,
                position: position as i64,
                created_at: now,
            })
            .collect();

        let decrements = aggregate_quantities(&request.cart);
        self.commit_bounded(&decrements, &sale, &items).await?;

        info!(
            sale_id = %sale_id,
            total_cents = breakdown.total_cents,
            lines = items.len(),
            "Sale committed"
        );

        Ok(CheckoutReceipt { sale_id, breakdown })
    }

    /// Issues a compensating refund for a committed sale.
    ///
    /// The original row is never edited: a new `kind = refund` record
    /// with negated totals references it, and stock is restored for
    /// every item - atomically, like checkout.
    pub async fn refund(
        &self,
        sale_id: &str,
        actor_id: &str,
    ) -> Result<RefundReceipt, CheckoutError> {
        let sales = self.db.sales();

        let original = sales.get_by_id(sale_id).await?.ok_or_else(|| {
            CheckoutError::InvalidRefund {
                sale_id: sale_id.to_string(),
                reason: "sale not found".to_string(),
            }
        })?;

        if original.is_refund() {
            return Err(CheckoutError::InvalidRefund {
                sale_id: sale_id.to_string(),
                reason: "refunds cannot be refunded".to_string(),
            });
        }

        if sales.find_refund_of(sale_id).await?.is_some() {
            return Err(CheckoutError::InvalidRefund {
                sale_id: sale_id.to_string(),
                reason: "already refunded".to_string(),
            });
        }

        let original_items = sales.get_items(sale_id).await?;

        let now = Utc::now();
        let refund_id = generate_sale_id();
        let refund = Sale {
            id: refund_id.clone(),
            branch_id: original.branch_id.clone(),
            kind: SaleKind::Refund,
            ref_sale_id: Some(original.id.clone()),
            subtotal_cents: -original.subtotal_cents,
            tax_rate_bps: original.tax_rate_bps,
            tax_cents: -original.tax_cents,
            flat_discount_cents: -original.flat_discount_cents,
            total_cents: -original.total_cents,
            payment_method: original.payment_method,
            actor_id: actor_id.to_string(),
            created_at: now,
        };
        let items: Vec<SaleItem> = original_items
            .iter()
            .map(|item| SaleItem {
                id: generate_sale_item_id(),
                sale_id: refund_id.clone(),
                created_at: now,
                ..item.clone()
            })
            .collect();

        // Stock goes back: positive deltas, unconditional
        let increments: Vec<(String, i64)> = {
            let mut order: Vec<String> = Vec::new();
            let mut totals: HashMap<String, i64> = HashMap::new();
            for item in &original_items {
                if !totals.contains_key(&item.product_id) {
                    order.push(item.product_id.clone());
                }
                *totals.entry(item.product_id.clone()).or_insert(0) += item.quantity;
            }
            order
                .into_iter()
                .map(|id| {
                    let qty = totals[&id];
                    (id, -qty) // negated: commit decrements by -qty = increment
                })
                .collect()
        };

        let result = self.commit_bounded(&increments, &refund, &items).await;
        match result {
            Ok(()) => {}
            // A concurrent refund won the race past the existence check;
            // the unique index on ref_sale_id caught it.
            Err(CheckoutError::PersistenceFailure(DbError::UniqueViolation { .. })) => {
                return Err(CheckoutError::InvalidRefund {
                    sale_id: sale_id.to_string(),
                    reason: "already refunded".to_string(),
                });
            }
            Err(err) => return Err(err),
        }

        info!(
            refund_id = %refund_id,
            ref_sale_id = %sale_id,
            total_cents = refund.total_cents,
            "Refund committed"
        );

        Ok(RefundReceipt {
            refund_id,
            ref_sale_id: sale_id.to_string(),
            total_cents: refund.total_cents,
        })
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Batch-loads the cart's products and classifies unknown or
    /// inactive references as input violations (every offending line).
    async fn load_products(
        &self,
        cart: &Cart,
    ) -> Result<HashMap<String, Product>, CheckoutError> {
        let mut ids: Vec<String> = Vec::new();
        for line in &cart.lines {
            if !ids.contains(&line.product_id) {
                ids.push(line.product_id.clone());
            }
        }

        let products: HashMap<String, Product> = self
            .db
            .products()
            .get_by_ids(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        let mut violations = Vec::new();
        for (index, line) in cart.lines.iter().enumerate() {
            match products.get(&line.product_id) {
                Some(product) if product.is_active => {}
                Some(_) => violations.push(InputViolation::for_line(
                    index,
                    "product_id",
                    "is not an active product",
                )),
                None => violations.push(InputViolation::for_line(
                    index,
                    "product_id",
                    "does not exist",
                )),
            }
        }
        if !violations.is_empty() {
            return Err(CheckoutError::InvalidInput { violations });
        }

        Ok(products)
    }

    /// Runs the atomic commit under the configured timeout.
    ///
    /// On expiry the transaction future is dropped (rolled back) and
    /// the timeout surfaces as a persistence failure.
    async fn commit_bounded(
        &self,
        decrements: &[(String, i64)],
        sale: &Sale,
        items: &[SaleItem],
    ) -> Result<(), CheckoutError> {
        match tokio::time::timeout(
            self.commit_timeout,
            self.commit_sale_atomic(decrements, sale, items),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(sale_id = %sale.id, timeout = ?self.commit_timeout, "Commit timed out");
                Err(CheckoutError::PersistenceFailure(DbError::Timeout(
                    self.commit_timeout,
                )))
            }
        }
    }

    /// The all-or-nothing commit: conditional stock decrements plus the
    /// sale and item inserts, in one transaction.
    async fn commit_sale_atomic(
        &self,
        decrements: &[(String, i64)],
        sale: &Sale,
        items: &[SaleItem],
    ) -> Result<(), CheckoutError> {
        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;
        let now = Utc::now();

        for (product_id, quantity) in decrements {
            let result = sqlx::query(
                "UPDATE products SET stock = stock - ?2, updated_at = ?3 \
                 WHERE id = ?1 AND stock >= ?2",
            )
            .bind(product_id)
            .bind(quantity)
            .bind(now)
            .execute(tx.as_mut())
            .await
            .map_err(DbError::from)?;

            if result.rows_affected() == 0 {
                // Dropping tx rolls back any earlier decrements.
                warn!(product_id = %product_id, "Stock consumed by concurrent checkout");
                return Err(CheckoutError::ConcurrentStockConflict {
                    product_id: product_id.clone(),
                });
            }
        }

        insert_sale(tx.as_mut(), sale).await?;
        for item in items {
            insert_item(tx.as_mut(), item).await?;
        }

        tx.commit().await.map_err(DbError::from)?;
        Ok(())
    }
}

// =============================================================================
// Pure Helpers
// =============================================================================

/// Finds every line the ledger cannot cover.
///
/// Duplicate product lines are checked against the CUMULATIVE requested
/// quantity in cart order: a line is short when the running total for
/// its product exceeds the available stock.
fn find_shortages(cart: &Cart, products: &HashMap<String, Product>) -> Vec<StockShortage> {
    let mut running: HashMap<&str, i64> = HashMap::new();
    let mut shortages = Vec::new();

    for (index, line) in cart.lines.iter().enumerate() {
        let product = &products[line.product_id.as_str()];
        let cumulative = running.entry(line.product_id.as_str()).or_insert(0);
        *cumulative += line.quantity;

        if *cumulative > product.stock {
            shortages.push(StockShortage {
                line: index,
                product_id: line.product_id.clone(),
                requested: line.quantity,
                available: product.stock,
            });
        }
    }

    shortages
}

/// Total quantity per product, preserving first-occurrence cart order.
fn aggregate_quantities(cart: &Cart) -> Vec<(String, i64)> {
    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<String, i64> = HashMap::new();

    for line in &cart.lines {
        if !totals.contains_key(&line.product_id) {
            order.push(line.product_id.clone());
        }
        *totals.entry(line.product_id.clone()).or_insert(0) += line.quantity;
    }

    order.into_iter().map(|id| {
        let qty = totals[&id];
        (id, qty)
    }).collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use atlas_core::cart::CartLine;
    use atlas_core::pricing::recompute_for_sale;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_product(db: &Database, id: &str, price_cents: i64, stock: i64) {
        let now = Utc::now();
        db.products()
            .insert(&Product {
                id: id.to_string(),
                name: format!("Product {id}"),
                category: "Beverages".to_string(),
                price_cents,
                stock,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
    }

    fn request(lines: Vec<CartLine>) -> CheckoutRequest {
        CheckoutRequest {
            cart: Cart::with_lines(lines),
            tax_rate: TaxRate::from_bps(1000),
            flat_discount: Money::zero(),
            payment_method: PaymentMethod::Cash,
            actor_id: "cashier-1".to_string(),
            branch_id: "branch-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_checkout_commits_sale_and_decrements_stock() {
        let db = test_db().await;
        seed_product(&db, "p1", 250, 8).await;
        let coordinator = CheckoutCoordinator::new(db.clone());

        let receipt = coordinator
            .checkout(&request(vec![CartLine::new("p1", 250, 3, 0)]))
            .await
            .unwrap();

        assert_eq!(receipt.breakdown.subtotal_cents, 750);
        assert_eq!(receipt.breakdown.tax_cents, 75);
        assert_eq!(receipt.breakdown.total_cents, 825);

        assert_eq!(db.products().get_stock("p1").await.unwrap(), 5);

        let sale = db.sales().get_by_id(&receipt.sale_id).await.unwrap().unwrap();
        assert_eq!(sale.kind, SaleKind::Sale);
        assert_eq!(sale.total_cents, 825);
        assert_eq!(sale.actor_id, "cashier-1");
        assert_eq!(sale.branch_id, "branch-1");

        let items = db.sales().get_items(&receipt.sale_id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, "p1");
        assert_eq!(items[0].quantity, 3);
        assert_eq!(items[0].name_snapshot, "Product p1");

        // Receipts cross the API boundary as JSON
        let json = serde_json::to_string(&receipt).unwrap();
        assert!(json.contains("\"sale_id\""));
        assert!(json.contains("\"total_cents\":825"));
    }

    #[tokio::test]
    async fn test_checkout_matches_preview() {
        let db = test_db().await;
        seed_product(&db, "p1", 250, 8).await;
        seed_product(&db, "p2", 199, 4).await;
        let coordinator = CheckoutCoordinator::new(db.clone());

        let req = request(vec![
            CartLine::new("p1", 250, 3, 2000),
            CartLine::new("p2", 199, 2, 0),
        ]);
        let preview =
            compute_preview(&req.cart, req.tax_rate, req.flat_discount).unwrap();

        let receipt = coordinator.checkout(&req).await.unwrap();
        assert_eq!(receipt.breakdown, preview);
    }

    #[tokio::test]
    async fn test_checkout_ignores_client_supplied_prices() {
        let db = test_db().await;
        seed_product(&db, "p1", 250, 8).await;
        let coordinator = CheckoutCoordinator::new(db.clone());

        // Client claims the unit price is one cent
        let receipt = coordinator
            .checkout(&request(vec![CartLine::new("p1", 1, 3, 0)]))
            .await
            .unwrap();

        assert_eq!(receipt.breakdown.lines[0].unit_price_cents, 250);
        assert_eq!(receipt.breakdown.subtotal_cents, 750);
    }

    #[tokio::test]
    async fn test_checkout_round_trip_recompute() {
        let db = test_db().await;
        seed_product(&db, "p1", 250, 8).await;
        seed_product(&db, "p2", 333, 5).await;
        let coordinator = CheckoutCoordinator::new(db.clone());

        let mut req = request(vec![
            CartLine::new("p1", 250, 2, 1500),
            CartLine::new("p2", 333, 3, 0),
        ]);
        req.flat_discount = Money::from_cents(50);

        let receipt = coordinator.checkout(&req).await.unwrap();

        let sale = db.sales().get_by_id(&receipt.sale_id).await.unwrap().unwrap();
        let items = db.sales().get_items(&receipt.sale_id).await.unwrap();

        let recomputed = recompute_for_sale(
            &items,
            TaxRate::from_bps(sale.tax_rate_bps),
            Money::from_cents(sale.flat_discount_cents),
        )
        .unwrap();

        assert_eq!(recomputed.subtotal_cents, sale.subtotal_cents);
        assert_eq!(recomputed.tax_cents, sale.tax_cents);
        assert_eq!(recomputed.total_cents, sale.total_cents);
        assert_eq!(recomputed, receipt.breakdown);
    }

    #[tokio::test]
    async fn test_stock_insufficient_leaves_state_unchanged() {
        let db = test_db().await;
        seed_product(&db, "p1", 250, 2).await;
        let coordinator = CheckoutCoordinator::new(db.clone());

        let err = coordinator
            .checkout(&request(vec![CartLine::new("p1", 250, 3, 0)]))
            .await
            .unwrap_err();

        match err {
            CheckoutError::StockInsufficient { shortages } => {
                assert_eq!(shortages.len(), 1);
                assert_eq!(shortages[0].line, 0);
                assert_eq!(shortages[0].requested, 3);
                assert_eq!(shortages[0].available, 2);
            }
            other => panic!("expected StockInsufficient, got {other:?}"),
        }

        // Ledger untouched, no orphan sale
        assert_eq!(db.products().get_stock("p1").await.unwrap(), 2);
        let sale_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(sale_count, 0);
    }

    #[tokio::test]
    async fn test_every_short_line_is_reported() {
        let db = test_db().await;
        seed_product(&db, "p1", 250, 1).await;
        seed_product(&db, "p2", 100, 5).await;
        seed_product(&db, "p3", 100, 0).await;
        let coordinator = CheckoutCoordinator::new(db.clone());

        let err = coordinator
            .checkout(&request(vec![
                CartLine::new("p1", 250, 2, 0),
                CartLine::new("p2", 100, 1, 0),
                CartLine::new("p3", 100, 1, 0),
            ]))
            .await
            .unwrap_err();

        match err {
            CheckoutError::StockInsufficient { shortages } => {
                let lines: Vec<usize> = shortages.iter().map(|s| s.line).collect();
                assert_eq!(lines, vec![0, 2]);
            }
            other => panic!("expected StockInsufficient, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_duplicate_lines_checked_cumulatively() {
        let db = test_db().await;
        seed_product(&db, "p1", 250, 5).await;
        let coordinator = CheckoutCoordinator::new(db.clone());

        // 3 + 3 = 6 > 5: the second line trips the cumulative check
        let err = coordinator
            .checkout(&request(vec![
                CartLine::new("p1", 250, 3, 0),
                CartLine::new("p1", 250, 3, 0),
            ]))
            .await
            .unwrap_err();

        match err {
            CheckoutError::StockInsufficient { shortages } => {
                assert_eq!(shortages.len(), 1);
                assert_eq!(shortages[0].line, 1);
                assert_eq!(shortages[0].available, 5);
            }
            other => panic!("expected StockInsufficient, got {other:?}"),
        }
        assert_eq!(db.products().get_stock("p1").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_empty_cart_is_invalid() {
        let db = test_db().await;
        let coordinator = CheckoutCoordinator::new(db);

        let err = coordinator.checkout(&request(vec![])).await.unwrap_err();
        match err {
            CheckoutError::InvalidInput { violations } => {
                assert_eq!(violations[0].field, "cart");
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_product_is_invalid_input() {
        let db = test_db().await;
        seed_product(&db, "p1", 250, 8).await;
        let coordinator = CheckoutCoordinator::new(db);

        let err = coordinator
            .checkout(&request(vec![
                CartLine::new("p1", 250, 1, 0),
                CartLine::new("ghost", 100, 1, 0),
            ]))
            .await
            .unwrap_err();

        match err {
            CheckoutError::InvalidInput { violations } => {
                assert_eq!(violations.len(), 1);
                assert_eq!(violations[0].line, Some(1));
                assert_eq!(violations[0].field, "product_id");
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sequential_checkouts_never_oversell() {
        let db = test_db().await;
        seed_product(&db, "p1", 250, 5).await;
        let coordinator = CheckoutCoordinator::new(db.clone());

        let req = request(vec![CartLine::new("p1", 250, 5, 0)]);

        coordinator.checkout(&req).await.unwrap();
        let err = coordinator.checkout(&req).await.unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::StockInsufficient { .. }
                | CheckoutError::ConcurrentStockConflict { .. }
        ));
        assert_eq!(db.products().get_stock("p1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_never_oversell() {
        let db = test_db().await;
        seed_product(&db, "p1", 250, 8).await;
        let coordinator = CheckoutCoordinator::new(db.clone());

        let req = request(vec![CartLine::new("p1", 250, 5, 0)]);
        let (a, b) = tokio::join!(coordinator.checkout(&req), coordinator.checkout(&req));

        let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(successes, 1, "exactly one of the racing checkouts may win");

        let loser = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
        assert!(matches!(
            loser,
            CheckoutError::StockInsufficient { .. }
                | CheckoutError::ConcurrentStockConflict { .. }
        ));

        // 8 - 5 = 3, never negative
        assert_eq!(db.products().get_stock("p1").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_commit_timeout_surfaces_as_persistence_failure() {
        let db = test_db().await;
        seed_product(&db, "p1", 250, 8).await;

        // An already-expired deadline: the commit future is dropped on
        // its first pending poll and the transaction rolls back.
        let coordinator =
            CheckoutCoordinator::new(db.clone()).with_commit_timeout(Duration::ZERO);

        let err = coordinator
            .checkout(&request(vec![CartLine::new("p1", 250, 3, 0)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::PersistenceFailure(DbError::Timeout(_))
        ));

        // Nothing landed: stock untouched, no sale row
        assert_eq!(db.products().get_stock("p1").await.unwrap(), 8);
        let sale_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(sale_count, 0);
    }

    #[tokio::test]
    async fn test_refund_restores_stock_and_compensates() {
        let db = test_db().await;
        seed_product(&db, "p1", 250, 8).await;
        let coordinator = CheckoutCoordinator::new(db.clone());

        let receipt = coordinator
            .checkout(&request(vec![CartLine::new("p1", 250, 3, 0)]))
            .await
            .unwrap();
        assert_eq!(db.products().get_stock("p1").await.unwrap(), 5);

        let refund = coordinator
            .refund(&receipt.sale_id, "manager-1")
            .await
            .unwrap();

        assert_eq!(refund.total_cents, -825);
        assert_eq!(db.products().get_stock("p1").await.unwrap(), 8);

        // Compensating record references the original
        let refund_sale = db.sales().get_by_id(&refund.refund_id).await.unwrap().unwrap();
        assert_eq!(refund_sale.kind, SaleKind::Refund);
        assert_eq!(refund_sale.ref_sale_id.as_deref(), Some(receipt.sale_id.as_str()));
        assert_eq!(refund_sale.actor_id, "manager-1");

        // Original row is untouched
        let original = db.sales().get_by_id(&receipt.sale_id).await.unwrap().unwrap();
        assert_eq!(original.kind, SaleKind::Sale);
        assert_eq!(original.total_cents, 825);
    }

    #[tokio::test]
    async fn test_double_refund_rejected() {
        let db = test_db().await;
        seed_product(&db, "p1", 250, 8).await;
        let coordinator = CheckoutCoordinator::new(db.clone());

        let receipt = coordinator
            .checkout(&request(vec![CartLine::new("p1", 250, 3, 0)]))
            .await
            .unwrap();

        let refund = coordinator.refund(&receipt.sale_id, "m1").await.unwrap();

        // Second refund of the same sale
        let err = coordinator.refund(&receipt.sale_id, "m1").await.unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidRefund { .. }));

        // Refunding the refund record itself
        let err = coordinator.refund(&refund.refund_id, "m1").await.unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidRefund { .. }));

        // Stock restored exactly once
        assert_eq!(db.products().get_stock("p1").await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_flat_discount_clamps_through_checkout() {
        let db = test_db().await;
        seed_product(&db, "p1", 250, 8).await;
        let coordinator = CheckoutCoordinator::new(db.clone());

        let mut req = request(vec![CartLine::new("p1", 250, 1, 0)]);
        req.flat_discount = Money::from_cents(10_000);

        let receipt = coordinator.checkout(&req).await.unwrap();
        assert_eq!(receipt.breakdown.total_cents, 0);
        assert!(receipt.breakdown.discount_exceeds_total);

        let sale = db.sales().get_by_id(&receipt.sale_id).await.unwrap().unwrap();
        assert_eq!(sale.total_cents, 0);
    }
}
