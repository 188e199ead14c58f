//! # Domain Types
//!
//! Core domain types used throughout Atlas POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐    │
//! │  │    Product      │   │      Sale       │   │    SaleItem     │    │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │    │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  sale_id (FK)   │    │
//! │  │  name           │   │  kind           │   │  name_snapshot  │    │
//! │  │  price_cents    │   │  total_cents    │   │  unit_price     │    │
//! │  │  stock (ledger) │   │  payment_method │   │  quantity       │    │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘    │
//! │                                                                     │
//! │  ┌─────────────────┐   ┌─────────────────┐                          │
//! │  │    TaxRate      │   │ PaymentMethod   │                          │
//! │  │  bps (u32)      │   │  Cash | Card    │                          │
//! │  │  1000 = 10%     │   └─────────────────┘                          │
//! │  └─────────────────┘                                                │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Immutability of Sales
//! A `Sale` row is written exactly once by the checkout coordinator and
//! never mutated afterward. Refunds are new compensating rows (kind
//! `Refund`, negative totals, `ref_sale_id` set), preserving the audit
//! trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1000 bps = 10% (the system default)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
///
/// `stock` is the authoritative stock-ledger counter for the product.
/// The core only ever reads snapshots of it; mutation belongs to the
/// checkout coordinator (decrement) and the restock collaborator
/// (increment), and it must never go negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to cashier and on receipts.
    pub name: String,

    /// Catalog category (e.g., "Beverages").
    pub category: String,

    /// Unit price in cents.
    pub price_cents: i64,

    /// Available stock. Never negative.
    pub stock: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether a requested quantity can be covered by stock.
    #[inline]
    pub fn can_cover(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on external terminal.
    Card,
}

// =============================================================================
// Sale Kind
// =============================================================================

/// Distinguishes regular sales from compensating refund records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum SaleKind {
    /// A completed checkout.
    Sale,
    /// A compensating record that restores stock and negates the
    /// original totals. Points at the original via `ref_sale_id`.
    Refund,
}

// =============================================================================
// Sale
// =============================================================================

/// The persisted, immutable result of a successful checkout.
///
/// Invariant: the breakdown stored here is recomputable byte-for-byte
/// from the sale's items plus `tax_rate_bps` and `flat_discount_cents`.
/// No hidden pricing state exists outside this row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub branch_id: String,
    pub kind: SaleKind,
    /// For refunds: the sale being compensated.
    pub ref_sale_id: Option<String>,
    pub subtotal_cents: i64,
    pub tax_rate_bps: u32,
    pub tax_cents: i64,
    pub flat_discount_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    /// Cashier who committed the transaction.
    pub actor_id: String,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn is_refund(&self) -> bool {
        self.kind == SaleKind::Refund
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a committed sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// Per-line discount in basis points at time of sale.
    pub discount_bps: u32,
    /// Extended price: unit × qty × (1 − discount), rounded.
    pub extended_cents: i64,
    /// Cart order, preserved so the breakdown is reproducible.
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn extended(&self) -> Money {
        Money::from_cents(self.extended_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
