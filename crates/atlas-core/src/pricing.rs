//! # Pricing Engine
//!
//! Converts a cart into a `PriceBreakdown`: per-line extended prices,
//! subtotal, tax, and grand total.
//!
//! ## Computation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Price Breakdown                                │
//! │                                                                     │
//! │  per line:  extended = unit × qty × (1 − discount)   [rounded]      │
//! │  subtotal = Σ extended                                              │
//! │  tax      = subtotal × tax_rate                      [rounded]      │
//! │  total    = max(0, subtotal + tax − flat_discount)                  │
//! │                                                                     │
//! │  All rounding is half-to-even, applied exactly once per value.      │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Purity
//! `compute_preview` is a pure function: no clock, no randomness, no
//! I/O. The UI calls it on every cart mutation; the checkout
//! coordinator calls it once more with catalog prices to obtain the
//! authoritative breakdown. Identical inputs always produce an
//! identical breakdown, which is what makes a committed sale's stored
//! totals recomputable from its items.

use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartLine};
use crate::error::PricingError;
use crate::money::Money;
use crate::types::{SaleItem, TaxRate};
use crate::validation::validate_pricing_input;

// =============================================================================
// Line Price
// =============================================================================

/// Priced view of a single cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinePrice {
    pub product_id: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub discount_bps: u32,
    /// unit × qty × (1 − discount), rounded half-to-even.
    pub extended_cents: i64,
}

// =============================================================================
// Price Breakdown
// =============================================================================

/// Derived pricing for a cart. Recomputed on demand, never persisted
/// mid-flow; a committed sale stores a copy that this engine can
/// reproduce exactly from the sale's items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub lines: Vec<LinePrice>,
    pub subtotal_cents: i64,
    pub tax_rate_bps: u32,
    pub tax_cents: i64,
    pub flat_discount_cents: i64,
    /// Never negative: clamped at zero when the flat discount exceeds
    /// subtotal + tax.
    pub total_cents: i64,
    /// Set when the clamp fired. Not an error - the UI surfaces it.
    pub discount_exceeds_total: bool,
}

impl PriceBreakdown {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Pricing Operations
// =============================================================================

/// Prices a single line: extended = unit × qty × (1 − discount).
fn price_line(line: &CartLine) -> LinePrice {
    let extended = line
        .unit_price()
        .multiply_quantity(line.quantity)
        .apply_percentage_discount(line.discount_bps);

    LinePrice {
        product_id: line.product_id.clone(),
        unit_price_cents: line.unit_price_cents,
        quantity: line.quantity,
        discount_bps: line.discount_bps,
        extended_cents: extended.cents(),
    }
}

/// Computes the price breakdown for a cart.
///
/// ## Arguments
/// * `cart` - ordered cart lines with frozen unit prices
/// * `tax_rate` - 0..=10000 bps
/// * `flat_discount` - fixed amount subtracted after tax, ≥ 0
///
/// ## Errors
/// Returns [`PricingError::InvalidInput`] with EVERY violation (line
/// index and field) when any line or call input is malformed.
///
/// ## Example
/// ```rust
/// use atlas_core::cart::{Cart, CartLine};
/// use atlas_core::money::Money;
/// use atlas_core::pricing::compute_preview;
/// use atlas_core::types::TaxRate;
///
/// // 3 × $2.50 at 20% line discount, 10% tax
/// let cart = Cart::with_lines(vec![CartLine::new("p1", 250, 3, 2000)]);
/// let b = compute_preview(&cart, TaxRate::from_bps(1000), Money::zero()).unwrap();
/// assert_eq!(b.lines[0].extended_cents, 600);
/// assert_eq!(b.total_cents, 660);
/// ```
pub fn compute_preview(
    cart: &Cart,
    tax_rate: TaxRate,
    flat_discount: Money,
) -> Result<PriceBreakdown, PricingError> {
    let violations = validate_pricing_input(cart, tax_rate, flat_discount);
    if !violations.is_empty() {
        return Err(PricingError::InvalidInput { violations });
    }

    let lines: Vec<LinePrice> = cart.lines.iter().map(price_line).collect();

    let subtotal: Money = lines
        .iter()
        .map(|l| Money::from_cents(l.extended_cents))
        .sum();
    let tax = subtotal.calculate_tax(tax_rate);
    let gross = subtotal + tax;
    let total = gross.saturating_sub_floor_zero(flat_discount);

    Ok(PriceBreakdown {
        lines,
        subtotal_cents: subtotal.cents(),
        tax_rate_bps: tax_rate.bps(),
        tax_cents: tax.cents(),
        flat_discount_cents: flat_discount.cents(),
        total_cents: total.cents(),
        discount_exceeds_total: flat_discount > gross,
    })
}

/// Recomputes the breakdown of a committed sale from its items and the
/// tax/discount inputs recorded with it.
///
/// For any committed sale this reproduces the stored breakdown exactly;
/// there is no hidden pricing state outside the sale row.
pub fn recompute_for_sale(
    items: &[SaleItem],
    tax_rate: TaxRate,
    flat_discount: Money,
) -> Result<PriceBreakdown, PricingError> {
    let cart = Cart::with_lines(
        items
            .iter()
            .map(|item| {
                CartLine::new(
                    item.product_id.clone(),
                    item.unit_price_cents,
                    item.quantity,
                    item.discount_bps,
                )
            })
            .collect(),
    );
    compute_preview(&cart, tax_rate, flat_discount)
}

// =============================================================================
// Unit Tests
// =============================================================================
