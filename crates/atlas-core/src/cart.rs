//! # Cart Value Objects
//!
//! The cart is an explicit value object passed into pricing and
//! checkout. It carries no UI lifecycle and no shared mutable state:
//! the caller owns it, mutates it, and hands it over by reference.
//!
//! ## Price Freezing
//! Each line freezes the unit price the caller saw when the line was
//! added. The preview prices against the frozen value; the checkout
//! coordinator re-resolves prices from the catalog because client-held
//! prices are never trusted as the source of truth.
//!
//! ## Line Uniqueness
//! A product id should appear at most once; merging quantities on
//! repeat-add is the caller's responsibility. Pricing and checkout
//! still behave defensively when duplicates slip through (cumulative
//! stock checks, in cart order).

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::Product;

// =============================================================================
// Cart Line
// =============================================================================

/// A requested purchase line: product, quantity, per-line discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product ID (UUID).
    pub product_id: String,

    /// Unit price in cents at the time the line was added (frozen).
    pub unit_price_cents: i64,

    /// Requested quantity. Must be positive.
    pub quantity: i64,

    /// Per-line discount in basis points (2000 = 20%). 0..=10000.
    pub discount_bps: u32,
}

impl CartLine {
    pub fn new(
        product_id: impl Into<String>,
        unit_price_cents: i64,
        quantity: i64,
        discount_bps: u32,
    ) -> Self {
        CartLine {
            product_id: product_id.into(),
            unit_price_cents,
            quantity,
            discount_bps,
        }
    }

    /// Builds a line from a catalog product snapshot.
    pub fn from_product(product: &Product, quantity: i64, discount_bps: u32) -> Self {
        CartLine::new(product.id.clone(), product.price_cents, quantity, discount_bps)
    }

    /// Returns a copy of this line with the unit price replaced.
    ///
    /// Used by the checkout coordinator to reprice lines from the live
    /// catalog before the authoritative breakdown is computed.
    pub fn with_unit_price(&self, unit_price_cents: i64) -> Self {
        CartLine {
            unit_price_cents,
            ..self.clone()
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// An ordered sequence of cart lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    pub fn with_lines(lines: Vec<CartLine>) -> Self {
        Cart { lines }
    }

    /// Appends a line, preserving cart order.
    pub fn push_line(&mut self, line: CartLine) {
        self.lines.push(line);
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_push_preserves_order() {
        let mut cart = Cart::new();
        cart.push_line(CartLine::new("p1", 250, 3, 0));
        cart.push_line(CartLine::new("p2", 100, 1, 500));

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.lines[0].product_id, "p1");
        assert_eq!(cart.lines[1].product_id, "p2");
        assert_eq!(cart.total_quantity(), 4);
    }

    #[test]
    fn test_with_unit_price() {
        let line = CartLine::new("p1", 250, 3, 2000);
        let repriced = line.with_unit_price(300);

        assert_eq!(repriced.unit_price_cents, 300);
        assert_eq!(repriced.quantity, 3);
        assert_eq!(repriced.discount_bps, 2000);
        // Original is untouched
        assert_eq!(line.unit_price_cents, 250);
    }
}
