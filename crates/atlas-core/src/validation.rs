//! # Validation Module
//!
//! Input validation rules for carts and pricing inputs.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                              │
//! │                                                                     │
//! │  Layer 1: Caller (UI / API)                                         │
//! │  └── Basic format checks, immediate user feedback                   │
//! │           │                                                         │
//! │           ▼                                                         │
//! │  Layer 2: THIS MODULE (on preview and again on checkout)            │
//! │  └── Business rule validation; every violation collected            │
//! │           │                                                         │
//! │           ▼                                                         │
//! │  Layer 3: Database (SQLite)                                         │
//! │  └── CHECK / UNIQUE / FK constraints                                │
//! │                                                                     │
//! │  Defense in depth: multiple layers catch different errors           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Violations are COLLECTED, not fail-fast: the caller gets every
//! offending line and field in a single response.

use crate::cart::{Cart, CartLine};
use crate::error::InputViolation;
use crate::money::Money;
use crate::types::TaxRate;
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY, MAX_PRICE_CENTS};

/// Upper bound for rates and percentage discounts, in basis points.
pub const MAX_BPS: u32 = 10_000;

// =============================================================================
// Line Validators
// =============================================================================

/// Validates a single cart line, appending any violations.
///
/// ## Rules
/// - `quantity` positive and at most [`MAX_LINE_QUANTITY`]
/// - `discount_bps` at most 10000 (100%)
/// - `unit_price_cents` non-negative (zero allowed: free items) and at
///   most [`MAX_PRICE_CENTS`]
/// - `product_id` non-empty
pub fn validate_line(index: usize, line: &CartLine, out: &mut Vec<InputViolation>) {
    if line.product_id.trim().is_empty() {
        out.push(InputViolation::for_line(index, "product_id", "is required"));
    }

    if line.quantity <= 0 {
        out.push(InputViolation::for_line(index, "quantity", "must be positive"));
    } else if line.quantity > MAX_LINE_QUANTITY {
        out.push(InputViolation::for_line(
            index,
            "quantity",
            format!("must be at most {MAX_LINE_QUANTITY}"),
        ));
    }

    if line.discount_bps > MAX_BPS {
        out.push(InputViolation::for_line(
            index,
            "discount_bps",
            format!("must be at most {MAX_BPS} (100%)"),
        ));
    }

    if line.unit_price_cents < 0 {
        out.push(InputViolation::for_line(index, "unit_price_cents", "must be non-negative"));
    } else if line.unit_price_cents > MAX_PRICE_CENTS {
        out.push(InputViolation::for_line(
            index,
            "unit_price_cents",
            format!("must be at most {MAX_PRICE_CENTS}"),
        ));
    }
}

// =============================================================================
// Call-Level Validators
// =============================================================================

/// Validates a tax rate (0% to 100%).
pub fn validate_tax_rate(rate: TaxRate, out: &mut Vec<InputViolation>) {
    if rate.bps() > MAX_BPS {
        out.push(InputViolation::for_input(
            "tax_rate",
            format!("must be at most {MAX_BPS} bps (100%)"),
        ));
    }
}

/// Validates a flat discount amount (non-negative).
pub fn validate_flat_discount(flat_discount: Money, out: &mut Vec<InputViolation>) {
    if flat_discount.is_negative() {
        out.push(InputViolation::for_input("flat_discount", "must be non-negative"));
    }
}

// =============================================================================
// Cart Validator
// =============================================================================

/// Validates an entire cart plus call-level inputs.
///
/// Returns every violation found. An empty vec means the input is
/// well-formed.
pub fn validate_pricing_input(
    cart: &Cart,
    tax_rate: TaxRate,
    flat_discount: Money,
) -> Vec<InputViolation> {
    let mut violations = Vec::new();

    if cart.len() > MAX_CART_LINES {
        violations.push(InputViolation::for_input(
            "cart",
            format!("must have at most {MAX_CART_LINES} lines"),
        ));
    }

    for (index, line) in cart.lines.iter().enumerate() {
        validate_line(index, line, &mut violations);
    }

    validate_tax_rate(tax_rate, &mut violations);
    validate_flat_discount(flat_discount, &mut violations);

    violations
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartLine;

    #[test]
    fn test_valid_line_has_no_violations() {
        let mut out = Vec::new();
        validate_line(0, &CartLine::new("p1", 250, 3, 2000), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_invalid_line_collects_all_fields() {
        let mut out = Vec::new();
        validate_line(1, &CartLine::new("", -5, 0, 10_001), &mut out);

        let fields: Vec<&str> = out.iter().map(|v| v.field).collect();
        assert!(fields.contains(&"product_id"));
        assert!(fields.contains(&"quantity"));
        assert!(fields.contains(&"discount_bps"));
        assert!(fields.contains(&"unit_price_cents"));
        assert!(out.iter().all(|v| v.line == Some(1)));
    }

    #[test]
    fn test_price_bounds() {
        let mut out = Vec::new();
        validate_line(0, &CartLine::new("p1", MAX_PRICE_CENTS, 1, 0), &mut out);
        assert!(out.is_empty());

        validate_line(0, &CartLine::new("p1", MAX_PRICE_CENTS + 1, 1, 0), &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].field, "unit_price_cents");

        validate_line(1, &CartLine::new("p1", i64::MAX, 1, 0), &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].field, "unit_price_cents");
    }

    #[test]
    fn test_quantity_bounds() {
        let mut out = Vec::new();
        validate_line(0, &CartLine::new("p1", 100, MAX_LINE_QUANTITY, 0), &mut out);
        assert!(out.is_empty());

        validate_line(0, &CartLine::new("p1", 100, MAX_LINE_QUANTITY + 1, 0), &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].field, "quantity");
    }

    #[test]
    fn test_validate_pricing_input_reports_every_line() {
        let cart = Cart::with_lines(vec![
            CartLine::new("p1", 100, 0, 0),  // bad quantity
            CartLine::new("p2", 100, 1, 0),  // fine
            CartLine::new("p3", 100, -2, 0), // bad quantity
        ]);

        let violations =
            validate_pricing_input(&cart, TaxRate::from_bps(1000), Money::zero());

        let lines: Vec<Option<usize>> = violations.iter().map(|v| v.line).collect();
        assert_eq!(lines, vec![Some(0), Some(2)]);
    }

    #[test]
    fn test_call_level_inputs() {
        let cart = Cart::with_lines(vec![CartLine::new("p1", 100, 1, 0)]);
        let violations = validate_pricing_input(
            &cart,
            TaxRate::from_bps(10_001),
            Money::from_cents(-1),
        );

        let fields: Vec<&str> = violations.iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["tax_rate", "flat_discount"]);
        assert!(violations.iter().all(|v| v.line.is_none()));
    }
}
