//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                         │
//! │                                                                     │
//! │  In JavaScript/floating point:                                      │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                       │
//! │                                                                     │
//! │  OUR SOLUTION: Integer Cents                                        │
//! │    Every monetary value is an i64 count of the currency's minor     │
//! │    unit. Rate math widens to i128 and rounds exactly once,          │
//! │    half-to-even, at the point the value becomes user-facing.        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding Policy
//! All rate multiplications (tax, percentage discounts) round half to
//! even. Rounding half up biases totals upward over many transactions;
//! half-to-even alternates the .5 case and keeps long-run drift at zero.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use crate::types::TaxRate;

/// One hundred percent, in basis points.
pub const BPS_SCALE: i128 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: refunds and compensating records carry negative
///   totals
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serde**: serializes as a bare integer of minor units; never as a
///   binary float
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies by an integer quantity (line extension).
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Calculates tax on this amount.
    ///
    /// ## Example
    /// ```rust
    /// use atlas_core::money::Money;
    /// use atlas_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(750);       // $7.50
    /// let tax = subtotal.calculate_tax(TaxRate::from_bps(1000)); // 10%
    /// assert_eq!(tax.cents(), 75);
    /// ```
    ///
    /// Rounds half to even: $1.25 at 10% is 12.5 cents and rounds to 12,
    /// $1.35 at 10% is 13.5 cents and rounds to 14.
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128 to prevent overflow on large amounts
        let product = self.0 as i128 * rate.bps() as i128;
        Money(div_round_half_even(product, BPS_SCALE) as i64)
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// ## Arguments
    /// * `discount_bps` - Discount in basis points (2000 = 20%)
    ///
    /// ## Example
    /// ```rust
    /// use atlas_core::money::Money;
    ///
    /// let line = Money::from_cents(750);
    /// assert_eq!(line.apply_percentage_discount(2000).cents(), 600);
    /// ```
    pub fn apply_percentage_discount(&self, discount_bps: u32) -> Money {
        let keep_bps = BPS_SCALE - discount_bps as i128;
        let product = self.0 as i128 * keep_bps;
        Money(div_round_half_even(product, BPS_SCALE) as i64)
    }

    /// Subtracts `other`, clamping at zero.
    ///
    /// Grand totals are never negative: if a flat discount exceeds
    /// subtotal + tax, the total clamps to zero and the caller surfaces
    /// the excess separately.
    #[inline]
    pub fn saturating_sub_floor_zero(&self, other: Money) -> Money {
        Money((self.0 - other.0).max(0))
    }
}

/// Integer division rounding half to even (banker's rounding).
///
/// `d` must be positive. Negative numerators round on their magnitude,
/// so -12.5 rounds to -12 just as 12.5 rounds to 12.
pub(crate) fn div_round_half_even(n: i128, d: i128) -> i128 {
    debug_assert!(d > 0);
    let negative = n < 0;
    let n = n.abs();
    let quotient = n / d;
    let remainder = n % d;
    let rounded = match (remainder * 2).cmp(&d) {
        Ordering::Less => quotient,
        Ordering::Greater => quotient + 1,
        Ordering::Equal => {
            if quotient % 2 == 0 {
                quotient
            } else {
                quotient + 1
            }
        }
    };
    if negative {
        -rounded
    } else {
        rounded
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly display. UI formatting (localization) happens in the
/// excluded presentation layer.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!((-a).cents(), -1000);
    }

    #[test]
    fn test_tax_basic() {
        // $7.50 at 10% = $0.75 exactly
        let tax = Money::from_cents(750).calculate_tax(TaxRate::from_bps(1000));
        assert_eq!(tax.cents(), 75);
    }

    #[test]
    fn test_tax_rounds_half_to_even() {
        // $1.25 at 10% = 12.5 cents → 12 (down to even)
        let tax = Money::from_cents(125).calculate_tax(TaxRate::from_bps(1000));
        assert_eq!(tax.cents(), 12);

        // $1.35 at 10% = 13.5 cents → 14 (up to even)
        let tax = Money::from_cents(135).calculate_tax(TaxRate::from_bps(1000));
        assert_eq!(tax.cents(), 14);
    }

    #[test]
    fn test_tax_rounds_nearest_away_from_half() {
        // $10.00 at 8.25% = 82.5 → 82; $10.01 at 8.25% = 82.5825 → 83
        let tax = Money::from_cents(1000).calculate_tax(TaxRate::from_bps(825));
        assert_eq!(tax.cents(), 82);

        let tax = Money::from_cents(1001).calculate_tax(TaxRate::from_bps(825));
        assert_eq!(tax.cents(), 83);
    }

    #[test]
    fn test_percentage_discount() {
        let line = Money::from_cents(10000); // $100.00
        assert_eq!(line.apply_percentage_discount(1000).cents(), 9000);
        assert_eq!(line.apply_percentage_discount(0).cents(), 10000);
        assert_eq!(line.apply_percentage_discount(10000).cents(), 0);
    }

    #[test]
    fn test_percentage_discount_half_even() {
        // 25 cents at 50% = 12.5 → 12
        assert_eq!(Money::from_cents(25).apply_percentage_discount(5000).cents(), 12);
        // 27 cents at 50% = 13.5 → 14
        assert_eq!(Money::from_cents(27).apply_percentage_discount(5000).cents(), 14);
    }

    #[test]
    fn test_div_round_half_even_negative() {
        assert_eq!(div_round_half_even(-125, 10), -12);
        assert_eq!(div_round_half_even(-135, 10), -14);
        assert_eq!(div_round_half_even(-134, 10), -13);
    }

    #[test]
    fn test_saturating_sub_floor_zero() {
        let total = Money::from_cents(660);
        assert_eq!(total.saturating_sub_floor_zero(Money::from_cents(60)).cents(), 600);
        assert_eq!(total.saturating_sub_floor_zero(Money::from_cents(1000)).cents(), 0);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 200, 300].iter().map(|c| Money::from_cents(*c)).sum();
        assert_eq!(total.cents(), 600);
    }
}
