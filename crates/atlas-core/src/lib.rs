//! # atlas-core: Pure Business Logic for Atlas POS
//!
//! This crate is the heart of Atlas POS. It contains the pricing engine
//! and its supporting domain types as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Atlas POS Architecture                         │
//! │                                                                     │
//! │  ┌─────────────────────────────────────────────────────────────┐   │
//! │  │                UI / API layer (out of scope)                │   │
//! │  │   cart mutations ──► preview on every change ──► checkout   │   │
//! │  └───────────────────────────┬─────────────────────────────────┘   │
//! │                              │                                     │
//! │  ┌───────────────────────────▼─────────────────────────────────┐   │
//! │  │               ★ atlas-core (THIS CRATE) ★                   │   │
//! │  │                                                             │   │
//! │  │   ┌───────────┐ ┌───────────┐ ┌───────────┐ ┌───────────┐  │   │
//! │  │   │   money   │ │   types   │ │   cart    │ │  pricing  │  │   │
//! │  │   │   Money   │ │  Product  │ │   Cart    │ │ compute_  │  │   │
//! │  │   │  TaxCalc  │ │   Sale    │ │ CartLine  │ │ preview   │  │   │
//! │  │   └───────────┘ └───────────┘ └───────────┘ └───────────┘  │   │
//! │  │                                                             │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS          │   │
//! │  └───────────────────────────┬─────────────────────────────────┘   │
//! │                              │                                     │
//! │  ┌───────────────────────────▼─────────────────────────────────┐   │
//! │  │              atlas-db (persistence + checkout)              │   │
//! │  └─────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`types`] - Domain types (Product, Sale, TaxRate, ...)
//! - [`cart`] - Cart and CartLine value objects
//! - [`pricing`] - The pricing engine: cart -> PriceBreakdown
//! - [`validation`] - Input validation rules
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: the same cart, tax rate, and discount always
//!    produce an identical breakdown - no clock, no randomness
//! 2. **Integer Money**: all monetary values are cents (i64); rounding
//!    happens once, half-to-even, when a value becomes user-facing
//! 3. **Explicit Errors**: typed errors, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use atlas_core::cart::{Cart, CartLine};
//! use atlas_core::money::Money;
//! use atlas_core::pricing::compute_preview;
//! use atlas_core::types::TaxRate;
//!
//! let mut cart = Cart::new();
//! cart.push_line(CartLine::new("p1", 250, 3, 0)); // 3 × $2.50
//!
//! let breakdown = compute_preview(&cart, TaxRate::from_bps(1000), Money::zero()).unwrap();
//! assert_eq!(breakdown.subtotal_cents, 750);
//! assert_eq!(breakdown.tax_cents, 75);
//! assert_eq!(breakdown.total_cents, 825);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine};
pub use error::{InputViolation, PricingError};
pub use money::Money;
pub use pricing::{compute_preview, LinePrice, PriceBreakdown};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart
///
/// Prevents runaway carts and ensures reasonable transaction sizes.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity on a single cart line
///
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Maximum unit price on a single cart line, in cents ($1,000,000.00)
///
/// Client-supplied prices are untrusted; together with
/// [`MAX_LINE_QUANTITY`] this keeps every line extension far inside
/// i64 range.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Default tax rate in basis points (10%)
///
/// Used by callers that do not carry a configured rate.
pub const DEFAULT_TAX_RATE_BPS: u32 = 1000;
