//! # Error Types
//!
//! Domain error types for atlas-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                 │
//! │                                                                     │
//! │  atlas-core errors (this file)                                      │
//! │  └── PricingError     - Malformed cart/line input                   │
//! │                                                                     │
//! │  atlas-db errors (separate crate)                                   │
//! │  ├── DbError          - Database operation failures                 │
//! │  └── CheckoutError    - Checkout workflow rejections                │
//! │                                                                     │
//! │  Flow: PricingError → CheckoutError::InvalidInput → caller          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Validation reports EVERY offending line in one error, never just
//!    the first - the caller fixes all of them in one round trip
//! 3. Errors are enum variants with context fields, never String

use std::fmt;
use thiserror::Error;

// =============================================================================
// Input Violation
// =============================================================================

/// A single validation failure, addressed to a cart line and field.
///
/// `line` is the zero-based cart position; call-level inputs (tax rate,
/// flat discount) use `line: None`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InputViolation {
    pub line: Option<usize>,
    pub field: &'static str,
    pub message: String,
}

impl InputViolation {
    pub fn for_line(line: usize, field: &'static str, message: impl Into<String>) -> Self {
        InputViolation {
            line: Some(line),
            field,
            message: message.into(),
        }
    }

    pub fn for_input(field: &'static str, message: impl Into<String>) -> Self {
        InputViolation {
            line: None,
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for InputViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {} {}", line, self.field, self.message),
            None => write!(f, "{} {}", self.field, self.message),
        }
    }
}

// =============================================================================
// Pricing Error
// =============================================================================

/// Pricing engine rejection. Malformed input is a caller bug and is not
/// retryable as-is.
#[derive(Debug, Error)]
pub enum PricingError {
    /// One or more cart lines or call inputs are malformed.
    /// All violations are collected before the engine returns.
    #[error("invalid cart input: {} violation(s)", .violations.len())]
    InvalidInput { violations: Vec<InputViolation> },
}

impl PricingError {
    /// The collected violations, for callers that surface them per line.
    pub fn violations(&self) -> &[InputViolation] {
        match self {
            PricingError::InvalidInput { violations } => violations,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_display() {
        let v = InputViolation::for_line(2, "quantity", "must be positive");
        assert_eq!(v.to_string(), "line 2: quantity must be positive");

        let v = InputViolation::for_input("tax_rate", "must be at most 10000 bps");
        assert_eq!(v.to_string(), "tax_rate must be at most 10000 bps");
    }

    #[test]
    fn test_pricing_error_display() {
        let err = PricingError::InvalidInput {
            violations: vec![
                InputViolation::for_line(0, "quantity", "must be positive"),
                InputViolation::for_line(1, "discount_bps", "must be at most 10000"),
            ],
        };
        assert_eq!(err.to_string(), "invalid cart input: 2 violation(s)");
        assert_eq!(err.violations().len(), 2);
    }
}
