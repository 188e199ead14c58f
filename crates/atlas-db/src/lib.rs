//! # atlas-db: Persistence and Checkout for Atlas POS
//!
//! SQLite persistence (via sqlx) plus the checkout coordinator - the
//! one component allowed to mutate the stock ledger and write sales.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         atlas-db                                    │
//! │                                                                     │
//! │  ┌──────────┐   ┌────────────────────────────────────────────────┐  │
//! │  │   pool   │──►│ repository                                     │  │
//! │  │ Database │   │   ProductRepository  (catalog + stock reads,   │  │
//! │  │ DbConfig │   │                       restock deltas)          │  │
//! │  └────┬─────┘   │   SaleRepository     (immutable sale reads)    │  │
//! │       │         └────────────────────────────────────────────────┘  │
//! │       │                                                             │
//! │       │         ┌────────────────────────────────────────────────┐  │
//! │       └────────►│ checkout                                       │  │
//! │                 │   CheckoutCoordinator                          │  │
//! │                 │   validate ──► reprice ──► atomic commit       │  │
//! │                 │   (stock decrement + sale insert, one tx)      │  │
//! │                 └────────────────────────────────────────────────┘  │
//! │                                                                     │
//! │  migrations: embedded SQL, run on connect                           │
//! │  error:      DbError (sqlx mapping), CheckoutError                  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pricing math lives in `atlas-core`; this crate feeds it catalog
//! prices and persists what it computes.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::{
    CheckoutCoordinator, CheckoutError, CheckoutReceipt, CheckoutRequest, RefundReceipt,
    StockShortage, DEFAULT_COMMIT_TIMEOUT,
};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
