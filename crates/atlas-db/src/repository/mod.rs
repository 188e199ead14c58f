//! Repository implementations.
//!
//! Each repository holds a cloned pool handle and exposes the queries
//! for one aggregate. Cross-aggregate writes (stock decrement + sale
//! insert) do NOT live here - they belong to the checkout coordinator,
//! which runs them inside a single transaction.

pub mod product;
pub mod sale;
