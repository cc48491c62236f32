//! Calculation outputs
//!
//! Value objects produced by the engines and consumed by order/invoice
//! workflows:
//! - Price results with their audit trail
//! - Monetary (tax) adjustments

pub mod adjustment;
pub mod applied_rule;
pub mod price_result;

// Re-exports
pub use adjustment::{AdjustmentKind, MonetaryAdjustment};
pub use applied_rule::AppliedPriceRule;
pub use price_result::{FlatOverrideSource, PriceNote, PriceResult, QuantityBreakPrice};
