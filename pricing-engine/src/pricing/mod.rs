//! Price Rule Engine
//!
//! - `context`: the price request
//! - `base_price`: type-keyed base prices and their fallbacks
//! - `condition`: condition facts and evaluation
//! - `calculator`: the rule fold, clamping and rounding
//! - `quantity_breaks`: one price per quantity-gated rule
//! - `engine`: [`PricingEngine`], tying it together over the data sources

pub mod base_price;
pub mod calculator;
pub mod condition;
pub mod context;
pub mod engine;
pub mod quantity_breaks;

pub use base_price::{BasePrices, PricePoint};
pub use calculator::{RuleOutcome, RunningPrice};
pub use condition::ConditionFacts;
pub use context::PriceRequest;
pub use engine::PricingEngine;
