//! Tax Rate Engine
//!
//! - `context`: lines, context and results
//! - `rate_selector`: which rate rows apply to a line
//! - `calculator`: per-row tax, VAT back-out and corrections
//! - `exemption`: party exemptions with authority inheritance
//! - `authority`: authorities for a shipping address
//! - `engine`: [`TaxEngine`], tying it together over the data sources

pub mod authority;
pub mod calculator;
pub mod context;
pub mod engine;
pub mod exemption;
pub mod rate_selector;

pub use context::{OrderTax, OrderTaxRequest, TaxContext, TaxDisplay, TaxLine};
pub use engine::TaxEngine;
pub use exemption::ExemptionStatus;
