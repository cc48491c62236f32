//! Data models
//!
//! Read-only snapshots the engines consume. All ids are `String`, all
//! instants are Unix millis, all money is `Decimal`.

pub mod party;
pub mod price_rule;
pub mod product;
pub mod product_price;
pub mod store;
pub mod tax;

// Re-exports
pub use party::*;
pub use price_rule::*;
pub use product::*;
pub use product_price::*;
pub use store::*;
pub use tax::*;
