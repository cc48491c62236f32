//! Error codes shared by the pricing crates
//!
//! Engine errors convert into [`AppError`], which carries a stable numeric
//! [`ErrorCode`] plus structured details.
//!
//! ```
//! use shared::error::{AppError, ErrorCategory, ErrorCode};
//!
//! let err = AppError::with_message(ErrorCode::PriceNotFound, "no default price")
//!     .with_detail("product_id", "GZ-1000");
//! assert_eq!(err.code.code(), 6101);
//! assert_eq!(err.code.category(), ErrorCategory::Pricing);
//! ```

mod category;
mod codes;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, AppResult};
