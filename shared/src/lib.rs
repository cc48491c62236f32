//! Shared types for the pricing workspace
//!
//! Data models, calculation outputs, unified error types and time helpers
//! used by the engines and their callers.

pub mod error;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
