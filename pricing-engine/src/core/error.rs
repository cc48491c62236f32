use crate::source::SourceError;
use shared::error::{AppError, ErrorCode};
use shared::models::{PriceType, RuleDefect};
use thiserror::Error;

/// Typed failure of a price or tax calculation
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No usable price for product {product_id} in {currency_id}")]
    PriceNotFound {
        product_id: String,
        currency_id: String,
    },

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Store {0} shows VAT-inclusive prices but has no VAT tax authority")]
    MissingVatAuthority(String),

    #[error("Invalid price rule {rule_id}: {defect}")]
    InvalidRule {
        rule_id: String,
        #[source]
        defect: RuleDefect,
    },

    #[error("Overlapping {price_type:?} records for product {product_id}")]
    PriceOverlap {
        product_id: String,
        price_type: PriceType,
    },

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(#[from] serde_json::Error),

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        let message = err.to_string();
        match err {
            EngineError::PriceNotFound {
                product_id,
                currency_id,
            } => AppError::with_message(ErrorCode::PriceNotFound, message)
                .with_detail("product_id", product_id)
                .with_detail("currency_id", currency_id),
            EngineError::ProductNotFound(id) => {
                AppError::with_message(ErrorCode::ProductNotFound, message).with_detail("product_id", id)
            }
            EngineError::MissingVatAuthority(store_id) => {
                AppError::with_message(ErrorCode::VatAuthorityMissing, message)
                    .with_detail("product_store_id", store_id)
            }
            EngineError::InvalidRule { rule_id, .. } => {
                AppError::with_message(ErrorCode::PriceRuleInvalid, message).with_detail("rule_id", rule_id)
            }
            EngineError::PriceOverlap { product_id, .. } => {
                AppError::with_message(ErrorCode::PriceOverlap, message).with_detail("product_id", product_id)
            }
            EngineError::InvalidSnapshot(_) => AppError::with_message(ErrorCode::InvalidFormat, message),
            EngineError::Source(_) => AppError::with_message(ErrorCode::DataSourceError, message),
        }
    }
}
