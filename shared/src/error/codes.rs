//! Numeric error codes
//!
//! | Range | Area |
//! |-------|------|
//! | 0xxx | input data |
//! | 6xxx | products, prices, price rules |
//! | 7xxx | tax |
//! | 9xxx | data sources |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code, serialized as its `u16` value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    /// Input could not be parsed
    InvalidFormat = 1,

    ProductNotFound = 6001,
    PriceNotFound = 6101,
    /// Two price records of one type are effective at the same time
    PriceOverlap = 6102,
    PriceRuleInvalid = 6201,

    /// Store shows VAT-inclusive prices without a VAT authority
    VatAuthorityMissing = 7001,

    DataSourceError = 9001,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 7] = [
        ErrorCode::InvalidFormat,
        ErrorCode::ProductNotFound,
        ErrorCode::PriceNotFound,
        ErrorCode::PriceOverlap,
        ErrorCode::PriceRuleInvalid,
        ErrorCode::VatAuthorityMissing,
        ErrorCode::DataSourceError,
    ];

    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Default message when the caller supplies none
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidFormat => "Input could not be parsed",
            ErrorCode::ProductNotFound => "Product does not exist",
            ErrorCode::PriceNotFound => "No usable price for the product",
            ErrorCode::PriceOverlap => "Price records of one type overlap in time",
            ErrorCode::PriceRuleInvalid => "Price rule cannot be evaluated",
            ErrorCode::VatAuthorityMissing => "Store has no VAT tax authority",
            ErrorCode::DataSourceError => "Data source failed",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// A `u16` that names no [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown error code {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        ErrorCode::ALL
            .into_iter()
            .find(|c| c.code() == value)
            .ok_or(InvalidErrorCode(value))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        for (i, a) in ErrorCode::ALL.iter().enumerate() {
            for b in &ErrorCode::ALL[i + 1..] {
                assert_ne!(a.code(), b.code(), "{:?} and {:?} share a code", a, b);
            }
        }
    }

    #[test]
    fn test_try_from() {
        assert_eq!(ErrorCode::try_from(6101), Ok(ErrorCode::PriceNotFound));
        assert_eq!(ErrorCode::try_from(7001), Ok(ErrorCode::VatAuthorityMissing));
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
    }

    #[test]
    fn test_serde_as_integer() {
        assert_eq!(serde_json::to_string(&ErrorCode::PriceOverlap).unwrap(), "6102");
        let code: ErrorCode = serde_json::from_str("9001").unwrap();
        assert_eq!(code, ErrorCode::DataSourceError);
        assert!(serde_json::from_str::<ErrorCode>("4242").is_err());
    }
}
