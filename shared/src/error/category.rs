use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Area an [`ErrorCode`] belongs to, derived from its range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Input,
    Pricing,
    Tax,
    /// Data sources, and any code outside the known ranges
    System,
}

impl ErrorCategory {
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::Input,
            6000..7000 => Self::Pricing,
            7000..8000 => Self::Tax,
            _ => Self::System,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Pricing => "pricing",
            Self::Tax => "tax",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
