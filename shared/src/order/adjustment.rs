//! Monetary Adjustment - tax output of the tax engine

use crate::models::tax::TaxAuthority;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Adjustment kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentKind {
    /// Tax charged on top of the price
    SalesTax,
    /// Tax embedded in a tax-inclusive price
    VatTax,
    /// Rounding drift between stored price-with-tax and recomputed total
    VatPriceCorrect,
}

/// One tax adjustment. Created fresh per calculation and never mutated after.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonetaryAdjustment {
    pub kind: AdjustmentKind,
    pub amount: Decimal,
    pub source_percentage: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_already_included: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exempt_amount: Option<Decimal>,
    pub authority: TaxAuthority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_gl_account_id: Option<String>,
    pub tax_rate_rule_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_tax_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl MonetaryAdjustment {
    pub fn new(
        kind: AdjustmentKind,
        amount: Decimal,
        source_percentage: Decimal,
        authority: TaxAuthority,
        tax_rate_rule_id: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            amount,
            source_percentage,
            amount_already_included: None,
            exempt_amount: None,
            authority,
            override_gl_account_id: None,
            tax_rate_rule_id: tax_rate_rule_id.into(),
            customer_tax_id: None,
            description: None,
        }
    }

    pub fn with_included(mut self, included: Decimal) -> Self {
        self.amount_already_included = Some(included);
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Tax the customer pays on top of the price
    pub fn charged(&self) -> Decimal {
        self.amount
    }

    /// Tax embedded in the price, charged or not
    pub fn embedded(&self) -> Decimal {
        self.amount_already_included.unwrap_or_default()
    }
}
