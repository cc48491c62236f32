//! Price Result - output of the price rule engine

use super::applied_rule::AppliedPriceRule;
use crate::models::product_price::PriceType;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which branch of the flat override chain produced the price
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlatOverrideSource {
    /// Action amount (plain flat) or base + amount (promo/wholesale flat)
    Amount,
    DefaultPrice,
    ListPrice,
    Zero,
}

impl FlatOverrideSource {
    /// True when the action's own amount was not used
    pub fn is_fallback(&self) -> bool {
        !matches!(self, Self::Amount)
    }
}

/// Approximation or fallback taken while computing a price
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceNote {
    /// A price type was taken from the virtual parent product
    VirtualFallback {
        virtual_id: String,
        price_type: PriceType,
    },
    /// Prices were adopted from the cheapest variant
    CheapestVariant { variant_id: String },
    /// Negotiated agreement price replaced the default price
    AgreementPrice { agreement_id: String },
    /// A flat override did not use its own amount
    FlatOverrideFallback {
        rule_id: String,
        source: FlatOverrideSource,
    },
    /// Currency conversion failed; the field kept its original value
    ConversionFailed { field: String, currency_id: String },
    /// Prices include VAT at the given rate
    VatIncluded { tax_percentage: Decimal },
    /// VAT lookup failed; prices are published without VAT
    VatUnavailable { product_store_id: String },
}

/// Price computed for one quantity-gated rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuantityBreakPrice {
    pub rule_id: String,
    /// Quantity conditions of the gating rule, e.g. `[quantity >= 10]`
    pub quantity_condition: String,
    pub price: Decimal,
    pub is_sale: bool,
    pub valid_price_found: bool,
    pub applied_rules: Vec<AppliedPriceRule>,
}

/// Complete result of a price calculation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceResult {
    pub product_id: String,
    pub currency_id: String,

    // === Final ===
    /// Price the rules started from
    pub base_price: Decimal,
    pub price: Decimal,
    pub is_sale: bool,
    pub valid_price_found: bool,

    // === Type-keyed prices ===
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitive_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_cost: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_promo_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wholesale_price: Option<Decimal>,

    // === VAT display ===
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_with_tax: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_percentage: Option<Decimal>,

    // === Audit ===
    #[serde(default)]
    pub applied_rules: Vec<AppliedPriceRule>,
    #[serde(default)]
    pub quantity_breaks: Vec<QuantityBreakPrice>,
    #[serde(default)]
    pub notes: Vec<PriceNote>,
}

impl PriceResult {
    /// True when no fallback or approximation was recorded
    pub fn is_exact(&self) -> bool {
        self.notes.iter().all(|note| {
            matches!(
                note,
                PriceNote::AgreementPrice { .. } | PriceNote::VatIncluded { .. }
            )
        })
    }

    /// Published price fields as (name, value) pairs, in a fixed order
    pub fn price_fields(&self) -> [(&'static str, Option<Decimal>); 12] {
        [
            ("base_price", Some(self.base_price)),
            ("price", Some(self.price)),
            ("list_price", self.list_price),
            ("default_price", self.default_price),
            ("competitive_price", self.competitive_price),
            ("average_cost", self.average_cost),
            ("promo_price", self.promo_price),
            ("special_promo_price", self.special_promo_price),
            ("minimum_price", self.minimum_price),
            ("maximum_price", self.maximum_price),
            ("wholesale_price", self.wholesale_price),
            ("price_with_tax", self.price_with_tax),
        ]
    }

    /// Mutable access to a published price field by name
    pub fn price_field_mut(&mut self, name: &str) -> Option<&mut Decimal> {
        match name {
            "base_price" => Some(&mut self.base_price),
            "price" => Some(&mut self.price),
            "list_price" => self.list_price.as_mut(),
            "default_price" => self.default_price.as_mut(),
            "competitive_price" => self.competitive_price.as_mut(),
            "average_cost" => self.average_cost.as_mut(),
            "promo_price" => self.promo_price.as_mut(),
            "special_promo_price" => self.special_promo_price.as_mut(),
            "minimum_price" => self.minimum_price.as_mut(),
            "maximum_price" => self.maximum_price.as_mut(),
            "wholesale_price" => self.wholesale_price.as_mut(),
            "price_with_tax" => self.price_with_tax.as_mut(),
            _ => None,
        }
    }
}
