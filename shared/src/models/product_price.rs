//! Product Price Model

use crate::util::{within_window, windows_overlap};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Purpose used when a request names none
pub const PURPOSE_PURCHASE: &str = "PURCHASE";

/// Store group meaning "any store"
pub const STORE_GROUP_ANY: &str = "_NA_";

/// Classification of a stored price record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceType {
    ListPrice,
    DefaultPrice,
    CompetitivePrice,
    AverageCost,
    PromoPrice,
    MinimumPrice,
    MaximumPrice,
    WholesalePrice,
    SpecialPromoPrice,
}

impl PriceType {
    pub const ALL: [PriceType; 9] = [
        PriceType::ListPrice,
        PriceType::DefaultPrice,
        PriceType::CompetitivePrice,
        PriceType::AverageCost,
        PriceType::PromoPrice,
        PriceType::MinimumPrice,
        PriceType::MaximumPrice,
        PriceType::WholesalePrice,
        PriceType::SpecialPromoPrice,
    ];
}

/// Price record, immutable per effective interval
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductPrice {
    pub product_id: String,
    pub price_type: PriceType,
    pub currency_id: String,
    #[serde(default = "default_store_group")]
    pub store_group_id: String,
    /// `None` is treated as a purchase price
    #[serde(default)]
    pub purpose_id: Option<String>,
    pub price: Decimal,
    pub from_date: i64,
    #[serde(default)]
    pub thru_date: Option<i64>,
    #[serde(default)]
    pub tax_in_price: bool,
    #[serde(default)]
    pub price_with_tax: Option<Decimal>,
}

fn default_store_group() -> String {
    STORE_GROUP_ANY.to_string()
}

impl ProductPrice {
    pub fn is_effective_at(&self, as_of: i64) -> bool {
        within_window(Some(self.from_date), self.thru_date, as_of)
    }

    /// Purchase requests also match records with no purpose
    pub fn matches_purpose(&self, purpose_id: &str) -> bool {
        match &self.purpose_id {
            Some(p) => p == purpose_id,
            None => purpose_id == PURPOSE_PURCHASE,
        }
    }

    fn key(&self) -> (&str, PriceType, &str, &str, Option<&str>) {
        (
            &self.product_id,
            self.price_type,
            &self.currency_id,
            &self.store_group_id,
            self.purpose_id.as_deref(),
        )
    }

    /// Two records for the same key whose effective windows intersect
    pub fn overlaps(&self, other: &ProductPrice) -> bool {
        self.key() == other.key()
            && windows_overlap(
                (Some(self.from_date), self.thru_date),
                (Some(other.from_date), other.thru_date),
            )
    }
}

/// Negotiated price under a sales agreement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgreementPrice {
    pub agreement_id: String,
    pub product_id: String,
    pub currency_id: String,
    pub price: Decimal,
    #[serde(default)]
    pub from_date: Option<i64>,
    #[serde(default)]
    pub thru_date: Option<i64>,
}

impl AgreementPrice {
    pub fn is_effective_at(&self, as_of: i64) -> bool {
        within_window(self.from_date, self.thru_date, as_of)
    }
}

/// Find the first pair of records that breaks the "one current record per key"
/// invariant.
pub fn find_price_overlap(records: &[ProductPrice]) -> Option<(&ProductPrice, &ProductPrice)> {
    for (i, a) in records.iter().enumerate() {
        for b in &records[i + 1..] {
            if a.overlaps(b) {
                return Some((a, b));
            }
        }
    }
    None
}
