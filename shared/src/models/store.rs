//! Product Store Model

use super::tax::TaxAuthority;
use serde::{Deserialize, Serialize};

/// Store settings that affect price presentation and tax
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductStore {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Publish prices with VAT included
    #[serde(default)]
    pub show_prices_with_vat_tax: bool,
    /// Authority used for VAT-inclusive display prices
    #[serde(default)]
    pub vat_tax_authority: Option<TaxAuthority>,
    /// Organization that receives payment; keys ledger account overrides
    #[serde(default)]
    pub pay_to_party_id: Option<String>,
    #[serde(default)]
    pub store_group_id: Option<String>,
}
