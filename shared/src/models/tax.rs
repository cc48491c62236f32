//! Tax Authority Model
//!
//! Tax authorities, their rate rules, party exemptions and the
//! exemption-inheritance links between authorities.

use crate::util::within_window;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Geo/party id matching every jurisdiction
pub const TAX_WILDCARD: &str = "_NA_";

/// One taxing jurisdiction: (geography, taxing party)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaxAuthority {
    pub geo_id: String,
    pub party_id: String,
}

impl TaxAuthority {
    pub fn new(geo_id: impl Into<String>, party_id: impl Into<String>) -> Self {
        Self {
            geo_id: geo_id.into(),
            party_id: party_id.into(),
        }
    }

    pub fn wildcard() -> Self {
        Self::new(TAX_WILDCARD, TAX_WILDCARD)
    }

    pub fn is_wildcard(&self) -> bool {
        self.geo_id == TAX_WILDCARD && self.party_id == TAX_WILDCARD
    }
}

impl fmt::Display for TaxAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.geo_id, self.party_id)
    }
}

/// A tax rate row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaxRateRule {
    pub id: String,
    pub authority: TaxAuthority,
    pub rate_type_id: String,
    /// `None` = all stores
    #[serde(default)]
    pub product_store_id: Option<String>,
    /// `None` = all categories
    #[serde(default)]
    pub product_category_id: Option<String>,
    #[serde(default)]
    pub min_item_price: Option<Decimal>,
    #[serde(default)]
    pub min_purchase: Option<Decimal>,
    pub tax_percentage: Decimal,
    #[serde(default)]
    pub tax_shipping: bool,
    #[serde(default)]
    pub tax_promotions: bool,
    #[serde(default)]
    pub from_date: Option<i64>,
    #[serde(default)]
    pub thru_date: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl TaxRateRule {
    pub fn is_effective_at(&self, as_of: i64) -> bool {
        within_window(self.from_date, self.thru_date, as_of)
    }
}

/// Party tax information for one authority
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartyTaxExemption {
    pub party_id: String,
    pub authority: TaxAuthority,
    #[serde(default)]
    pub is_exempt: bool,
    #[serde(default)]
    pub party_tax_id: Option<String>,
    #[serde(default)]
    pub from_date: Option<i64>,
    #[serde(default)]
    pub thru_date: Option<i64>,
}

impl PartyTaxExemption {
    pub fn is_effective_at(&self, as_of: i64) -> bool {
        within_window(self.from_date, self.thru_date, as_of)
    }
}

/// Kind of link between two authorities
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorityRelation {
    /// Exemptions granted by the parent also apply to the child
    ExemptInher,
    /// Child collects on behalf of the parent; not walked for exemptions
    Collect,
}

/// Link from a child authority to its parent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaxAuthorityInheritance {
    pub child: TaxAuthority,
    pub parent: TaxAuthority,
    pub relation: AuthorityRelation,
    #[serde(default)]
    pub from_date: Option<i64>,
    #[serde(default)]
    pub thru_date: Option<i64>,
}

impl TaxAuthorityInheritance {
    pub fn is_effective_at(&self, as_of: i64) -> bool {
        within_window(self.from_date, self.thru_date, as_of)
    }
}

/// Ledger account override per (authority, payee organization)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaxAuthorityGlAccount {
    pub authority: TaxAuthority,
    pub organization_party_id: String,
    pub gl_account_id: String,
}

/// Geo containment: `geo_id` lies inside `parent_geo_id`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeoAssoc {
    pub geo_id: String,
    pub parent_geo_id: String,
}

/// The geo ids of a shipping address that taxing authorities key on
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PostalAddress {
    #[serde(default)]
    pub country_geo_id: Option<String>,
    #[serde(default)]
    pub state_province_geo_id: Option<String>,
    #[serde(default)]
    pub county_geo_id: Option<String>,
    #[serde(default)]
    pub postal_code_geo_id: Option<String>,
}

impl PostalAddress {
    /// Geo ids in order from most general to most specific
    pub fn geo_ids(&self) -> Vec<String> {
        [
            &self.country_geo_id,
            &self.state_province_geo_id,
            &self.county_geo_id,
            &self.postal_code_geo_id,
        ]
        .into_iter()
        .flatten()
        .cloned()
        .collect()
    }
}
