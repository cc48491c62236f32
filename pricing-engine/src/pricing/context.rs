//! Price request

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Input of a price calculation. Unset fields fall back to engine
/// configuration (currency, purpose, store group), quantity 1 and "now".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PriceRequest {
    pub product_id: String,
    pub currency_id: Option<String>,
    pub product_store_id: Option<String>,
    pub product_store_group_id: Option<String>,
    pub catalog_id: Option<String>,
    pub web_site_id: Option<String>,
    pub party_id: Option<String>,
    pub agreement_id: Option<String>,
    pub quantity: Option<Decimal>,
    pub purpose_id: Option<String>,
    /// Convert every published price into this currency
    pub target_currency_id: Option<String>,
    /// Evaluation instant (Unix millis)
    pub as_of: Option<i64>,
    /// Also compute one price per quantity break
    pub find_all_quantity_prices: bool,
    /// Add VAT when the store publishes VAT-inclusive prices
    pub check_including_vat: bool,
}

impl PriceRequest {
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            ..Default::default()
        }
    }

    pub fn currency(mut self, currency_id: impl Into<String>) -> Self {
        self.currency_id = Some(currency_id.into());
        self
    }

    pub fn store(mut self, product_store_id: impl Into<String>) -> Self {
        self.product_store_id = Some(product_store_id.into());
        self
    }

    pub fn store_group(mut self, store_group_id: impl Into<String>) -> Self {
        self.product_store_group_id = Some(store_group_id.into());
        self
    }

    pub fn catalog(mut self, catalog_id: impl Into<String>) -> Self {
        self.catalog_id = Some(catalog_id.into());
        self
    }

    pub fn web_site(mut self, web_site_id: impl Into<String>) -> Self {
        self.web_site_id = Some(web_site_id.into());
        self
    }

    pub fn party(mut self, party_id: impl Into<String>) -> Self {
        self.party_id = Some(party_id.into());
        self
    }

    pub fn agreement(mut self, agreement_id: impl Into<String>) -> Self {
        self.agreement_id = Some(agreement_id.into());
        self
    }

    pub fn quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn purpose(mut self, purpose_id: impl Into<String>) -> Self {
        self.purpose_id = Some(purpose_id.into());
        self
    }

    pub fn convert_to(mut self, currency_id: impl Into<String>) -> Self {
        self.target_currency_id = Some(currency_id.into());
        self
    }

    pub fn at(mut self, as_of: i64) -> Self {
        self.as_of = Some(as_of);
        self
    }

    pub fn with_quantity_breaks(mut self) -> Self {
        self.find_all_quantity_prices = true;
        self
    }

    pub fn including_vat(mut self) -> Self {
        self.check_including_vat = true;
        self
    }
}
