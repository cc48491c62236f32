//! Read-only data sources
//!
//! The engines never own data. Everything they read comes through these
//! capability traits, so a host can back them with a database, a cache or
//! the in-memory [`MemoryStore`]. Implementations must return records in a
//! stable order; the engines rely on it for deterministic output.

mod memory;

pub use memory::{ExchangeRate, MemoryStore, Snapshot};

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{
    PartyTaxExemption, PriceRule, Product, ProductPrice, ProductStore, TaxAuthority, TaxRateRule,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

/// Error of a data source call
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Data source unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid data: {0}")]
    Invalid(String),
}

/// Result type for data source calls
pub type SourceResult<T> = Result<T, SourceError>;

/// Price record lookup key
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuery {
    pub product_id: String,
    pub currency_id: String,
    pub store_group_id: String,
    pub purpose_id: String,
    pub as_of: i64,
}

/// Tax rate row lookup
#[derive(Debug, Clone, PartialEq)]
pub struct TaxRateQuery {
    /// Rows for these authorities and for the wildcard authority
    pub authorities: BTreeSet<TaxAuthority>,
    pub product_store_id: Option<String>,
    pub category_ids: BTreeSet<String>,
    pub as_of: i64,
}

/// Products, variants, categories, features and stores
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn product(&self, product_id: &str) -> SourceResult<Option<Product>>;

    /// Virtual parent of a variant
    async fn virtual_product(&self, variant_id: &str, as_of: i64) -> SourceResult<Option<String>>;

    /// Variants of a virtual product, in id order
    async fn variants(&self, virtual_id: &str, as_of: i64) -> SourceResult<Vec<Product>>;

    async fn category_ids(&self, product_id: &str, as_of: i64) -> SourceResult<BTreeSet<String>>;

    async fn feature_ids(&self, product_id: &str, as_of: i64) -> SourceResult<BTreeSet<String>>;

    async fn product_store(&self, store_id: &str) -> SourceResult<Option<ProductStore>>;
}

/// Price records, price rules and agreement prices
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Records effective at `as_of` for the query key; a purchase query also
    /// returns records with no purpose
    async fn price_records(&self, query: &PriceQuery) -> SourceResult<Vec<ProductPrice>>;

    /// Rules that may apply to the product, in evaluation order
    async fn price_rules(&self, product_id: &str, as_of: i64) -> SourceResult<Vec<PriceRule>>;

    async fn agreement_price(
        &self,
        agreement_id: &str,
        product_id: &str,
        currency_id: &str,
        as_of: i64,
    ) -> SourceResult<Option<Decimal>>;
}

/// Party relationships, classifications and roles
#[async_trait]
pub trait PartySource: Send + Sync {
    /// Direct GROUP_ROLLUP members of a group
    async fn group_members(&self, group_id: &str, as_of: i64) -> SourceResult<Vec<String>>;

    /// Groups a party directly rolls up into
    async fn parent_groups(&self, party_id: &str, as_of: i64) -> SourceResult<Vec<String>>;

    /// Classification groups the party is directly placed in
    async fn classifications(&self, party_id: &str, as_of: i64) -> SourceResult<Vec<String>>;

    async fn classification_parent(&self, group_id: &str) -> SourceResult<Option<String>>;

    async fn role_types(&self, party_id: &str) -> SourceResult<BTreeSet<String>>;
}

/// Tax rate rows, exemptions and authority metadata
#[async_trait]
pub trait TaxSource: Send + Sync {
    async fn tax_rate_rules(&self, query: &TaxRateQuery) -> SourceResult<Vec<TaxRateRule>>;

    /// Most recent effective exemption record of any of the parties
    async fn exemption(
        &self,
        party_ids: &BTreeSet<String>,
        authority: &TaxAuthority,
        as_of: i64,
    ) -> SourceResult<Option<PartyTaxExemption>>;

    /// Parent authority through an exemption-inheritance link
    async fn parent_authority(
        &self,
        authority: &TaxAuthority,
        as_of: i64,
    ) -> SourceResult<Option<TaxAuthority>>;

    async fn gl_account_override(
        &self,
        authority: &TaxAuthority,
        organization_party_id: &str,
    ) -> SourceResult<Option<String>>;

    /// Authorities registered for any of the geos
    async fn authorities_for_geos(
        &self,
        geo_ids: &BTreeSet<String>,
    ) -> SourceResult<Vec<TaxAuthority>>;

    /// Geos that directly contain `geo_id`
    async fn geo_parents(&self, geo_id: &str) -> SourceResult<Vec<String>>;
}

/// Currency conversion capability; `None` means the conversion failed
#[async_trait]
pub trait CurrencyConverter: Send + Sync {
    async fn convert(
        &self,
        from_currency: &str,
        to_currency: &str,
        amount: Decimal,
        as_of: i64,
    ) -> Option<Decimal>;
}

/// The capabilities one engine instance reads through
#[derive(Clone)]
pub struct Sources {
    pub catalog: Arc<dyn CatalogSource>,
    pub prices: Arc<dyn PriceSource>,
    pub parties: Arc<dyn PartySource>,
    pub tax: Arc<dyn TaxSource>,
    /// `None`: every conversion fails and keeps the original amount
    pub converter: Option<Arc<dyn CurrencyConverter>>,
}

impl Sources {
    /// Every capability served by one store
    pub fn from_store<T>(store: Arc<T>) -> Self
    where
        T: CatalogSource + PriceSource + PartySource + TaxSource + CurrencyConverter + 'static,
    {
        Self {
            catalog: store.clone(),
            prices: store.clone(),
            parties: store.clone(),
            tax: store.clone(),
            converter: Some(store),
        }
    }

    pub fn with_converter(mut self, converter: Option<Arc<dyn CurrencyConverter>>) -> Self {
        self.converter = converter;
        self
    }
}
