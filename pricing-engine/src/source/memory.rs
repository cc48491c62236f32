//! In-memory data source over an immutable snapshot

use super::{
    CatalogSource, CurrencyConverter, PartySource, PriceQuery, PriceSource, SourceResult,
    TaxRateQuery, TaxSource,
};
use crate::core::{EngineError, EngineResult};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{
    AgreementPrice, AuthorityRelation, ClassificationGroup, GeoAssoc, PartyClassification,
    PartyRelationship, PartyRole, PartyTaxExemption, PriceRule, Product, ProductCategoryMember,
    ProductFeatureAppl, ProductPrice, ProductStore, TaxAuthority,
    TaxAuthorityGlAccount, TaxAuthorityInheritance, TaxRateRule, VariantAssoc, find_price_overlap,
};
use shared::util::within_window;
use std::collections::BTreeSet;

/// Conversion rate `from -> to`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExchangeRate {
    pub from_currency: String,
    pub to_currency: String,
    pub rate: Decimal,
    #[serde(default)]
    pub from_date: Option<i64>,
    #[serde(default)]
    pub thru_date: Option<i64>,
}

/// Everything the engines read, as one serde document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    // === Catalog ===
    pub products: Vec<Product>,
    pub product_stores: Vec<ProductStore>,
    pub category_members: Vec<ProductCategoryMember>,
    pub feature_appls: Vec<ProductFeatureAppl>,
    pub variant_assocs: Vec<VariantAssoc>,

    // === Prices ===
    pub prices: Vec<ProductPrice>,
    pub price_rules: Vec<PriceRule>,
    pub agreement_prices: Vec<AgreementPrice>,
    pub exchange_rates: Vec<ExchangeRate>,

    // === Parties ===
    pub party_relationships: Vec<PartyRelationship>,
    pub party_classifications: Vec<PartyClassification>,
    pub classification_groups: Vec<ClassificationGroup>,
    pub party_roles: Vec<PartyRole>,

    // === Tax ===
    pub tax_authorities: Vec<TaxAuthority>,
    pub tax_rate_rules: Vec<TaxRateRule>,
    pub exemptions: Vec<PartyTaxExemption>,
    pub authority_links: Vec<TaxAuthorityInheritance>,
    pub gl_accounts: Vec<TaxAuthorityGlAccount>,
    pub geo_assocs: Vec<GeoAssoc>,
}

/// Validated, read-only snapshot implementing every source trait
#[derive(Debug, Clone)]
pub struct MemoryStore {
    data: Snapshot,
}

impl MemoryStore {
    /// Validate and wrap a snapshot.
    ///
    /// Rejects rules with unknown condition, operator or action tags and
    /// price records whose effective windows overlap for the same key.
    pub fn new(data: Snapshot) -> EngineResult<Self> {
        for rule in &data.price_rules {
            rule.validate().map_err(|defect| EngineError::InvalidRule {
                rule_id: rule.id.clone(),
                defect,
            })?;
        }

        if let Some((a, _)) = find_price_overlap(&data.prices) {
            return Err(EngineError::PriceOverlap {
                product_id: a.product_id.clone(),
                price_type: a.price_type,
            });
        }

        tracing::debug!(
            products = data.products.len(),
            prices = data.prices.len(),
            price_rules = data.price_rules.len(),
            tax_rate_rules = data.tax_rate_rules.len(),
            "Snapshot loaded"
        );

        Ok(Self { data })
    }

    /// Parse and validate a JSON snapshot
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let data: Snapshot = serde_json::from_str(json)?;
        Self::new(data)
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.data
    }

    fn direct_rate(&self, from: &str, to: &str, as_of: i64) -> Option<Decimal> {
        self.data
            .exchange_rates
            .iter()
            .find(|r| {
                r.from_currency == from
                    && r.to_currency == to
                    && within_window(r.from_date, r.thru_date, as_of)
            })
            .map(|r| r.rate)
    }
}

#[async_trait]
impl CatalogSource for MemoryStore {
    async fn product(&self, product_id: &str) -> SourceResult<Option<Product>> {
        Ok(self.data.products.iter().find(|p| p.id == product_id).cloned())
    }

    async fn virtual_product(&self, variant_id: &str, as_of: i64) -> SourceResult<Option<String>> {
        Ok(self
            .data
            .variant_assocs
            .iter()
            .find(|a| a.variant_id == variant_id && a.is_effective_at(as_of))
            .map(|a| a.virtual_id.clone()))
    }

    async fn variants(&self, virtual_id: &str, as_of: i64) -> SourceResult<Vec<Product>> {
        let ids: BTreeSet<&str> = self
            .data
            .variant_assocs
            .iter()
            .filter(|a| a.virtual_id == virtual_id && a.is_effective_at(as_of))
            .map(|a| a.variant_id.as_str())
            .collect();
        Ok(ids
            .into_iter()
            .filter_map(|id| self.data.products.iter().find(|p| p.id == id).cloned())
            .collect())
    }

    async fn category_ids(&self, product_id: &str, as_of: i64) -> SourceResult<BTreeSet<String>> {
        Ok(self
            .data
            .category_members
            .iter()
            .filter(|m| m.product_id == product_id && m.is_effective_at(as_of))
            .map(|m| m.category_id.clone())
            .collect())
    }

    async fn feature_ids(&self, product_id: &str, as_of: i64) -> SourceResult<BTreeSet<String>> {
        Ok(self
            .data
            .feature_appls
            .iter()
            .filter(|f| f.product_id == product_id && f.is_effective_at(as_of))
            .map(|f| f.feature_id.clone())
            .collect())
    }

    async fn product_store(&self, store_id: &str) -> SourceResult<Option<ProductStore>> {
        Ok(self
            .data
            .product_stores
            .iter()
            .find(|s| s.id == store_id)
            .cloned())
    }
}

#[async_trait]
impl PriceSource for MemoryStore {
    async fn price_records(&self, query: &PriceQuery) -> SourceResult<Vec<ProductPrice>> {
        Ok(self
            .data
            .prices
            .iter()
            .filter(|p| {
                p.product_id == query.product_id
                    && p.currency_id == query.currency_id
                    && p.store_group_id == query.store_group_id
                    && p.matches_purpose(&query.purpose_id)
                    && p.is_effective_at(query.as_of)
            })
            .cloned()
            .collect())
    }

    async fn price_rules(&self, _product_id: &str, as_of: i64) -> SourceResult<Vec<PriceRule>> {
        // Product relevance is decided by the rule conditions
        Ok(self
            .data
            .price_rules
            .iter()
            .filter(|r| r.is_effective_at(as_of))
            .cloned()
            .collect())
    }

    async fn agreement_price(
        &self,
        agreement_id: &str,
        product_id: &str,
        currency_id: &str,
        as_of: i64,
    ) -> SourceResult<Option<Decimal>> {
        Ok(self
            .data
            .agreement_prices
            .iter()
            .filter(|a| {
                a.agreement_id == agreement_id
                    && a.product_id == product_id
                    && a.currency_id == currency_id
                    && a.is_effective_at(as_of)
            })
            .max_by_key(|a| a.from_date.unwrap_or(i64::MIN))
            .map(|a| a.price))
    }
}

#[async_trait]
impl PartySource for MemoryStore {
    async fn group_members(&self, group_id: &str, as_of: i64) -> SourceResult<Vec<String>> {
        Ok(self
            .data
            .party_relationships
            .iter()
            .filter(|r| r.group_id == group_id && r.is_effective_at(as_of))
            .map(|r| r.member_id.clone())
            .collect())
    }

    async fn parent_groups(&self, party_id: &str, as_of: i64) -> SourceResult<Vec<String>> {
        Ok(self
            .data
            .party_relationships
            .iter()
            .filter(|r| r.member_id == party_id && r.is_effective_at(as_of))
            .map(|r| r.group_id.clone())
            .collect())
    }

    async fn classifications(&self, party_id: &str, as_of: i64) -> SourceResult<Vec<String>> {
        Ok(self
            .data
            .party_classifications
            .iter()
            .filter(|c| c.party_id == party_id && c.is_effective_at(as_of))
            .map(|c| c.classification_group_id.clone())
            .collect())
    }

    async fn classification_parent(&self, group_id: &str) -> SourceResult<Option<String>> {
        Ok(self
            .data
            .classification_groups
            .iter()
            .find(|g| g.id == group_id)
            .and_then(|g| g.parent_id.clone()))
    }

    async fn role_types(&self, party_id: &str) -> SourceResult<BTreeSet<String>> {
        Ok(self
            .data
            .party_roles
            .iter()
            .filter(|r| r.party_id == party_id)
            .map(|r| r.role_type_id.clone())
            .collect())
    }
}

#[async_trait]
impl TaxSource for MemoryStore {
    async fn tax_rate_rules(&self, query: &TaxRateQuery) -> SourceResult<Vec<TaxRateRule>> {
        Ok(self
            .data
            .tax_rate_rules
            .iter()
            .filter(|r| {
                r.is_effective_at(query.as_of)
                    && (r.authority.is_wildcard() || query.authorities.contains(&r.authority))
                    && r.product_store_id.as_ref().is_none_or(|store| {
                        query.product_store_id.as_deref() == Some(store.as_str())
                    })
            })
            .cloned()
            .collect())
    }

    async fn exemption(
        &self,
        party_ids: &BTreeSet<String>,
        authority: &TaxAuthority,
        as_of: i64,
    ) -> SourceResult<Option<PartyTaxExemption>> {
        let mut latest: Option<&PartyTaxExemption> = None;
        for record in self.data.exemptions.iter().filter(|e| {
            party_ids.contains(&e.party_id) && &e.authority == authority && e.is_effective_at(as_of)
        }) {
            let from = record.from_date.unwrap_or(i64::MIN);
            if latest.is_none_or(|l| from > l.from_date.unwrap_or(i64::MIN)) {
                latest = Some(record);
            }
        }
        Ok(latest.cloned())
    }

    async fn parent_authority(
        &self,
        authority: &TaxAuthority,
        as_of: i64,
    ) -> SourceResult<Option<TaxAuthority>> {
        Ok(self
            .data
            .authority_links
            .iter()
            .find(|l| {
                &l.child == authority
                    && l.relation == AuthorityRelation::ExemptInher
                    && l.is_effective_at(as_of)
            })
            .map(|l| l.parent.clone()))
    }

    async fn gl_account_override(
        &self,
        authority: &TaxAuthority,
        organization_party_id: &str,
    ) -> SourceResult<Option<String>> {
        Ok(self
            .data
            .gl_accounts
            .iter()
            .find(|g| &g.authority == authority && g.organization_party_id == organization_party_id)
            .map(|g| g.gl_account_id.clone()))
    }

    async fn authorities_for_geos(
        &self,
        geo_ids: &BTreeSet<String>,
    ) -> SourceResult<Vec<TaxAuthority>> {
        let found: BTreeSet<TaxAuthority> = self
            .data
            .tax_authorities
            .iter()
            .filter(|a| geo_ids.contains(&a.geo_id))
            .cloned()
            .collect();
        Ok(found.into_iter().collect())
    }

    async fn geo_parents(&self, geo_id: &str) -> SourceResult<Vec<String>> {
        Ok(self
            .data
            .geo_assocs
            .iter()
            .filter(|g| g.geo_id == geo_id)
            .map(|g| g.parent_geo_id.clone())
            .collect())
    }
}

#[async_trait]
impl CurrencyConverter for MemoryStore {
    async fn convert(
        &self,
        from_currency: &str,
        to_currency: &str,
        amount: Decimal,
        as_of: i64,
    ) -> Option<Decimal> {
        if from_currency == to_currency {
            return Some(amount);
        }
        if let Some(rate) = self.direct_rate(from_currency, to_currency, as_of) {
            return Some(amount * rate);
        }
        self.direct_rate(to_currency, from_currency, as_of)
            .filter(|rate| !rate.is_zero())
            .map(|rate| amount / rate)
    }
}
