//! Base Price Resolution
//!
//! Picks one price per price type, then applies the ordered fallbacks:
//! virtual parent for variants, cheapest variant for virtual products,
//! agreement price over the default price. Every fallback taken is
//! reported as a [`PriceNote`].

use crate::source::{CatalogSource, PriceQuery, PriceSource, SourceResult};
use rust_decimal::Decimal;
use shared::models::{PriceType, Product, ProductPrice, STORE_GROUP_ANY};
use shared::order::PriceNote;
use std::collections::BTreeMap;

/// One resolved price with the tax flags of its record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub value: Decimal,
    pub tax_in_price: bool,
    pub price_with_tax: Option<Decimal>,
}

impl From<&ProductPrice> for PricePoint {
    fn from(record: &ProductPrice) -> Self {
        Self {
            value: record.price,
            tax_in_price: record.tax_in_price,
            price_with_tax: record.price_with_tax,
        }
    }
}

/// Type-keyed base prices of one product
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BasePrices {
    points: BTreeMap<PriceType, PricePoint>,
}

impl BasePrices {
    /// Most recently effective record per type; ties keep the first record
    pub fn from_records(records: &[ProductPrice]) -> Self {
        let mut latest: BTreeMap<PriceType, &ProductPrice> = BTreeMap::new();
        for record in records {
            let newer = latest
                .get(&record.price_type)
                .is_none_or(|current| record.from_date > current.from_date);
            if newer {
                latest.insert(record.price_type, record);
            }
        }
        Self {
            points: latest.into_iter().map(|(t, r)| (t, r.into())).collect(),
        }
    }

    pub fn get(&self, price_type: PriceType) -> Option<Decimal> {
        self.points.get(&price_type).map(|p| p.value)
    }

    pub fn set(&mut self, price_type: PriceType, value: Decimal) {
        self.points
            .entry(price_type)
            .and_modify(|p| p.value = value)
            .or_insert(PricePoint {
                value,
                tax_in_price: false,
                price_with_tax: None,
            });
    }

    pub fn list(&self) -> Option<Decimal> {
        self.get(PriceType::ListPrice)
    }

    pub fn default_price(&self) -> Option<Decimal> {
        self.get(PriceType::DefaultPrice)
    }

    pub fn minimum(&self) -> Option<Decimal> {
        self.get(PriceType::MinimumPrice)
    }

    pub fn maximum(&self) -> Option<Decimal> {
        self.get(PriceType::MaximumPrice)
    }

    /// Average cost; falls back to the list price when absent
    pub fn average_cost_or_list(&self) -> Option<Decimal> {
        self.get(PriceType::AverageCost).or_else(|| self.list())
    }

    /// Record that carries the tax flags: default price, else list price
    pub fn tax_point(&self) -> Option<&PricePoint> {
        self.points
            .get(&PriceType::DefaultPrice)
            .or_else(|| self.points.get(&PriceType::ListPrice))
    }

    /// Fill the types missing here from `other`; returns the filled types
    fn fill_from(&mut self, other: &BasePrices) -> Vec<PriceType> {
        let mut filled = Vec::new();
        for (price_type, point) in &other.points {
            if !self.points.contains_key(price_type) {
                self.points.insert(*price_type, *point);
                filled.push(*price_type);
            }
        }
        filled
    }
}

/// Records of the requested store group, else of the catch-all group
async fn load(prices: &dyn PriceSource, query: &PriceQuery, product_id: &str) -> SourceResult<BasePrices> {
    let query = PriceQuery {
        product_id: product_id.to_string(),
        ..query.clone()
    };
    let mut records = prices.price_records(&query).await?;
    if records.is_empty() && query.store_group_id != STORE_GROUP_ANY {
        let any_group = PriceQuery {
            store_group_id: STORE_GROUP_ANY.to_string(),
            ..query
        };
        records = prices.price_records(&any_group).await?;
    }
    Ok(BasePrices::from_records(&records))
}

/// Resolve the base prices of `product` for the query key.
///
/// `query.product_id` is ignored; the product and its relatives are looked
/// up in turn.
pub async fn resolve_base_prices(
    prices: &dyn PriceSource,
    catalog: &dyn CatalogSource,
    product: &Product,
    virtual_id: Option<&str>,
    agreement_id: Option<&str>,
    query: &PriceQuery,
) -> SourceResult<(BasePrices, Vec<PriceNote>)> {
    let mut notes = Vec::new();
    let mut base = load(prices, query, &product.id).await?;

    // Variant: missing types come from the virtual parent
    if product.is_variant
        && let Some(virtual_id) = virtual_id
    {
        let parent = load(prices, query, virtual_id).await?;
        for price_type in base.fill_from(&parent) {
            tracing::debug!(
                product_id = %product.id,
                virtual_id = %virtual_id,
                price_type = ?price_type,
                "Price taken from virtual product"
            );
            notes.push(PriceNote::VirtualFallback {
                virtual_id: virtual_id.to_string(),
                price_type,
            });
        }
    }

    // Virtual without default: adopt the cheapest sellable variant's prices
    if product.is_virtual && !product.is_variant && base.default_price().is_none() {
        let mut cheapest: Option<(String, Decimal, BasePrices)> = None;
        for variant in catalog.variants(&product.id, query.as_of).await? {
            if !variant.is_sellable_at(query.as_of) {
                continue;
            }
            let candidate = load(prices, query, &variant.id).await?;
            let Some(default) = candidate.default_price() else {
                continue;
            };
            if cheapest.as_ref().is_none_or(|(_, best, _)| default < *best) {
                cheapest = Some((variant.id.clone(), default, candidate));
            }
        }
        if let Some((variant_id, default, candidate)) = cheapest {
            tracing::info!(
                product_id = %product.id,
                variant_id = %variant_id,
                default_price = %default,
                "Using prices of cheapest variant"
            );
            base = candidate;
            notes.push(PriceNote::CheapestVariant { variant_id });
        }
    }

    if let Some(agreement_id) = agreement_id
        && let Some(price) = prices
            .agreement_price(agreement_id, &product.id, &query.currency_id, query.as_of)
            .await?
    {
        tracing::debug!(product_id = %product.id, agreement_id = %agreement_id, price = %price, "Agreement price applied");
        base.set(PriceType::DefaultPrice, price);
        notes.push(PriceNote::AgreementPrice {
            agreement_id: agreement_id.to_string(),
        });
    }

    Ok((base, notes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(price_type: PriceType, price: Decimal, from: i64) -> ProductPrice {
        ProductPrice {
            product_id: "P1".to_string(),
            price_type,
            currency_id: "USD".to_string(),
            store_group_id: STORE_GROUP_ANY.to_string(),
            purpose_id: None,
            price,
            from_date: from,
            thru_date: None,
            tax_in_price: false,
            price_with_tax: None,
        }
    }

    #[test]
    fn test_most_recent_record_wins() {
        let base = BasePrices::from_records(&[
            record(PriceType::ListPrice, dec!(10), 0),
            record(PriceType::ListPrice, dec!(12), 50),
            record(PriceType::DefaultPrice, dec!(9), 0),
        ]);
        assert_eq!(base.list(), Some(dec!(12)));
        assert_eq!(base.default_price(), Some(dec!(9)));
        assert_eq!(base.minimum(), None);
    }

    #[test]
    fn test_average_cost_falls_back_to_list() {
        let mut base = BasePrices::from_records(&[record(PriceType::ListPrice, dec!(10), 0)]);
        assert_eq!(base.average_cost_or_list(), Some(dec!(10)));
        base.set(PriceType::AverageCost, dec!(6));
        assert_eq!(base.average_cost_or_list(), Some(dec!(6)));
    }

    #[test]
    fn test_tax_point_prefers_default() {
        let mut list = record(PriceType::ListPrice, dec!(10), 0);
        list.tax_in_price = true;
        let base = BasePrices::from_records(&[list.clone()]);
        assert!(base.tax_point().unwrap().tax_in_price);

        let base = BasePrices::from_records(&[list, record(PriceType::DefaultPrice, dec!(9), 0)]);
        assert!(!base.tax_point().unwrap().tax_in_price);
    }

    #[test]
    fn test_fill_from_only_missing() {
        let mut own = BasePrices::from_records(&[record(PriceType::ListPrice, dec!(10), 0)]);
        let parent = BasePrices::from_records(&[
            record(PriceType::ListPrice, dec!(99), 0),
            record(PriceType::DefaultPrice, dec!(8), 0),
        ]);
        let filled = own.fill_from(&parent);
        assert_eq!(filled, vec![PriceType::DefaultPrice]);
        assert_eq!(own.list(), Some(dec!(10)));
        assert_eq!(own.default_price(), Some(dec!(8)));
    }
}
