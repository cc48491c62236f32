//! Price Rule Engine
//!
//! Resolves base prices, folds the effective price rules over the list
//! price, then optionally publishes VAT-inclusive figures and converts the
//! result into a target currency.

use super::base_price::{BasePrices, resolve_base_prices};
use super::calculator::{RuleOutcome, evaluate_rules, finish, price_without_rules};
use super::condition::ConditionFacts;
use super::context::PriceRequest;
use super::quantity_breaks::quantity_break_prices;
use crate::core::{EngineConfig, EngineError, EngineResult};
use crate::money::{round_money, scale_by_rate};
use crate::source::{PriceQuery, Sources};
use crate::tax::TaxEngine;
use futures::future::join_all;
use rust_decimal::Decimal;
use shared::models::{PriceRule, PriceType, Product, ProductStore};
use shared::order::{PriceNote, PriceResult};
use shared::util::now_millis;

/// Price engine over a set of data sources
#[derive(Clone)]
pub struct PricingEngine {
    sources: Sources,
    config: EngineConfig,
    tax: TaxEngine,
}

impl PricingEngine {
    pub fn new(sources: Sources, config: EngineConfig) -> Self {
        let tax = TaxEngine::new(sources.clone(), config.clone());
        Self {
            sources,
            config,
            tax,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Tax engine sharing this engine's sources and configuration
    pub fn tax_engine(&self) -> &TaxEngine {
        &self.tax
    }

    /// Compute the price of one product for the request context
    #[tracing::instrument(skip(self, request), fields(product_id = %request.product_id))]
    pub async fn calculate_price(&self, request: &PriceRequest) -> EngineResult<PriceResult> {
        let result = self.compute(request).await;
        match &result {
            Ok(r) => tracing::debug!(
                price = %r.price,
                currency_id = %r.currency_id,
                valid_price_found = r.valid_price_found,
                rules = r.applied_rules.len(),
                "Price calculated"
            ),
            Err(e @ (EngineError::ProductNotFound(_) | EngineError::PriceNotFound { .. })) => {
                tracing::warn!(error = %e, "Price calculation failed")
            }
            Err(e) => tracing::error!(error = %e, "Price calculation failed"),
        }
        result
    }

    async fn compute(&self, request: &PriceRequest) -> EngineResult<PriceResult> {
        let catalog = self.sources.catalog.as_ref();
        let as_of = request.as_of.unwrap_or_else(now_millis);
        let currency_id = request
            .currency_id
            .clone()
            .unwrap_or_else(|| self.config.default_currency.clone());

        let product = catalog
            .product(&request.product_id)
            .await?
            .ok_or_else(|| EngineError::ProductNotFound(request.product_id.clone()))?;
        let virtual_id = if product.is_variant {
            catalog.virtual_product(&product.id, as_of).await?
        } else {
            None
        };

        let store = match request.product_store_id.as_deref() {
            Some(store_id) => {
                let store = catalog.product_store(store_id).await?;
                if store.is_none() {
                    tracing::warn!(product_store_id = %store_id, "Product store not found");
                }
                store
            }
            None => None,
        };
        let store_group_id = request
            .product_store_group_id
            .clone()
            .or_else(|| store.as_ref().and_then(|s| s.store_group_id.clone()))
            .unwrap_or_else(|| self.config.default_store_group.clone());

        let query = PriceQuery {
            product_id: product.id.clone(),
            currency_id: currency_id.clone(),
            store_group_id: store_group_id.clone(),
            purpose_id: request
                .purpose_id
                .clone()
                .unwrap_or_else(|| self.config.default_purpose.clone()),
            as_of,
        };
        let (base, mut notes) = resolve_base_prices(
            self.sources.prices.as_ref(),
            catalog,
            &product,
            virtual_id.as_deref(),
            request.agreement_id.as_deref(),
            &query,
        )
        .await?;

        let quantity = request.quantity.unwrap_or(Decimal::ONE);
        let decimals = self.config.price_decimals;

        let (outcome, base_price, quantity_breaks) = match base.list() {
            None => {
                let outcome = price_without_rules(&base, decimals).ok_or_else(|| {
                    EngineError::PriceNotFound {
                        product_id: product.id.clone(),
                        currency_id: currency_id.clone(),
                    }
                })?;
                tracing::debug!("No list price, rules skipped");
                let base_price = outcome.price;
                (outcome, base_price, Vec::new())
            }
            Some(list) => {
                let rules = self.effective_rules(&product, as_of).await?;
                let facts = ConditionFacts {
                    product_id: product.id.clone(),
                    virtual_product_id: virtual_id.clone(),
                    catalog_id: request.catalog_id.clone(),
                    store_group_id: Some(store_group_id),
                    web_site_id: request.web_site_id.clone(),
                    party_id: request.party_id.clone(),
                    quantity: Some(if request.find_all_quantity_prices {
                        Decimal::ONE
                    } else {
                        quantity
                    }),
                    list_price: Some(list),
                    currency_id: currency_id.clone(),
                    ..Default::default()
                }
                .resolve(
                    &rules,
                    catalog,
                    self.sources.parties.as_ref(),
                    self.config.max_hierarchy_depth,
                    as_of,
                )
                .await?;

                let outcome: RuleOutcome = finish(evaluate_rules(&rules, &facts, &base, list), &base, decimals);
                let breaks = if request.find_all_quantity_prices {
                    quantity_break_prices(&rules, &facts, &base, list, decimals)
                } else {
                    Vec::new()
                };
                (outcome, list, breaks)
            }
        };
        notes.extend(outcome.notes);

        let mut result = PriceResult {
            product_id: product.id.clone(),
            currency_id,
            base_price,
            price: outcome.price,
            is_sale: outcome.is_sale,
            valid_price_found: outcome.valid_price_found,
            list_price: base.list(),
            default_price: base.default_price(),
            competitive_price: base.get(PriceType::CompetitivePrice),
            average_cost: base.get(PriceType::AverageCost),
            promo_price: base.get(PriceType::PromoPrice),
            special_promo_price: base.get(PriceType::SpecialPromoPrice),
            minimum_price: base.minimum(),
            maximum_price: base.maximum(),
            wholesale_price: base.get(PriceType::WholesalePrice),
            price_with_tax: None,
            tax_percentage: None,
            applied_rules: outcome.applied_rules,
            quantity_breaks,
            notes,
        };

        if request.check_including_vat
            && let Some(store) = store.as_ref().filter(|s| s.show_prices_with_vat_tax)
        {
            self.include_vat(&mut result, store, &base, quantity, as_of).await?;
        }

        if let Some(target) = request.target_currency_id.as_deref()
            && target != result.currency_id
        {
            self.convert_result(&mut result, target, as_of).await;
        }

        Ok(result)
    }

    /// Rules for the product that are effective now, in source order
    async fn effective_rules(&self, product: &Product, as_of: i64) -> EngineResult<Vec<PriceRule>> {
        let rules: Vec<PriceRule> = self
            .sources
            .prices
            .price_rules(&product.id, as_of)
            .await?
            .into_iter()
            .filter(|r| r.is_effective_at(as_of))
            .collect();
        tracing::trace!(rules = rules.len(), "Candidate price rules");
        Ok(rules)
    }

    /// Publish the price VAT-inclusive and scale the other price fields by
    /// the applied rate. A failing tax source leaves the price without VAT.
    async fn include_vat(
        &self,
        result: &mut PriceResult,
        store: &ProductStore,
        base: &BasePrices,
        quantity: Decimal,
        as_of: i64,
    ) -> EngineResult<()> {
        let tax_in_price = base.tax_point().is_some_and(|p| p.tax_in_price);
        let vat = match self
            .tax
            .display_for_store(store, &result.product_id, result.price, quantity, tax_in_price, as_of)
            .await
        {
            Ok(vat) => vat,
            Err(EngineError::Source(e)) => {
                tracing::warn!(product_store_id = %store.id, error = %e, "VAT lookup failed, price published without VAT");
                result.notes.push(PriceNote::VatUnavailable {
                    product_store_id: store.id.clone(),
                });
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        result.price = vat.price_with_tax;
        result.price_with_tax = Some(vat.price_with_tax);
        result.tax_percentage = Some(vat.tax_percentage);

        // Tax-inclusive records already carry VAT in every field
        if !tax_in_price {
            let fin = self.config.tax_final_decimals;
            for field in [
                &mut result.list_price,
                &mut result.default_price,
                &mut result.average_cost,
                &mut result.promo_price,
                &mut result.competitive_price,
            ] {
                if let Some(value) = field.as_mut() {
                    *value = scale_by_rate(*value, vat.tax_percentage, fin);
                }
            }
        }

        tracing::debug!(
            product_store_id = %store.id,
            tax_percentage = %vat.tax_percentage,
            price_with_tax = %vat.price_with_tax,
            "VAT included in price"
        );
        result.notes.push(PriceNote::VatIncluded {
            tax_percentage: vat.tax_percentage,
        });
        Ok(())
    }

    /// Convert every non-zero price field. A failed field keeps its value
    /// and is noted. When no field converts the result stays in its own
    /// currency.
    async fn convert_result(&self, result: &mut PriceResult, target: &str, as_of: i64) {
        let from_currency = result.currency_id.clone();
        let from = from_currency.as_str();
        let fields: Vec<(&'static str, Decimal)> = result
            .price_fields()
            .into_iter()
            .filter_map(|(name, value)| value.filter(|v| !v.is_zero()).map(|v| (name, v)))
            .collect();
        let breaks: Vec<Decimal> = result.quantity_breaks.iter().map(|b| b.price).collect();

        let (converted, converted_breaks) = match &self.sources.converter {
            Some(converter) => {
                let convert = |amount: Decimal| converter.convert(from, target, amount, as_of);
                (
                    join_all(fields.iter().map(|(_, amount)| convert(*amount))).await,
                    join_all(breaks.iter().map(|amount| convert(*amount))).await,
                )
            }
            None => (vec![None; fields.len()], vec![None; breaks.len()]),
        };

        let decimals = self.config.price_decimals;
        let attempted = fields.len() + breaks.len();
        let mut failed = Vec::new();
        for ((name, original), value) in fields.into_iter().zip(converted) {
            match value {
                Some(value) => {
                    if let Some(field) = result.price_field_mut(name) {
                        *field = round_money(value, decimals);
                    }
                }
                None => {
                    tracing::warn!(field = name, value = %original, from = %from, to = %target, "Currency conversion failed, keeping original value");
                    failed.push(name.to_string());
                }
            }
        }
        for (price_break, value) in result.quantity_breaks.iter_mut().zip(converted_breaks) {
            match value {
                Some(value) => price_break.price = round_money(value, decimals),
                None => {
                    tracing::warn!(rule_id = %price_break.rule_id, from = %from, to = %target, "Currency conversion failed for quantity break");
                    failed.push(format!("quantity_breaks.{}", price_break.rule_id));
                }
            }
        }

        let nothing_converted = attempted > 0 && failed.len() == attempted;
        result.notes.extend(failed.into_iter().map(|field| PriceNote::ConversionFailed {
            field,
            currency_id: target.to_string(),
        }));
        if nothing_converted {
            tracing::warn!(from = %from, to = %target, "No price field converted, keeping source currency");
            return;
        }
        result.currency_id = target.to_string();
    }
}
