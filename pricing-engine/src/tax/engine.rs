//! Tax Rate Engine
//!
//! Selects the rate rows for a line, computes one adjustment set per row,
//! attaches ledger overrides and applies party exemptions.
//!
//! ## Failure policy
//!
//! [`TaxEngine::calculate_tax`] and [`TaxEngine::calculate_order_tax`] fail
//! open: a data source failure is logged and an empty result is returned.
//! The `try_` variants surface the error instead.

use super::authority;
use super::calculator::{RowTax, TaxScales, compute_row_tax, exempt};
use super::context::{OrderTax, OrderTaxRequest, TaxContext, TaxDisplay, TaxLine};
use super::exemption::{ExemptionStatus, resolve_exemption};
use super::rate_selector::{LineScope, select_rate_rules};
use crate::core::{EngineConfig, EngineError, EngineResult};
use crate::money::{proration_weight, round_money};
use crate::party::PartyHierarchy;
use crate::source::{SourceError, Sources, TaxRateQuery};
use rust_decimal::Decimal;
use shared::models::{PostalAddress, ProductStore, TaxAuthority};
use shared::order::MonetaryAdjustment;
use shared::util::now_millis;
use std::collections::{BTreeMap, BTreeSet};

/// Adjustments of one line and the summed percentage of the rows behind them
#[derive(Debug, Default)]
struct LineTax {
    adjustments: Vec<MonetaryAdjustment>,
    tax_percentage: Decimal,
}

/// Tax engine over a set of data sources
#[derive(Clone)]
pub struct TaxEngine {
    sources: Sources,
    config: EngineConfig,
}

impl TaxEngine {
    pub fn new(sources: Sources, config: EngineConfig) -> Self {
        Self { sources, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn scales(&self) -> TaxScales {
        TaxScales {
            calc: self.config.tax_calc_decimals,
            fin: self.config.tax_final_decimals,
        }
    }

    /// Authorities for a shipping address, following geo containment
    pub async fn resolve_authorities(&self, address: &PostalAddress) -> EngineResult<Vec<TaxAuthority>> {
        Ok(authority::resolve_authorities(
            self.sources.tax.as_ref(),
            address,
            self.config.max_hierarchy_depth,
        )
        .await?)
    }

    /// Tax adjustments for one line; empty on failure
    pub async fn calculate_tax(
        &self,
        line: &TaxLine,
        authorities: &[TaxAuthority],
        ctx: &TaxContext,
    ) -> Vec<MonetaryAdjustment> {
        match self.try_calculate_tax(line, authorities, ctx).await {
            Ok(adjustments) => adjustments,
            Err(e) => {
                tracing::error!(
                    product_id = ?line.product_id,
                    error = %e,
                    "Tax calculation failed, returning no adjustments"
                );
                Vec::new()
            }
        }
    }

    pub async fn try_calculate_tax(
        &self,
        line: &TaxLine,
        authorities: &[TaxAuthority],
        ctx: &TaxContext,
    ) -> EngineResult<Vec<MonetaryAdjustment>> {
        if authorities.is_empty() {
            tracing::debug!(product_id = ?line.product_id, "No tax authorities, no tax");
            return Ok(Vec::new());
        }
        let as_of = ctx.as_of.unwrap_or_else(now_millis);
        let authorities: BTreeSet<TaxAuthority> = authorities.iter().cloned().collect();
        let bill_to = self.billing_parties(ctx, as_of).await?;

        let tax = self
            .line_tax(line, &authorities, ctx, bill_to.as_ref(), Decimal::ONE, as_of)
            .await?;
        Ok(tax.adjustments)
    }

    /// Tax for every line of an order plus order-level shipping and
    /// promotions; empty on failure
    pub async fn calculate_order_tax(
        &self,
        order: &OrderTaxRequest,
        authorities: &[TaxAuthority],
        ctx: &TaxContext,
    ) -> OrderTax {
        match self.try_calculate_order_tax(order, authorities, ctx).await {
            Ok(tax) => tax,
            Err(e) => {
                tracing::error!(lines = order.lines.len(), error = %e, "Order tax calculation failed");
                OrderTax {
                    line_adjustments: vec![Vec::new(); order.lines.len()],
                    order_adjustments: Vec::new(),
                }
            }
        }
    }

    /// Order-level shipping and promotions are apportioned over the products
    /// by their share of the subtotal, so category-scoped rows still apply.
    pub async fn try_calculate_order_tax(
        &self,
        order: &OrderTaxRequest,
        authorities: &[TaxAuthority],
        ctx: &TaxContext,
    ) -> EngineResult<OrderTax> {
        if authorities.is_empty() {
            tracing::debug!(lines = order.lines.len(), "No tax authorities, no tax");
            return Ok(OrderTax {
                line_adjustments: vec![Vec::new(); order.lines.len()],
                order_adjustments: Vec::new(),
            });
        }
        let as_of = ctx.as_of.unwrap_or_else(now_millis);
        let authorities: BTreeSet<TaxAuthority> = authorities.iter().cloned().collect();
        let bill_to = self.billing_parties(ctx, as_of).await?;

        let mut result = OrderTax::default();
        for line in &order.lines {
            let tax = self
                .line_tax(line, &authorities, ctx, bill_to.as_ref(), Decimal::ONE, as_of)
                .await?;
            result.line_adjustments.push(tax.adjustments);
        }

        let order_line = TaxLine {
            quantity: Decimal::ONE,
            shipping_amount: order.shipping_amount,
            promotions_amount: order.promotions_amount,
            ..Default::default()
        };
        if !order_line.has_shipping() && !order_line.has_promotions() {
            return Ok(result);
        }

        let mut shares: BTreeMap<&str, Decimal> = BTreeMap::new();
        for line in &order.lines {
            if let Some(product_id) = line.product_id.as_deref() {
                *shares.entry(product_id).or_default() += line.line_amount;
            }
        }
        let subtotal: Decimal = shares.values().copied().sum();

        if subtotal.is_zero() {
            let tax = self
                .line_tax(&order_line, &authorities, ctx, bill_to.as_ref(), Decimal::ONE, as_of)
                .await?;
            result.order_adjustments = tax.adjustments;
            return Ok(result);
        }

        for (product_id, amount) in shares {
            let Some(weight) = proration_weight(amount, subtotal).filter(|w| !w.is_zero()) else {
                continue;
            };
            let share_line = TaxLine {
                product_id: Some(product_id.to_string()),
                ..order_line.clone()
            };
            tracing::trace!(product_id = %product_id, weight = %weight, "Apportioning order amounts");
            let tax = self
                .line_tax(&share_line, &authorities, ctx, bill_to.as_ref(), weight, as_of)
                .await?;
            result.order_adjustments.extend(tax.adjustments);
        }

        Ok(result)
    }

    /// VAT figures for displaying `base_price` tax-inclusive in a store
    pub async fn calculate_tax_for_display(
        &self,
        product_store_id: &str,
        product_id: &str,
        base_price: Decimal,
        quantity: Decimal,
        tax_in_price: bool,
        as_of: Option<i64>,
    ) -> EngineResult<TaxDisplay> {
        let store = self
            .sources
            .catalog
            .product_store(product_store_id)
            .await?
            .ok_or_else(|| SourceError::NotFound(format!("product store {product_store_id}")))?;
        let as_of = as_of.unwrap_or_else(now_millis);
        self.display_for_store(&store, product_id, base_price, quantity, tax_in_price, as_of)
            .await
    }

    pub(crate) async fn display_for_store(
        &self,
        store: &ProductStore,
        product_id: &str,
        base_price: Decimal,
        quantity: Decimal,
        tax_in_price: bool,
        as_of: i64,
    ) -> EngineResult<TaxDisplay> {
        let authority = store
            .vat_tax_authority
            .clone()
            .ok_or_else(|| EngineError::MissingVatAuthority(store.id.clone()))?;

        let mut line = TaxLine::product(product_id, base_price, quantity);
        line.tax_in_price = tax_in_price;
        let ctx = TaxContext {
            product_store_id: Some(store.id.clone()),
            pay_to_party_id: store.pay_to_party_id.clone(),
            bill_to_party_id: None,
            as_of: Some(as_of),
        };

        let tax = self
            .line_tax(&line, &BTreeSet::from([authority]), &ctx, None, Decimal::ONE, as_of)
            .await?;

        let fin = self.config.tax_final_decimals;
        let tax_total = round_money(tax.adjustments.iter().map(|a| a.amount).sum::<Decimal>(), fin);
        let per_unit = if quantity.is_zero() {
            tax_total
        } else {
            tax_total / quantity
        };

        Ok(TaxDisplay {
            tax_total,
            tax_percentage: tax.tax_percentage,
            price_with_tax: round_money(base_price + per_unit, fin),
        })
    }

    async fn billing_parties(&self, ctx: &TaxContext, as_of: i64) -> EngineResult<Option<BTreeSet<String>>> {
        let Some(bill_to) = ctx.bill_to_party_id.as_deref() else {
            return Ok(None);
        };
        let hierarchy = PartyHierarchy::new(self.sources.parties.as_ref(), self.config.max_hierarchy_depth);
        Ok(Some(hierarchy.rollup_parties(bill_to, as_of).await?))
    }

    async fn line_tax(
        &self,
        line: &TaxLine,
        authorities: &BTreeSet<TaxAuthority>,
        ctx: &TaxContext,
        bill_to: Option<&BTreeSet<String>>,
        weight: Decimal,
        as_of: i64,
    ) -> EngineResult<LineTax> {
        let catalog = self.sources.catalog.as_ref();
        let tax_source = self.sources.tax.as_ref();

        let (product_taxable, category_ids) = match line.product_id.as_deref() {
            Some(product_id) => {
                let product = catalog
                    .product(product_id)
                    .await?
                    .ok_or_else(|| EngineError::ProductNotFound(product_id.to_string()))?;
                let mut categories = catalog.category_ids(product_id, as_of).await?;
                if product.is_variant
                    && let Some(virtual_id) = catalog.virtual_product(product_id, as_of).await?
                {
                    categories.extend(catalog.category_ids(&virtual_id, as_of).await?);
                }
                (product.taxable, categories)
            }
            None => (false, BTreeSet::new()),
        };

        let query = TaxRateQuery {
            authorities: authorities.clone(),
            product_store_id: ctx.product_store_id.clone(),
            category_ids: category_ids.clone(),
            as_of,
        };
        let rows = tax_source.tax_rate_rules(&query).await?;
        let scope = LineScope {
            product_store_id: ctx.product_store_id.as_deref(),
            category_ids: &category_ids,
            line,
            as_of,
        };

        let mut out = LineTax::default();
        for row in select_rate_rules(&rows, authorities, &scope) {
            let Some(RowTax {
                primary,
                corrections,
                raw_tax,
            }) = compute_row_tax(row, line, weight, product_taxable, self.scales())
            else {
                continue;
            };

            let gl_account = match ctx.pay_to_party_id.as_deref() {
                Some(org) => tax_source.gl_account_override(&row.authority, org).await?,
                None => None,
            };
            let status = match bill_to {
                Some(parties) => {
                    resolve_exemption(
                        tax_source,
                        parties,
                        &row.authority,
                        as_of,
                        self.config.max_hierarchy_depth,
                    )
                    .await?
                }
                None => ExemptionStatus::default(),
            };

            let mut primary = if status.is_exempt {
                tracing::debug!(
                    rule_id = %row.id,
                    authority = %row.authority,
                    exempt_amount = %raw_tax,
                    "Party exempt from tax"
                );
                exempt(primary, raw_tax)
            } else {
                primary
            };
            primary.customer_tax_id = status.customer_tax_id;

            out.tax_percentage += row.tax_percentage;
            out.adjustments
                .extend(std::iter::once(primary).chain(corrections).map(|mut adj| {
                    adj.override_gl_account_id = gl_account.clone();
                    adj
                }));
        }

        tracing::debug!(
            product_id = ?line.product_id,
            rows = rows.len(),
            adjustments = out.adjustments.len(),
            "Line tax calculated"
        );
        Ok(out)
    }
}
