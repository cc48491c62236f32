//! Per-row tax computation
//!
//! Pure functions from (rate row, line, weight) to adjustments. Exemption
//! and ledger overrides are applied afterwards by the engine.

use super::context::TaxLine;
use crate::money::{embedded_tax_per_unit, round_money};
use rust_decimal::Decimal;
use shared::models::TaxRateRule;
use shared::order::{AdjustmentKind, MonetaryAdjustment};

/// Adjustments produced by one rate row
#[derive(Debug, Clone, PartialEq)]
pub struct RowTax {
    /// SALES_TAX, or VAT_TAX for a tax-inclusive line
    pub primary: MonetaryAdjustment,
    /// Discount and price-with-tax corrections
    pub corrections: Vec<MonetaryAdjustment>,
    /// Tax before exemption: charged amount, or the embedded amount for a
    /// tax-inclusive line
    pub raw_tax: Decimal,
}

/// Decimal places used by the computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxScales {
    /// Per-row raw tax
    pub calc: u32,
    /// Embedded per-unit tax and presented totals
    pub fin: u32,
}

/// Amount the row taxes on this line
pub fn taxable_amount(row: &TaxRateRule, line: &TaxLine, product_taxable: bool) -> Decimal {
    let mut taxable = Decimal::ZERO;
    if product_taxable {
        taxable += line.line_amount;
    }
    if row.tax_shipping {
        taxable += line.shipping_amount.unwrap_or_default();
    }
    if row.tax_promotions {
        taxable += line.promotions_amount.unwrap_or_default();
    }
    taxable
}

fn adjustment(row: &TaxRateRule, kind: AdjustmentKind, amount: Decimal) -> MonetaryAdjustment {
    MonetaryAdjustment::new(kind, amount, row.tax_percentage, row.authority.clone(), &row.id)
        .with_description(row.description.clone())
}

/// Tax of one row on one line. `None` when nothing is taxable.
///
/// The effective rate is the row percentage times `weight`; the adjustment
/// still reports the row percentage as its source.
pub fn compute_row_tax(
    row: &TaxRateRule,
    line: &TaxLine,
    weight: Decimal,
    product_taxable: bool,
    scales: TaxScales,
) -> Option<RowTax> {
    let taxable = taxable_amount(row, line, product_taxable);
    if taxable.is_zero() {
        return None;
    }
    let rate = row.tax_percentage * weight;

    // Only the product amount carries embedded VAT; shipping and promotions
    // the row taxes are charged on top
    if line.tax_in_price && product_taxable {
        let included = embedded_tax_per_unit(line.unit_price, rate, scales.fin) * line.quantity;
        let extra = taxable - line.line_amount;
        let extra_tax = round_money(extra * rate / Decimal::ONE_HUNDRED, scales.calc);
        let primary = adjustment(row, AdjustmentKind::VatTax, extra_tax).with_included(included);

        let mut corrections = Vec::new();
        if let Some(discount) = line.discount_amount.filter(|d| !d.is_zero())
            && !line.quantity.is_zero()
        {
            let net_unit = line.unit_price - discount / line.quantity;
            let net_included = embedded_tax_per_unit(net_unit, rate, scales.fin) * line.quantity;
            if net_included < included {
                corrections.push(
                    adjustment(row, AdjustmentKind::VatTax, Decimal::ZERO)
                        .with_included(net_included - included),
                );
            }
        }

        return Some(RowTax {
            primary,
            corrections,
            raw_tax: included + extra_tax,
        });
    }

    let raw_tax = round_money(taxable * rate / Decimal::ONE_HUNDRED, scales.calc);
    let primary = adjustment(row, AdjustmentKind::SalesTax, raw_tax);

    let mut corrections = Vec::new();
    if let Some(price_with_tax) = line.price_with_tax {
        let subtotal = line.unit_price * line.quantity;
        let subtotal_tax = round_money(subtotal * rate / Decimal::ONE_HUNDRED, scales.calc);
        let drift = price_with_tax * line.quantity - (subtotal + subtotal_tax);
        if !drift.is_zero() {
            corrections.push(adjustment(row, AdjustmentKind::VatPriceCorrect, drift));
        }
    }

    Some(RowTax {
        primary,
        corrections,
        raw_tax,
    })
}

/// Zero the charged amount and keep what would have been charged
pub fn exempt(mut adjustment: MonetaryAdjustment, raw_tax: Decimal) -> MonetaryAdjustment {
    adjustment.amount = Decimal::ZERO;
    adjustment.exempt_amount = Some(raw_tax);
    adjustment
}
