//! Tax rate row selection

use super::context::TaxLine;
use shared::models::{TaxAuthority, TaxRateRule};
use std::collections::BTreeSet;

/// What a row is matched against
#[derive(Debug, Clone)]
pub struct LineScope<'a> {
    pub product_store_id: Option<&'a str>,
    /// Categories of the product and its virtual parent
    pub category_ids: &'a BTreeSet<String>,
    pub line: &'a TaxLine,
    pub as_of: i64,
}

fn category_matches(row: &TaxRateRule, scope: &LineScope<'_>) -> bool {
    match &row.product_category_id {
        None => true,
        Some(category) => {
            scope.category_ids.contains(category)
                || (row.tax_shipping && scope.line.has_shipping())
                || (row.tax_promotions && scope.line.has_promotions())
        }
    }
}

fn row_matches(
    row: &TaxRateRule,
    authorities: &BTreeSet<TaxAuthority>,
    scope: &LineScope<'_>,
) -> bool {
    row.is_effective_at(scope.as_of)
        && row
            .product_store_id
            .as_deref()
            .is_none_or(|store| scope.product_store_id == Some(store))
        && (row.authority.is_wildcard() || authorities.contains(&row.authority))
        && category_matches(row, scope)
        && row
            .min_item_price
            .is_none_or(|min| min <= scope.line.unit_price)
        && row
            .min_purchase
            .is_none_or(|min| min <= scope.line.line_amount)
}

/// Every applicable row, ordered by minimum item price, then minimum
/// purchase, then effective-from. All of them apply to the line.
pub fn select_rate_rules<'r>(
    rows: &'r [TaxRateRule],
    authorities: &BTreeSet<TaxAuthority>,
    scope: &LineScope<'_>,
) -> Vec<&'r TaxRateRule> {
    let mut selected: Vec<&TaxRateRule> = rows
        .iter()
        .filter(|row| row_matches(row, authorities, scope))
        .collect();

    selected.sort_by_key(|row| {
        (
            row.min_item_price.unwrap_or_default(),
            row.min_purchase.unwrap_or_default(),
            row.from_date.unwrap_or(i64::MIN),
        )
    });
    selected
}
