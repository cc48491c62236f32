//! Quantity break enumeration

use super::base_price::BasePrices;
use super::calculator::{evaluate_rules, finish};
use super::condition::{ConditionFacts, conditions_hold};
use rust_decimal::Decimal;
use shared::models::{InputParam, PriceRule};
use shared::order::QuantityBreakPrice;

/// Whether the rule is gated on quantity and every other condition already
/// holds for the context.
pub fn is_quantity_gated(rule: &PriceRule, facts_without_quantity: &ConditionFacts) -> bool {
    rule.has_quantity_condition() && conditions_hold(rule, facts_without_quantity).is_some()
}

/// One price per quantity-gated rule, each computed together with every rule
/// that has no quantity condition. Quantity conditions pass during these
/// computations since no quantity is in context.
pub fn quantity_break_prices(
    rules: &[PriceRule],
    facts: &ConditionFacts,
    base: &BasePrices,
    start_price: Decimal,
    decimals: u32,
) -> Vec<QuantityBreakPrice> {
    let facts = facts.without_quantity();

    rules
        .iter()
        .filter(|rule| is_quantity_gated(rule, &facts))
        .map(|gate| {
            let subset = rules
                .iter()
                .filter(|r| r.id == gate.id || !r.has_quantity_condition());
            let outcome = finish(evaluate_rules(subset, &facts, base, start_price), base, decimals);

            let quantity_condition = gate
                .conditions
                .iter()
                .filter(|c| c.input_param == InputParam::Quantity)
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(" ");

            tracing::trace!(rule_id = %gate.id, price = %outcome.price, "Quantity break computed");

            QuantityBreakPrice {
                rule_id: gate.id.clone(),
                quantity_condition,
                price: outcome.price,
                is_sale: outcome.is_sale,
                valid_price_found: outcome.valid_price_found,
                applied_rules: outcome.applied_rules,
            }
        })
        .collect()
}
