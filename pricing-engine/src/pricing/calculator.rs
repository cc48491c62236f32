//! Price Calculator
//!
//! Folds matching rules over a running price. Each rule application is a
//! pure step from one [`RunningPrice`] to the next; a flat override ends the
//! fold for every later rule.

use super::base_price::BasePrices;
use super::condition::{ConditionFacts, conditions_hold};
use crate::money::{clamp_price, percent_of, round_money};
use rust_decimal::Decimal;
use shared::models::{ActionType, PriceAction, PriceRule, PriceType};
use shared::order::{AppliedPriceRule, FlatOverrideSource, PriceNote};
use std::ops::ControlFlow;

/// Accumulator threaded through the rule fold
#[derive(Debug, Clone, PartialEq)]
pub struct RunningPrice {
    pub price: Decimal,
    pub is_sale: bool,
    pub action_fired: bool,
    pub applied: Vec<AppliedPriceRule>,
    pub notes: Vec<PriceNote>,
}

impl RunningPrice {
    pub fn start(price: Decimal) -> Self {
        Self {
            price,
            is_sale: false,
            action_fired: false,
            applied: Vec::new(),
            notes: Vec::new(),
        }
    }
}

/// Outcome of applying one rule
#[derive(Debug, Clone, PartialEq)]
pub enum RuleFlow {
    /// Later rules may still apply
    Continue(RunningPrice),
    /// A flat override fired; no later rule may change the price
    Terminate(RunningPrice),
}

/// Final price of a rule evaluation, clamped and rounded
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub price: Decimal,
    pub is_sale: bool,
    pub valid_price_found: bool,
    pub applied_rules: Vec<AppliedPriceRule>,
    pub notes: Vec<PriceNote>,
}

/// Price of a flat override action and the branch that produced it.
///
/// Plain flat: amount, then default, list, zero. Promo/wholesale flat:
/// base + amount, then default, list, zero. A zero result counts as missing.
pub fn flat_override_price(action: &PriceAction, base: &BasePrices) -> (Decimal, FlatOverrideSource) {
    let increment = action.amount.unwrap_or_default();
    let primary = match action.action_type {
        ActionType::FlatOverride => action.amount,
        ActionType::FlatOverrideOfPromo => base.get(PriceType::PromoPrice).map(|p| p + increment),
        ActionType::FlatOverrideOfWholesale => {
            base.get(PriceType::WholesalePrice).map(|w| w + increment)
        }
        _ => None,
    };

    if let Some(price) = primary.filter(|p| !p.is_zero()) {
        return (price, FlatOverrideSource::Amount);
    }
    if let Some(price) = base.default_price() {
        return (price, FlatOverrideSource::DefaultPrice);
    }
    if let Some(price) = base.list() {
        return (price, FlatOverrideSource::ListPrice);
    }
    (Decimal::ZERO, FlatOverrideSource::Zero)
}

/// Change a percent or delta action makes to the running price
fn modify_amount(action: &PriceAction, base: &BasePrices) -> Option<Decimal> {
    let amount = action.amount.unwrap_or_default();
    let list = base.list().unwrap_or_default();
    let modify = match action.action_type {
        ActionType::PercentOfDefault => percent_of(base.default_price().unwrap_or_default(), amount),
        ActionType::PercentOfList => percent_of(list, amount),
        ActionType::PercentOfAverageCost => {
            percent_of(base.average_cost_or_list().unwrap_or_default(), amount)
        }
        ActionType::PercentOfMargin => {
            let margin = list - base.average_cost_or_list().unwrap_or(list);
            percent_of(margin, amount)
        }
        ActionType::PercentOfWholesale => {
            percent_of(base.get(PriceType::WholesalePrice).unwrap_or_default(), amount)
        }
        ActionType::FlatDeltaOfList => amount,
        ActionType::FlatOverride
        | ActionType::FlatOverrideOfPromo
        | ActionType::FlatOverrideOfWholesale
        | ActionType::Unsupported => return None,
    };
    Some(modify)
}

/// Apply the actions of a rule whose conditions all hold
pub fn apply_rule(mut acc: RunningPrice, rule: &PriceRule, trail: &str, base: &BasePrices) -> RuleFlow {
    if rule.is_sale {
        acc.is_sale = true;
    }

    for action in &rule.actions {
        if action.action_type.is_flat_override() {
            let (price, source) = flat_override_price(action, base);
            if source.is_fallback() {
                tracing::info!(
                    rule_id = %rule.id,
                    action = %action.seq_id,
                    source = ?source,
                    price = %price,
                    "Flat override fell back"
                );
                acc.is_sale = false;
                acc.notes.push(PriceNote::FlatOverrideFallback {
                    rule_id: rule.id.clone(),
                    source,
                });
            }
            let modify = price - acc.price;
            acc.price = price;
            acc.action_fired = true;
            acc.applied
                .push(AppliedPriceRule::from_action(rule, action, trail, modify));
            tracing::debug!(rule_id = %rule.id, price = %price, "Flat override, stopping rule evaluation");
            return RuleFlow::Terminate(acc);
        }

        let Some(modify) = modify_amount(action, base) else {
            tracing::warn!(rule_id = %rule.id, action = %action.seq_id, "Unsupported action type, skipped");
            continue;
        };
        acc.price += modify;
        acc.action_fired = true;
        acc.applied
            .push(AppliedPriceRule::from_action(rule, action, trail, modify));
        tracing::trace!(rule_id = %rule.id, action = %action.seq_id, modify = %modify, "Action applied");
    }

    RuleFlow::Continue(acc)
}

/// Fold the rules in order, starting from `start_price`
pub fn evaluate_rules<'r>(
    rules: impl IntoIterator<Item = &'r PriceRule>,
    facts: &ConditionFacts,
    base: &BasePrices,
    start_price: Decimal,
) -> RunningPrice {
    let flow = rules
        .into_iter()
        .try_fold(RunningPrice::start(start_price), |acc, rule| {
            let Some(trail) = conditions_hold(rule, facts) else {
                return ControlFlow::Continue(acc);
            };
            match apply_rule(acc, rule, &trail, base) {
                RuleFlow::Continue(acc) => ControlFlow::Continue(acc),
                RuleFlow::Terminate(acc) => ControlFlow::Break(acc),
            }
        });

    match flow {
        ControlFlow::Continue(acc) | ControlFlow::Break(acc) => acc,
    }
}

/// Settle a fold: default price when no action fired, then clamp and round
pub fn finish(acc: RunningPrice, base: &BasePrices, decimals: u32) -> RuleOutcome {
    let price = if acc.action_fired {
        acc.price
    } else {
        base.default_price().or(base.list()).unwrap_or(acc.price)
    };
    let (clamped, minimum_applied) = clamp_price(price, base.minimum(), base.maximum());

    RuleOutcome {
        price: round_money(clamped, decimals),
        is_sale: acc.is_sale,
        valid_price_found: acc.action_fired || minimum_applied,
        applied_rules: acc.applied,
        notes: acc.notes,
    }
}

/// Price without rules (no list price): the default price, clamped.
///
/// `None` when there is no default price either.
pub fn price_without_rules(base: &BasePrices, decimals: u32) -> Option<RuleOutcome> {
    let default = base.default_price()?;
    let (clamped, minimum_applied) = clamp_price(default, base.minimum(), base.maximum());
    Some(RuleOutcome {
        price: round_money(clamped, decimals),
        is_sale: false,
        valid_price_found: minimum_applied,
        applied_rules: Vec::new(),
        notes: Vec::new(),
    })
}
