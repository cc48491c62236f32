//! Applied Rule - audit record of one price action execution

use crate::models::price_rule::{ActionType, PriceAction, PriceRule};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One executed action of a matching price rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppliedPriceRule {
    // === Rule Identity ===
    pub rule_id: String,
    pub rule_name: String,

    // === Action ===
    pub action_seq_id: String,
    pub action_type: ActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_code: Option<String>,

    // === Calculation Info ===
    /// Conditions that held, e.g. `[quantity >= 10] [party_id == C1]`
    pub condition_trail: String,
    /// Change this action made to the running price
    pub modify_amount: Decimal,
    pub is_sale: bool,
}

impl AppliedPriceRule {
    /// Create from the rule and action that fired
    pub fn from_action(
        rule: &PriceRule,
        action: &PriceAction,
        condition_trail: &str,
        modify_amount: Decimal,
    ) -> Self {
        Self {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            action_seq_id: action.seq_id.clone(),
            action_type: action.action_type,
            rate_code: action.rate_code.clone(),
            condition_trail: condition_trail.to_string(),
            modify_amount,
            is_sale: rule.is_sale,
        }
    }
}
