//! Condition Evaluator
//!
//! Facts about the calculation context are resolved once per calculation,
//! limited to what the candidate rules reference. Evaluation itself is a
//! pure function of a condition and those facts.

use crate::party::PartyHierarchy;
use crate::source::{CatalogSource, PartySource, SourceResult};
use rust_decimal::Decimal;
use shared::models::{CondOperator, InputParam, PriceCondition, PriceRule};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Context-derived left-hand values for condition evaluation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionFacts {
    pub product_id: String,
    pub virtual_product_id: Option<String>,
    /// Categories of the product and of its virtual parent
    pub category_ids: BTreeSet<String>,
    pub feature_ids: BTreeSet<String>,
    pub catalog_id: Option<String>,
    pub store_group_id: Option<String>,
    pub web_site_id: Option<String>,
    pub party_id: Option<String>,
    /// Referenced groups the party belongs to, directly or transitively
    pub party_groups: BTreeSet<String>,
    /// Classification groups of the party, ancestors included
    pub party_classifications: BTreeSet<String>,
    pub role_types: BTreeSet<String>,
    /// `None` makes every quantity condition pass
    pub quantity: Option<Decimal>,
    pub list_price: Option<Decimal>,
    pub currency_id: String,
}

impl ConditionFacts {
    /// Same facts with the quantity removed
    pub fn without_quantity(&self) -> Self {
        Self {
            quantity: None,
            ..self.clone()
        }
    }

    /// Fill the lookup-backed facts the rules reference
    pub async fn resolve(
        mut self,
        rules: &[PriceRule],
        catalog: &dyn CatalogSource,
        parties: &dyn PartySource,
        max_depth: usize,
        as_of: i64,
    ) -> SourceResult<Self> {
        let referenced: BTreeSet<InputParam> = rules
            .iter()
            .flat_map(|r| r.conditions.iter().map(|c| c.input_param))
            .collect();

        let product_ids: Vec<String> = std::iter::once(self.product_id.clone())
            .chain(self.virtual_product_id.clone())
            .collect();

        if referenced.contains(&InputParam::Category) {
            for id in &product_ids {
                self.category_ids.extend(catalog.category_ids(id, as_of).await?);
            }
        }
        if referenced.contains(&InputParam::Feature) {
            for id in &product_ids {
                self.feature_ids.extend(catalog.feature_ids(id, as_of).await?);
            }
        }

        let Some(party_id) = self.party_id.clone() else {
            return Ok(self);
        };
        let hierarchy = PartyHierarchy::new(parties, max_depth);

        if referenced.contains(&InputParam::PartyGroupMember) {
            let groups: BTreeSet<&str> = rules
                .iter()
                .flat_map(|r| r.conditions.iter())
                .filter(|c| c.input_param == InputParam::PartyGroupMember)
                .map(|c| c.cond_value.as_str())
                .collect();
            for group in groups {
                if hierarchy.is_group_member(group, &party_id, as_of).await? {
                    self.party_groups.insert(group.to_string());
                }
            }
        }
        if referenced.contains(&InputParam::PartyClassification) {
            self.party_classifications = hierarchy.classification_groups(&party_id, as_of).await?;
        }
        if referenced.contains(&InputParam::RoleType) {
            self.role_types = parties.role_types(&party_id).await?;
        }

        Ok(self)
    }
}

fn ordering_value(ordering: Ordering) -> i32 {
    match ordering {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

/// Absent context values compare as "greater"
fn compare_text(actual: Option<&str>, expected: &str) -> i32 {
    actual.map_or(1, |a| ordering_value(a.cmp(expected)))
}

fn membership(set: &BTreeSet<String>, expected: &str) -> i32 {
    if set.contains(expected) { 0 } else { 1 }
}

/// Evaluate one condition. Never panics; malformed conditions fail closed.
pub fn evaluate_condition(cond: &PriceCondition, facts: &ConditionFacts) -> bool {
    if cond.operator == CondOperator::Unsupported {
        tracing::warn!(seq_id = %cond.seq_id, "Unsupported condition operator, condition fails");
        return false;
    }

    let expected = cond.cond_value.as_str();
    let compare = match cond.input_param {
        InputParam::ProductId => {
            let matches = facts.product_id == expected
                || facts.virtual_product_id.as_deref() == Some(expected);
            if matches { 0 } else { 1 }
        }
        InputParam::Category => membership(&facts.category_ids, expected),
        InputParam::Feature => membership(&facts.feature_ids, expected),
        InputParam::Catalog => compare_text(facts.catalog_id.as_deref(), expected),
        InputParam::StoreGroup => compare_text(facts.store_group_id.as_deref(), expected),
        InputParam::WebSite => compare_text(facts.web_site_id.as_deref(), expected),
        InputParam::PartyId => compare_text(facts.party_id.as_deref(), expected),
        InputParam::PartyGroupMember => membership(&facts.party_groups, expected),
        InputParam::PartyClassification => membership(&facts.party_classifications, expected),
        InputParam::RoleType => membership(&facts.role_types, expected),
        InputParam::Currency => compare_text(Some(facts.currency_id.as_str()), expected),
        InputParam::Quantity => {
            // No quantity in context: the condition does not constrain
            let Some(quantity) = facts.quantity else {
                return true;
            };
            let Some(value) = cond.numeric_value() else {
                tracing::warn!(seq_id = %cond.seq_id, value = %expected, "Non-numeric quantity condition, condition fails");
                return false;
            };
            ordering_value(quantity.cmp(&value))
        }
        InputParam::ListPrice => {
            let Some(value) = cond.numeric_value() else {
                tracing::warn!(seq_id = %cond.seq_id, value = %expected, "Non-numeric list price condition, condition fails");
                return false;
            };
            facts
                .list_price
                .map_or(1, |list| ordering_value(list.cmp(&value)))
        }
        InputParam::Unsupported => {
            tracing::warn!(seq_id = %cond.seq_id, "Unsupported condition input, condition fails");
            return false;
        }
    };

    cond.operator.accepts(compare).unwrap_or(false)
}

/// AND all conditions of a rule, stopping at the first failure.
///
/// Returns the condition trail when every condition holds.
pub fn conditions_hold(rule: &PriceRule, facts: &ConditionFacts) -> Option<String> {
    let mut trail = Vec::with_capacity(rule.conditions.len());
    for cond in &rule.conditions {
        if !evaluate_condition(cond, facts) {
            tracing::trace!(rule_id = %rule.id, condition = %cond, "Condition failed");
            return None;
        }
        trail.push(cond.to_string());
    }
    Some(trail.join(" "))
}
