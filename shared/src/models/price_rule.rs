//! Price Rule Model
//!
//! A price rule is a date-scoped bundle of AND-combined conditions and
//! ordered actions. Condition and action kinds are closed enums; tags that
//! are not recognised deserialize to `Unsupported` so that a snapshot can be
//! loaded, validated, and rejected with a precise message.

use crate::util::within_window;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Left-hand side of a price condition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InputParam {
    #[serde(rename = "PRIP_PRODUCT_ID")]
    ProductId,
    #[serde(rename = "PRIP_PROD_CAT_ID")]
    Category,
    #[serde(rename = "PRIP_PROD_FEAT_ID")]
    Feature,
    #[serde(rename = "PRIP_PROD_CLG_ID")]
    Catalog,
    #[serde(rename = "PRIP_PROD_SGRP_ID")]
    StoreGroup,
    #[serde(rename = "PRIP_WEBSITE_ID")]
    WebSite,
    #[serde(rename = "PRIP_QUANTITY")]
    Quantity,
    #[serde(rename = "PRIP_PARTY_ID")]
    PartyId,
    #[serde(rename = "PRIP_PARTY_GRP_MEM")]
    PartyGroupMember,
    #[serde(rename = "PRIP_PARTY_CLASS")]
    PartyClassification,
    #[serde(rename = "PRIP_ROLE_TYPE")]
    RoleType,
    #[serde(rename = "PRIP_LIST_PRICE")]
    ListPrice,
    #[serde(rename = "PRIP_CURRENCY_UOMID")]
    Currency,
    #[serde(other, rename = "UNSUPPORTED")]
    Unsupported,
}

impl InputParam {
    /// Short label used in condition trails
    pub fn label(&self) -> &'static str {
        match self {
            Self::ProductId => "product_id",
            Self::Category => "category",
            Self::Feature => "feature",
            Self::Catalog => "catalog",
            Self::StoreGroup => "store_group",
            Self::WebSite => "web_site",
            Self::Quantity => "quantity",
            Self::PartyId => "party_id",
            Self::PartyGroupMember => "party_group",
            Self::PartyClassification => "party_class",
            Self::RoleType => "role_type",
            Self::ListPrice => "list_price",
            Self::Currency => "currency",
            Self::Unsupported => "unsupported",
        }
    }

    /// Whether the comparison value must parse as a decimal
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Quantity | Self::ListPrice)
    }
}

/// Comparison operator of a price condition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CondOperator {
    #[serde(rename = "PRC_EQ")]
    Eq,
    #[serde(rename = "PRC_NEQ")]
    Neq,
    #[serde(rename = "PRC_LT")]
    Lt,
    #[serde(rename = "PRC_LTE")]
    Lte,
    #[serde(rename = "PRC_GT")]
    Gt,
    #[serde(rename = "PRC_GTE")]
    Gte,
    #[serde(other, rename = "UNSUPPORTED")]
    Unsupported,
}

impl CondOperator {
    /// Apply the operator to a 3-way comparison outcome (-1/0/+1).
    ///
    /// Returns `None` for `Unsupported`.
    pub fn accepts(&self, compare: i32) -> Option<bool> {
        match self {
            Self::Eq => Some(compare == 0),
            Self::Neq => Some(compare != 0),
            Self::Lt => Some(compare < 0),
            Self::Lte => Some(compare <= 0),
            Self::Gt => Some(compare > 0),
            Self::Gte => Some(compare >= 0),
            Self::Unsupported => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Neq => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Unsupported => "?",
        }
    }
}

/// Action kinds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ActionType {
    /// Percent of default price
    #[serde(rename = "PRICE_POD")]
    PercentOfDefault,
    /// Percent of list price
    #[serde(rename = "PRICE_POL")]
    PercentOfList,
    /// Percent of average cost
    #[serde(rename = "PRICE_POAC")]
    PercentOfAverageCost,
    /// Percent of margin (list - average cost)
    #[serde(rename = "PRICE_POM")]
    PercentOfMargin,
    /// Percent of wholesale price
    #[serde(rename = "PRICE_POWHS")]
    PercentOfWholesale,
    /// Flat amount added to the running price
    #[serde(rename = "PRICE_FOL")]
    FlatDeltaOfList,
    /// Replace the running price
    #[serde(rename = "PRICE_FLAT")]
    FlatOverride,
    /// Replace the running price with promo price + amount
    #[serde(rename = "PRICE_PFLAT")]
    FlatOverrideOfPromo,
    /// Replace the running price with wholesale price + amount
    #[serde(rename = "PRICE_WFLAT")]
    FlatOverrideOfWholesale,
    #[serde(other, rename = "UNSUPPORTED")]
    Unsupported,
}

impl ActionType {
    /// Flat overrides end rule processing for the whole calculation
    pub fn is_flat_override(&self) -> bool {
        matches!(
            self,
            Self::FlatOverride | Self::FlatOverrideOfPromo | Self::FlatOverrideOfWholesale
        )
    }
}

/// A single condition of a rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceCondition {
    pub seq_id: String,
    pub input_param: InputParam,
    pub operator: CondOperator,
    pub cond_value: String,
}

impl PriceCondition {
    /// Comparison value as a decimal, for numeric inputs
    pub fn numeric_value(&self) -> Option<Decimal> {
        Decimal::from_str(self.cond_value.trim()).ok()
    }
}

impl fmt::Display for PriceCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} {} {}]",
            self.input_param.label(),
            self.operator.symbol(),
            self.cond_value
        )
    }
}

/// A single action of a rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceAction {
    pub seq_id: String,
    pub action_type: ActionType,
    /// Percentage for percent actions (-10 = 10% off), currency amount otherwise
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub rate_code: Option<String>,
}

/// Price rule entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceRule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_sale: bool,
    /// Valid from (Unix millis)
    #[serde(default)]
    pub from_date: Option<i64>,
    /// Valid until, exclusive (Unix millis)
    #[serde(default)]
    pub thru_date: Option<i64>,
    #[serde(default)]
    pub conditions: Vec<PriceCondition>,
    #[serde(default)]
    pub actions: Vec<PriceAction>,
}

/// Defect found while validating rule data at load time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleDefect {
    #[error("condition {seq_id} has an unsupported input parameter")]
    UnsupportedInput { seq_id: String },

    #[error("condition {seq_id} has an unsupported operator")]
    UnsupportedOperator { seq_id: String },

    #[error("condition {seq_id} compares a numeric input against '{value}'")]
    NonNumericValue { seq_id: String, value: String },

    #[error("action {seq_id} has an unsupported action type")]
    UnsupportedAction { seq_id: String },
}

impl PriceRule {
    pub fn is_effective_at(&self, as_of: i64) -> bool {
        within_window(self.from_date, self.thru_date, as_of)
    }

    pub fn has_quantity_condition(&self) -> bool {
        self.conditions
            .iter()
            .any(|c| c.input_param == InputParam::Quantity)
    }

    /// Check every condition and action tag; the first defect wins
    pub fn validate(&self) -> Result<(), RuleDefect> {
        for cond in &self.conditions {
            if cond.input_param == InputParam::Unsupported {
                return Err(RuleDefect::UnsupportedInput {
                    seq_id: cond.seq_id.clone(),
                });
            }
            if cond.operator == CondOperator::Unsupported {
                return Err(RuleDefect::UnsupportedOperator {
                    seq_id: cond.seq_id.clone(),
                });
            }
            if cond.input_param.is_numeric() && cond.numeric_value().is_none() {
                return Err(RuleDefect::NonNumericValue {
                    seq_id: cond.seq_id.clone(),
                    value: cond.cond_value.clone(),
                });
            }
        }
        for action in &self.actions {
            if action.action_type == ActionType::Unsupported {
                return Err(RuleDefect::UnsupportedAction {
                    seq_id: action.seq_id.clone(),
                });
            }
        }
        Ok(())
    }
}
