//! Party Model
//!
//! Only the relationships the engines walk: group rollups, classifications
//! and roles.

use crate::util::within_window;
use serde::{Deserialize, Serialize};

/// GROUP_ROLLUP relationship: `member_id` rolls up into `group_id`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartyRelationship {
    pub group_id: String,
    pub member_id: String,
    #[serde(default)]
    pub from_date: Option<i64>,
    #[serde(default)]
    pub thru_date: Option<i64>,
}

impl PartyRelationship {
    pub fn is_effective_at(&self, as_of: i64) -> bool {
        within_window(self.from_date, self.thru_date, as_of)
    }
}

/// Party placed into a classification group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartyClassification {
    pub party_id: String,
    pub classification_group_id: String,
    #[serde(default)]
    pub from_date: Option<i64>,
    #[serde(default)]
    pub thru_date: Option<i64>,
}

impl PartyClassification {
    pub fn is_effective_at(&self, as_of: i64) -> bool {
        within_window(self.from_date, self.thru_date, as_of)
    }
}

/// Classification group with an optional parent group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationGroup {
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// Role a party plays
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartyRole {
    pub party_id: String,
    pub role_type_id: String,
}
