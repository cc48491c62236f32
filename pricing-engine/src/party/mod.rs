//! Party hierarchy walks
//!
//! Group rollups and classification groups form graphs that the data does
//! not guarantee to be acyclic. Every walk keeps a visited set and stops at
//! `max_depth` levels, logging a warning when the bound cuts it short.

use crate::source::{PartySource, SourceResult};
use std::collections::BTreeSet;

/// Bounded walks over party relationships
pub struct PartyHierarchy<'a> {
    source: &'a dyn PartySource,
    max_depth: usize,
}

impl<'a> PartyHierarchy<'a> {
    pub fn new(source: &'a dyn PartySource, max_depth: usize) -> Self {
        Self { source, max_depth }
    }

    /// Whether `party_id` is a direct or transitive GROUP_ROLLUP member of
    /// `group_id`, walking down from the group.
    pub async fn is_group_member(
        &self,
        group_id: &str,
        party_id: &str,
        as_of: i64,
    ) -> SourceResult<bool> {
        if group_id == party_id {
            return Ok(true);
        }

        let mut visited = BTreeSet::from([group_id.to_string()]);
        let mut frontier = vec![group_id.to_string()];

        for _ in 0..self.max_depth {
            let mut next = Vec::new();
            for group in &frontier {
                for member in self.source.group_members(group, as_of).await? {
                    if member == party_id {
                        return Ok(true);
                    }
                    if visited.insert(member.clone()) {
                        next.push(member);
                    }
                }
            }
            if next.is_empty() {
                return Ok(false);
            }
            frontier = next;
        }

        tracing::warn!(
            group_id = %group_id,
            party_id = %party_id,
            max_depth = self.max_depth,
            "Group membership walk hit depth bound"
        );
        Ok(false)
    }

    /// The party plus every group it transitively rolls up into
    pub async fn rollup_parties(&self, party_id: &str, as_of: i64) -> SourceResult<BTreeSet<String>> {
        let mut parties = BTreeSet::from([party_id.to_string()]);
        let mut frontier = vec![party_id.to_string()];

        for _ in 0..self.max_depth {
            let mut next = Vec::new();
            for party in &frontier {
                for group in self.source.parent_groups(party, as_of).await? {
                    if parties.insert(group.clone()) {
                        next.push(group);
                    }
                }
            }
            if next.is_empty() {
                return Ok(parties);
            }
            frontier = next;
        }

        tracing::warn!(
            party_id = %party_id,
            max_depth = self.max_depth,
            "Group rollup walk hit depth bound"
        );
        Ok(parties)
    }

    /// Classification groups of the party, including every ancestor group
    pub async fn classification_groups(
        &self,
        party_id: &str,
        as_of: i64,
    ) -> SourceResult<BTreeSet<String>> {
        let mut groups = BTreeSet::new();

        for direct in self.source.classifications(party_id, as_of).await? {
            let mut current = Some(direct);
            let mut depth = 0;
            while let Some(group) = current {
                if !groups.insert(group.clone()) {
                    break;
                }
                if depth == self.max_depth {
                    tracing::warn!(
                        party_id = %party_id,
                        group_id = %group,
                        max_depth = self.max_depth,
                        "Classification walk hit depth bound"
                    );
                    break;
                }
                depth += 1;
                current = self.source.classification_parent(&group).await?;
            }
        }

        Ok(groups)
    }
}
