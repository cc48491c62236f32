//! Party tax exemption lookup

use crate::source::{SourceResult, TaxSource};
use shared::models::{PartyTaxExemption, TaxAuthority};
use std::collections::BTreeSet;

/// Exemption standing of the billing parties toward one authority
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExemptionStatus {
    pub is_exempt: bool,
    /// Customer tax id from the record found at the row's own authority
    pub customer_tax_id: Option<String>,
    /// Authority whose record granted the exemption
    pub granted_by: Option<TaxAuthority>,
}

impl ExemptionStatus {
    fn exempt_at(record: &PartyTaxExemption, customer_tax_id: Option<String>) -> Self {
        Self {
            is_exempt: true,
            customer_tax_id,
            granted_by: Some(record.authority.clone()),
        }
    }
}

/// Look up the parties' exemption for `authority`, then walk exemption
/// inheritance links upward while no exemption is found.
pub async fn resolve_exemption(
    source: &dyn TaxSource,
    parties: &BTreeSet<String>,
    authority: &TaxAuthority,
    as_of: i64,
    max_depth: usize,
) -> SourceResult<ExemptionStatus> {
    let own = source.exemption(parties, authority, as_of).await?;
    let customer_tax_id = own.as_ref().and_then(|r| r.party_tax_id.clone());

    if let Some(record) = own.as_ref().filter(|r| r.is_exempt) {
        return Ok(ExemptionStatus::exempt_at(record, customer_tax_id));
    }

    let mut visited = BTreeSet::from([authority.clone()]);
    let mut current = authority.clone();
    for _ in 0..max_depth {
        let Some(parent) = source.parent_authority(&current, as_of).await? else {
            return Ok(ExemptionStatus {
                customer_tax_id,
                ..Default::default()
            });
        };
        if !visited.insert(parent.clone()) {
            tracing::warn!(authority = %authority, parent = %parent, "Cycle in authority inheritance");
            return Ok(ExemptionStatus {
                customer_tax_id,
                ..Default::default()
            });
        }
        if let Some(record) = source
            .exemption(parties, &parent, as_of)
            .await?
            .filter(|r| r.is_exempt)
        {
            tracing::debug!(authority = %authority, granted_by = %parent, "Exemption inherited");
            return Ok(ExemptionStatus::exempt_at(&record, customer_tax_id));
        }
        current = parent;
    }

    tracing::warn!(authority = %authority, max_depth, "Authority inheritance walk hit depth bound");
    Ok(ExemptionStatus {
        customer_tax_id,
        ..Default::default()
    })
}
