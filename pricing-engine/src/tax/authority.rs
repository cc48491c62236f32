//! Tax authority resolution from a shipping address

use crate::source::{SourceResult, TaxSource};
use shared::models::{PostalAddress, TaxAuthority};
use std::collections::BTreeSet;

/// Geos of the address plus every geo that contains them, bounded by
/// `max_depth` levels of containment
pub async fn expand_geos(
    source: &dyn TaxSource,
    address: &PostalAddress,
    max_depth: usize,
) -> SourceResult<BTreeSet<String>> {
    let mut geos: BTreeSet<String> = address.geo_ids().into_iter().collect();
    let mut frontier: Vec<String> = geos.iter().cloned().collect();

    for _ in 0..max_depth {
        let mut next = Vec::new();
        for geo in &frontier {
            for parent in source.geo_parents(geo).await? {
                if geos.insert(parent.clone()) {
                    next.push(parent);
                }
            }
        }
        if next.is_empty() {
            return Ok(geos);
        }
        frontier = next;
    }

    tracing::warn!(max_depth, "Geo containment walk hit depth bound");
    Ok(geos)
}

/// Authorities for the address, sorted
pub async fn resolve_authorities(
    source: &dyn TaxSource,
    address: &PostalAddress,
    max_depth: usize,
) -> SourceResult<Vec<TaxAuthority>> {
    let geos = expand_geos(source, address, max_depth).await?;
    if geos.is_empty() {
        return Ok(Vec::new());
    }
    let authorities: BTreeSet<TaxAuthority> =
        source.authorities_for_geos(&geos).await?.into_iter().collect();
    tracing::debug!(geos = geos.len(), authorities = authorities.len(), "Tax authorities resolved");
    Ok(authorities.into_iter().collect())
}
