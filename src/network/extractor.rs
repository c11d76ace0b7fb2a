//! Per-element network statistics.

use std::collections::HashSet;

use tracing::trace;

use crate::data::OccurrenceGraph;
use crate::domain::{AgeRange, ElementNetworkRecord, QueryResult};
use crate::error::AppError;

/// Query the occurrence graph for `symbol` inside `age_range` and count its
/// co-occurring elements, minerals, and localities.
///
/// An empty query result is a legitimate outcome and yields all-zero counts.
/// Backend failures propagate unchanged.
pub fn extract(
    graph: &dyn OccurrenceGraph,
    symbol: &str,
    age_range: AgeRange,
) -> Result<ElementNetworkRecord, AppError> {
    let result = graph.query(&[symbol], age_range)?;
    let record = count_network(symbol, &result);
    trace!(
        symbol,
        n_elements = record.n_elements,
        n_minerals = record.n_minerals,
        n_localities = record.n_localities,
        edges = result.edges.len(),
        "extracted element network"
    );
    Ok(record)
}

/// Derive the three counts from a raw query result.
///
/// - `n_elements`: distinct edge targets, never counting `symbol` itself
/// - `n_minerals`: distinct edge sources
/// - `n_localities`: distinct locality ids of those minerals
///
/// A result without edges is all zeros whatever locality records came with it.
/// Records that name a mineral outside the edge sources are ignored; records
/// without a mineral are attributed to the result as a whole.
pub fn count_network(symbol: &str, result: &QueryResult) -> ElementNetworkRecord {
    if result.edges.is_empty() {
        return ElementNetworkRecord::zero(symbol);
    }

    let mut elements: HashSet<&str> = HashSet::new();
    let mut minerals: HashSet<&str> = HashSet::new();
    for edge in &result.edges {
        minerals.insert(edge.mineral.as_str());
        if edge.element != symbol {
            elements.insert(edge.element.as_str());
        }
    }

    let localities: HashSet<&str> = result
        .locality_info
        .iter()
        .filter(|r| r.mineral.as_deref().is_none_or(|m| minerals.contains(m)))
        .map(|r| r.locality_id.as_str())
        .collect();

    ElementNetworkRecord {
        symbol: symbol.to_string(),
        n_elements: elements.len() as u64,
        n_minerals: minerals.len() as u64,
        n_localities: localities.len() as u64,
    }
}
