//! The occurrence-graph collaborator.
//!
//! The extraction stage only relies on the `OccurrenceGraph` contract: given a set
//! of elements of interest and an inclusive age window, return the mineral→element
//! edges and the locality records of the minerals that match. How a backend walks
//! its data is its own business.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::domain::{AgeRange, LocalityRecord, OccurrenceEdge, QueryResult};
use crate::error::AppError;

/// Black-box query interface over a bipartite mineral–element dataset.
///
/// Implementations must be shareable across the extraction worker pool.
pub trait OccurrenceGraph: Sync {
    /// Return the subgraph of minerals containing every element in `elements`
    /// that have at least one occurrence inside `age_range`.
    ///
    /// A legitimate "nothing matched" answer is an empty `QueryResult`; `Err` is
    /// reserved for backends that could not answer at all.
    fn query(&self, elements: &[&str], age_range: AgeRange) -> Result<QueryResult, AppError>;
}

/// An in-memory occurrence graph, typically loaded from CSV files.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGraph {
    /// mineral -> constituent elements
    composition: BTreeMap<String, BTreeSet<String>>,
    /// element -> minerals containing it
    by_element: HashMap<String, BTreeSet<String>>,
    /// mineral -> dated locality observations
    localities: HashMap<String, Vec<LocalityRecord>>,
}

impl InMemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mineral and its constituent elements.
    ///
    /// Adding the same mineral twice merges the element sets.
    pub fn add_mineral<I, S>(&mut self, mineral: &str, elements: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.composition.entry(mineral.to_string()).or_default();
        for element in elements {
            let element = element.into();
            self.by_element
                .entry(element.clone())
                .or_default()
                .insert(mineral.to_string());
            entry.insert(element);
        }
    }

    /// Register a locality observation. The record must name its mineral.
    pub fn add_locality(&mut self, record: LocalityRecord) -> Result<(), AppError> {
        let Some(mineral) = record.mineral.clone() else {
            return Err(AppError::input(format!(
                "Locality record '{}' has no mineral id.",
                record.locality_id
            )));
        };
        self.localities.entry(mineral).or_default().push(record);
        Ok(())
    }

    pub fn mineral_count(&self) -> usize {
        self.composition.len()
    }

    pub fn locality_record_count(&self) -> usize {
        self.localities.values().map(Vec::len).sum()
    }

    /// Locality records of `mineral` that fall inside `age_range`.
    fn records_in_window(&self, mineral: &str, age_range: AgeRange) -> Vec<LocalityRecord> {
        self.localities
            .get(mineral)
            .into_iter()
            .flatten()
            .filter(|r| age_range.overlaps(r.max_age_ga, r.min_age_ga))
            .cloned()
            .collect()
    }
}

impl OccurrenceGraph for InMemoryGraph {
    fn query(&self, elements: &[&str], age_range: AgeRange) -> Result<QueryResult, AppError> {
        let Some((first, rest)) = elements.split_first() else {
            return Err(AppError::query("Occurrence query needs at least one element."));
        };

        let Some(candidates) = self.by_element.get(*first) else {
            return Ok(QueryResult::default());
        };

        let mut out = QueryResult::default();
        for mineral in candidates {
            let Some(composition) = self.composition.get(mineral) else {
                continue;
            };
            if !rest.iter().all(|e| composition.contains(*e)) {
                continue;
            }

            let in_window = self.records_in_window(mineral, age_range);
            if in_window.is_empty() {
                continue;
            }

            out.edges.extend(
                composition
                    .iter()
                    .map(|element| OccurrenceEdge::new(mineral.clone(), element.clone())),
            );
            out.locality_info.extend(in_window);
        }

        Ok(out)
    }
}
