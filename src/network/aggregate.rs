//! Statistics aggregation over the filtered catalog.
//!
//! Extraction calls are independent of each other, so they run on a rayon pool.
//! Results are merged back by symbol in catalog order, which keeps the table
//! identical whether one worker or many did the work.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::data::OccurrenceGraph;
use crate::domain::{AgeRange, Element, ElementNetworkRecord, ElementStats};
use crate::error::AppError;
use crate::network::extractor::extract;

/// Extract statistics for every catalog element and join them onto metadata.
///
/// Any extraction failure aborts the whole batch; no partial table is returned.
pub fn aggregate(
    graph: &dyn OccurrenceGraph,
    catalog: &[Element],
    age_range: AgeRange,
    jobs: Option<usize>,
) -> Result<Vec<ElementStats>, AppError> {
    info!(elements = catalog.len(), %age_range, "extracting element networks");
    let records = extract_all(graph, catalog, age_range, jobs)?;
    join_metadata(catalog, records)
}

fn extract_all(
    graph: &dyn OccurrenceGraph,
    catalog: &[Element],
    age_range: AgeRange,
    jobs: Option<usize>,
) -> Result<Vec<ElementNetworkRecord>, AppError> {
    let par_extract = || {
        catalog
            .par_iter()
            .map(|e| extract(graph, &e.symbol, age_range))
            .collect::<Result<Vec<_>, AppError>>()
    };

    match jobs {
        Some(0) => Err(AppError::input("Worker count must be at least 1.")),
        Some(1) => catalog
            .iter()
            .map(|e| extract(graph, &e.symbol, age_range))
            .collect(),
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| AppError::input(format!("Failed to start {n} extraction workers: {e}")))?;
            pool.install(par_extract)
        }
        None => par_extract(),
    }
}

/// Left-join extracted records onto the catalog by symbol.
///
/// The join is strict: every catalog element must have exactly one record and
/// every record must belong to a catalog element. The first divergence is
/// reported with the offending symbol.
pub fn join_metadata(
    catalog: &[Element],
    records: Vec<ElementNetworkRecord>,
) -> Result<Vec<ElementStats>, AppError> {
    let mut catalog_symbols = HashSet::with_capacity(catalog.len());
    for element in catalog {
        if !catalog_symbols.insert(element.symbol.as_str()) {
            return Err(AppError::join_mismatch(
                &element.symbol,
                "listed more than once in the catalog",
            ));
        }
    }

    let mut by_symbol: HashMap<String, ElementNetworkRecord> = HashMap::with_capacity(records.len());
    for record in records {
        if by_symbol.contains_key(&record.symbol) {
            return Err(AppError::join_mismatch(
                &record.symbol,
                "statistics were produced more than once",
            ));
        }
        by_symbol.insert(record.symbol.clone(), record);
    }

    let mut table = Vec::with_capacity(catalog.len());
    for element in catalog {
        let record = by_symbol.remove(&element.symbol).ok_or_else(|| {
            AppError::join_mismatch(&element.symbol, "catalog element has no extracted statistics")
        })?;
        table.push(ElementStats {
            record,
            meta: element.meta.clone(),
        });
    }

    // Report leftovers deterministically.
    if let Some(extra) = by_symbol.keys().min() {
        return Err(AppError::join_mismatch(extra, "statistics exist for an element missing from the catalog"));
    }

    debug!(rows = table.len(), "joined statistics onto catalog metadata");
    Ok(table)
}
