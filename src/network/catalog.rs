//! Catalog filtering by temporal validity.

use std::collections::HashSet;

use tracing::debug;

use crate::domain::Element;
use crate::error::AppError;

/// Whether an element occurred naturally at some point since `cutoff_ga`.
///
/// An element that is not natural at all never qualifies. An element whose
/// natural occurrence ended `extinct_ga` Ga ago qualifies only when that end lies
/// strictly inside the window, i.e. `extinct_ga < cutoff_ga`.
pub fn occurs_since(element: &Element, cutoff_ga: f64) -> bool {
    if !element.meta.natural {
        return false;
    }
    match element.meta.extinct_ga {
        None => true,
        Some(extinct) => extinct < cutoff_ga,
    }
}

/// Restrict the catalog to elements valid since `cutoff_ga`, preserving order.
///
/// Duplicate symbols are rejected: the aggregated table is keyed by symbol.
pub fn filter_catalog(catalog: &[Element], cutoff_ga: f64) -> Result<Vec<Element>, AppError> {
    if !(cutoff_ga.is_finite() && cutoff_ga >= 0.0) {
        return Err(AppError::input(format!("Invalid catalog cutoff age: {cutoff_ga} Ga.")));
    }

    let mut seen = HashSet::with_capacity(catalog.len());
    for element in catalog {
        if element.symbol.trim().is_empty() {
            return Err(AppError::input("Catalog contains an element with an empty symbol."));
        }
        if !seen.insert(element.symbol.as_str()) {
            return Err(AppError::input(format!(
                "Catalog lists element '{}' more than once.",
                element.symbol
            )));
        }
    }

    let kept: Vec<Element> = catalog
        .iter()
        .filter(|e| {
            let keep = occurs_since(e, cutoff_ga);
            if !keep {
                debug!(symbol = %e.symbol, cutoff_ga, "dropping element outside temporal scope");
            }
            keep
        })
        .cloned()
        .collect();

    Ok(kept)
}
