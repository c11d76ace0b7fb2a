//! Shared analysis pipeline used by every subcommand.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! catalog -> filter -> extract per element -> join -> fit candidates
//!
//! The subcommands then only decide what to print and export.

use std::collections::HashSet;

use tracing::{info, info_span};

use crate::data::{HttpGraph, OccurrenceGraph, SyntheticSpec, generate_dataset};
use crate::domain::{AnalysisConfig, Element, ElementNetworkRecord, ElementStats, GraphSource, ZeroPolicy};
use crate::error::{AppError, ErrorKind};
use crate::fit::{FitReport, default_candidates, fit_candidates};
use crate::io::ingest::{load_catalog, load_graph, load_stats_table};
use crate::network::{aggregate, filter_catalog, join_metadata};

/// The aggregated table plus how much of the catalog it covers.
#[derive(Debug, Clone)]
pub struct StatsOutput {
    pub table: Vec<ElementStats>,
    /// Catalog size before the temporal filter.
    pub catalog_size: usize,
    /// Elements kept by the filter (equals `table.len()`).
    pub kept: usize,
}

/// All computed outputs of a `fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub stats: StatsOutput,
    pub fits: FitReport,
}

/// Build the aggregated table from whichever source the config names.
pub fn build_table(config: &AnalysisConfig) -> Result<StatsOutput, AppError> {
    let _span = info_span!("build_table").entered();

    match &config.source {
        GraphSource::Synthetic {
            seed,
            n_minerals,
            n_sites,
        } => {
            let dataset = generate_dataset(&SyntheticSpec {
                n_minerals: *n_minerals,
                n_sites: *n_sites,
                seed: *seed,
            })?;
            table_from_graph(&dataset.graph, &dataset.catalog, config)
        }
        GraphSource::Files { minerals, localities } => {
            let catalog = load_required_catalog(config)?;
            let graph = load_graph(minerals, localities)?;
            table_from_graph(&graph, &catalog, config)
        }
        GraphSource::Remote { endpoint } => {
            let catalog = load_required_catalog(config)?;
            let graph = HttpGraph::new(endpoint.as_str())?;
            info!(endpoint = graph.endpoint(), "querying remote occurrence service");
            table_from_graph(&graph, &catalog, config)
        }
        GraphSource::StatsTable { path } => {
            let catalog = load_required_catalog(config)?;
            let records = load_stats_table(path)?;
            table_from_records(&catalog, records, config.cutoff_ga)
        }
    }
}

/// Filter the catalog, extract every kept element from `graph`, and join.
pub fn table_from_graph(
    graph: &dyn OccurrenceGraph,
    catalog: &[Element],
    config: &AnalysisConfig,
) -> Result<StatsOutput, AppError> {
    let kept = filter_catalog(catalog, config.cutoff_ga)?;
    let table = aggregate(graph, &kept, config.age_range, config.jobs)?;
    Ok(StatsOutput {
        catalog_size: catalog.len(),
        kept: kept.len(),
        table,
    })
}

/// Join a previously exported table onto the filtered catalog.
///
/// Rows for catalog elements the filter dropped are ignored; rows for symbols
/// the catalog does not know at all are a join mismatch.
pub fn table_from_records(
    catalog: &[Element],
    records: Vec<ElementNetworkRecord>,
    cutoff_ga: f64,
) -> Result<StatsOutput, AppError> {
    let kept = filter_catalog(catalog, cutoff_ga)?;
    let kept_symbols: HashSet<&str> = kept.iter().map(|e| e.symbol.as_str()).collect();
    let known: HashSet<&str> = catalog.iter().map(|e| e.symbol.as_str()).collect();

    let mut in_scope = Vec::with_capacity(records.len());
    for record in records {
        if kept_symbols.contains(record.symbol.as_str()) {
            in_scope.push(record);
        } else if !known.contains(record.symbol.as_str()) {
            return Err(AppError::join_mismatch(
                &record.symbol,
                "statistics table row has no catalog entry",
            ));
        }
    }

    let table = join_metadata(&kept, in_scope)?;
    Ok(StatsOutput {
        catalog_size: catalog.len(),
        kept: kept.len(),
        table,
    })
}

/// Build the table and fit every candidate form.
pub fn run_analysis(config: &AnalysisConfig) -> Result<RunOutput, AppError> {
    let stats = build_table(config)?;
    Ok(fit_table(stats, config))
}

/// Fit the configured candidates (or the standard six) over a built table.
pub fn fit_table(stats: StatsOutput, config: &AnalysisConfig) -> RunOutput {
    let _span = info_span!("fit_candidates", rows = stats.table.len()).entered();
    let candidates = if config.candidates.is_empty() {
        default_candidates()
    } else {
        config.candidates.clone()
    };
    let fits = fit_candidates(&stats.table, &candidates, config.zero_policy);
    RunOutput { stats, fits }
}

/// Decide whether a fit report should fail the process.
///
/// Under `ZeroPolicy::Fail` any undefined transform is fatal. Otherwise the run
/// fails only when no candidate could be fitted.
pub fn check_fits(report: &FitReport, policy: ZeroPolicy) -> Result<(), AppError> {
    if policy == ZeroPolicy::Fail {
        if let Some((_, err)) = report
            .failed
            .iter()
            .find(|(_, e)| e.kind() == ErrorKind::UndefinedTransform)
        {
            return Err(err.clone());
        }
    }
    if report.fits.is_empty() && !report.failed.is_empty() {
        return Err(AppError::degenerate(format!(
            "All {} candidate fits failed.",
            report.failed.len()
        )));
    }
    Ok(())
}

fn load_required_catalog(config: &AnalysisConfig) -> Result<Vec<Element>, AppError> {
    let path = config
        .catalog_path
        .as_deref()
        .ok_or_else(|| AppError::input("An element catalog is required (--catalog or ENET_CATALOG)."))?;
    load_catalog(path)
}
