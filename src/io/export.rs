//! Exports: the aggregated statistics table (CSV) and the fitted models (JSON).
//!
//! The CSV export can be read back with `ingest::load_stats_table`, so a table
//! built once against a slow occurrence service can be refitted offline.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{AgeRange, ElementStats, FitSpec, ModelFit, ZeroPolicy};
use crate::error::AppError;
use crate::fit::{FitReport, QqSummary, qq_summary};

/// Write the aggregated table, one row per element, in table order.
pub fn write_stats_csv(path: &Path, table: &[ElementStats]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::output(format!("Failed to create stats CSV '{}': {e}", path.display())))?;

    writer
        .write_record([
            "symbol",
            "name",
            "atomic_number",
            "group",
            "period",
            "discovery_era",
            "n_elements",
            "n_minerals",
            "n_localities",
        ])
        .map_err(|e| AppError::output(format!("Failed to write stats CSV header: {e}")))?;

    for row in table {
        let meta = &row.meta;
        writer
            .write_record([
                row.symbol().to_string(),
                meta.name.clone().unwrap_or_default(),
                opt_to_string(meta.atomic_number),
                opt_to_string(meta.group),
                opt_to_string(meta.period),
                meta.discovery_era.clone().unwrap_or_default(),
                row.record.n_elements.to_string(),
                row.record.n_minerals.to_string(),
                row.record.n_localities.to_string(),
            ])
            .map_err(|e| AppError::output(format!("Failed to write stats CSV row for '{}': {e}", row.symbol())))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::output(format!("Failed to flush stats CSV '{}': {e}", path.display())))?;
    Ok(())
}

/// Schema of the fits JSON export.
#[derive(Debug, Clone, Serialize)]
pub struct FitsFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub age_range: AgeRange,
    pub zero_policy: ZeroPolicy,
    pub fits: Vec<ModelFit>,
    pub failed: Vec<FailedFit>,
    pub diagnostics: Vec<QqSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedFit {
    pub label: String,
    pub spec: FitSpec,
    pub error: String,
}

impl FitsFile {
    pub fn new(report: &FitReport, age_range: AgeRange, zero_policy: ZeroPolicy) -> Self {
        Self {
            tool: "enet".to_string(),
            generated_at: Utc::now(),
            age_range,
            zero_policy,
            fits: report.fits.clone(),
            failed: report
                .failed
                .iter()
                .map(|(spec, err)| FailedFit {
                    label: spec.label(),
                    spec: *spec,
                    error: err.message().to_string(),
                })
                .collect(),
            diagnostics: report.fits.iter().map(qq_summary).collect(),
        }
    }
}

/// Write every fit, failure, and Q-Q table as pretty JSON.
pub fn write_fits_json(path: &Path, fits: &FitsFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::output(format!("Failed to create fits JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, fits)
        .map_err(|e| AppError::output(format!("Failed to write fits JSON: {e}")))?;
    Ok(())
}

fn opt_to_string<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ElementMeta, ElementNetworkRecord};
    use crate::fit::{default_candidates, fit_candidates};
    use crate::io::ingest::load_stats_table;

    fn table() -> Vec<ElementStats> {
        [("H", 1, 3, 50), ("O", 2, 7, 80), ("Si", 4, 9, 120), ("Tc", 0, 0, 0)]
            .iter()
            .map(|&(s, e, m, l)| ElementStats {
                record: ElementNetworkRecord {
                    symbol: s.to_string(),
                    n_elements: e,
                    n_minerals: m,
                    n_localities: l,
                },
                meta: ElementMeta {
                    name: Some(format!("{s}, the element")),
                    ..ElementMeta::default()
                },
            })
            .collect()
    }

    #[test]
    fn stats_csv_reloads_as_the_same_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        let table = table();
        write_stats_csv(&path, &table).unwrap();

        let reloaded = load_stats_table(&path).unwrap();
        let original: Vec<ElementNetworkRecord> = table.into_iter().map(|r| r.record).collect();
        assert_eq!(reloaded, original);
    }

    #[test]
    fn fits_json_lists_fits_and_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fits.json");
        let report = fit_candidates(&table(), &default_candidates(), ZeroPolicy::Exclude);
        let file = FitsFile::new(&report, AgeRange::new(4.5, 0.0).unwrap(), ZeroPolicy::Exclude);
        write_fits_json(&path, &file).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["tool"], "enet");
        assert_eq!(value["zero_policy"], "exclude");
        let fits = value["fits"].as_array().unwrap();
        assert_eq!(fits.len() + value["failed"].as_array().unwrap().len(), 6);
        assert_eq!(value["diagnostics"].as_array().unwrap().len(), fits.len());

        let log_fit = fits
            .iter()
            .find(|f| f["spec"]["response_transform"] == "log" && f["spec"]["response"] == "minerals")
            .unwrap();
        assert_eq!(log_fit["excluded"][0], "Tc");
    }
}
