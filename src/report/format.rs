//! Terminal formatting of the statistics table, fits, and diagnostics.
//!
//! Formatting lives in one place so:
//! - the extraction and fitting code stays free of presentation concerns
//! - output changes are localized

use crate::domain::{AgeRange, ElementStats};
use crate::fit::{FitReport, QqSummary};

/// Header block describing the run.
pub fn format_run_header(age_range: &AgeRange, catalog_size: usize, kept: usize) -> String {
    let mut out = String::new();
    out.push_str("=== enet - element network statistics ===\n");
    out.push_str(&format!("Age window: {age_range}\n"));
    out.push_str(&format!("Catalog: {kept} of {catalog_size} elements in temporal scope\n"));
    out
}

/// Format the aggregated table (one row per element).
pub fn format_stats_table(table: &[ElementStats]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<8} {:<16} {:>6} {:>12} {:>12} {:>14}\n",
            "symbol", "name", "Z", "n_elements", "n_minerals", "n_localities"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<8} {:-<16} {:-<6} {:-<12} {:-<12} {:-<14}\n",
            "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for row in table {
        let z = row
            .meta
            .atomic_number
            .map(|z| z.to_string())
            .unwrap_or_default();
        out.push_str(
            format!(
                "{:<8} {:<16} {:>6} {:>12} {:>12} {:>14}\n",
                truncate(row.symbol(), 8),
                truncate(row.meta.name.as_deref().unwrap_or(""), 16),
                z,
                row.record.n_elements,
                row.record.n_minerals,
                row.record.n_localities,
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

/// Format every candidate fit (and every failure) as one line each.
pub fn format_fit_report(report: &FitReport) -> String {
    let mut out = String::new();
    out.push_str("Fitted relationships:\n");
    for fit in &report.fits {
        out.push_str(&format!(
            "  {:<34} {:<28} R²={:.3} n={}",
            fit.spec.label(),
            fit.equation,
            fit.r_squared_rounded(),
            fit.n_used,
        ));
        if !fit.excluded.is_empty() {
            out.push_str(&format!(" (excluded: {})", fit.excluded.join(", ")));
        }
        out.push('\n');
    }
    for (spec, err) in &report.failed {
        out.push_str(&format!("  {:<34} FAILED: {err}\n", spec.label()));
    }
    out
}

/// Format the Q-Q table of one candidate.
pub fn format_qq(summary: &QqSummary) -> String {
    let mut out = String::new();
    let corr = summary
        .correlation
        .map(|r| format!("{r:.4}"))
        .unwrap_or_else(|| "n/a".to_string());
    out.push_str(&format!(
        "Normal Q-Q for {} (probability-plot r = {corr}):\n",
        summary.spec.label()
    ));
    out.push_str(format!("{:<8} {:>12} {:>12}\n", "symbol", "normal_q", "std_resid").trim_end());
    out.push('\n');
    for p in &summary.points {
        out.push_str(
            format!(
                "{:<8} {:>12.4} {:>12.4}\n",
                truncate(&p.symbol, 8),
                p.theoretical,
                p.sample
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
