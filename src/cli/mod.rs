//! Command-line parsing for the element network analysis.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! extraction and fitting code. Flags are resolved into an `AnalysisConfig` by
//! `app`, so the pipeline never sees clap types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{FitSpec, ZeroPolicy};
use crate::fit::parse_fit_spec;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "enet",
    version,
    about = "Per-element network statistics from mineral occurrences, with regression fits"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract per-element network statistics and print the table.
    Stats(StatsArgs),
    /// Extract statistics (or load an exported table) and fit every candidate form.
    Fit(FitArgs),
    /// Like `fit`, but print normal Q-Q tables of each candidate's residuals.
    Qq(FitArgs),
    /// Run `fit` against a seeded synthetic occurrence dataset.
    Demo(DemoArgs),
}

/// Where the catalog and the occurrence graph come from.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Element catalog CSV (`symbol`, `name`, `atomic_number`, ..., `natural`, `extinct_ga`).
    #[arg(long, env = "ENET_CATALOG", value_name = "CSV")]
    pub catalog: Option<PathBuf>,

    /// Mineral composition CSV (`mineral_id`, `elements`).
    #[arg(long, env = "ENET_MINERALS", value_name = "CSV", requires = "localities")]
    pub minerals: Option<PathBuf>,

    /// Locality CSV (`mineral_id`, `locality_id`, `max_age_ga`, `min_age_ga`).
    #[arg(long, env = "ENET_LOCALITIES", value_name = "CSV", requires = "minerals")]
    pub localities: Option<PathBuf>,

    /// Occurrence service URL; used when no minerals/localities files are given.
    #[arg(long, env = "ENET_ENDPOINT", value_name = "URL")]
    pub endpoint: Option<String>,

    #[command(flatten)]
    pub window: WindowArgs,

    /// Drop elements whose natural occurrence ended at or before this age (Ga).
    #[arg(long, default_value_t = 4.5)]
    pub cutoff: f64,

    /// Worker threads for extraction (1 = sequential; default: all cores).
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,
}

/// Inclusive geological time window.
#[derive(Debug, Args, Clone, Copy)]
pub struct WindowArgs {
    /// Oldest bound of the window (Ga before present).
    #[arg(long, default_value_t = 4.5)]
    pub max_age: f64,

    /// Youngest bound of the window (Ga before present).
    #[arg(long, default_value_t = 0.0)]
    pub min_age: f64,
}

/// Fit options shared by `fit`, `qq`, and `demo`.
#[derive(Debug, Args, Clone)]
pub struct FitOptions {
    /// How to treat rows a log transform cannot take.
    #[arg(long, value_enum, default_value_t = ZeroPolicy::Exclude)]
    pub zero_policy: ZeroPolicy,

    /// Candidate form, e.g. `ln(minerals) ~ elements` (repeatable; default: the standard six).
    #[arg(long = "candidate", value_name = "FORM", value_parser = parse_fit_spec)]
    pub candidates: Vec<FitSpec>,

    /// Also print normal Q-Q tables of residuals.
    #[arg(long)]
    pub qq: bool,

    /// Export fits, failures, and Q-Q tables to JSON.
    #[arg(long = "export-fits", value_name = "JSON")]
    pub export_fits: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct StatsArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Export the aggregated table to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Fit a previously exported statistics table instead of querying the graph.
    #[arg(long, value_name = "CSV", conflicts_with_all = ["minerals", "localities", "endpoint"])]
    pub stats: Option<PathBuf>,

    #[command(flatten)]
    pub fit: FitOptions,

    /// Export the aggregated table to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Random seed for the synthetic dataset.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of synthetic minerals.
    #[arg(long, default_value_t = 600)]
    pub n_minerals: usize,

    /// Number of synthetic localities.
    #[arg(long, default_value_t = 2000)]
    pub n_sites: usize,

    #[command(flatten)]
    pub window: WindowArgs,

    /// Worker threads for extraction (1 = sequential; default: all cores).
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    #[command(flatten)]
    pub fit: FitOptions,

    /// Export the aggregated table to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn candidates_parse_from_flags() {
        let cli = Cli::try_parse_from([
            "enet",
            "fit",
            "--catalog",
            "c.csv",
            "--stats",
            "s.csv",
            "--candidate",
            "ln(minerals) ~ ln(elements)",
            "--candidate",
            "localities ~ minerals",
            "--zero-policy",
            "fail",
        ])
        .unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.fit.candidates.len(), 2);
        assert_eq!(args.fit.zero_policy, ZeroPolicy::Fail);
        assert_eq!(args.source.window.max_age, 4.5);
    }

    #[test]
    fn stats_table_conflicts_with_graph_files() {
        let result = Cli::try_parse_from([
            "enet", "fit", "--stats", "s.csv", "--minerals", "m.csv", "--localities", "l.csv",
        ]);
        assert!(result.is_err());
    }
}
