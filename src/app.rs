//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and installs logging
//! - parses CLI arguments into an `AnalysisConfig`
//! - runs the pipeline
//! - prints reports and writes optional exports

use clap::Parser;
use tracing::debug;

use crate::cli::{Cli, Command, DemoArgs, FitArgs, FitOptions, SourceArgs, StatsArgs, WindowArgs};
use crate::domain::{AgeRange, AnalysisConfig, GraphSource};
use crate::error::AppError;
use crate::fit::qq_summary;
use crate::io::export::{FitsFile, write_fits_json, write_stats_csv};
use crate::report::{format_fit_report, format_qq, format_run_header, format_stats_table};

pub mod pipeline;

/// Entry point for the `enet` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env is the normal case.
    let _ = dotenvy::dotenv();
    crate::logging::init_logging();

    let cli = Cli::parse();
    match cli.command {
        Command::Stats(args) => handle_stats(args),
        Command::Fit(args) => handle_fit(args, OutputMode::Full),
        Command::Qq(args) => handle_fit(args, OutputMode::Qq),
        Command::Demo(args) => handle_demo(args),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Full,
    Qq,
}

fn handle_stats(args: StatsArgs) -> Result<(), AppError> {
    let mut config = config_from_source(&args.source, None)?;
    config.export_stats = args.export.clone();

    let stats = pipeline::build_table(&config)?;
    println!(
        "{}",
        format_run_header(&config.age_range, stats.catalog_size, stats.kept)
    );
    println!("{}", format_stats_table(&stats.table));

    if let Some(path) = &config.export_stats {
        write_stats_csv(path, &stats.table)?;
        debug!(path = %path.display(), "wrote statistics table");
    }
    Ok(())
}

fn handle_fit(args: FitArgs, mode: OutputMode) -> Result<(), AppError> {
    let mut config = config_from_source(&args.source, args.stats.clone())?;
    apply_fit_options(&mut config, &args.fit);
    config.export_stats = args.export.clone();
    let show_qq = mode == OutputMode::Qq || args.fit.qq;
    analyze_and_report(&config, mode == OutputMode::Full, show_qq)
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let mut config = AnalysisConfig {
        catalog_path: None,
        source: GraphSource::Synthetic {
            seed: args.seed,
            n_minerals: args.n_minerals,
            n_sites: args.n_sites,
        },
        cutoff_ga: args.window.max_age,
        age_range: age_range_from(args.window)?,
        zero_policy: args.fit.zero_policy,
        jobs: args.jobs,
        candidates: Vec::new(),
        export_stats: args.export.clone(),
        export_fits: None,
    };
    apply_fit_options(&mut config, &args.fit);
    analyze_and_report(&config, true, args.fit.qq)
}

fn analyze_and_report(config: &AnalysisConfig, show_table: bool, show_qq: bool) -> Result<(), AppError> {
    let run = pipeline::run_analysis(config)?;

    println!(
        "{}",
        format_run_header(&config.age_range, run.stats.catalog_size, run.stats.kept)
    );
    if show_table {
        println!("{}", format_stats_table(&run.stats.table));
    }
    println!("{}", format_fit_report(&run.fits));
    if show_qq {
        for fit in &run.fits.fits {
            println!("{}", format_qq(&qq_summary(fit)));
        }
    }

    // Exports go out even when some fits failed; they record the failures.
    if let Some(path) = &config.export_stats {
        write_stats_csv(path, &run.stats.table)?;
    }
    if let Some(path) = &config.export_fits {
        write_fits_json(path, &FitsFile::new(&run.fits, config.age_range, config.zero_policy))?;
    }

    pipeline::check_fits(&run.fits, config.zero_policy)
}

/// Resolve source flags into a config with default fit settings.
///
/// Precedence: `--stats` table, then minerals/localities files, then the endpoint.
pub fn config_from_source(
    source: &SourceArgs,
    stats: Option<std::path::PathBuf>,
) -> Result<AnalysisConfig, AppError> {
    let graph_source = match (stats, &source.minerals, &source.localities, &source.endpoint) {
        (Some(path), _, _, _) => GraphSource::StatsTable { path },
        (None, Some(minerals), Some(localities), _) => GraphSource::Files {
            minerals: minerals.clone(),
            localities: localities.clone(),
        },
        (None, None, None, Some(endpoint)) => GraphSource::Remote {
            endpoint: endpoint.clone(),
        },
        (None, Some(_), None, _) | (None, None, Some(_), _) => {
            return Err(AppError::input("--minerals and --localities must be given together."));
        }
        (None, None, None, None) => {
            return Err(AppError::input(
                "No occurrence data: give --minerals/--localities, --endpoint, or --stats.",
            ));
        }
    };

    if !source.cutoff.is_finite() || source.cutoff < 0.0 {
        return Err(AppError::input(format!(
            "Catalog cutoff must be a non-negative age in Ga, got {}.",
            source.cutoff
        )));
    }

    Ok(AnalysisConfig {
        catalog_path: source.catalog.clone(),
        source: graph_source,
        cutoff_ga: source.cutoff,
        age_range: age_range_from(source.window)?,
        zero_policy: Default::default(),
        jobs: source.jobs,
        candidates: Vec::new(),
        export_stats: None,
        export_fits: None,
    })
}

fn apply_fit_options(config: &mut AnalysisConfig, fit: &FitOptions) {
    config.zero_policy = fit.zero_policy;
    config.candidates = fit.candidates.clone();
    config.export_fits = fit.export_fits.clone();
}

fn age_range_from(window: WindowArgs) -> Result<AgeRange, AppError> {
    AgeRange::new(window.max_age, window.min_age)
}
