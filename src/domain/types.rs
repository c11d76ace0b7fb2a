//! Shared domain types.
//!
//! These types are kept small and serializable so they can be:
//!
//! - passed between the extraction, aggregation, and fitting stages
//! - exported to CSV/JSON
//! - reloaded later for refitting without querying the occurrence graph again

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Inclusive geological time window, in Ga (billions of years before present).
///
/// `max_ga` is the older bound and `min_ga` the younger one, so a valid range
/// satisfies `max_ga >= min_ga >= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgeRange {
    pub max_ga: f64,
    pub min_ga: f64,
}

impl AgeRange {
    pub fn new(max_ga: f64, min_ga: f64) -> Result<Self, AppError> {
        if !(max_ga.is_finite() && min_ga.is_finite()) {
            return Err(AppError::input("Age range bounds must be finite."));
        }
        if min_ga < 0.0 {
            return Err(AppError::input(format!(
                "Invalid age range: min age {min_ga} Ga is negative."
            )));
        }
        if max_ga < min_ga {
            return Err(AppError::input(format!(
                "Invalid age range: max age {max_ga} Ga is younger than min age {min_ga} Ga."
            )));
        }
        Ok(Self { max_ga, min_ga })
    }

    /// Whether an observation dated to `[older, younger]` falls in the window.
    ///
    /// Both bounds are inclusive: an observation touching the window edge counts.
    /// Undated observations (`None`) are treated as unconstrained on that side.
    pub fn overlaps(&self, older: Option<f64>, younger: Option<f64>) -> bool {
        let older = older.unwrap_or(f64::INFINITY);
        let younger = younger.unwrap_or(0.0);
        younger <= self.max_ga && older >= self.min_ga
    }
}

impl std::fmt::Display for AgeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} Ga, {} Ga]", self.max_ga, self.min_ga)
    }
}

/// Catalog metadata for an element. Opaque to the analysis beyond the join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementMeta {
    pub name: Option<String>,
    pub atomic_number: Option<u32>,
    pub group: Option<u32>,
    pub period: Option<u32>,
    pub discovery_era: Option<String>,
    /// `false` for elements that never occur naturally (e.g. synthetic elements).
    pub natural: bool,
    /// Age (Ga) after which the element stopped occurring naturally, if any.
    pub extinct_ga: Option<f64>,
}

impl Default for ElementMeta {
    fn default() -> Self {
        Self {
            name: None,
            atomic_number: None,
            group: None,
            period: None,
            discovery_era: None,
            natural: true,
            extinct_ga: None,
        }
    }
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub symbol: String,
    pub meta: ElementMeta,
}

impl Element {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            meta: ElementMeta::default(),
        }
    }
}

/// "This mineral contains this element."
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OccurrenceEdge {
    pub mineral: String,
    pub element: String,
}

impl OccurrenceEdge {
    pub fn new(mineral: impl Into<String>, element: impl Into<String>) -> Self {
        Self {
            mineral: mineral.into(),
            element: element.into(),
        }
    }
}

/// A single dated observation of a mineral at a locality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalityRecord {
    pub locality_id: String,
    pub mineral: Option<String>,
    pub max_age_ga: Option<f64>,
    pub min_age_ga: Option<f64>,
}

impl LocalityRecord {
    pub fn new(locality_id: impl Into<String>) -> Self {
        Self {
            locality_id: locality_id.into(),
            mineral: None,
            max_age_ga: None,
            min_age_ga: None,
        }
    }
}

/// What the occurrence-graph collaborator returns for one query.
///
/// No ordering is guaranteed for either collection, and duplicates are allowed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub edges: Vec<OccurrenceEdge>,
    pub locality_info: Vec<LocalityRecord>,
}

/// Derived per-element network statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementNetworkRecord {
    pub symbol: String,
    pub n_elements: u64,
    pub n_minerals: u64,
    pub n_localities: u64,
}

impl ElementNetworkRecord {
    pub fn zero(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            n_elements: 0,
            n_minerals: 0,
            n_localities: 0,
        }
    }

    pub fn value(&self, variable: Variable) -> f64 {
        match variable {
            Variable::Elements => self.n_elements as f64,
            Variable::Minerals => self.n_minerals as f64,
            Variable::Localities => self.n_localities as f64,
        }
    }
}

/// One row of the aggregated table: statistics joined with catalog metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementStats {
    pub record: ElementNetworkRecord,
    pub meta: ElementMeta,
}

impl ElementStats {
    pub fn symbol(&self) -> &str {
        &self.record.symbol
    }
}

/// A count column of the aggregated table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Variable {
    Elements,
    Minerals,
    Localities,
}

impl Variable {
    pub fn column_name(self) -> &'static str {
        match self {
            Variable::Elements => "n_elements",
            Variable::Minerals => "n_minerals",
            Variable::Localities => "n_localities",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Variable::Elements => "elements",
            Variable::Minerals => "minerals",
            Variable::Localities => "localities",
        }
    }
}

/// Transform applied to a variable before the linear fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Transform {
    Linear,
    /// Natural logarithm.
    Log,
}

impl Transform {
    /// Apply the transform. Returns `None` when the result would be undefined.
    pub fn apply(self, v: f64) -> Option<f64> {
        match self {
            Transform::Linear => v.is_finite().then_some(v),
            Transform::Log => (v.is_finite() && v > 0.0).then(|| v.ln()),
        }
    }

    pub fn wrap(self, name: &str) -> String {
        match self {
            Transform::Linear => name.to_string(),
            Transform::Log => format!("ln({name})"),
        }
    }
}

/// One candidate regression: `T_r(response) = slope * T_p(predictor) + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FitSpec {
    pub response: Variable,
    pub predictor: Variable,
    pub response_transform: Transform,
    pub predictor_transform: Transform,
}

impl FitSpec {
    pub fn linear(response: Variable, predictor: Variable) -> Self {
        Self {
            response,
            predictor,
            response_transform: Transform::Linear,
            predictor_transform: Transform::Linear,
        }
    }

    pub fn label(&self) -> String {
        format!(
            "{} ~ {}",
            self.response_transform.wrap(self.response.column_name()),
            self.predictor_transform.wrap(self.predictor.column_name())
        )
    }
}

/// What to do with rows that a log transform cannot handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ZeroPolicy {
    /// Drop the row from that fit and report it.
    #[default]
    Exclude,
    /// Abort that fit with an undefined-transform error.
    Fail,
}

/// Per-element residual in the transformed space of the fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Residual {
    pub symbol: String,
    pub x: f64,
    pub y_obs: f64,
    pub y_fit: f64,
    pub residual: f64,
}

/// Fitted model for one `FitSpec`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFit {
    pub spec: FitSpec,
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination in `[0, 1]` (unrounded).
    pub r_squared: f64,
    pub equation: String,
    pub n_used: usize,
    /// Symbols dropped under `ZeroPolicy::Exclude`.
    pub excluded: Vec<String>,
    pub residuals: Vec<Residual>,
}

impl ModelFit {
    /// R² rounded to 3 decimals for reporting.
    pub fn r_squared_rounded(&self) -> f64 {
        (self.r_squared * 1000.0).round() / 1000.0
    }
}

/// Where the occurrence graph comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphSource {
    Files { minerals: PathBuf, localities: PathBuf },
    Remote { endpoint: String },
    /// A previously exported statistics table; no graph queries are issued.
    StatsTable { path: PathBuf },
    /// A seeded synthetic dataset that brings its own catalog.
    Synthetic { seed: u64, n_minerals: usize, n_sites: usize },
}

/// A full run's configuration as understood by the pipeline.
///
/// Derived from CLI flags (plus environment and defaults).
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Required for every source except `Synthetic`.
    pub catalog_path: Option<PathBuf>,
    pub source: GraphSource,
    /// Elements whose natural occurrence ended at or earlier than this age (Ga) are dropped.
    pub cutoff_ga: f64,
    pub age_range: AgeRange,
    pub zero_policy: ZeroPolicy,
    /// Worker threads for extraction; `Some(1)` forces sequential execution.
    pub jobs: Option<usize>,
    pub candidates: Vec<FitSpec>,
    pub export_stats: Option<PathBuf>,
    pub export_fits: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_range_rejects_inverted_bounds() {
        assert!(AgeRange::new(1.0, 2.0).is_err());
        assert!(AgeRange::new(4.5, -0.1).is_err());
        assert!(AgeRange::new(4.5, 0.0).is_ok());
    }

    #[test]
    fn age_range_is_inclusive_on_both_bounds() {
        let range = AgeRange::new(2.5, 1.0).unwrap();
        assert!(range.overlaps(Some(1.0), Some(0.5)));
        assert!(range.overlaps(Some(3.0), Some(2.5)));
        assert!(!range.overlaps(Some(0.9), Some(0.1)));
        assert!(!range.overlaps(Some(3.0), Some(2.6)));
        assert!(range.overlaps(None, None));
    }

    #[test]
    fn log_transform_is_undefined_at_zero() {
        assert_eq!(Transform::Log.apply(0.0), None);
        assert_eq!(Transform::Log.apply(-2.0), None);
        assert_eq!(Transform::Linear.apply(0.0), Some(0.0));
        assert!((Transform::Log.apply(std::f64::consts::E).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn fit_spec_label_shows_transforms() {
        let spec = FitSpec {
            response: Variable::Minerals,
            predictor: Variable::Elements,
            response_transform: Transform::Log,
            predictor_transform: Transform::Linear,
        };
        assert_eq!(spec.label(), "ln(n_minerals) ~ n_elements");
    }
}
