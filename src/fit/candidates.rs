//! Candidate forms and batch fitting.
//!
//! The analysis fits a fixed list of forms chosen by the analyst:
//!
//! - minerals vs elements, under all four combinations of linear/log response
//!   and predictor (the analyst picks one by inspecting residual normality)
//! - localities vs elements, linear
//! - localities vs minerals, linear
//!
//! The list is just data, so it can be replaced from the command line. Each form
//! is fitted independently: a degenerate or undefined fit is recorded next to
//! the successful ones instead of aborting the batch.

use tracing::{info, warn};

use crate::domain::{ElementStats, FitSpec, ModelFit, Transform, Variable, ZeroPolicy};
use crate::error::AppError;
use crate::fit::fitter::fit;

/// Output of fitting every candidate.
#[derive(Debug, Clone)]
pub struct FitReport {
    /// Successful fits, in candidate order.
    pub fits: Vec<ModelFit>,
    /// Candidates that could not be fitted and why.
    pub failed: Vec<(FitSpec, AppError)>,
}

impl FitReport {
    pub fn get(&self, spec: &FitSpec) -> Option<&ModelFit> {
        self.fits.iter().find(|f| f.spec == *spec)
    }
}

/// The four transform combinations for `response ~ predictor`.
pub fn transform_grid(response: Variable, predictor: Variable) -> Vec<FitSpec> {
    [
        (Transform::Linear, Transform::Linear),
        (Transform::Log, Transform::Linear),
        (Transform::Log, Transform::Log),
        (Transform::Linear, Transform::Log),
    ]
    .into_iter()
    .map(|(response_transform, predictor_transform)| FitSpec {
        response,
        predictor,
        response_transform,
        predictor_transform,
    })
    .collect()
}

/// The standard analysis: four minerals~elements forms plus two linear locality fits.
pub fn default_candidates() -> Vec<FitSpec> {
    let mut out = transform_grid(Variable::Minerals, Variable::Elements);
    out.push(FitSpec::linear(Variable::Localities, Variable::Elements));
    out.push(FitSpec::linear(Variable::Localities, Variable::Minerals));
    out
}

/// Fit every candidate independently.
pub fn fit_candidates(table: &[ElementStats], candidates: &[FitSpec], policy: ZeroPolicy) -> FitReport {
    let mut fits = Vec::with_capacity(candidates.len());
    let mut failed = Vec::new();

    for spec in candidates {
        match fit(table, spec, policy) {
            Ok(model) => {
                info!(
                    fit = %spec.label(),
                    equation = %model.equation,
                    r_squared = model.r_squared_rounded(),
                    n = model.n_used,
                    "fitted candidate"
                );
                fits.push(model);
            }
            Err(e) => {
                warn!(fit = %spec.label(), error = %e, "candidate fit failed");
                failed.push((*spec, e));
            }
        }
    }

    FitReport { fits, failed }
}

/// Parse a candidate written like its label: `ln(minerals) ~ elements`.
///
/// Variable names may carry the `n_` prefix; `log(...)` is accepted for `ln(...)`.
pub fn parse_fit_spec(s: &str) -> Result<FitSpec, String> {
    let (lhs, rhs) = s
        .split_once('~')
        .ok_or_else(|| format!("Expected `response ~ predictor`, got '{s}'."))?;
    let (response_transform, response) = parse_term(lhs)?;
    let (predictor_transform, predictor) = parse_term(rhs)?;
    if response == predictor {
        return Err(format!("Response and predictor are both '{}'.", response.display_name()));
    }
    Ok(FitSpec {
        response,
        predictor,
        response_transform,
        predictor_transform,
    })
}

fn parse_term(term: &str) -> Result<(Transform, Variable), String> {
    let term = term.trim();
    let lower = term.to_ascii_lowercase();

    let (transform, name) = ["ln(", "log("]
        .iter()
        .find_map(|prefix| {
            lower
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_suffix(')'))
                .map(|inner| (Transform::Log, inner.trim().to_string()))
        })
        .unwrap_or((Transform::Linear, lower.clone()));

    let variable = match name.strip_prefix("n_").unwrap_or(name.as_str()) {
        "elements" => Variable::Elements,
        "minerals" => Variable::Minerals,
        "localities" => Variable::Localities,
        other => return Err(format!("Unknown variable '{other}' in '{term}'.")),
    };
    Ok((transform, variable))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ElementMeta, ElementNetworkRecord};

    fn table() -> Vec<ElementStats> {
        [(1, 3, 10), (2, 5, 30), (3, 9, 35), (5, 12, 70), (8, 20, 90)]
            .iter()
            .enumerate()
            .map(|(i, &(e, m, l))| ElementStats {
                record: ElementNetworkRecord {
                    symbol: format!("E{i}"),
                    n_elements: e,
                    n_minerals: m,
                    n_localities: l,
                },
                meta: ElementMeta::default(),
            })
            .collect()
    }

    #[test]
    fn default_candidates_cover_the_standard_analysis() {
        let candidates = default_candidates();
        assert_eq!(candidates.len(), 6);
        let labels: Vec<String> = candidates.iter().map(FitSpec::label).collect();
        assert_eq!(
            labels,
            vec![
                "n_minerals ~ n_elements",
                "ln(n_minerals) ~ n_elements",
                "ln(n_minerals) ~ ln(n_elements)",
                "n_minerals ~ ln(n_elements)",
                "n_localities ~ n_elements",
                "n_localities ~ n_minerals",
            ]
        );
    }

    #[test]
    fn all_candidates_fit_on_well_formed_table() {
        let report = fit_candidates(&table(), &default_candidates(), ZeroPolicy::Exclude);
        assert_eq!(report.fits.len(), 6);
        assert!(report.failed.is_empty());
        for fit in &report.fits {
            assert!((0.0..=1.0).contains(&fit.r_squared));
        }
    }

    #[test]
    fn one_failing_candidate_does_not_abort_the_others() {
        let mut rows = table();
        for row in &mut rows {
            row.record.n_localities = 42;
        }
        let report = fit_candidates(&rows, &default_candidates(), ZeroPolicy::Exclude);
        assert_eq!(report.fits.len(), 4);
        assert_eq!(report.failed.len(), 2);
        assert!(report.get(&FitSpec::linear(Variable::Minerals, Variable::Elements)).is_some());
    }

    #[test]
    fn parses_labels_back_into_specs() {
        for spec in default_candidates() {
            assert_eq!(parse_fit_spec(&spec.label()).unwrap(), spec);
        }
        let spec = parse_fit_spec("log(minerals)~Elements").unwrap();
        assert_eq!(spec.response_transform, Transform::Log);
        assert_eq!(spec.predictor, Variable::Elements);
    }

    #[test]
    fn rejects_malformed_specs() {
        assert!(parse_fit_spec("minerals elements").is_err());
        assert!(parse_fit_spec("minerals ~ rocks").is_err());
        assert!(parse_fit_spec("minerals ~ ln(minerals)").is_err());
    }
}
