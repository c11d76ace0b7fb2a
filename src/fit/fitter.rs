//! Fitting a single candidate form.
//!
//! Given the aggregated table and a `FitSpec`, we:
//! - pull the response and predictor columns as `f64`
//! - apply the requested transforms, resolving undefined values per `ZeroPolicy`
//! - solve OLS on the transformed pairs
//! - keep per-element residuals for diagnostics

use tracing::debug;

use crate::domain::{ElementStats, FitSpec, ModelFit, Residual, ZeroPolicy};
use crate::error::AppError;
use crate::math::fit_line;
use crate::report::formula::format_equation;

/// A transformed (x, y) observation tied to its element.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub symbol: String,
    pub x: f64,
    pub y: f64,
}

/// Transformed observations for one fit form, plus the symbols that were excluded.
#[derive(Debug, Clone, Default)]
pub struct PreparedData {
    pub observations: Vec<Observation>,
    pub excluded: Vec<String>,
}

/// Apply the form's transforms to every row.
///
/// A row is undefined when either transformed value is undefined (log of a
/// zero or negative count). Under `Exclude` such rows are set aside; under
/// `Fail` the first one aborts this fit.
pub fn prepare(table: &[ElementStats], spec: &FitSpec, policy: ZeroPolicy) -> Result<PreparedData, AppError> {
    let mut out = PreparedData {
        observations: Vec::with_capacity(table.len()),
        excluded: Vec::new(),
    };

    for row in table {
        let raw_x = row.record.value(spec.predictor);
        let raw_y = row.record.value(spec.response);
        let x = spec.predictor_transform.apply(raw_x);
        let y = spec.response_transform.apply(raw_y);

        match (x, y) {
            (Some(x), Some(y)) => out.observations.push(Observation {
                symbol: row.symbol().to_string(),
                x,
                y,
            }),
            _ => match policy {
                ZeroPolicy::Exclude => out.excluded.push(row.symbol().to_string()),
                ZeroPolicy::Fail => {
                    return Err(AppError::undefined_transform(format!(
                        "{}: element '{}' has {}={} and {}={}, which the transform cannot take.",
                        spec.label(),
                        row.symbol(),
                        spec.predictor.column_name(),
                        raw_x,
                        spec.response.column_name(),
                        raw_y
                    )));
                }
            },
        }
    }

    Ok(out)
}

/// Fit one candidate form over the aggregated table.
pub fn fit(table: &[ElementStats], spec: &FitSpec, policy: ZeroPolicy) -> Result<ModelFit, AppError> {
    let prepared = prepare(table, spec, policy)?;
    if !prepared.excluded.is_empty() {
        debug!(
            fit = %spec.label(),
            excluded = prepared.excluded.len(),
            "excluded rows with undefined transform"
        );
    }

    let x: Vec<f64> = prepared.observations.iter().map(|o| o.x).collect();
    let y: Vec<f64> = prepared.observations.iter().map(|o| o.y).collect();

    let line = fit_line(&x, &y).map_err(|e| {
        AppError::new(e.kind(), format!("{}: {}", spec.label(), e.message()))
    })?;

    let residuals = prepared
        .observations
        .iter()
        .map(|o| {
            let y_fit = line.predict(o.x);
            Residual {
                symbol: o.symbol.clone(),
                x: o.x,
                y_obs: o.y,
                y_fit,
                residual: o.y - y_fit,
            }
        })
        .collect();

    let equation = format_equation(line.slope, line.intercept)?;

    Ok(ModelFit {
        spec: *spec,
        slope: line.slope,
        intercept: line.intercept,
        r_squared: line.r_squared,
        equation,
        n_used: prepared.observations.len(),
        excluded: prepared.excluded,
        residuals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ElementMeta, ElementNetworkRecord, Transform, Variable};
    use crate::error::ErrorKind;

    fn row(symbol: &str, n_elements: u64, n_minerals: u64, n_localities: u64) -> ElementStats {
        ElementStats {
            record: ElementNetworkRecord {
                symbol: symbol.to_string(),
                n_elements,
                n_minerals,
                n_localities,
            },
            meta: ElementMeta::default(),
        }
    }

    fn log_log() -> FitSpec {
        FitSpec {
            response: Variable::Minerals,
            predictor: Variable::Elements,
            response_transform: Transform::Log,
            predictor_transform: Transform::Log,
        }
    }

    #[test]
    fn linear_fit_recovers_known_line() {
        let table: Vec<ElementStats> = (1..=10u64)
            .map(|i| row(&format!("E{i}"), i, 3 * i + 2, 10))
            .collect();
        let fit = fit(&table, &FitSpec::linear(Variable::Minerals, Variable::Elements), ZeroPolicy::Fail).unwrap();
        assert!((fit.slope - 3.0).abs() < 1e-9);
        assert!((fit.intercept - 2.0).abs() < 1e-9);
        assert_eq!(fit.r_squared_rounded(), 1.0);
        assert_eq!(fit.equation, "Y = 3X + 2");
        assert_eq!(fit.n_used, 10);
        assert!(fit.residuals.iter().all(|r| r.residual.abs() < 1e-9));
    }

    #[test]
    fn zero_rows_are_excluded_from_log_fits() {
        let table = vec![
            row("A", 1, 2, 0),
            row("B", 2, 4, 0),
            row("C", 4, 8, 0),
            row("Tc", 0, 0, 0),
        ];
        let fit = fit(&table, &log_log(), ZeroPolicy::Exclude).unwrap();
        assert_eq!(fit.excluded, vec!["Tc".to_string()]);
        assert_eq!(fit.n_used, 3);
        assert!((fit.slope - 1.0).abs() < 1e-9);
        assert!((fit.intercept - 2f64.ln()).abs() < 1e-9);
    }

    #[test]
    fn zero_rows_fail_fast_when_requested() {
        let table = vec![row("A", 1, 2, 0), row("Tc", 0, 0, 0), row("B", 2, 5, 0)];
        let err = fit(&table, &log_log(), ZeroPolicy::Fail).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UndefinedTransform);
        assert!(err.message().contains("'Tc'"));
    }

    #[test]
    fn zero_counts_are_fine_for_linear_fits() {
        let table = vec![row("A", 0, 1, 0), row("B", 1, 3, 0), row("C", 2, 5, 0)];
        let fit = fit(&table, &FitSpec::linear(Variable::Minerals, Variable::Elements), ZeroPolicy::Fail).unwrap();
        assert!(fit.excluded.is_empty());
        assert!((fit.slope - 2.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_fit_names_the_relationship() {
        let table = vec![row("A", 3, 1, 0), row("B", 3, 2, 0)];
        let err = fit(&table, &FitSpec::linear(Variable::Minerals, Variable::Elements), ZeroPolicy::Exclude)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DegenerateFit);
        assert!(err.message().starts_with("n_minerals ~ n_elements"));
    }
}
