//! Residual diagnostics for manual model choice.
//!
//! For each fitted candidate we expose a normal Q-Q table: ordered standardized
//! residuals against standard normal quantiles at plotting positions
//! `(i - 0.5) / n`. The probability-plot correlation of that table summarizes how
//! straight the Q-Q line is (1.0 = perfectly normal residuals). Nothing here
//! picks a model; it only informs the analyst.

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};

use crate::domain::{FitSpec, ModelFit, Residual};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QqPoint {
    pub symbol: String,
    pub theoretical: f64,
    /// Residual divided by the sample standard deviation of residuals.
    pub sample: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QqSummary {
    pub spec: FitSpec,
    pub points: Vec<QqPoint>,
    /// Pearson correlation between theoretical and sample quantiles.
    pub correlation: Option<f64>,
}

pub fn qq_summary(fit: &ModelFit) -> QqSummary {
    let points = qq_points(&fit.residuals);
    let correlation = qq_correlation(&points);
    QqSummary {
        spec: fit.spec,
        points,
        correlation,
    }
}

/// Ordered standardized residuals paired with normal quantiles.
pub fn qq_points(residuals: &[Residual]) -> Vec<QqPoint> {
    let n = residuals.len();
    if n == 0 {
        return Vec::new();
    }

    let mean = residuals.iter().map(|r| r.residual).sum::<f64>() / n as f64;
    let sd = if n > 1 {
        let var = residuals
            .iter()
            .map(|r| (r.residual - mean).powi(2))
            .sum::<f64>()
            / (n as f64 - 1.0);
        var.sqrt()
    } else {
        0.0
    };

    let Ok(standard) = Normal::new(0.0, 1.0) else {
        return Vec::new();
    };

    let mut sorted: Vec<&Residual> = residuals.iter().collect();
    sorted.sort_by(|a, b| a.residual.total_cmp(&b.residual));

    sorted
        .into_iter()
        .enumerate()
        .filter_map(|(i, r)| {
            let p = (i as f64 + 0.5) / n as f64;
            let theoretical = standard.inverse_cdf(p);
            if !theoretical.is_finite() {
                return None;
            }
            let sample = if sd > 0.0 { (r.residual - mean) / sd } else { 0.0 };
            Some(QqPoint {
                symbol: r.symbol.clone(),
                theoretical,
                sample,
            })
        })
        .collect()
}

/// Probability-plot correlation coefficient, `None` when undefined.
pub fn qq_correlation(points: &[QqPoint]) -> Option<f64> {
    let n = points.len();
    if n < 3 {
        return None;
    }
    let mx = points.iter().map(|p| p.theoretical).sum::<f64>() / n as f64;
    let my = points.iter().map(|p| p.sample).sum::<f64>() / n as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for p in points {
        let dx = p.theoretical - mx;
        let dy = p.sample - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    let r = sxy / (sxx * syy).sqrt();
    r.is_finite().then_some(r)
}
