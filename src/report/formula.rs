//! Closed-form equation strings for fitted lines.

use crate::domain::ModelFit;
use crate::error::AppError;

/// Render `Y = {slope}X ± {|intercept|}`.
///
/// Both coefficients are rounded to 3 decimals with trailing zeros trimmed. The
/// sign is taken from the intercept itself, so the printed magnitude is never
/// negative. Non-finite coefficients are rejected rather than printed.
pub fn format_equation(slope: f64, intercept: f64) -> Result<String, AppError> {
    if !(slope.is_finite() && intercept.is_finite()) {
        return Err(AppError::degenerate(format!(
            "Cannot format an equation from non-finite coefficients (slope={slope}, intercept={intercept})."
        )));
    }

    let sign = if intercept < 0.0 { '-' } else { '+' };
    Ok(format!(
        "Y = {}X {sign} {}",
        format_coefficient(slope),
        format_coefficient(intercept.abs())
    ))
}

/// The equation string of a fitted model.
pub fn format_fit(fit: &ModelFit) -> Result<String, AppError> {
    format_equation(fit.slope, fit.intercept)
}

/// Round to 3 decimals and drop redundant zeros: `2.500 -> 2.5`, `-1.000 -> -1`.
pub fn format_coefficient(v: f64) -> String {
    let s = format!("{v:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "-0" => "0".to_string(),
        _ => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_intercept_uses_minus_sign() {
        assert_eq!(format_equation(2.5, -3.2).unwrap(), "Y = 2.5X - 3.2");
    }

    #[test]
    fn zero_intercept_is_plus_zero() {
        assert_eq!(format_equation(-1.0, 0.0).unwrap(), "Y = -1X + 0");
    }

    #[test]
    fn rounds_to_three_decimals() {
        assert_eq!(format_equation(0.123_456, 10.000_4).unwrap(), "Y = 0.123X + 10");
        assert_eq!(format_equation(1.0005e3, -0.0126).unwrap(), "Y = 1000.5X - 0.013");
    }

    #[test]
    fn tiny_negative_slope_does_not_print_negative_zero() {
        assert_eq!(format_coefficient(-0.0001), "0");
        assert_eq!(format_coefficient(120.0), "120");
    }

    #[test]
    fn tiny_negative_intercept_keeps_its_sign() {
        assert_eq!(format_equation(1.0, -0.0001).unwrap(), "Y = 1X - 0");
    }

    #[test]
    fn non_finite_coefficients_are_rejected() {
        assert!(format_equation(f64::NAN, 1.0).is_err());
        assert!(format_equation(1.0, f64::INFINITY).is_err());
    }
}
