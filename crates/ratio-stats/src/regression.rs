//! Ordinary least squares for a single regressor with an intercept.
//!
//! Fits `y = a + b·x` and reports the usual inference quantities
//! (standard errors, t statistic and two-sided p-value of the slope)
//! using Student's t with `n − 2` residual degrees of freedom.
//!
//! Two observations determine the line exactly but leave no residual
//! degrees of freedom; the inference quantities of such a fit are NaN.
//!
//! # Examples
//!
//! ```
//! use ratio_stats::regression::LinearFit;
//!
//! let x = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let y = [2.1, 3.9, 6.2, 7.8, 10.1];
//! let fit = LinearFit::fit(&x, &y).unwrap();
//!
//! assert!((fit.slope - 1.99).abs() < 1e-9);
//! assert!(fit.slope_p_value < 0.001);
//! ```

use crate::special;

/// Minimum number of observations for a fit.
pub const MIN_OBSERVATIONS: usize = 2;

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum RegressionError {
    #[display("x and y must have the same length (x: {x_len}, y: {y_len})")]
    LengthMismatch { x_len: usize, y_len: usize },
    #[display("at least {required} observations are required, got {actual}")]
    TooFewObservations { required: usize, actual: usize },
    #[display("observation {index} is not finite")]
    NonFinite { index: usize },
    #[display("design matrix is rank deficient: all x values are identical")]
    RankDeficient,
}

/// Result of fitting `y = intercept + slope·x`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    /// Number of observations.
    pub observations: usize,
    pub intercept: f64,
    pub slope: f64,
    pub intercept_std_err: f64,
    pub slope_std_err: f64,
    /// `slope / slope_std_err`.
    pub slope_t: f64,
    /// Two-sided p-value of the slope, NaN without residual degrees of freedom.
    pub slope_p_value: f64,
    /// Coefficient of determination.
    pub r_squared: f64,
    /// Residual degrees of freedom (`n − 2`).
    pub residual_df: usize,
}

impl LinearFit {
    /// Fits the model by least squares.
    ///
    /// # Errors
    ///
    /// * [`RegressionError::LengthMismatch`] - `x` and `y` differ in length
    /// * [`RegressionError::TooFewObservations`] - fewer than [`MIN_OBSERVATIONS`] points
    /// * [`RegressionError::NonFinite`] - any value is NaN or infinite
    /// * [`RegressionError::RankDeficient`] - `x` has no variation
    #[expect(clippy::cast_precision_loss)]
    pub fn fit(x: &[f64], y: &[f64]) -> Result<Self, RegressionError> {
        if x.len() != y.len() {
            return Err(RegressionError::LengthMismatch {
                x_len: x.len(),
                y_len: y.len(),
            });
        }
        let observations = x.len();
        if observations < MIN_OBSERVATIONS {
            return Err(RegressionError::TooFewObservations {
                required: MIN_OBSERVATIONS,
                actual: observations,
            });
        }
        if let Some(index) = x
            .iter()
            .zip(y)
            .position(|(xi, yi)| !xi.is_finite() || !yi.is_finite())
        {
            return Err(RegressionError::NonFinite { index });
        }

        let n = observations as f64;
        let x_mean = x.iter().sum::<f64>() / n;
        let y_mean = y.iter().sum::<f64>() / n;

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        let mut syy = 0.0;
        for (xi, yi) in x.iter().zip(y) {
            let dx = xi - x_mean;
            let dy = yi - y_mean;
            sxx += dx * dx;
            sxy += dx * dy;
            syy += dy * dy;
        }

        // Relative tolerance: identical x values can leave rounding noise in sxx.
        let x_scale = x.iter().map(|v| v * v).sum::<f64>();
        if sxx <= f64::EPSILON * x_scale || x.iter().all(|&v| v == x[0]) {
            return Err(RegressionError::RankDeficient);
        }

        let slope = sxy / sxx;
        let intercept = y_mean - slope * x_mean;

        let rss = x
            .iter()
            .zip(y)
            .map(|(xi, yi)| (yi - intercept - slope * xi).powi(2))
            .sum::<f64>();
        let residual_df = observations - 2;
        let sigma_squared = if residual_df > 0 {
            rss / residual_df as f64
        } else {
            f64::NAN
        };

        let slope_std_err = (sigma_squared / sxx).sqrt();
        let intercept_std_err = (sigma_squared * (1.0 / n + x_mean * x_mean / sxx)).sqrt();

        let (slope_t, slope_p_value) = if residual_df == 0 {
            (f64::NAN, f64::NAN)
        } else if slope_std_err > 0.0 {
            let t = slope / slope_std_err;
            (t, special::students_t_two_sided_p(t, residual_df as f64))
        } else if slope == 0.0 {
            // exact fit with a flat line
            (0.0, 1.0)
        } else {
            (slope.signum() * f64::INFINITY, 0.0)
        };

        let r_squared = if syy > 0.0 { 1.0 - rss / syy } else { 1.0 };

        Ok(Self {
            observations,
            intercept,
            slope,
            intercept_std_err,
            slope_std_err,
            slope_t,
            slope_p_value,
            r_squared,
            residual_df,
        })
    }

    /// Predicted response at `x`.
    #[must_use]
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_line() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [3.0, 5.0, 7.0, 9.0];
        let fit = LinearFit::fit(&x, &y).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
        assert_eq!(fit.residual_df, 2);
        assert!(fit.slope_p_value < 1e-6);
        assert!((fit.predict(10.0) - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_response() {
        let fit = LinearFit::fit(&[1.0, 2.0, 3.0], &[0.5, 0.5, 0.5]).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.slope_t, 0.0);
        assert_eq!(fit.slope_p_value, 1.0);
    }

    #[test]
    fn test_known_inference() {
        // y = x + alternating noise; hand-computed with the textbook formulas
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = [1.5, 1.5, 3.5, 3.5, 5.5, 5.5];
        let fit = LinearFit::fit(&x, &y).unwrap();

        // sxx = 17.5, sxy = 16.0
        assert!((fit.slope - 16.0 / 17.5).abs() < 1e-12);
        let rss: f64 = x
            .iter()
            .zip(&y)
            .map(|(xi, yi)| (yi - fit.predict(*xi)).powi(2))
            .sum();
        let se = (rss / 4.0 / 17.5).sqrt();
        assert!((fit.slope_std_err - se).abs() < 1e-12);
        assert!((fit.slope_t - fit.slope / se).abs() < 1e-9);
        assert!(fit.slope_p_value > 0.0 && fit.slope_p_value < 0.01);
    }

    #[test]
    fn test_negative_slope_p_value_is_two_sided() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let up = [1.0, 2.5, 2.8, 4.4, 5.1];
        let down = up.map(|v| -v);
        let a = LinearFit::fit(&x, &up).unwrap();
        let b = LinearFit::fit(&x, &down).unwrap();
        assert!((a.slope + b.slope).abs() < 1e-12);
        assert!((a.slope_p_value - b.slope_p_value).abs() < 1e-12);
    }

    #[test]
    fn test_rank_deficient() {
        let err = LinearFit::fit(&[17.2, 17.2, 17.2], &[0.1, 0.2, 0.3]).unwrap_err();
        assert_eq!(err, RegressionError::RankDeficient);
    }

    #[test]
    fn test_two_observations_have_no_inference() {
        let fit = LinearFit::fit(&[1.0, 3.0], &[1.0, 2.0]).unwrap();
        assert!((fit.slope - 0.5).abs() < 1e-12);
        assert!((fit.intercept - 0.5).abs() < 1e-12);
        assert_eq!(fit.residual_df, 0);
        assert!(fit.slope_std_err.is_nan());
        assert!(fit.slope_p_value.is_nan());
    }

    #[test]
    fn test_too_few_observations() {
        let err = LinearFit::fit(&[1.0], &[1.0]).unwrap_err();
        assert_eq!(
            err,
            RegressionError::TooFewObservations {
                required: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_length_mismatch() {
        let err = LinearFit::fit(&[1.0, 2.0, 3.0], &[1.0, 2.0]).unwrap_err();
        assert_eq!(err, RegressionError::LengthMismatch { x_len: 3, y_len: 2 });
    }

    #[test]
    fn test_non_finite() {
        let err = LinearFit::fit(&[1.0, f64::NAN, 3.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(err, RegressionError::NonFinite { index: 1 });
    }
}
