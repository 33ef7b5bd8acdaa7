//! LOWESS scatterplot smoothing.
//!
//! Locally weighted linear regression with a tricube kernel over the
//! `frac · n` nearest neighbours of each point, followed by bisquare
//! robustness iterations that down-weight outliers (Cleveland, 1979).

use crate::{descriptive, regression::RegressionError};

/// Tuning parameters for [`lowess`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LowessParams {
    /// Fraction of the data used for each local fit.
    pub frac: f64,
    /// Number of robustifying iterations after the initial fit.
    pub iterations: usize,
}

impl Default for LowessParams {
    fn default() -> Self {
        Self {
            frac: 2.0 / 3.0,
            iterations: 3,
        }
    }
}

/// A point on the smoothed curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedPoint {
    pub x: f64,
    pub y: f64,
}

/// Smooths `y` against `x`.
///
/// The returned points are ordered by ascending `x`.
///
/// # Errors
///
/// Returns [`RegressionError::LengthMismatch`] if `x` and `y` differ in
/// length and [`RegressionError::NonFinite`] if any value is not finite.
///
/// # Examples
///
/// ```
/// use ratio_stats::smoothing::{lowess, LowessParams};
///
/// let x = [3.0, 1.0, 2.0, 4.0, 5.0];
/// let y = [6.0, 2.0, 4.0, 8.0, 10.0];
/// let curve = lowess(&x, &y, LowessParams::default()).unwrap();
///
/// assert_eq!(curve.len(), 5);
/// assert_eq!(curve[0].x, 1.0);
/// assert!((curve[2].y - 6.0).abs() < 1e-9);
/// ```
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn lowess(
    x: &[f64],
    y: &[f64],
    params: LowessParams,
) -> Result<Vec<SmoothedPoint>, RegressionError> {
    if x.len() != y.len() {
        return Err(RegressionError::LengthMismatch {
            x_len: x.len(),
            y_len: y.len(),
        });
    }
    if let Some(index) = x
        .iter()
        .zip(y)
        .position(|(xi, yi)| !xi.is_finite() || !yi.is_finite())
    {
        return Err(RegressionError::NonFinite { index });
    }

    let n = x.len();
    let mut points = x.iter().copied().zip(y.iter().copied()).collect::<Vec<_>>();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    let (xs, ys): (Vec<f64>, Vec<f64>) = points.into_iter().unzip();

    if n < 2 {
        return Ok(xs
            .into_iter()
            .zip(ys)
            .map(|(x, y)| SmoothedPoint { x, y })
            .collect());
    }

    let span = ((params.frac * n as f64).floor() as usize).clamp(2, n);
    let mut robustness = vec![1.0; n];
    let mut fitted = vec![0.0; n];

    for iteration in 0..=params.iterations {
        let mut left = 0;
        let mut right = span - 1;
        for i in 0..n {
            while right + 1 < n && xs[i] - xs[left] > xs[right + 1] - xs[i] {
                left += 1;
                right += 1;
            }
            let (lo, hi) = widen_over_ties(&xs, left, right);
            fitted[i] = local_fit(&xs, &ys, &robustness, i, lo, hi);
        }

        if iteration == params.iterations {
            break;
        }

        let residuals = ys
            .iter()
            .zip(&fitted)
            .map(|(y, f)| y - f)
            .collect::<Vec<_>>();
        let abs_residuals = residuals.iter().map(|r| r.abs()).collect::<Vec<_>>();
        let scale = descriptive::median(&abs_residuals).unwrap_or(0.0);
        if scale <= f64::EPSILON * ys.iter().map(|v| v.abs()).fold(0.0, f64::max) {
            break;
        }
        for (weight, r) in robustness.iter_mut().zip(&residuals) {
            *weight = bisquare(r / (6.0 * scale));
        }
    }

    Ok(xs
        .into_iter()
        .zip(fitted)
        .map(|(x, y)| SmoothedPoint { x, y })
        .collect())
}

/// Extends `left..=right` so that points tied with either edge are inside.
fn widen_over_ties(xs: &[f64], mut left: usize, mut right: usize) -> (usize, usize) {
    while left > 0 && xs[left - 1] == xs[left] {
        left -= 1;
    }
    while right + 1 < xs.len() && xs[right + 1] == xs[right] {
        right += 1;
    }
    (left, right)
}

/// Weighted linear fit over `left..=right`, evaluated at `xs[i]`.
fn local_fit(
    xs: &[f64],
    ys: &[f64],
    robustness: &[f64],
    i: usize,
    left: usize,
    right: usize,
) -> f64 {
    let x0 = xs[i];
    let radius = (x0 - xs[left]).max(xs[right] - x0);

    let mut weights = Vec::with_capacity(right - left + 1);
    for j in left..=right {
        let kernel = if radius > 0.0 {
            tricube((xs[j] - x0).abs() / radius)
        } else {
            1.0
        };
        weights.push(kernel * robustness[j]);
    }

    let total = weights.iter().sum::<f64>();
    if total <= 0.0 {
        return ys[i];
    }
    let window = left..=right;
    let x_mean = window
        .clone()
        .zip(&weights)
        .map(|(j, w)| w * xs[j])
        .sum::<f64>()
        / total;
    let y_mean = window
        .clone()
        .zip(&weights)
        .map(|(j, w)| w * ys[j])
        .sum::<f64>()
        / total;

    let (sxx, sxy) = window
        .zip(&weights)
        .fold((0.0, 0.0), |(sxx, sxy), (j, w)| {
            let dx = xs[j] - x_mean;
            (sxx + w * dx * dx, sxy + w * dx * (ys[j] - y_mean))
        });

    if sxx > f64::EPSILON * radius * radius * total {
        y_mean + sxy / sxx * (x0 - x_mean)
    } else {
        y_mean
    }
}

fn tricube(u: f64) -> f64 {
    if u >= 1.0 {
        0.0
    } else {
        (1.0 - u.powi(3)).powi(3)
    }
}

fn bisquare(u: f64) -> f64 {
    if u.abs() >= 1.0 {
        0.0
    } else {
        (1.0 - u * u).powi(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_data_is_reproduced() {
        let x = (0..20).map(f64::from).collect::<Vec<_>>();
        let y = x.iter().map(|v| 0.5 * v - 3.0).collect::<Vec<_>>();
        let curve = lowess(&x, &y, LowessParams::default()).unwrap();
        for (point, expected) in curve.iter().zip(&y) {
            assert!((point.y - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_output_sorted_by_x() {
        let x = [5.0, -1.0, 3.0, 0.5, 2.0];
        let y = [1.0, 2.0, 3.0, 4.0, 5.0];
        let curve = lowess(&x, &y, LowessParams::default()).unwrap();
        assert!(curve.is_sorted_by(|a, b| a.x <= b.x));
    }

    #[test]
    fn test_outlier_is_downweighted() {
        let x = (0..30).map(f64::from).collect::<Vec<_>>();
        let mut y = x.clone();
        y[15] = 100.0;
        let robust = lowess(&x, &y, LowessParams::default()).unwrap();
        let plain = lowess(
            &x,
            &y,
            LowessParams {
                iterations: 0,
                ..LowessParams::default()
            },
        )
        .unwrap();
        assert!((robust[15].y - 15.0).abs() < (plain[15].y - 15.0).abs());
    }

    #[test]
    fn test_tied_x_values() {
        let x = [1.0, 1.0, 1.0];
        let y = [1.0, 2.0, 3.0];
        let curve = lowess(&x, &y, LowessParams::default()).unwrap();
        for point in curve {
            assert!((point.y - 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_ties_at_window_edge_do_not_depend_on_order() {
        // Two-point span, three-way tie at x = 0
        let params = LowessParams {
            frac: 0.5,
            iterations: 0,
        };
        let x = [0.0, 0.0, 0.0, 10.0];
        let forward = lowess(&x, &[0.0, 3.0, 6.0, 10.0], params).unwrap();
        let shuffled = lowess(&x, &[6.0, 0.0, 3.0, 10.0], params).unwrap();
        for curve in [forward, shuffled] {
            let ys = curve.iter().map(|p| p.y).collect::<Vec<_>>();
            assert_eq!(ys, [3.0, 3.0, 3.0, 10.0]);
        }
    }

    #[test]
    fn test_empty_and_single() {
        assert!(lowess(&[], &[], LowessParams::default()).unwrap().is_empty());
        let single = lowess(&[2.0], &[7.0], LowessParams::default()).unwrap();
        assert_eq!(single, vec![SmoothedPoint { x: 2.0, y: 7.0 }]);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(lowess(&[1.0, 2.0], &[1.0], LowessParams::default()).is_err());
    }
}
