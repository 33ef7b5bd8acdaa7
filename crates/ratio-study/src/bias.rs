//! Price-related bias (PRB)
//!
//! PRB measures how assessment ratios change as value rises. Each parcel's
//! percentage deviation from the median ratio is regressed on the base-2
//! logarithm of a value proxy that blends sale price and normalized
//! predicted value:
//!
//! ```text
//! ratio_i     = predicted_i / sale_price_i
//! proxy_i     = 0.5 · sale_price_i + 0.5 · predicted_i / median(predicted)
//! log_value_i = log2(proxy_i)
//! pct_diff_i  = (ratio_i − median(ratio)) / median(ratio)
//!
//! pct_diff = a + PRB · log_value
//! ```
//!
//! The slope is the PRB coefficient: the percentage change in the ratio for
//! a doubling of value. A negative, significant coefficient indicates
//! regressivity (higher-valued parcels are under-assessed relative to
//! lower-valued ones).
//!
//! # Diagnostic plots
//!
//! A [`BiasPlotRenderer`] may be passed to receive the derived regression
//! data for a scatter plot. Rendering never affects the computed result.
//!
//! # Examples
//!
//! ```
//! use ratio_study::bias::price_related_bias;
//!
//! let predicted = [131_670.0, 152_820.0, 187_200.0, 241_560.0, 283_680.0, 357_570.0];
//! let prices = [139_500.0, 155_000.0, 240_000.0, 294_000.0, 335_000.0, 427_900.0];
//!
//! let prb = price_related_bias(&predicted, &prices).unwrap();
//! assert!(prb.coefficient < 0.0);
//! assert!((0.0..=1.0).contains(&prb.significance));
//! ```

use ratio_stats::regression::LinearFit;

use crate::{
    error::{DegenerateReason, RatioStudyError},
    measures::{self, median_of},
};

/// The PRB coefficient and its two-sided p-value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiasResult {
    pub coefficient: f64,
    pub significance: f64,
}

/// Receiver of the bias regression's scatter data.
///
/// Implementations might draw a chart, export the points, or capture them
/// for later inspection.
pub trait BiasPlotRenderer {
    /// Called with the regressor (`log2` value proxy) and the response
    /// (percentage deviation from the median ratio), aligned by parcel.
    fn render(&mut self, log_value: &[f64], pct_diff: &[f64]);
}

/// Renderer that keeps a copy of the scatter data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapturedPlot {
    pub log_value: Vec<f64>,
    pub pct_diff: Vec<f64>,
}

impl BiasPlotRenderer for CapturedPlot {
    fn render(&mut self, log_value: &[f64], pct_diff: &[f64]) {
        self.log_value = log_value.to_vec();
        self.pct_diff = pct_diff.to_vec();
    }
}

/// The derived regression dataset together with its fitted model.
#[derive(Debug, Clone, PartialEq)]
pub struct BiasRegression {
    /// `log2` of the value proxy, per parcel.
    pub log_value: Vec<f64>,
    /// Percentage deviation of each ratio from the median ratio.
    pub pct_diff: Vec<f64>,
    pub median_ratio: f64,
    pub fit: LinearFit,
}

impl BiasRegression {
    /// Builds the regression dataset and fits `pct_diff = a + b · log_value`.
    ///
    /// # Errors
    ///
    /// * `DivisionByZero` - any sale price is zero
    /// * `DegenerateInput` - invalid values, a zero median ratio or median
    ///   predicted value, a non-positive value proxy, too few parcels, or no
    ///   variation in the value proxy
    pub fn compute(predicted: &[f64], sale_prices: &[f64]) -> Result<Self, RatioStudyError> {
        let ratios = measures::ratios(predicted, sale_prices)?;

        let median_ratio = median_of(&ratios);
        if median_ratio == 0.0 {
            return Err(RatioStudyError::degenerate(
                DegenerateReason::ZeroMedianRatio,
            ));
        }
        let median_predicted = median_of(predicted);
        if median_predicted == 0.0 {
            return Err(RatioStudyError::degenerate(
                DegenerateReason::ZeroMedianPredicted,
            ));
        }

        let log_value = predicted
            .iter()
            .zip(sale_prices)
            .enumerate()
            .map(|(index, (p, s))| {
                let proxy = 0.5 * s + 0.5 * p / median_predicted;
                if proxy > 0.0 {
                    Ok(proxy.log2())
                } else {
                    Err(RatioStudyError::degenerate(
                        DegenerateReason::NonPositiveValueProxy {
                            index,
                            value: proxy,
                        },
                    ))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let pct_diff = ratios
            .iter()
            .map(|r| (r - median_ratio) / median_ratio)
            .collect::<Vec<_>>();

        let fit = LinearFit::fit(&log_value, &pct_diff)?;
        log::trace!(
            "PRB fit over {} parcels: slope={:.6}, t={:.3}, p={:.6}",
            fit.observations,
            fit.slope,
            fit.slope_t,
            fit.slope_p_value
        );

        Ok(Self {
            log_value,
            pct_diff,
            median_ratio,
            fit,
        })
    }

    #[must_use]
    pub fn result(&self) -> BiasResult {
        BiasResult {
            coefficient: self.fit.slope,
            significance: self.fit.slope_p_value,
        }
    }

    /// Hands the scatter data to `renderer`.
    pub fn render(&self, renderer: &mut dyn BiasPlotRenderer) {
        renderer.render(&self.log_value, &self.pct_diff);
    }
}

/// Computes the PRB coefficient and its significance.
///
/// # Errors
///
/// See [`BiasRegression::compute`].
pub fn price_related_bias(
    predicted: &[f64],
    sale_prices: &[f64],
) -> Result<BiasResult, RatioStudyError> {
    price_related_bias_with_plot(predicted, sale_prices, None)
}

/// Computes PRB and, when a renderer is given, passes it the scatter data.
///
/// # Errors
///
/// See [`BiasRegression::compute`]. The renderer is only invoked on success.
pub fn price_related_bias_with_plot(
    predicted: &[f64],
    sale_prices: &[f64],
    renderer: Option<&mut dyn BiasPlotRenderer>,
) -> Result<BiasResult, RatioStudyError> {
    let regression = BiasRegression::compute(predicted, sale_prices)?;
    if let Some(renderer) = renderer {
        regression.render(renderer);
    }
    Ok(regression.result())
}
