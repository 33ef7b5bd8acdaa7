//! Ratio-study measures of level, uniformity and vertical equity.
//!
//! All functions take two aligned slices: the predicted values and the sale
//! prices of the same parcels. Inputs are validated up front; a zero sale
//! price is always reported as [`RatioStudyError::DivisionByZero`], never
//! turned into an infinite or NaN ratio.
//!
//! | measure | formula |
//! |---|---|
//! | weighted mean | `Σ predicted / Σ sale_price` |
//! | average deviation | `mean(|ratio − median(ratio)|)` |
//! | COD | `100 · average deviation / median(ratio)` |
//! | PRD | `mean(ratio) / weighted mean` |
//!
//! # Examples
//!
//! ```
//! use ratio_study::measures;
//!
//! let predicted = [50_000.0, 48_000.0, 62_000.0, 80_000.0, 120_000.0, 158_000.0];
//! let prices = [40_000.0, 60_000.0, 80_000.0, 100_000.0, 120_000.0, 140_000.0];
//!
//! let prd = measures::price_related_differential(&predicted, &prices).unwrap();
//! assert_eq!(format!("{prd:.3}"), "1.000");
//! ```

use ratio_stats::descriptive;

use crate::error::{DegenerateReason, Denominator, Field, RatioStudyError};

/// The four scalar measures computed over one collection of parcels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioMeasureSet {
    pub weighted_mean: f64,
    pub average_deviation: f64,
    /// Coefficient of dispersion, in percent.
    pub cod: f64,
    /// Price-related differential.
    pub prd: f64,
}

impl RatioMeasureSet {
    /// Computes all four measures, validating the input once.
    ///
    /// # Errors
    ///
    /// Fails like the individual measure functions.
    pub fn compute(predicted: &[f64], sale_prices: &[f64]) -> Result<Self, RatioStudyError> {
        let ratios = ratios(predicted, sale_prices)?;
        let median_ratio = median_of(&ratios);
        let weighted_mean = weighted_mean_unchecked(predicted, sale_prices)?;
        let average_deviation = average_deviation_from(&ratios, median_ratio);
        Ok(Self {
            weighted_mean,
            average_deviation,
            cod: cod_from(average_deviation, median_ratio)?,
            prd: prd_from(&ratios, weighted_mean)?,
        })
    }
}

/// Per-parcel assessment ratios `predicted / sale_price`.
///
/// # Errors
///
/// * `DegenerateInput` - empty input, mismatched lengths, non-finite or
///   negative values
/// * `DivisionByZero` - any sale price is zero
pub fn ratios(predicted: &[f64], sale_prices: &[f64]) -> Result<Vec<f64>, RatioStudyError> {
    validate(predicted, sale_prices)?;
    Ok(predicted
        .iter()
        .zip(sale_prices)
        .map(|(p, s)| p / s)
        .collect())
}

/// Weighted mean ratio: total predicted value over total sale price.
///
/// ```
/// use ratio_study::measures::weighted_mean;
///
/// let predicted = [100_000.0, 100_000.0, 100_000.0, 100_000.0, 200_000.0];
/// let prices = [125_000.0, 125_000.0, 125_000.0, 125_000.0, 500_000.0];
/// assert_eq!(weighted_mean(&predicted, &prices).unwrap(), 0.60);
/// ```
///
/// # Errors
///
/// See [`ratios`]; additionally `DivisionByZero` if the sale prices sum to zero.
pub fn weighted_mean(predicted: &[f64], sale_prices: &[f64]) -> Result<f64, RatioStudyError> {
    validate(predicted, sale_prices)?;
    weighted_mean_unchecked(predicted, sale_prices)
}

/// Mean absolute deviation of the ratios from their median.
///
/// # Errors
///
/// See [`ratios`].
pub fn average_deviation(
    predicted: &[f64],
    sale_prices: &[f64],
) -> Result<f64, RatioStudyError> {
    let ratios = ratios(predicted, sale_prices)?;
    Ok(average_deviation_from(&ratios, median_of(&ratios)))
}

/// Coefficient of dispersion: the average deviation as a percentage of the median ratio.
///
/// ```
/// use ratio_study::measures::coefficient_of_dispersion;
///
/// let predicted = [25_500.0, 57_000.0, 39_000.0, 90_000.0, 51_000.0, 93_000.0, 49_500.0];
/// let prices = [75_000.0, 150_000.0, 90_000.0, 180_000.0, 90_000.0, 150_000.0, 75_000.0];
/// let cod = coefficient_of_dispersion(&predicted, &prices).unwrap();
/// assert_eq!(format!("{cod:.1}"), "19.8");
/// ```
///
/// # Errors
///
/// See [`ratios`]; additionally `DivisionByZero` if the median ratio is zero.
pub fn coefficient_of_dispersion(
    predicted: &[f64],
    sale_prices: &[f64],
) -> Result<f64, RatioStudyError> {
    let ratios = ratios(predicted, sale_prices)?;
    let median_ratio = median_of(&ratios);
    cod_from(average_deviation_from(&ratios, median_ratio), median_ratio)
}

/// Price-related differential: mean ratio over weighted mean ratio.
///
/// Values above 1 suggest high-value parcels are under-assessed relative to
/// low-value ones.
///
/// # Errors
///
/// See [`ratios`]; additionally `DivisionByZero` if the weighted mean is zero.
pub fn price_related_differential(
    predicted: &[f64],
    sale_prices: &[f64],
) -> Result<f64, RatioStudyError> {
    let ratios = ratios(predicted, sale_prices)?;
    let weighted_mean = weighted_mean_unchecked(predicted, sale_prices)?;
    prd_from(&ratios, weighted_mean)
}

/// Checks lengths, emptiness and the domain of every value.
pub(crate) fn validate(predicted: &[f64], sale_prices: &[f64]) -> Result<(), RatioStudyError> {
    if predicted.len() != sale_prices.len() {
        return Err(RatioStudyError::degenerate(
            DegenerateReason::LengthMismatch {
                predicted: predicted.len(),
                sale_prices: sale_prices.len(),
            },
        ));
    }
    if predicted.is_empty() {
        return Err(RatioStudyError::degenerate(DegenerateReason::Empty));
    }

    for (index, (&p, &s)) in predicted.iter().zip(sale_prices).enumerate() {
        for (field, value) in [(Field::PredictedValue, p), (Field::SalePrice, s)] {
            if !value.is_finite() {
                return Err(RatioStudyError::degenerate(DegenerateReason::NonFinite {
                    field,
                    index,
                }));
            }
            if value < 0.0 {
                return Err(RatioStudyError::degenerate(DegenerateReason::Negative {
                    field,
                    index,
                    value,
                }));
            }
        }
        if s == 0.0 {
            return Err(RatioStudyError::division_by_zero(Denominator::SalePrice {
                index,
            }));
        }
    }
    Ok(())
}

/// Median of validated, non-empty ratios.
pub(crate) fn median_of(values: &[f64]) -> f64 {
    descriptive::median(values).unwrap_or(f64::NAN)
}

fn weighted_mean_unchecked(
    predicted: &[f64],
    sale_prices: &[f64],
) -> Result<f64, RatioStudyError> {
    let total_price = sale_prices.iter().sum::<f64>();
    if total_price == 0.0 {
        return Err(RatioStudyError::division_by_zero(Denominator::SalePriceSum));
    }
    Ok(predicted.iter().sum::<f64>() / total_price)
}

#[expect(clippy::cast_precision_loss)]
fn average_deviation_from(ratios: &[f64], median_ratio: f64) -> f64 {
    ratios.iter().map(|r| (r - median_ratio).abs()).sum::<f64>() / ratios.len() as f64
}

fn cod_from(average_deviation: f64, median_ratio: f64) -> Result<f64, RatioStudyError> {
    if median_ratio == 0.0 {
        return Err(RatioStudyError::division_by_zero(Denominator::MedianRatio));
    }
    Ok(100.0 * average_deviation / median_ratio)
}

fn prd_from(ratios: &[f64], weighted_mean: f64) -> Result<f64, RatioStudyError> {
    if weighted_mean == 0.0 {
        return Err(RatioStudyError::division_by_zero(Denominator::WeightedMean));
    }
    let mean_ratio = descriptive::mean(ratios).unwrap_or(f64::NAN);
    Ok(mean_ratio / weighted_mean)
}
