//! Error types shared by the ratio measures, the bias regression and the
//! grouped report.

use ratio_stats::regression::RegressionError;

/// Failure of a single ratio-study computation.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum RatioStudyError {
    #[display("division by zero: {denominator} is zero")]
    DivisionByZero { denominator: Denominator },
    #[display("degenerate input: {reason}")]
    DegenerateInput { reason: DegenerateReason },
    #[display("group has no parcels")]
    EmptyGroup,
}

impl RatioStudyError {
    pub(crate) fn division_by_zero(denominator: Denominator) -> Self {
        Self::DivisionByZero { denominator }
    }

    pub(crate) fn degenerate(reason: DegenerateReason) -> Self {
        Self::DegenerateInput { reason }
    }
}

/// The quantity that turned out to be zero in a division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Denominator {
    #[display("sale price of parcel {index}")]
    SalePrice { index: usize },
    #[display("sum of sale prices")]
    SalePriceSum,
    #[display("median ratio")]
    MedianRatio,
    #[display("weighted mean")]
    WeightedMean,
}

/// Parcel field named in validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Field {
    #[display("predicted value")]
    PredictedValue,
    #[display("sale price")]
    SalePrice,
}

/// Why an input cannot support the requested statistic.
#[derive(Debug, Clone, PartialEq, derive_more::Display)]
pub enum DegenerateReason {
    #[display("no parcels")]
    Empty,
    #[display("{predicted} predicted values but {sale_prices} sale prices")]
    LengthMismatch {
        predicted: usize,
        sale_prices: usize,
    },
    #[display("{field} of parcel {index} is not finite")]
    NonFinite { field: Field, index: usize },
    #[display("{field} of parcel {index} is negative ({value})")]
    Negative {
        field: Field,
        index: usize,
        value: f64,
    },
    #[display("median predicted value is zero")]
    ZeroMedianPredicted,
    #[display("median ratio is zero")]
    ZeroMedianRatio,
    #[display("value proxy of parcel {index} is not positive ({value})")]
    NonPositiveValueProxy { index: usize, value: f64 },
    #[display("bias regression failed: {error}")]
    Regression { error: RegressionError },
}

impl From<RegressionError> for RatioStudyError {
    fn from(error: RegressionError) -> Self {
        Self::degenerate(DegenerateReason::Regression { error })
    }
}

/// A per-group failure of report generation, annotated with the group key.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
#[display("ratio statistics failed for group '{group}': {source}")]
pub struct GroupError {
    /// The offending group key, rendered with `Display`.
    pub group: String,
    pub source: RatioStudyError,
}
