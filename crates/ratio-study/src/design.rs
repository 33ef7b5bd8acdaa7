//! Design columns for valuation models
//!
//! Helpers that turn raw parcel characteristics into regression columns:
//!
//! - [`LogColumn`]: natural log of a continuous characteristic, shifted by
//!   one when any value is zero so that `ln` stays defined
//! - [`indicator_columns`]: one `0`/`1` column per category except a base
//!   category, dropping categories with too few sales
//!
//! # Examples
//!
//! ```
//! use ratio_study::design::{indicator_columns, LogColumn};
//!
//! let lot = LogColumn::new(&[0.0, 9.0]).unwrap();
//! assert!(lot.shifted);
//! assert_eq!(lot.values[0], 0.0);
//!
//! let nbhd = ["12", "7", "12", "3"];
//! let columns = indicator_columns(&nbhd, "12", "Nbhd", 0).unwrap();
//! let names = columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
//! assert_eq!(names, ["Nbhd_3", "Nbhd_7"]);
//! assert_eq!(columns[1].values, [0.0, 1.0, 0.0, 0.0]);
//! ```

use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum DesignError {
    #[display("value {index} is not finite")]
    NonFinite { index: usize },
    #[display("value {index} is negative ({value})")]
    Negative { index: usize, value: f64 },
    #[display("base category '{base}' does not occur in the data")]
    UnknownBase { base: String },
}

/// Log-transformed continuous column.
#[derive(Debug, Clone, PartialEq)]
pub struct LogColumn {
    pub values: Vec<f64>,
    /// Whether every value was shifted by one before taking the log
    pub shifted: bool,
}

impl LogColumn {
    /// Takes `ln(v)` of every value, or `ln(v + 1)` if any value is zero.
    ///
    /// # Errors
    ///
    /// Fails on a non-finite or negative value.
    pub fn new(values: &[f64]) -> Result<Self, DesignError> {
        for (index, &value) in values.iter().enumerate() {
            if !value.is_finite() {
                return Err(DesignError::NonFinite { index });
            }
            if value < 0.0 {
                return Err(DesignError::Negative { index, value });
            }
        }
        let shifted = values.contains(&0.0);
        let values = values
            .iter()
            .map(|&v| if shifted { v.ln_1p() } else { v.ln() })
            .collect();
        Ok(Self { values, shifted })
    }
}

/// A named `0`/`1` indicator column.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorColumn {
    pub name: String,
    pub values: Vec<f64>,
}

impl IndicatorColumn {
    /// Number of rows in the category.
    #[must_use]
    pub fn sales(&self) -> usize {
        self.values.iter().filter(|&&v| v == 1.0).count()
    }
}

/// Encodes `categories` as indicator columns named `{prefix}_{category}`.
///
/// Columns come in sorted category order. The `base` category gets no
/// column, and categories with fewer than `min_sales` rows are dropped.
///
/// # Errors
///
/// Returns [`DesignError::UnknownBase`] if `base` is not among the
/// categories.
pub fn indicator_columns<S>(
    categories: &[S],
    base: &str,
    prefix: &str,
    min_sales: usize,
) -> Result<Vec<IndicatorColumn>, DesignError>
where
    S: AsRef<str>,
{
    let distinct = categories
        .iter()
        .map(|c| c.as_ref())
        .collect::<BTreeSet<&str>>();
    if !distinct.contains(base) {
        return Err(DesignError::UnknownBase {
            base: base.to_owned(),
        });
    }

    let columns = distinct
        .into_iter()
        .filter(|&category| category != base)
        .map(|category| IndicatorColumn {
            name: format!("{prefix}_{category}"),
            values: categories
                .iter()
                .map(|c| if c.as_ref() == category { 1.0 } else { 0.0 })
                .collect(),
        })
        .filter(|column| {
            let sales = column.sales();
            if sales < min_sales {
                log::warn!(
                    "insufficient sales for '{}': {sales} < {min_sales}",
                    column.name
                );
            }
            sales >= min_sales
        })
        .collect();
    Ok(columns)
}
