//! Sales coverage of model coefficients
//!
//! Coverage tells how many sales support each coefficient of a valuation
//! model. A column with exactly two distinct values is treated as a binary
//! indicator and covered by the rows equal to `1`; any other column is
//! continuous and covered by its nonzero rows.
//!
//! Missing and NaN values never count toward coverage or toward the
//! distinct-value test.
//!
//! # Examples
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use ratio_study::coverage::{coefficient_coverage, ColumnKind};
//!
//! let rows = [(1.0, 7.2), (0.0, 7.9), (1.0, 0.0)]
//!     .map(|(pool, ln_sqft)| {
//!         BTreeMap::from([("Pool".to_owned(), pool), ("LnSqFt".to_owned(), ln_sqft)])
//!     });
//!
//! let coverage = coefficient_coverage(&rows, ["Pool", "LnSqFt"]);
//! assert_eq!(coverage[0].kind, ColumnKind::Binary);
//! assert_eq!(coverage[0].coverage, 2);
//! assert_eq!(coverage[1].kind, ColumnKind::Continuous);
//! assert_eq!(coverage[1].coverage, 2);
//! ```

use std::collections::HashSet;

use serde::Serialize;

use crate::parcel::AttributeSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    #[display("binary")]
    Binary,
    #[display("continuous")]
    Continuous,
}

/// Coverage count of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageEntry {
    pub column: String,
    pub kind: ColumnKind,
    /// Number of rows supporting the column
    pub coverage: usize,
}

/// Counts the sales coverage of each of `columns` over `rows`.
///
/// Entries are returned in the order of `columns`.
pub fn coefficient_coverage<'c, A, C>(rows: &[A], columns: C) -> Vec<CoverageEntry>
where
    A: AttributeSource,
    C: IntoIterator<Item = &'c str>,
{
    columns
        .into_iter()
        .map(|column| column_coverage(rows, column))
        .collect()
}

fn column_coverage<A>(rows: &[A], column: &str) -> CoverageEntry
where
    A: AttributeSource,
{
    let values = rows
        .iter()
        .filter_map(|row| row.attribute(column))
        .filter(|v| !v.is_nan())
        .collect::<Vec<_>>();

    // -0.0 and 0.0 are the same value
    let distinct = values
        .iter()
        .map(|v| (v + 0.0).to_bits())
        .collect::<HashSet<_>>();

    let (kind, coverage) = if distinct.len() == 2 {
        let ones = values.iter().filter(|&&v| v == 1.0).count();
        (ColumnKind::Binary, ones)
    } else {
        let nonzero = values.iter().filter(|&&v| v != 0.0).count();
        (ColumnKind::Continuous, nonzero)
    };
    log::debug!("coverage of '{column}' ({kind}): {coverage} of {} rows", rows.len());

    CoverageEntry {
        column: column.to_owned(),
        kind,
        coverage,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn rows(column: &str, values: &[f64]) -> Vec<BTreeMap<String, f64>> {
        values
            .iter()
            .map(|&v| BTreeMap::from([(column.to_owned(), v)]))
            .collect()
    }

    #[test]
    fn test_binary_column_counts_ones() {
        let data = rows("Nbhd_3", &[0.0, 1.0, 1.0, 0.0, 1.0]);
        let coverage = coefficient_coverage(&data, ["Nbhd_3"]);
        assert_eq!(
            coverage,
            [CoverageEntry {
                column: "Nbhd_3".to_owned(),
                kind: ColumnKind::Binary,
                coverage: 3,
            }]
        );
    }

    #[test]
    fn test_two_valued_column_without_ones() {
        // Two distinct values make it binary even when neither is 1
        let coverage = coefficient_coverage(&rows("Stories", &[2.0, 3.0, 2.0]), ["Stories"]);
        assert_eq!(coverage[0].kind, ColumnKind::Binary);
        assert_eq!(coverage[0].coverage, 0);
    }

    #[test]
    fn test_continuous_column_counts_nonzero() {
        let coverage = coefficient_coverage(&rows("LnLot", &[0.0, 8.1, 9.3, 0.0, 7.7]), ["LnLot"]);
        assert_eq!(coverage[0].kind, ColumnKind::Continuous);
        assert_eq!(coverage[0].coverage, 3);
    }

    #[test]
    fn test_constant_column_is_continuous() {
        let coverage = coefficient_coverage(&rows("Ones", &[1.0, 1.0]), ["Ones"]);
        assert_eq!(coverage[0].kind, ColumnKind::Continuous);
        assert_eq!(coverage[0].coverage, 2);
    }

    #[test]
    fn test_missing_values_are_ignored() {
        let mut data = rows("Pool", &[1.0, 0.0, f64::NAN]);
        data.push(BTreeMap::new());
        let coverage = coefficient_coverage(&data, ["Pool", "Garage"]);
        assert_eq!(coverage[0].kind, ColumnKind::Binary);
        assert_eq!(coverage[0].coverage, 1);
        assert_eq!(coverage[1].coverage, 0);
    }

    #[test]
    fn test_signed_zero_is_one_value() {
        let coverage = coefficient_coverage(&rows("x", &[0.0, -0.0, 5.0]), ["x"]);
        assert_eq!(coverage[0].kind, ColumnKind::Binary);
    }
}
