//! Ratio-study statistics for mass appraisal
//!
//! This crate measures how well predicted values (appraisals or model
//! estimates) track observed sale prices, overall or broken out by a grouping
//! attribute such as neighborhood or property class.
//!
//! # Overview
//!
//! The engine has three layers:
//!
//! 1. **Ratio measures** ([`measures`]): weighted mean, average deviation,
//!    coefficient of dispersion (COD) and price-related differential (PRD)
//! 2. **Price-related bias** ([`bias`]): regression of ratio deviations on
//!    log value, giving the PRB coefficient and its significance
//! 3. **Grouped report** ([`report`]): partitions records with
//!    [`partition::Partition`] and assembles one row per group
//!
//! Supporting modules cover valuation models that produce the predicted
//! values ([`valuation`], [`design`]) and the sales coverage of their
//! coefficients ([`coverage`]).
//!
//! # Reading the statistics
//!
//! | statistic | ideal | meaning |
//! |---|---|---|
//! | median / weighted mean | 1.0 | level of assessment |
//! | COD | low (5–15) | uniformity: average percent deviation from the median |
//! | PRD | 0.98–1.03 | above: regressive, below: progressive |
//! | PRB | −0.05–0.05 | ratio change per doubling of value |
//!
//! # Examples
//!
//! ```
//! use ratio_study::{measures, parcel::Parcel, report::RatioStudy};
//!
//! let predicted = [25_500.0, 57_000.0, 39_000.0, 90_000.0, 51_000.0, 93_000.0, 49_500.0];
//! let prices = [75_000.0, 150_000.0, 90_000.0, 180_000.0, 90_000.0, 150_000.0, 75_000.0];
//!
//! let cod = measures::coefficient_of_dispersion(&predicted, &prices).unwrap();
//! assert_eq!(format!("{cod:.1}"), "19.8");
//!
//! let parcels = predicted
//!     .iter()
//!     .zip(prices)
//!     .map(|(&p, s)| Parcel::new(p, s))
//!     .collect::<Vec<_>>();
//! let report = RatioStudy::parcels().report_ungrouped(&parcels).unwrap();
//! let (group, row) = report.iter().next().unwrap();
//! assert_eq!(group.to_string(), "All");
//! assert_eq!(row.formatted().weighted_mean, "0.500");
//! ```

pub mod bias;
pub mod coverage;
pub mod design;
pub mod error;
pub mod measures;
pub mod parcel;
pub mod partition;
pub mod report;
pub mod valuation;
