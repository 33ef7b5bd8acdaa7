//! Statistical primitives for ratio studies.
//!
//! This crate provides the numeric building blocks used by `ratio-study`:
//!
//! - **Descriptive statistics**: count, sum, min, max, mean and median
//! - **Special functions**: log-gamma, incomplete beta and Student's t distribution
//! - **Regression**: ordinary least squares with an intercept and slope inference
//! - **Smoothing**: LOWESS trend curves for diagnostic scatter plots
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`special`]: Special functions behind the t-test p-values
//! - [`regression`]: Simple linear regression with standard errors and p-values
//! - [`smoothing`]: Locally weighted scatterplot smoothing
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use ratio_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 2.5);
//! assert_eq!(stats.median, 2.5);
//! ```
//!
//! ## Fitting a regression line
//!
//! ```
//! use ratio_stats::regression::LinearFit;
//!
//! let fit = LinearFit::fit(&[1.0, 2.0, 3.0, 4.0], &[2.0, 4.1, 5.9, 8.0]).unwrap();
//! assert!(fit.slope > 1.9 && fit.slope < 2.1);
//! assert!(fit.slope_p_value < 0.01);
//! ```
//!
//! ## Smoothing a scatter plot
//!
//! ```
//! use ratio_stats::smoothing::{lowess, LowessParams};
//!
//! let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
//! let y = [1.0, 1.8, 3.2, 3.9, 5.1, 6.0];
//! let trend = lowess(&x, &y, LowessParams::default()).unwrap();
//! assert_eq!(trend.len(), x.len());
//! ```

pub mod descriptive;
pub mod regression;
pub mod smoothing;
pub mod special;
