//! Grouped ratio-study report
//!
//! [`RatioStudy`] partitions records by a grouping key and computes one
//! [`RatioReportRow`] per group: ratio count and central tendency, weighted
//! mean, PRD, COD and PRB with its significance.
//!
//! # Overview
//!
//! ```text
//! records ──Partition::by_key──▶ groups (first-seen order)
//!                                   │
//!                                   ├─ ratio summary   (count, mean, median, min, max)
//!                                   ├─ RatioMeasureSet (weighted mean, COD, PRD)
//!                                   └─ BiasRegression  (PRB, significance)
//!                                   ▼
//!                              RatioReport<K>
//! ```
//!
//! A failure in any group aborts the whole report with a [`GroupError`]
//! naming the group. An empty input produces an empty report.
//!
//! # Examples
//!
//! ```
//! use ratio_study::{parcel::Parcel, report::RatioStudy};
//!
//! let parcels = [
//!     Parcel::new(100_000.0, 125_000.0).with_group("North"),
//!     Parcel::new(90_000.0, 100_000.0).with_group("South"),
//!     Parcel::new(150_000.0, 160_000.0).with_group("North"),
//!     Parcel::new(120_000.0, 110_000.0).with_group("North"),
//! ];
//!
//! let study = RatioStudy::parcels();
//! let err = study
//!     .report(&parcels, |p| p.group.clone().unwrap_or_default())
//!     .unwrap_err();
//! // "South" has a single parcel, too few for the bias regression
//! assert_eq!(err.group, "South");
//!
//! let report = study.report_ungrouped(&parcels).unwrap();
//! assert_eq!(report.len(), 1);
//! assert_eq!(report.iter().next().unwrap().1.count, 4);
//! ```

use std::{fmt, hash::Hash, num::NonZeroUsize, panic, thread};

use ratio_stats::descriptive::DescriptiveStats;
use serde::Serialize;

use crate::{
    bias::{BiasPlotRenderer, BiasRegression},
    error::{DegenerateReason, GroupError, RatioStudyError},
    measures::{self, RatioMeasureSet},
    parcel::Parcel,
    partition::{Group, Partition},
};

/// Statistics of one group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatioReportRow {
    pub count: usize,
    /// Mean ratio
    pub mean: f64,
    /// Median ratio
    pub median: f64,
    pub weighted_mean: f64,
    /// Smallest ratio
    pub min: f64,
    /// Largest ratio
    pub max: f64,
    pub prd: f64,
    pub cod: f64,
    pub prb: f64,
    /// Two-sided p-value of the PRB coefficient
    pub prb_significance: f64,
}

impl RatioReportRow {
    /// Computes the row for aligned predicted values and sale prices.
    ///
    /// # Errors
    ///
    /// `EmptyGroup` when there are no parcels, otherwise any error of
    /// [`RatioMeasureSet::compute`] or [`BiasRegression::compute`].
    pub fn compute(predicted: &[f64], sale_prices: &[f64]) -> Result<Self, RatioStudyError> {
        Self::compute_with_plot(predicted, sale_prices, None)
    }

    /// Like [`RatioReportRow::compute`], also handing the bias regression's
    /// scatter data to `renderer` once every statistic has succeeded.
    ///
    /// # Errors
    ///
    /// See [`RatioReportRow::compute`].
    pub fn compute_with_plot(
        predicted: &[f64],
        sale_prices: &[f64],
        renderer: Option<&mut dyn BiasPlotRenderer>,
    ) -> Result<Self, RatioStudyError> {
        if predicted.is_empty() && sale_prices.is_empty() {
            return Err(RatioStudyError::EmptyGroup);
        }
        let ratios = measures::ratios(predicted, sale_prices)?;
        let summary = DescriptiveStats::new(ratios.iter().copied())
            .ok_or_else(|| RatioStudyError::degenerate(DegenerateReason::Empty))?;
        let measure_set = RatioMeasureSet::compute(predicted, sale_prices)?;
        let bias = BiasRegression::compute(predicted, sale_prices)?;
        if let Some(renderer) = renderer {
            bias.render(renderer);
        }
        let bias = bias.result();

        Ok(Self {
            count: summary.count,
            mean: summary.mean,
            median: summary.median,
            weighted_mean: measure_set.weighted_mean,
            min: summary.min,
            max: summary.max,
            prd: measure_set.prd,
            cod: measure_set.cod,
            prb: bias.coefficient,
            prb_significance: bias.significance,
        })
    }

    /// Renders the row for presentation: three decimal places for every
    /// statistic except `min` and `max`, which keep full precision.
    #[must_use]
    pub fn formatted(&self) -> FormattedRow {
        let fmt3 = |v: f64| format!("{v:.3}");
        FormattedRow {
            count: self.count,
            mean: fmt3(self.mean),
            median: fmt3(self.median),
            weighted_mean: fmt3(self.weighted_mean),
            min: self.min,
            max: self.max,
            prd: fmt3(self.prd),
            cod: fmt3(self.cod),
            prb: fmt3(self.prb),
            prb_significance: fmt3(self.prb_significance),
        }
    }
}

/// A [`RatioReportRow`] as shown to readers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedRow {
    pub count: usize,
    pub mean: String,
    pub median: String,
    pub weighted_mean: String,
    pub min: f64,
    pub max: f64,
    pub prd: String,
    pub cod: String,
    pub prb: String,
    #[serde(rename = "sig")]
    pub prb_significance: String,
}

/// Group key of an ungrouped report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, derive_more::Display)]
#[display("All")]
pub struct AllParcels;

/// Report rows keyed by group, in first-seen group order.
#[derive(Debug, Clone, PartialEq)]
pub struct RatioReport<K> {
    rows: Vec<(K, RatioReportRow)>,
}

impl<K> RatioReport<K> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &RatioReportRow)> {
        self.rows.iter().map(|(key, row)| (key, row))
    }

    /// Row of the group with `key`, if present.
    pub fn get(&self, key: &K) -> Option<&RatioReportRow>
    where
        K: PartialEq,
    {
        self.rows.iter().find(|(k, _)| k == key).map(|(_, row)| row)
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<(K, RatioReportRow)> {
        self.rows
    }
}

/// Receiver of per-group bias scatter data during report generation.
pub trait GroupPlotRenderer<K> {
    fn render_group(&mut self, key: &K, log_value: &[f64], pct_diff: &[f64]);
}

struct KeyedRenderer<'r, 'k, K> {
    key: &'k K,
    inner: &'r mut dyn GroupPlotRenderer<K>,
}

impl<K> BiasPlotRenderer for KeyedRenderer<'_, '_, K> {
    fn render(&mut self, log_value: &[f64], pct_diff: &[f64]) {
        self.inner.render_group(self.key, log_value, pct_diff);
    }
}

/// Grouped report generator over records of any type.
///
/// `P` and `S` select the predicted value and the sale price of a record.
#[derive(Debug, Clone, Copy)]
pub struct RatioStudy<P, S> {
    predicted: P,
    sale_price: S,
}

impl RatioStudy<fn(&Parcel) -> f64, fn(&Parcel) -> f64> {
    /// Study over [`Parcel`] records.
    #[must_use]
    pub fn parcels() -> Self {
        Self::new(|p: &Parcel| p.predicted_value, |p: &Parcel| p.sale_price)
    }
}

impl<P, S> RatioStudy<P, S> {
    #[must_use]
    pub fn new(predicted: P, sale_price: S) -> Self {
        Self {
            predicted,
            sale_price,
        }
    }

    /// Computes the report for `items` grouped by `group_fn`.
    ///
    /// # Arguments
    ///
    /// * `items` - Records to analyze
    /// * `group_fn` - Extracts the group key of a record
    ///
    /// # Errors
    ///
    /// Returns the first failing group's error, in group order.
    pub fn report<T, K, G>(&self, items: &[T], group_fn: G) -> Result<RatioReport<K>, GroupError>
    where
        P: Fn(&T) -> f64,
        S: Fn(&T) -> f64,
        K: Eq + Hash + Clone + fmt::Display,
        G: FnMut(&T) -> K,
    {
        self.report_partition(&Partition::by_key(items, group_fn), None)
    }

    /// Computes a single-row report over all `items`.
    ///
    /// # Errors
    ///
    /// See [`RatioStudy::report`].
    pub fn report_ungrouped<T>(&self, items: &[T]) -> Result<RatioReport<AllParcels>, GroupError>
    where
        P: Fn(&T) -> f64,
        S: Fn(&T) -> f64,
    {
        self.report(items, |_| AllParcels)
    }

    /// Computes the report for a prepared partition, optionally sending each
    /// group's bias scatter data to `plots`.
    ///
    /// # Errors
    ///
    /// See [`RatioStudy::report`].
    pub fn report_partition<T, K>(
        &self,
        partition: &Partition<'_, K, T>,
        mut plots: Option<&mut dyn GroupPlotRenderer<K>>,
    ) -> Result<RatioReport<K>, GroupError>
    where
        P: Fn(&T) -> f64,
        S: Fn(&T) -> f64,
        K: Clone + fmt::Display,
    {
        let mut rows = Vec::with_capacity(partition.len());
        for group in partition {
            let row = match plots.as_deref_mut() {
                Some(inner) => {
                    let mut renderer = KeyedRenderer {
                        key: &group.key,
                        inner,
                    };
                    self.group_row(group, Some(&mut renderer))
                }
                None => self.group_row(group, None),
            }?;
            rows.push((group.key.clone(), row));
        }
        log::info!("computed ratio statistics for {} group(s)", rows.len());
        Ok(RatioReport { rows })
    }

    /// Computes the report on a bounded set of scoped worker threads.
    ///
    /// Groups are split into contiguous chunks, one per available CPU. Rows
    /// come back in the same order as [`RatioStudy::report`], and the first
    /// failing group in that order is reported.
    ///
    /// # Errors
    ///
    /// See [`RatioStudy::report`].
    pub fn report_parallel<T, K, G>(
        &self,
        items: &[T],
        group_fn: G,
    ) -> Result<RatioReport<K>, GroupError>
    where
        P: Fn(&T) -> f64 + Sync,
        S: Fn(&T) -> f64 + Sync,
        T: Sync,
        K: Eq + Hash + Clone + fmt::Display + Sync,
        G: FnMut(&T) -> K,
    {
        let partition = Partition::by_key(items, group_fn);
        let workers = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        let chunk_size = partition.len().div_ceil(workers).max(1);
        let groups = partition.iter().as_slice();

        let results = thread::scope(|s| {
            // Spawn every chunk before joining any
            let handles = groups
                .chunks(chunk_size)
                .map(|chunk| {
                    s.spawn(move || {
                        chunk
                            .iter()
                            .map(|group| self.group_row(group, None))
                            .collect::<Vec<_>>()
                    })
                })
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .flat_map(|handle| handle.join().unwrap_or_else(|e| panic::resume_unwind(e)))
                .collect::<Vec<_>>()
        });

        let mut rows = Vec::with_capacity(partition.len());
        for (group, result) in groups.iter().zip(results) {
            rows.push((group.key.clone(), result?));
        }
        log::info!(
            "computed ratio statistics for {} group(s) on {} worker(s)",
            rows.len(),
            groups.len().div_ceil(chunk_size)
        );
        Ok(RatioReport { rows })
    }

    /// Row of one partition group. Partitions never hold empty groups.
    fn group_row<T, K>(
        &self,
        group: &Group<'_, K, T>,
        renderer: Option<&mut dyn BiasPlotRenderer>,
    ) -> Result<RatioReportRow, GroupError>
    where
        P: Fn(&T) -> f64,
        S: Fn(&T) -> f64,
        K: fmt::Display,
    {
        let annotate = |source| GroupError {
            group: group.key.to_string(),
            source,
        };
        let predicted = group.map(&self.predicted);
        let sale_prices = group.map(&self.sale_price);
        log::debug!("group '{}': {} parcel(s)", group.key, group.len());
        RatioReportRow::compute_with_plot(&predicted, &sale_prices, renderer).map_err(annotate)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::error::Denominator;

    fn scenario_parcels() -> Vec<Parcel> {
        let predicted = [50_000.0, 48_000.0, 62_000.0, 80_000.0, 120_000.0, 158_000.0];
        let prices = [40_000.0, 60_000.0, 80_000.0, 100_000.0, 120_000.0, 140_000.0];
        predicted
            .iter()
            .zip(prices)
            .enumerate()
            .map(|(i, (&p, s))| {
                let group = if i % 2 == 0 { "Even" } else { "Odd" };
                Parcel::new(p, s).with_group(group)
            })
            .collect()
    }

    #[test]
    fn test_empty_input_gives_empty_report() {
        let parcels: Vec<Parcel> = vec![];
        let report = RatioStudy::parcels().report_ungrouped(&parcels).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_ungrouped_report_counts_all_parcels() {
        let parcels = scenario_parcels();
        let report = RatioStudy::parcels().report_ungrouped(&parcels).unwrap();
        assert_eq!(report.len(), 1);

        let row = report.get(&AllParcels).unwrap();
        assert_eq!(row.count, 6);
        assert_eq!(row.min, 0.775);
        assert_eq!(row.max, 1.25);

        let formatted = row.formatted();
        assert_eq!(formatted.mean, "0.959");
        assert_eq!(formatted.median, "0.900");
        assert_eq!(formatted.weighted_mean, "0.959");
        assert_eq!(formatted.prd, "1.000");
    }

    #[test]
    fn test_first_seen_group_order() {
        let parcels = scenario_parcels();
        let report = RatioStudy::parcels()
            .report(&parcels, |p| p.group.clone().unwrap_or_default())
            .unwrap();
        let keys = report.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, ["Even", "Odd"]);
        assert!(report.iter().all(|(_, row)| row.count == 3));
    }

    #[test]
    fn test_group_error_names_group() {
        let mut parcels = scenario_parcels();
        parcels[3].sale_price = 0.0;
        let err = RatioStudy::parcels()
            .report(&parcels, |p| p.group.clone().unwrap_or_default())
            .unwrap_err();
        assert_eq!(err.group, "Odd");
        assert_eq!(
            err.source,
            RatioStudyError::DivisionByZero {
                denominator: Denominator::SalePrice { index: 1 }
            }
        );
    }

    #[test]
    fn test_custom_selectors() {
        let records = [(90.0, 100.0), (180.0, 200.0), (330.0, 300.0)];
        let study = RatioStudy::new(|r: &(f64, f64)| r.0, |r: &(f64, f64)| r.1);
        let report = study.report_ungrouped(&records).unwrap();
        let row = report.get(&AllParcels).unwrap();
        assert_eq!(row.count, 3);
        assert!((row.median - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let parcels = scenario_parcels();
        let study = RatioStudy::parcels();
        let key = |p: &Parcel| p.group.clone().unwrap_or_default();
        let sequential = study.report(&parcels, key).unwrap();
        let parallel = study.report_parallel(&parcels, key).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_parallel_reports_first_failing_group() {
        let mut parcels = scenario_parcels();
        parcels[5].predicted_value = f64::NAN;
        parcels.push(Parcel::new(1.0, 1.0).with_group("Single"));
        let err = RatioStudy::parcels()
            .report_parallel(&parcels, |p| p.group.clone().unwrap_or_default())
            .unwrap_err();
        assert_eq!(err.group, "Odd");
    }

    #[test]
    fn test_parallel_with_more_groups_than_workers() {
        let parcels = (0..500)
            .map(|i| {
                let price = 100_000.0 + f64::from(i % 7) * 10_000.0;
                let ratio = 0.8 + f64::from(i % 5) * 0.05;
                Parcel::new(price * ratio, price).with_group(format!("Nbhd {}", i / 5))
            })
            .collect::<Vec<_>>();
        let study = RatioStudy::parcels();
        let key = |p: &Parcel| p.group.clone().unwrap_or_default();
        let sequential = study.report(&parcels, key).unwrap();
        let parallel = study.report_parallel(&parcels, key).unwrap();
        assert_eq!(parallel.len(), 100);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_row_without_parcels_is_empty_group() {
        assert_eq!(
            RatioReportRow::compute(&[], &[]).unwrap_err(),
            RatioStudyError::EmptyGroup
        );
    }

    #[test]
    fn test_empty_group_is_omitted_from_report() {
        let parcels = scenario_parcels();
        let partition = Partition::from_groups([
            Group {
                key: "Vacant".to_owned(),
                members: vec![],
            },
            Group {
                key: "All".to_owned(),
                members: parcels.iter().collect(),
            },
        ]);
        let report = RatioStudy::parcels()
            .report_partition(&partition, None)
            .unwrap();
        let keys = report.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, ["All"]);
    }

    #[test]
    fn test_group_plots_receive_each_group() {
        #[derive(Default)]
        struct Keys(Vec<(String, usize)>);
        impl GroupPlotRenderer<String> for Keys {
            fn render_group(&mut self, key: &String, log_value: &[f64], _pct_diff: &[f64]) {
                self.0.push((key.clone(), log_value.len()));
            }
        }

        let parcels = scenario_parcels();
        let partition = Partition::by_key(&parcels, |p| p.group.clone().unwrap_or_default());
        let mut plots = Keys::default();
        RatioStudy::parcels()
            .report_partition(&partition, Some(&mut plots))
            .unwrap();
        assert_eq!(plots.0, [("Even".to_owned(), 3), ("Odd".to_owned(), 3)]);
    }

    fn priced_parcels() -> impl Strategy<Value = Vec<Parcel>> {
        prop::collection::vec((10_000.0..1_000_000.0_f64, 0.5..1.5_f64), 3..40).prop_map(|rows| {
            rows.into_iter()
                .map(|(price, ratio)| Parcel::new(price * ratio, price))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_ungrouped_report_has_one_row(parcels in priced_parcels()) {
            let report = RatioStudy::parcels().report_ungrouped(&parcels).unwrap();
            prop_assert_eq!(report.len(), 1);
            prop_assert_eq!(report.get(&AllParcels).unwrap().count, parcels.len());
        }

        #[test]
        fn prop_scaling_predictions_scales_level_only(
            parcels in priced_parcels(),
            k in 0.1..10.0_f64,
        ) {
            let scaled = parcels
                .iter()
                .map(|p| Parcel::new(p.predicted_value * k, p.sale_price))
                .collect::<Vec<_>>();
            let study = RatioStudy::parcels();
            let base = *study.report_ungrouped(&parcels).unwrap().get(&AllParcels).unwrap();
            let after = *study.report_ungrouped(&scaled).unwrap().get(&AllParcels).unwrap();

            let close = |a: f64, b: f64| (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0);
            prop_assert!(close(after.mean, k * base.mean));
            prop_assert!(close(after.median, k * base.median));
            prop_assert!(close(after.weighted_mean, k * base.weighted_mean));
            prop_assert!(close(after.cod, base.cod));
            prop_assert!(close(after.prd, base.prd));
            prop_assert!((after.prb - base.prb).abs() < 1e-6);
        }
    }
}
