//! PRB scatter export
//!
//! Collects each group's bias regression data during report generation and
//! writes `<group>_prb.csv` with a LOWESS trend column for plotting.

use std::{
    collections::HashSet,
    fmt::{self, Write as _},
    fs,
    path::Path,
};

use anyhow::Context;
use ratio_stats::smoothing::{self, LowessParams};
use ratio_study::report::GroupPlotRenderer;

#[derive(Debug, Clone, PartialEq)]
struct GroupPlot {
    group: String,
    log_value: Vec<f64>,
    pct_diff: Vec<f64>,
}

#[derive(Debug, Default)]
pub(super) struct PlotCollector {
    plots: Vec<GroupPlot>,
}

impl<K> GroupPlotRenderer<K> for PlotCollector
where
    K: fmt::Display,
{
    fn render_group(&mut self, key: &K, log_value: &[f64], pct_diff: &[f64]) {
        self.plots.push(GroupPlot {
            group: key.to_string(),
            log_value: log_value.to_vec(),
            pct_diff: pct_diff.to_vec(),
        });
    }
}

impl PlotCollector {
    #[cfg(test)]
    pub(super) fn len(&self) -> usize {
        self.plots.len()
    }

    pub(super) fn save_all(&self, dir: &Path) -> anyhow::Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create plot directory: {}", dir.display()))?;
        let stems = unique_stems(self.plots.iter().map(|plot| plot.group.as_str()));
        for (plot, stem) in self.plots.iter().zip(stems) {
            let csv_path = dir.join(format!("{stem}_prb.csv"));
            let csv_content = trend_csv(plot)
                .with_context(|| format!("Failed to smooth PRB scatter of {}", plot.group))?;
            fs::write(&csv_path, csv_content)
                .with_context(|| format!("Failed to write CSV file: {}", csv_path.display()))?;
            log::info!("PRB scatter saved to: {}", csv_path.display());
        }
        Ok(())
    }
}

/// Rows sorted by `log_value`, each with its smoothed trend value.
fn trend_csv(plot: &GroupPlot) -> anyhow::Result<String> {
    let trend = smoothing::lowess(&plot.log_value, &plot.pct_diff, LowessParams::default())?;

    // Same stable ordering as the smoother
    let mut points = plot
        .log_value
        .iter()
        .copied()
        .zip(plot.pct_diff.iter().copied())
        .collect::<Vec<_>>();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut csv_content = String::from("log_value,pct_diff,trend\n");
    for ((x, y), smoothed) in points.iter().zip(&trend) {
        writeln!(&mut csv_content, "{x},{y},{}", smoothed.y)?;
    }
    Ok(csv_content)
}

/// File stems for `groups`, numbered `_2`, `_3`, ... where sanitized labels
/// collide.
fn unique_stems<'g, I>(groups: I) -> Vec<String>
where
    I: IntoIterator<Item = &'g str>,
{
    let mut used = HashSet::new();
    groups
        .into_iter()
        .map(|group| {
            let base = file_stem(group);
            let mut stem = base.clone();
            let mut n = 1;
            while !used.insert(stem.clone()) {
                n += 1;
                stem = format!("{base}_{n}");
            }
            if n > 1 {
                log::warn!("group '{group}' shares file name '{base}', saving as '{stem}'");
            }
            stem
        })
        .collect()
}

/// Group label made safe for use as a file name.
fn file_stem(group: &str) -> String {
    let stem = group
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>();
    if stem.is_empty() { "_".to_owned() } else { stem }
}
