//! Ratio report command
//!
//! Loads parcels from CSV, computes the grouped ratio report and writes it as
//! a table, JSON or CSV. With `--plot-dir`, each group's bias regression
//! scatter is exported alongside a LOWESS trend.

mod plot;
mod table;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, ValueEnum};
use ratio_study::{
    parcel::Parcel,
    partition::Partition,
    report::{AllParcels, RatioReport, RatioReportRow, RatioStudy},
};

use self::plot::PlotCollector;
use crate::{
    data::{ParcelColumns, ParcelTable},
    schema::report::ReportDocument,
    util::Output,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct ReportArg {
    /// Path to the parcels CSV file
    pub parcels: PathBuf,

    /// Column holding the predicted value
    #[arg(long, default_value = "ESP")]
    pub predicted_column: String,

    /// Column holding the sale price
    #[arg(long, default_value = "SalesPrice")]
    pub sale_price_column: String,

    /// Column to group parcels by (one report row per distinct value)
    #[arg(long)]
    pub group_by: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Output file path (default: stdout)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Compute groups concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Output directory for per-group PRB scatter CSV files
    #[arg(long)]
    pub plot_dir: Option<PathBuf>,
}

pub(crate) fn run(arg: &ReportArg) -> anyhow::Result<()> {
    let table = ParcelTable::open(&arg.parcels)?;
    let parcels = table.to_parcels(ParcelColumns {
        predicted: &arg.predicted_column,
        sale_price: &arg.sale_price_column,
        group_by: arg.group_by.as_deref(),
    })?;

    let mut plots = arg.plot_dir.as_ref().map(|_| PlotCollector::default());
    let rows = compute_rows(&parcels, arg, plots.as_mut())
        .context("Failed to compute ratio report")?;

    let mut output = Output::from_output_path(arg.output.as_deref())?;
    match arg.format {
        OutputFormat::Table => {
            let label = arg.group_by.as_deref().unwrap_or("Group");
            table::write_report(&mut output, label, &rows)
                .with_context(|| format!("Failed to write report to {}", output.display_path()))?;
            output.finish()?;
        }
        OutputFormat::Json => {
            let document = ReportDocument::new(
                arg.parcels.display().to_string(),
                arg.group_by.clone(),
                &rows,
            );
            output.write_json(&document)?;
        }
        OutputFormat::Csv => {
            write_csv(&mut output, &rows)
                .with_context(|| format!("Failed to write CSV to {}", output.display_path()))?;
            output.finish()?;
        }
    }

    if let (Some(dir), Some(plots)) = (&arg.plot_dir, &plots) {
        plots.save_all(dir)?;
    }
    Ok(())
}

fn compute_rows(
    parcels: &[Parcel],
    arg: &ReportArg,
    plots: Option<&mut PlotCollector>,
) -> anyhow::Result<Vec<(String, RatioReportRow)>> {
    let study = RatioStudy::parcels();
    let group_key = |p: &Parcel| p.group.clone().unwrap_or_default();

    let rows = match (&arg.group_by, plots) {
        (Some(_), Some(plots)) => {
            if arg.parallel {
                log::warn!("--plot-dir computes groups sequentially; ignoring --parallel");
            }
            let partition = Partition::by_key(parcels, group_key);
            keyed_rows(study.report_partition(&partition, Some(plots))?)
        }
        (None, Some(plots)) => {
            let partition = Partition::by_key(parcels, |_| AllParcels);
            keyed_rows(study.report_partition(&partition, Some(plots))?)
        }
        (Some(_), None) if arg.parallel => keyed_rows(study.report_parallel(parcels, group_key)?),
        (Some(_), None) => keyed_rows(study.report(parcels, group_key)?),
        (None, None) => keyed_rows(study.report_ungrouped(parcels)?),
    };
    if rows.is_empty() {
        log::warn!("no parcels to report");
    }
    Ok(rows)
}

fn keyed_rows<K>(report: RatioReport<K>) -> Vec<(String, RatioReportRow)>
where
    K: ToString,
{
    report
        .into_rows()
        .into_iter()
        .map(|(key, row)| (key.to_string(), row))
        .collect()
}

fn write_csv<W>(writer: W, rows: &[(String, RatioReportRow)]) -> anyhow::Result<()>
where
    W: std::io::Write,
{
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record([
        "group",
        "count",
        "mean",
        "median",
        "weighted_mean",
        "min",
        "max",
        "prd",
        "cod",
        "prb",
        "sig",
    ])?;
    for (group, row) in rows {
        let row = row.formatted();
        writer.write_record([
            group.clone(),
            row.count.to_string(),
            row.mean,
            row.median,
            row.weighted_mean,
            row.min.to_string(),
            row.max.to_string(),
            row.prd,
            row.cod,
            row.prb,
            row.prb_significance,
        ])?;
    }
    writer.flush()?;
    Ok(())
}
