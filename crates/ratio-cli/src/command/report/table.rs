//! Ratio report table display

use std::io::{self, Write};

use ratio_study::report::RatioReportRow;

/// Write the report table followed by its legend
///
/// # Arguments
/// * `writer` - Destination of the table
/// * `label_col` - Name of the group column (e.g., the `--group-by` column)
/// * `rows` - Report rows in display order
pub(super) fn write_report<W>(
    mut writer: W,
    label_col: &str,
    rows: &[(String, RatioReportRow)],
) -> io::Result<()>
where
    W: Write,
{
    writeln!(
        writer,
        "  {:<20} {:>7} {:>7} {:>7} {:>7} {:>10} {:>10} {:>7} {:>8} {:>7} {:>7}",
        label_col, "Count", "Mean", "Median", "WMean", "Min", "Max", "PRD", "COD", "PRB", "Sig",
    )?;
    // label(20) + count(7) + mean/median/wmean(7 × 3) + min/max(10 × 2) + prd(7) + cod(8)
    // + prb/sig(7 × 2) + spaces(10)
    writeln!(writer, "  {}", "-".repeat(107))?;

    for (label, row) in rows {
        let row = row.formatted();
        writeln!(
            writer,
            "  {:<20} {:>7} {:>7} {:>7} {:>7} {:>10} {:>10} {:>7} {:>8} {:>7} {:>7}",
            label,
            row.count,
            row.mean,
            row.median,
            row.weighted_mean,
            row.min,
            row.max,
            row.prd,
            row.cod,
            row.prb,
            row.prb_significance,
        )?;
    }
    if rows.is_empty() {
        writeln!(writer, "  (no parcels)")?;
    }

    writeln!(writer)?;
    write_legend(writer)
}

fn write_legend<W>(mut writer: W) -> io::Result<()>
where
    W: Write,
{
    writeln!(writer, "Legend:")?;
    writeln!(writer, "  Mean/Median : Mean and median of predicted value / sale price")?;
    writeln!(writer, "  WMean       : Weighted mean ratio (sum of predictions / sum of prices)")?;
    writeln!(writer, "  PRD         : Price-related differential (> 1.03 regressive, < 0.98 progressive)")?;
    writeln!(writer, "  COD         : Coefficient of dispersion, average % deviation from the median ratio")?;
    writeln!(writer, "  PRB         : Price-related bias, ratio change per doubling of value")?;
    writeln!(writer, "  Sig         : Two-sided p-value of PRB (NaN with only two parcels, too few to test)")?;
    Ok(())
}
