use std::path::PathBuf;

use clap::Args;
use ratio_study::coverage::{self, CoverageEntry};

use crate::{data::ParcelTable, util::Output};

#[derive(Debug, Clone, Args)]
pub(crate) struct CoverageArg {
    /// Path to the parcels CSV file
    pub parcels: PathBuf,

    /// Model columns to count (comma-separated, default: every column)
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Write JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Output file path (default: stdout)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub(crate) fn run(arg: &CoverageArg) -> anyhow::Result<()> {
    let table = ParcelTable::open(&arg.parcels)?;
    let entries = column_coverage(&table, &arg.columns)?;

    let mut output = Output::from_output_path(arg.output.as_deref())?;
    if arg.json {
        output.write_json(&entries)?;
    } else {
        write_table(&mut output, &entries)?;
        output.finish()?;
    }
    Ok(())
}

fn column_coverage(table: &ParcelTable, columns: &[String]) -> anyhow::Result<Vec<CoverageEntry>> {
    let columns: Vec<String> = if columns.is_empty() {
        table.headers().map(str::to_owned).collect()
    } else {
        for column in columns {
            table.column_index(column)?;
        }
        columns.to_vec()
    };
    let rows = table.rows().collect::<Vec<_>>();
    Ok(coverage::coefficient_coverage(
        &rows,
        columns.iter().map(String::as_str),
    ))
}

fn write_table<W>(mut writer: W, entries: &[CoverageEntry]) -> std::io::Result<()>
where
    W: std::io::Write,
{
    writeln!(writer, "  {:<30} {:>12} {:>10}", "Column", "Kind", "Coverage")?;
    writeln!(writer, "  {}", "-".repeat(54))?;
    for entry in entries {
        writeln!(
            writer,
            "  {:<30} {:>12} {:>10}",
            entry.column,
            entry.kind.to_string(),
            entry.coverage
        )?;
    }
    Ok(())
}
