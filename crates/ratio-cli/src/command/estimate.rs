use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use ratio_study::valuation::LinearValuationModel;

use crate::{data::ParcelTable, util};

#[derive(Debug, Clone, Args)]
pub(crate) struct EstimateArg {
    /// Path to the parcels CSV file
    pub parcels: PathBuf,

    /// Path to the valuation model JSON file
    #[arg(long)]
    pub model: PathBuf,

    /// Name of the appended estimate column
    #[arg(long, default_value = "ESP")]
    pub output_column: String,

    /// Output CSV file path (default: stdout)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub(crate) fn run(arg: &EstimateArg) -> anyhow::Result<()> {
    let model = util::read_model_file(&arg.model)?;
    let table = ParcelTable::open(&arg.parcels)?;
    let estimates = estimate_rows(&model, &table)?;

    let mut output = util::Output::from_output_path(arg.output.as_deref())?;
    table
        .write_with_column(&mut output, &arg.output_column, &estimates)
        .with_context(|| format!("Failed to write CSV to {}", output.display_path()))?;
    output.finish()
}

fn estimate_rows(model: &LinearValuationModel, table: &ParcelTable) -> anyhow::Result<Vec<f64>> {
    for attribute in model.attributes() {
        table
            .column_index(attribute)
            .context("Model attribute is missing from the parcels file")?;
    }
    let estimates = table
        .rows()
        .enumerate()
        .map(|(i, row)| {
            model
                .estimate(&row)
                .with_context(|| format!("Failed to estimate row {}", i + 1))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    log::info!(
        "estimated {} parcel(s) with {} model term(s)",
        estimates.len(),
        model.terms.len()
    );
    Ok(estimates)
}

#[cfg(test)]
mod tests {
    use ratio_study::valuation::ModelTarget;

    use super::*;

    const CSV: &str = "\
ParcelId,SqFt,Pool,SalesPrice
A-1,1500,0,200000
A-2,2000,1,260000
";

    #[test]
    fn test_estimates_each_row() {
        let table = ParcelTable::from_reader(CSV.as_bytes()).unwrap();
        let model = LinearValuationModel::new(50_000.0, ModelTarget::Linear)
            .with_term("SqFt", 100.0)
            .with_term("Pool", 15_000.0);
        assert_eq!(estimate_rows(&model, &table).unwrap(), [200_000.0, 265_000.0]);
    }

    #[test]
    fn test_missing_model_column() {
        let table = ParcelTable::from_reader(CSV.as_bytes()).unwrap();
        let model = LinearValuationModel::new(0.0, ModelTarget::Log).with_term("Baths", 0.1);
        let err = estimate_rows(&model, &table).unwrap_err();
        assert_eq!(
            format!("{err:#}"),
            "Model attribute is missing from the parcels file: Column not found: Baths"
        );
    }

    #[test]
    fn test_blank_cell_fails_row() {
        let model = LinearValuationModel::new(0.0, ModelTarget::Linear).with_term("SqFt", 1.0);
        let table = ParcelTable::from_reader("SqFt,X\n1500,1\n,2\n".as_bytes()).unwrap();
        let err = estimate_rows(&model, &table).unwrap_err();
        assert_eq!(err.to_string(), "Failed to estimate row 2");
    }
}
