use clap::{Parser, Subcommand};

use self::{coverage::CoverageArg, estimate::EstimateArg, report::ReportArg};

mod coverage;
mod estimate;
mod report;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Compute ratio-study statistics, optionally per group
    Report(#[clap(flatten)] ReportArg),
    /// Apply a linear valuation model to every parcel
    Estimate(#[clap(flatten)] EstimateArg),
    /// Count sales coverage of model coefficients
    Coverage(#[clap(flatten)] CoverageArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Report(arg) => report::run(&arg)?,
        Mode::Estimate(arg) => estimate::run(&arg)?,
        Mode::Coverage(arg) => coverage::run(&arg)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn test_command_definition() {
        CommandArgs::command().debug_assert();
    }

    #[test]
    fn test_report_defaults() {
        let args = CommandArgs::try_parse_from(["ratio-study", "report", "sales.csv"]).unwrap();
        let Mode::Report(arg) = args.mode else {
            panic!("expected report mode");
        };
        assert_eq!(arg.predicted_column, "ESP");
        assert_eq!(arg.sale_price_column, "SalesPrice");
        assert_eq!(arg.format, report::OutputFormat::Table);
        assert!(arg.group_by.is_none());
        assert!(!arg.parallel);
    }

    #[test]
    fn test_coverage_columns_are_comma_separated() {
        let args = CommandArgs::try_parse_from([
            "ratio-study",
            "coverage",
            "sales.csv",
            "--columns",
            "LnSqFt,Pool",
        ])
        .unwrap();
        let Mode::Coverage(arg) = args.mode else {
            panic!("expected coverage mode");
        };
        assert_eq!(arg.columns, ["LnSqFt", "Pool"]);
    }
}
