use clap::Args;
use serde_json::Value;

use renewables_finance_core::statements::{build_platform_statements, StatementsInput};

use super::period::Interval;
use super::Priced;
use crate::input;

/// Arguments for platform financial statements
#[derive(Args)]
pub struct StatementsArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Also report the income statement at this interval
    #[arg(long, value_enum)]
    pub interval: Option<Interval>,

    /// Calendar month fiscal years start in (1-12)
    #[arg(long)]
    pub fiscal_start: Option<u32>,
}

pub fn run_statements(args: StatementsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut fs_input: Priced<StatementsInput> = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for platform statements".into());
    };
    if let Some(interval) = args.interval {
        fs_input.model.platform.statement_interval = interval.into();
    }
    if let Some(month) = args.fiscal_start {
        fs_input.model.platform.fiscal_year_start_month = month;
    }
    let prices = fs_input.market.into_gateway();
    let result = build_platform_statements(&fs_input.model, prices.as_ref())?;
    Ok(serde_json::to_value(result)?)
}
