use clap::Args;
use serde_json::Value;

use renewables_finance_core::revenue::{forecast_portfolio_revenue, RevenueForecastInput};

use super::Priced;
use crate::input;

/// Arguments for a portfolio revenue forecast
#[derive(Args)]
pub struct RevenueArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_revenue(args: RevenueArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let rev_input: Priced<RevenueForecastInput> = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for revenue forecast".into());
    };
    let prices = rev_input.market.into_gateway();
    let result = forecast_portfolio_revenue(&rev_input.model, prices.as_ref())?;
    Ok(serde_json::to_value(result)?)
}
