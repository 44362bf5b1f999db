use clap::Args;
use serde_json::Value;

use renewables_finance_core::financing::{size_debt, DebtSizingInput};
use renewables_finance_core::statements::{model_asset_financing, AssetFinancingInput};

use super::Priced;
use crate::input;

/// Arguments for debt sizing
#[derive(Args)]
pub struct SizeDebtArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for single-asset financing
#[derive(Args)]
pub struct AssetFinanceArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_size_debt(args: SizeDebtArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sizing_input: DebtSizingInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for debt sizing".into());
    };
    let result = size_debt(&sizing_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_asset_finance(args: AssetFinanceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let asset_input: Priced<AssetFinancingInput> = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for asset financing".into());
    };
    let prices = asset_input.market.into_gateway();
    let result = model_asset_financing(&asset_input.model, prices.as_ref())?;
    Ok(serde_json::to_value(result)?)
}
