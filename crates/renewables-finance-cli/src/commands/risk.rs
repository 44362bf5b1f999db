use clap::Args;
use serde_json::Value;

use renewables_finance_core::risk::{run_earnings_at_risk, EarInput};

use super::Priced;
use crate::input;

/// Arguments for earnings at risk
#[derive(Args)]
pub struct EarArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Override the number of scenarios
    #[arg(long)]
    pub scenarios: Option<u32>,

    /// Override the random seed
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run_ear(args: EarArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut ear_input: Priced<EarInput> = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for earnings at risk".into());
    };
    if let Some(n) = args.scenarios {
        ear_input.model.config.num_scenarios = n;
    }
    if args.seed.is_some() {
        ear_input.model.config.seed = args.seed;
    }
    let prices = ear_input.market.into_gateway();
    let result = run_earnings_at_risk(&ear_input.model.portfolio, prices.as_ref(), &ear_input.model.config)?;
    Ok(serde_json::to_value(result)?)
}
