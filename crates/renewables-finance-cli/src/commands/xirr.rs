use clap::Args;
use serde_json::Value;

use renewables_finance_core::time_value::{compute_xirr, XirrInput};

use crate::input;

/// Arguments for XIRR
#[derive(Args)]
pub struct XirrArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_xirr(args: XirrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let xirr_input: XirrInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for XIRR".into());
    };
    let result = compute_xirr(&xirr_input)?;
    Ok(serde_json::to_value(result)?)
}
