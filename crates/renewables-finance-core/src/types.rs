use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// All monetary values, in $M unless a field says otherwise.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Energy volumes in MWh.
pub type Mwh = Decimal;

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    envelope(methodology, assumptions, warnings, elapsed_us, result, "rust_decimal_128bit")
}

/// Same as [`with_metadata`] for results computed in `f64`.
pub fn with_metadata_f64<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    envelope(methodology, assumptions, warnings, elapsed_us, result, "ieee754_f64")
}

fn envelope<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
    precision: &str,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: precision.to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// A non-fatal finding raised while modelling. Diagnostics never stop a run;
/// they travel with the result and are mirrored into the envelope warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The asset failed validation and was left out of the run.
    AssetExcluded { asset: String, reason: String },
    /// No positive gearing met the DSCR target; maximum gearing was used.
    DscrBreach {
        subject: String,
        year: Option<i32>,
        dscr: Option<Decimal>,
        target: Decimal,
    },
    /// Assets differ from liabilities plus equity by more than the tolerance.
    BalanceSheetImbalance { year: i32, difference: Decimal },
    /// Cash closed the year below the minimum balance.
    CashBelowMinimum {
        year: i32,
        cash: Decimal,
        minimum: Decimal,
    },
    /// XIRR did not produce a rate for the named cash flow series.
    IrrNotFound { series: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::AssetExcluded { asset, reason } => {
                write!(f, "Asset '{asset}' excluded: {reason}")
            }
            Diagnostic::DscrBreach {
                subject,
                year,
                dscr,
                target,
            } => {
                write!(f, "{subject}: DSCR target {target} not achievable at any positive gearing")?;
                if let (Some(y), Some(d)) = (year, dscr) {
                    write!(f, " (worst year {y}, DSCR {})", d.round_dp(3))?;
                }
                Ok(())
            }
            Diagnostic::BalanceSheetImbalance { year, difference } => {
                write!(f, "Balance sheet out of balance in {year} by {difference}")
            }
            Diagnostic::CashBelowMinimum {
                year,
                cash,
                minimum,
            } => write!(
                f,
                "Cash balance {} below minimum {minimum} in {year}",
                cash.round_dp(4)
            ),
            Diagnostic::IrrNotFound { series } => {
                write!(f, "{series}: IRR could not be solved")
            }
        }
    }
}

/// Render diagnostics as envelope warnings.
pub fn diagnostic_warnings(diagnostics: &[Diagnostic]) -> Vec<String> {
    diagnostics.iter().map(|d| d.to_string()).collect()
}
