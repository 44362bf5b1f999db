pub mod earnings_at_risk;
pub mod statistics;

pub use earnings_at_risk::{run_earnings_at_risk, EarConfig, EarInput, EarOutput, EarYear, StressTest};
pub use statistics::HistogramBin;
