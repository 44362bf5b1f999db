use clap::{Args, ValueEnum};
use serde_json::{json, Value};

use renewables_finance_core::period::{self, Period, PeriodKind};

/// Arguments for period parsing and timeline generation
#[derive(Args)]
pub struct PeriodArgs {
    /// Period label to parse, e.g. 2025, 2025-Q3, 03/01/2025 or 2025-03
    #[arg(long, conflicts_with = "start_year")]
    pub parse: Option<String>,

    /// Timeline granularity
    #[arg(long, value_enum, default_value = "annual")]
    pub interval: Interval,

    /// First year of the generated timeline
    #[arg(long)]
    pub start_year: Option<i32>,

    /// Number of periods to generate
    #[arg(long, default_value_t = 1)]
    pub count: u32,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Interval {
    Annual,
    Quarterly,
    Monthly,
}

impl From<Interval> for PeriodKind {
    fn from(i: Interval) -> Self {
        match i {
            Interval::Annual => PeriodKind::Annual,
            Interval::Quarterly => PeriodKind::Quarterly,
            Interval::Monthly => PeriodKind::Monthly,
        }
    }
}

pub fn run_period(args: PeriodArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(ref raw) = args.parse {
        let p = period::parse_period(raw)?;
        return Ok(json!({ "result": describe(&p) }));
    }

    let Some(start_year) = args.start_year else {
        return Err("--parse <label> or --start-year <year> required for period".into());
    };
    Period::annual(start_year)?;
    let kind = PeriodKind::from(args.interval);
    let periods: Vec<Value> = period::generate_periods(kind, start_year, args.count)
        .iter()
        .map(describe)
        .collect();
    Ok(json!({
        "result": {
            "interval": kind,
            "count": periods.len(),
            "periods": periods,
        }
    }))
}

fn describe(p: &Period) -> Value {
    json!({
        "period": p,
        "kind": p.kind(),
        "year": p.year(),
        "quarter": p.quarter(),
        "month": p.month(),
        "start_date": p.start_date(),
        "end_date": p.end_date(),
        "fraction_of_year": p.fraction_of_year(),
        "hours": p.hours(),
    })
}
