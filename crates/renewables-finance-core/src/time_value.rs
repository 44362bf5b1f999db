use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::FinanceError;
use crate::types::{with_metadata_f64, ComputationOutput, Money, Rate};
use crate::FinanceResult;

const XIRR_TOLERANCE: f64 = 1e-6;
const MAX_IRR_ITERATIONS: u32 = 100;
const DAYS_PER_YEAR: f64 = 365.25;
const MIN_RATE: f64 = -0.99;
const MAX_RATE: f64 = 10.0;

/// Starting point used when callers have no better guess.
pub const DEFAULT_XIRR_GUESS: f64 = 0.1;

/// Net present value of dated cash flows, discounted to the first date.
pub fn xnpv(rate: f64, dated_flows: &[(NaiveDate, f64)]) -> f64 {
    let Some(&(base_date, _)) = dated_flows.first() else {
        return 0.0;
    };
    dated_flows
        .iter()
        .map(|(date, cf)| {
            let years = (*date - base_date).num_days() as f64 / DAYS_PER_YEAR;
            cf / (1.0 + rate).powf(years)
        })
        .sum()
}

/// Extended IRR for irregular cash flow dates using Newton-Raphson.
///
/// Returns `NaN` instead of failing: fewer than two flows, all-zero flows,
/// no sign change, a zero derivative, a step outside (-0.99, 10), or no
/// convergence within 100 iterations.
pub fn xirr(dated_flows: &[(NaiveDate, f64)], guess: f64) -> f64 {
    if dated_flows.len() < 2 {
        return f64::NAN;
    }
    let has_positive = dated_flows.iter().any(|(_, cf)| *cf > 0.0);
    let has_negative = dated_flows.iter().any(|(_, cf)| *cf < 0.0);
    if !has_positive || !has_negative {
        return f64::NAN;
    }

    let base_date = dated_flows[0].0;
    let times: Vec<f64> = dated_flows
        .iter()
        .map(|(date, _)| (*date - base_date).num_days() as f64 / DAYS_PER_YEAR)
        .collect();

    let mut rate = guess;
    for i in 0..MAX_IRR_ITERATIONS {
        let mut npv = 0.0;
        let mut dnpv = 0.0;
        for ((_, cf), t) in dated_flows.iter().zip(&times) {
            let discount = (1.0 + rate).powf(*t);
            npv += cf / discount;
            dnpv -= t * cf / ((1.0 + rate) * discount);
        }

        if npv.abs() < XIRR_TOLERANCE {
            debug!(iterations = i, rate, "xirr converged");
            return rate;
        }
        if dnpv == 0.0 || !dnpv.is_finite() {
            return f64::NAN;
        }

        let next = rate - npv / dnpv;
        if !next.is_finite() || next <= MIN_RATE || next >= MAX_RATE {
            debug!(iterations = i, next, "xirr left the admissible range");
            return f64::NAN;
        }
        if (next - rate).abs() < XIRR_TOLERANCE * 1e-3 {
            return next;
        }
        rate = next;
    }

    f64::NAN
}

/// Convenience wrapper over [`xirr`] for Decimal cash flows.
pub fn xirr_decimal(dated_flows: &[(NaiveDate, Money)]) -> f64 {
    let flows: Vec<(NaiveDate, f64)> = dated_flows
        .iter()
        .map(|(d, cf)| (*d, cf.to_f64().unwrap_or(0.0)))
        .collect();
    xirr(&flows, DEFAULT_XIRR_GUESS)
}

/// One dated cash flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatedCashFlow {
    pub date: NaiveDate,
    pub amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XirrInput {
    pub cash_flows: Vec<DatedCashFlow>,
    #[serde(default)]
    pub guess: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XirrOutput {
    /// `None` when no rate could be found.
    pub xirr: Option<f64>,
    pub flow_count: usize,
    pub total_outflow: Money,
    pub total_inflow: Money,
}

/// XIRR over a list of dated flows. Flows are sorted by date first; an
/// unsolvable series is reported as a warning with `xirr: None`.
pub fn compute_xirr(input: &XirrInput) -> FinanceResult<ComputationOutput<XirrOutput>> {
    let start = Instant::now();
    let guess = input.guess.unwrap_or(DEFAULT_XIRR_GUESS);
    if !guess.is_finite() || guess <= MIN_RATE || guess >= MAX_RATE {
        return Err(FinanceError::InvalidInput {
            field: "guess".into(),
            reason: "Guess must lie in (-0.99, 10)".into(),
        });
    }

    let mut flows: Vec<(NaiveDate, Money)> = input
        .cash_flows
        .iter()
        .map(|cf| (cf.date, cf.amount))
        .collect();
    flows.sort_by_key(|(date, _)| *date);
    let as_f64: Vec<(NaiveDate, f64)> = flows
        .iter()
        .map(|(d, cf)| (*d, cf.to_f64().unwrap_or(0.0)))
        .collect();

    let rate = xirr(&as_f64, guess);
    let mut warnings = Vec::new();
    if !rate.is_finite() {
        warnings.push("XIRR did not converge; check the flows change sign".to_string());
    }

    let output = XirrOutput {
        xirr: rate.is_finite().then_some(rate),
        flow_count: flows.len(),
        total_outflow: flows.iter().map(|(_, cf)| *cf).filter(|cf| cf.is_sign_negative()).sum(),
        total_inflow: flows.iter().map(|(_, cf)| *cf).filter(|cf| cf.is_sign_positive()).sum(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata_f64(
        "XIRR (Newton-Raphson, actual/365.25)",
        &serde_json::json!({ "guess": guess }),
        warnings,
        elapsed,
        output,
    ))
}

/// Level annuity payment on `principal` over `periods` at `rate`.
///
/// `P·r(1+r)^n / ((1+r)^n − 1)`, or `P/n` when the rate is zero.
pub fn annuity_payment(principal: Money, rate: Rate, periods: u32) -> FinanceResult<Money> {
    if periods == 0 {
        return Err(FinanceError::InvalidInput {
            field: "periods".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }
    if rate.is_zero() {
        return Ok(principal / Decimal::from(periods));
    }

    let factor = (Decimal::ONE + rate).powi(periods as i64);
    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return Err(FinanceError::InvalidInput {
            field: "rate".into(),
            reason: "Annuity factor is zero".into(),
        });
    }
    Ok(principal * rate * factor / denominator)
}
