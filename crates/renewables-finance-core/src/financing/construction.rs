use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::period::fractional_year;
use crate::types::Money;

/// Order in which equity and debt fund construction spend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquityTiming {
    /// Each draw split by gearing.
    #[default]
    ProRata,
    /// Equity funds spend until exhausted, then debt.
    EquityFirst,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionYear {
    pub year: i32,
    pub capex: Money,
    pub cumulative_capex: Money,
    pub debt_drawdown: Money,
    pub equity_contribution: Money,
}

/// Capex spent by fractional year `t` on a straight-line build of
/// `duration` years starting at `start`:
/// `total × min(1, max(0, (t − start) / duration))`.
pub fn cumulative_capex(total: Money, t: Decimal, start: Decimal, duration: Decimal) -> Money {
    if duration <= Decimal::ZERO {
        return if t >= start { total } else { Decimal::ZERO };
    }
    let progress = ((t - start) / duration)
        .max(Decimal::ZERO)
        .min(Decimal::ONE);
    total * progress
}

/// Year-by-year construction spend and its funding.
///
/// Construction runs for `duration_years` up to the commissioning date.
/// Each year's draw is the difference in cumulative capex between
/// consecutive year ends. `debt_amount` is the total debt drawn, the rest
/// is equity.
pub fn construction_schedule(
    capex: Money,
    commissioning_date: NaiveDate,
    duration_years: Decimal,
    debt_amount: Money,
    timing: EquityTiming,
) -> Vec<ConstructionYear> {
    if capex <= Decimal::ZERO {
        return Vec::new();
    }
    let debt_amount = debt_amount.max(Decimal::ZERO).min(capex);
    let equity_total = capex - debt_amount;
    let cod = fractional_year(commissioning_date);
    let duration = duration_years.max(Decimal::ZERO);
    let start = cod - duration;

    let first_year = start.floor().to_i32().unwrap_or(0);
    let last_year = cod.floor().to_i32().unwrap_or(first_year);

    let mut rows = Vec::new();
    let mut prev_cum = Decimal::ZERO;
    let mut prev_equity = Decimal::ZERO;
    for year in first_year..=last_year {
        let year_end = Decimal::from(year + 1);
        let cum = cumulative_capex(capex, year_end, start, duration);
        let draw = cum - prev_cum;
        if draw.is_zero() {
            prev_cum = cum;
            continue;
        }

        let (equity, debt) = match timing {
            EquityTiming::ProRata => {
                let equity = draw * equity_total / capex;
                (equity, draw - equity)
            }
            EquityTiming::EquityFirst => {
                let cum_equity = cum.min(equity_total);
                let equity = cum_equity - prev_equity;
                prev_equity = cum_equity;
                (equity, draw - equity)
            }
        };

        rows.push(ConstructionYear {
            year,
            capex: draw,
            cumulative_capex: cum,
            debt_drawdown: debt,
            equity_contribution: equity,
        });
        prev_cum = cum;
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cumulative_capex_clamped() {
        assert_eq!(cumulative_capex(dec!(100), dec!(2024), dec!(2025), dec!(2)), Decimal::ZERO);
        assert_eq!(cumulative_capex(dec!(100), dec!(2026), dec!(2025), dec!(2)), dec!(50));
        assert_eq!(cumulative_capex(dec!(100), dec!(2030), dec!(2025), dec!(2)), dec!(100));
    }

    #[test]
    fn test_two_year_build_pro_rata() {
        let cod = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        let rows = construction_schedule(dec!(200), cod, dec!(2), dec!(120), EquityTiming::ProRata);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].year, 2025);
        assert_eq!(rows[0].capex, dec!(100));
        assert_eq!(rows[0].debt_drawdown, dec!(60));
        assert_eq!(rows[1].equity_contribution, dec!(40));
        let total: Money = rows.iter().map(|r| r.capex).sum();
        assert_eq!(total, dec!(200));
    }

    #[test]
    fn test_equity_first_funds_early_spend() {
        let cod = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        let rows =
            construction_schedule(dec!(200), cod, dec!(2), dec!(120), EquityTiming::EquityFirst);
        assert_eq!(rows[0].equity_contribution, dec!(80));
        assert_eq!(rows[0].debt_drawdown, dec!(20));
        assert_eq!(rows[1].equity_contribution, Decimal::ZERO);
        assert_eq!(rows[1].debt_drawdown, dec!(100));
    }

    #[test]
    fn test_zero_duration_spends_in_commissioning_year() {
        let cod = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        let rows = construction_schedule(dec!(50), cod, Decimal::ZERO, dec!(0), EquityTiming::ProRata);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].year, 2026);
        assert_eq!(rows[0].equity_contribution, dec!(50));
    }
}
