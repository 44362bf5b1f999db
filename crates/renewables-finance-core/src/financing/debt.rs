use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::FinanceError;
use crate::time_value::annuity_payment;
use crate::types::{diagnostic_warnings, with_metadata, ComputationOutput, Diagnostic, Money, Rate};
use crate::FinanceResult;

/// DSCR shortfall tolerated when testing a gearing.
const DSCR_TOLERANCE: Decimal = dec!(0.0001);
/// Gearing precision at which bisection stops.
const GEARING_TOLERANCE: Decimal = dec!(0.000001);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How principal is repaid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtStructure {
    /// Level annuity over the tenor.
    Amortizing,
    /// Principal sized each year to hold the target DSCR, remainder repaid
    /// in the final tenor year.
    #[default]
    Sculpted,
}

/// Which facility a schedule belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancingPhase {
    #[default]
    Project,
    Portfolio,
}

/// How often principal and interest fall due within a year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepaymentFrequency {
    #[default]
    Annual,
    Quarterly,
    Monthly,
}

impl RepaymentFrequency {
    pub fn payments_per_year(self) -> u32 {
        match self {
            RepaymentFrequency::Annual => 1,
            RepaymentFrequency::Quarterly => 4,
            RepaymentFrequency::Monthly => 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtTerms {
    pub interest_rate: Rate,
    pub tenor_years: u32,
    #[serde(default)]
    pub structure: DebtStructure,
    /// Interest-only years at the start of the tenor.
    #[serde(default)]
    pub grace_period_years: u32,
    #[serde(default)]
    pub repayment_frequency: RepaymentFrequency,
    /// Annual rate per tenor year from the first. Years past the end of the
    /// curve pay `interest_rate`.
    #[serde(default)]
    pub interest_rate_curve: Vec<Rate>,
}

impl DebtTerms {
    pub fn new(interest_rate: Rate, tenor_years: u32, structure: DebtStructure) -> Self {
        DebtTerms {
            interest_rate,
            tenor_years,
            structure,
            grace_period_years: 0,
            repayment_frequency: RepaymentFrequency::Annual,
            interest_rate_curve: Vec::new(),
        }
    }

    /// Annual rate in tenor year `i`, zero-based.
    pub fn rate_in_year(&self, i: usize) -> Rate {
        self.interest_rate_curve
            .get(i)
            .copied()
            .unwrap_or(self.interest_rate)
    }

    fn validate(&self) -> FinanceResult<()> {
        if self.tenor_years == 0 {
            return Err(FinanceError::InvalidInput {
                field: "tenor_years".into(),
                reason: "Tenor must be at least one year".into(),
            });
        }
        if self.grace_period_years >= self.tenor_years {
            return Err(FinanceError::InvalidInput {
                field: "grace_period_years".into(),
                reason: "Grace period must end before the tenor does".into(),
            });
        }
        let too_low = |r: &Rate| *r <= dec!(-1);
        if too_low(&self.interest_rate) || self.interest_rate_curve.iter().any(too_low) {
            return Err(FinanceError::InvalidInput {
                field: "interest_rate".into(),
                reason: "Interest rate must be greater than -100%".into(),
            });
        }
        Ok(())
    }
}

/// One year of a debt facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtScheduleEntry {
    pub year: i32,
    pub opening_balance: Money,
    pub drawdown: Money,
    pub interest: Money,
    pub principal: Money,
    pub closing_balance: Money,
    pub cfads: Money,
    pub debt_service: Money,
    /// `None` when there is no debt service.
    pub dscr: Option<Decimal>,
    pub target_dscr: Decimal,
}

/// A debt facility and its repayment schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtSchedule {
    pub name: String,
    pub phase: FinancingPhase,
    pub amount: Money,
    pub terms: DebtTerms,
    pub entries: Vec<DebtScheduleEntry>,
}

impl DebtSchedule {
    pub fn entry(&self, year: i32) -> Option<&DebtScheduleEntry> {
        self.entries.iter().find(|e| e.year == year)
    }

    pub fn min_dscr(&self) -> Option<Decimal> {
        min_dscr(&self.entries)
    }
}

/// Input for sizing debt against a CFADS profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtSizingInput {
    pub name: String,
    /// Amount gearing is applied to.
    pub capex: Money,
    pub max_gearing: Rate,
    pub terms: DebtTerms,
    /// Calendar year of the first repayment.
    pub first_year: i32,
    /// CFADS per year from `first_year`. Missing years count as zero.
    pub cfads: Vec<Money>,
    /// Target DSCR per year from `first_year`. The last value carries
    /// forward.
    pub target_dscr: Vec<Decimal>,
    #[serde(default)]
    pub phase: FinancingPhase,
    /// Bisection iteration budget.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

fn default_max_iterations() -> u32 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtSizingOutput {
    pub calculated_gearing: Rate,
    pub debt_amount: Money,
    pub schedule: DebtSchedule,
    pub min_dscr: Option<Decimal>,
    pub average_dscr: Option<Decimal>,
    pub iterations: u32,
    /// True when no positive gearing met the target and maximum gearing
    /// was used regardless.
    pub breach: bool,
    pub diagnostics: Vec<Diagnostic>,
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// Repayment schedule for `amount` drawn before `first_year`.
///
/// Grace years pay interest only. Afterwards amortizing debt pays a level
/// annuity over the remaining payments, re-struck whenever the rate
/// changes, and sculpted debt pays `CFADS / target − interest`, clamped to
/// the balance. With quarterly or monthly repayment each year is split into
/// equal payments, each accruing its share of the annual rate. The last
/// payment of the tenor clears the balance.
pub fn build_debt_schedule(
    amount: Money,
    terms: &DebtTerms,
    first_year: i32,
    cfads: &[Money],
    target_dscr: &[Decimal],
) -> FinanceResult<Vec<DebtScheduleEntry>> {
    if amount <= Decimal::ZERO || terms.tenor_years == 0 {
        return Ok(Vec::new());
    }
    terms.validate()?;
    let tenor = terms.tenor_years as usize;
    let per_year = terms.repayment_frequency.payments_per_year();
    let payments_per_year = Decimal::from(per_year);

    let mut entries = Vec::with_capacity(tenor);
    let mut balance = amount;
    for i in 0..tenor {
        let year_cfads = cfads.get(i).copied().unwrap_or(Decimal::ZERO);
        let target = target_at(target_dscr, i);
        let rate = terms.rate_in_year(i) / payments_per_year;
        let grace = (i as u32) < terms.grace_period_years;
        let last = i + 1 == tenor;

        let amortizing_payment = match terms.structure {
            DebtStructure::Amortizing if !grace && balance > Decimal::ZERO => {
                let remaining = (terms.tenor_years - i as u32) * per_year;
                annuity_payment(balance, rate, remaining)?
            }
            _ => Decimal::ZERO,
        };
        let sculpted_service = if target > Decimal::ZERO {
            year_cfads / target / payments_per_year
        } else {
            Decimal::ZERO
        };

        let opening_balance = balance;
        let mut interest = Decimal::ZERO;
        let mut principal = Decimal::ZERO;
        for q in 0..per_year {
            let due = balance * rate;
            let repaid = if last && q + 1 == per_year {
                balance
            } else if grace {
                Decimal::ZERO
            } else {
                let service = match terms.structure {
                    DebtStructure::Amortizing => amortizing_payment,
                    DebtStructure::Sculpted => sculpted_service,
                };
                (service - due).max(Decimal::ZERO).min(balance)
            };
            interest += due;
            principal += repaid;
            balance -= repaid;
        }

        let service = interest + principal;
        entries.push(DebtScheduleEntry {
            year: first_year + i as i32,
            opening_balance,
            drawdown: Decimal::ZERO,
            interest,
            principal,
            closing_balance: balance,
            cfads: year_cfads,
            debt_service: service,
            dscr: dscr(year_cfads, service),
            target_dscr: target,
        });
    }
    Ok(entries)
}

/// CFADS over debt service, `None` without service.
pub fn dscr(cfads: Money, debt_service: Money) -> Option<Decimal> {
    if debt_service > Decimal::ZERO {
        Some(cfads / debt_service)
    } else {
        None
    }
}

fn target_at(targets: &[Decimal], i: usize) -> Decimal {
    targets
        .get(i)
        .or_else(|| targets.last())
        .copied()
        .unwrap_or(Decimal::ONE)
}

fn min_dscr(entries: &[DebtScheduleEntry]) -> Option<Decimal> {
    entries.iter().filter_map(|e| e.dscr).min()
}

fn average_dscr(entries: &[DebtScheduleEntry]) -> Option<Decimal> {
    let values: Vec<Decimal> = entries.iter().filter_map(|e| e.dscr).collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<Decimal>() / Decimal::from(values.len()))
    }
}

/// Every serviced year meets its target within tolerance.
fn meets_targets(entries: &[DebtScheduleEntry]) -> bool {
    entries.iter().all(|e| match e.dscr {
        Some(d) => d >= e.target_dscr - DSCR_TOLERANCE,
        None => true,
    })
}

// ---------------------------------------------------------------------------
// Sizing
// ---------------------------------------------------------------------------

/// Largest gearing up to `max_gearing` whose schedule holds every DSCR
/// target, found by bisection.
///
/// When no positive gearing works the maximum is returned with `breach`
/// set and a [`Diagnostic::DscrBreach`]; sizing never fails on coverage.
pub fn solve_debt_sizing(input: &DebtSizingInput) -> FinanceResult<DebtSizingOutput> {
    validate_sizing_input(input)?;

    let schedule_for = |gearing: Decimal| {
        build_debt_schedule(
            input.capex * gearing,
            &input.terms,
            input.first_year,
            &input.cfads,
            &input.target_dscr,
        )
    };

    let mut iterations = 0u32;
    let max_entries = schedule_for(input.max_gearing)?;
    let (gearing, breach) = if meets_targets(&max_entries) {
        (input.max_gearing, false)
    } else if input.max_iterations == 0 {
        return Err(FinanceError::InvalidInput {
            field: "max_iterations".into(),
            reason: "Maximum gearing misses the DSCR target and no iterations are allowed to search below it".into(),
        });
    } else {
        let mut lo = Decimal::ZERO;
        let mut hi = input.max_gearing;
        while iterations < input.max_iterations && hi - lo > GEARING_TOLERANCE {
            iterations += 1;
            let mid = (lo + hi) / Decimal::TWO;
            if meets_targets(&schedule_for(mid)?) {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        debug!(name = %input.name, iterations, gearing = %lo, "debt sizing converged");
        if lo > Decimal::ZERO {
            (lo, false)
        } else {
            (input.max_gearing, true)
        }
    };

    let entries = if gearing == input.max_gearing {
        max_entries
    } else {
        schedule_for(gearing)?
    };

    let mut diagnostics = Vec::new();
    if breach {
        let worst = entries
            .iter()
            .filter(|e| e.dscr.is_some())
            .min_by_key(|e| e.dscr);
        warn!(name = %input.name, "no positive gearing meets the DSCR target");
        diagnostics.push(Diagnostic::DscrBreach {
            subject: input.name.clone(),
            year: worst.map(|e| e.year),
            dscr: worst.and_then(|e| e.dscr),
            target: worst
                .map(|e| e.target_dscr)
                .unwrap_or_else(|| target_at(&input.target_dscr, 0)),
        });
    }

    let debt_amount = input.capex * gearing;
    Ok(DebtSizingOutput {
        calculated_gearing: gearing,
        debt_amount,
        min_dscr: min_dscr(&entries),
        average_dscr: average_dscr(&entries),
        iterations,
        breach,
        diagnostics,
        schedule: DebtSchedule {
            name: input.name.clone(),
            phase: input.phase,
            amount: debt_amount,
            terms: input.terms.clone(),
            entries,
        },
    })
}

/// Size debt and wrap the result in the standard output envelope.
pub fn size_debt(input: &DebtSizingInput) -> FinanceResult<ComputationOutput<DebtSizingOutput>> {
    let start = Instant::now();
    let output = solve_debt_sizing(input)?;
    let warnings = diagnostic_warnings(&output.diagnostics);
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "DSCR-constrained debt sizing by gearing bisection",
        &serde_json::json!({
            "capex": input.capex.to_string(),
            "max_gearing": input.max_gearing.to_string(),
            "structure": input.terms.structure,
            "tenor_years": input.terms.tenor_years,
            "grace_period_years": input.terms.grace_period_years,
            "repayment_frequency": input.terms.repayment_frequency,
            "dscr_tolerance": DSCR_TOLERANCE.to_string(),
            "max_iterations": input.max_iterations,
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn validate_sizing_input(input: &DebtSizingInput) -> FinanceResult<()> {
    if input.capex < Decimal::ZERO {
        return Err(FinanceError::InvalidInput {
            field: "capex".into(),
            reason: "Capex cannot be negative".into(),
        });
    }
    if input.max_gearing < Decimal::ZERO || input.max_gearing > Decimal::ONE {
        return Err(FinanceError::InvalidInput {
            field: "max_gearing".into(),
            reason: "Gearing must be between 0 and 1".into(),
        });
    }
    input.terms.validate()?;
    if input.target_dscr.iter().any(|t| *t <= Decimal::ZERO) {
        return Err(FinanceError::InvalidInput {
            field: "target_dscr".into(),
            reason: "DSCR targets must be positive".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizing_input(structure: DebtStructure, cfads: Vec<Money>) -> DebtSizingInput {
        DebtSizingInput {
            name: "Test".into(),
            capex: dec!(100),
            max_gearing: dec!(0.8),
            terms: DebtTerms::new(dec!(0.06), 10, structure),
            first_year: 2026,
            cfads,
            target_dscr: vec![dec!(1.4)],
            phase: FinancingPhase::Project,
            max_iterations: 60,
        }
    }

    #[test]
    fn test_amortizing_schedule_repays_in_full() {
        let terms = DebtTerms::new(dec!(0.05), 5, DebtStructure::Amortizing);
        let entries = build_debt_schedule(dec!(50), &terms, 2030, &[dec!(20); 5], &[dec!(1.3)]).unwrap();
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[4].closing_balance, Decimal::ZERO);
        let principal: Money = entries.iter().map(|e| e.principal).sum();
        assert!((principal - dec!(50)).abs() < dec!(0.000001));
        // Level service within rounding
        assert!((entries[0].debt_service - entries[3].debt_service).abs() < dec!(0.000001));
        assert_eq!(entries[0].interest, dec!(2.5));
    }

    #[test]
    fn test_sculpted_principal_tracks_cfads() {
        let terms = DebtTerms::new(dec!(0.05), 3, DebtStructure::Sculpted);
        let entries =
            build_debt_schedule(dec!(20), &terms, 2030, &[dec!(13), dec!(13), dec!(13)], &[dec!(1.3)])
                .unwrap();
        // 13 / 1.3 = 10 of service, 1 of it interest
        assert_eq!(entries[0].principal, dec!(9));
        assert_eq!(entries[0].dscr, Some(dec!(1.3)));
        assert_eq!(entries[2].closing_balance, Decimal::ZERO);
    }

    #[test]
    fn test_dscr_none_without_service() {
        assert_eq!(dscr(dec!(10), Decimal::ZERO), None);
        assert_eq!(dscr(dec!(10), dec!(5)), Some(dec!(2)));
    }

    #[test]
    fn test_sizing_meets_target_when_fed_back() {
        let input = sizing_input(DebtStructure::Amortizing, vec![dec!(8); 10]);
        let out = solve_debt_sizing(&input).unwrap();
        assert!(!out.breach);
        assert!(out.calculated_gearing > Decimal::ZERO);
        assert!(out.calculated_gearing < dec!(0.8));
        let replay = build_debt_schedule(
            out.debt_amount,
            &input.terms,
            input.first_year,
            &input.cfads,
            &input.target_dscr,
        )
        .unwrap();
        for e in &replay {
            assert!(e.dscr.unwrap() >= dec!(1.4) - DSCR_TOLERANCE);
        }
    }

    #[test]
    fn test_sizing_returns_max_when_unconstrained() {
        let input = sizing_input(DebtStructure::Sculpted, vec![dec!(50); 10]);
        let out = solve_debt_sizing(&input).unwrap();
        assert_eq!(out.calculated_gearing, dec!(0.8));
        assert_eq!(out.iterations, 0);
    }

    #[test]
    fn test_sizing_flags_breach_when_nothing_fits() {
        let mut input = sizing_input(DebtStructure::Amortizing, vec![Decimal::ZERO; 10]);
        input.max_iterations = 40;
        let out = solve_debt_sizing(&input).unwrap();
        assert!(out.breach);
        assert_eq!(out.calculated_gearing, dec!(0.8));
        assert!(matches!(out.diagnostics[0], Diagnostic::DscrBreach { .. }));
    }

    #[test]
    fn test_iteration_budget_respected() {
        let mut input = sizing_input(DebtStructure::Amortizing, vec![dec!(8); 10]);
        input.max_iterations = 5;
        let out = solve_debt_sizing(&input).unwrap();
        assert!(out.iterations <= 5);
    }

    #[test]
    fn test_grace_years_pay_interest_only() {
        let mut terms = DebtTerms::new(dec!(0.05), 5, DebtStructure::Amortizing);
        terms.grace_period_years = 2;
        let entries = build_debt_schedule(dec!(100), &terms, 2030, &[dec!(40); 5], &[dec!(1.3)]).unwrap();
        for e in &entries[..2] {
            assert_eq!(e.principal, Decimal::ZERO);
            assert_eq!(e.interest, dec!(5));
            assert_eq!(e.closing_balance, dec!(100));
        }
        // the annuity runs over the three years left
        let payment = annuity_payment(dec!(100), dec!(0.05), 3).unwrap();
        assert!((entries[2].debt_service - payment).abs() < dec!(0.000001));
        assert!((entries[3].debt_service - payment).abs() < dec!(0.000001));
        assert_eq!(entries[4].closing_balance, Decimal::ZERO);
    }

    #[test]
    fn test_grace_as_long_as_tenor_rejected() {
        let mut terms = DebtTerms::new(dec!(0.05), 3, DebtStructure::Sculpted);
        terms.grace_period_years = 3;
        assert!(build_debt_schedule(dec!(10), &terms, 2030, &[dec!(5); 3], &[dec!(1.3)]).is_err());
    }

    #[test]
    fn test_rate_curve_overrides_base_rate_by_year() {
        let mut terms = DebtTerms::new(dec!(0.05), 4, DebtStructure::Sculpted);
        terms.interest_rate_curve = vec![dec!(0.04), dec!(0.07)];
        let entries =
            build_debt_schedule(dec!(20), &terms, 2030, &[dec!(13); 4], &[dec!(1.3)]).unwrap();
        assert_eq!(entries[0].interest, dec!(0.8));
        assert_eq!(entries[1].interest, entries[1].opening_balance * dec!(0.07));
        assert_eq!(entries[2].interest, entries[2].opening_balance * dec!(0.05));
    }

    #[test]
    fn test_quarterly_repayment_pays_less_interest() {
        let annual = DebtTerms::new(dec!(0.08), 3, DebtStructure::Sculpted);
        let quarterly = DebtTerms {
            repayment_frequency: RepaymentFrequency::Quarterly,
            ..annual.clone()
        };
        let cfads = [dec!(13); 3];
        let a = build_debt_schedule(dec!(20), &annual, 2030, &cfads, &[dec!(1.3)]).unwrap();
        let q = build_debt_schedule(dec!(20), &quarterly, 2030, &cfads, &[dec!(1.3)]).unwrap();
        // same annual service, more of it principal
        assert_eq!(q[0].debt_service, dec!(10));
        assert_eq!(q[0].dscr, Some(dec!(1.3)));
        assert!(q[0].interest < a[0].interest);
        assert!(q[0].principal > a[0].principal);
        assert_eq!(q[2].closing_balance, Decimal::ZERO);
    }

    #[test]
    fn test_zero_iterations_with_infeasible_maximum_rejected() {
        let mut input = sizing_input(DebtStructure::Amortizing, vec![dec!(8); 10]);
        input.max_iterations = 0;
        assert!(matches!(
            solve_debt_sizing(&input),
            Err(FinanceError::InvalidInput { field, .. }) if field == "max_iterations"
        ));
        // a feasible maximum needs no search
        let mut easy = sizing_input(DebtStructure::Sculpted, vec![dec!(50); 10]);
        easy.max_iterations = 0;
        assert_eq!(solve_debt_sizing(&easy).unwrap().calculated_gearing, dec!(0.8));
    }

    #[test]
    fn test_invalid_gearing_rejected() {
        let mut input = sizing_input(DebtStructure::Amortizing, vec![dec!(8); 10]);
        input.max_gearing = dec!(1.5);
        assert!(solve_debt_sizing(&input).is_err());
    }
}
