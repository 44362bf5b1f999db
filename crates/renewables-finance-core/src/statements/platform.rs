use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::assets::Asset;
use crate::error::FinanceError;
use crate::financing::assumptions::AssetCostAssumptions;
use crate::financing::construction::construction_schedule;
use crate::financing::debt::{
    dscr, solve_debt_sizing, DebtSizingInput, DebtSizingOutput, DebtStructure, DebtTerms,
    FinancingPhase,
};
use crate::period::{Period, PeriodKind};
use crate::pricing::gateway::MerchantPriceGateway;
use crate::revenue::portfolio::{screen_assets, Portfolio};
use crate::time_value::xirr_decimal;
use crate::types::{diagnostic_warnings, with_metadata, ComputationOutput, Diagnostic, Money, Rate};
use crate::FinanceResult;

use super::asset_statement::{project_asset, AssetFinancials, AssetStatementYear, TaxSettings};
use super::deferred_tax::{deferred_tax_schedule, DeferredTaxInput, DeferredTaxYear, TaxDepreciationLives};
use super::periodic::{fiscal_year_summaries, monthly_statements, roll_up, FiscalYearSummary, PeriodStatement};

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// A platform-level facility that refinances project debt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioFinancing {
    /// Project debt outstanding at the end of the prior year is repaid
    /// from the facility in this year.
    pub refinance_year: i32,
    pub max_gearing: Rate,
    pub target_dscr: Decimal,
    pub interest_rate: Rate,
    pub tenor_years: u32,
    #[serde(default)]
    pub debt_structure: DebtStructure,
}

impl PortfolioFinancing {
    pub fn terms(&self) -> DebtTerms {
        DebtTerms::new(self.interest_rate, self.tenor_years, self.debt_structure)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformAssumptions {
    pub start_year: i32,
    #[serde(default = "default_years")]
    pub years: u32,
    #[serde(default = "default_tax_rate")]
    pub tax_rate: Rate,
    /// Platform overhead per year from `start_year`, $M.
    #[serde(default)]
    pub platform_opex: Money,
    #[serde(default)]
    pub platform_opex_escalation: Rate,
    /// Share of positive NPAT paid out, limited by cash above the minimum.
    #[serde(default)]
    pub dividend_payout_ratio: Rate,
    #[serde(default)]
    pub minimum_cash_balance: Money,
    #[serde(default = "default_balance_tolerance")]
    pub balance_tolerance: Decimal,
    #[serde(default)]
    pub tax_depreciation: TaxDepreciationLives,
    #[serde(default)]
    pub portfolio_financing: Option<PortfolioFinancing>,
    #[serde(default = "default_max_iterations")]
    pub max_sizing_iterations: u32,
    /// Interval of the `periods` view. Annual statements are always built.
    #[serde(default)]
    pub statement_interval: PeriodKind,
    /// Calendar month fiscal years start in.
    #[serde(default = "default_fiscal_year_start")]
    pub fiscal_year_start_month: u32,
}

fn default_fiscal_year_start() -> u32 {
    7
}

fn default_years() -> u32 {
    30
}

fn default_tax_rate() -> Rate {
    dec!(0.30)
}

fn default_balance_tolerance() -> Decimal {
    dec!(0.01)
}

fn default_max_iterations() -> u32 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementsInput {
    pub portfolio: Portfolio,
    /// Keyed by asset name.
    #[serde(default)]
    pub cost_assumptions: BTreeMap<String, AssetCostAssumptions>,
    pub platform: PlatformAssumptions,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Consolidated P&L, cash flow and balance sheet for one year. $M.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformYear {
    pub year: i32,
    // Income statement
    pub revenue: Money,
    pub contracted_revenue: Money,
    pub merchant_revenue: Money,
    pub asset_opex: Money,
    pub platform_opex: Money,
    pub ebitda: Money,
    pub depreciation: Money,
    pub ebit: Money,
    pub interest: Money,
    pub ebt: Money,
    pub tax: Money,
    pub npat: Money,
    // Cash flow
    pub cfads: Money,
    pub principal_repayment: Money,
    pub dscr: Option<Decimal>,
    pub fcfe: Money,
    pub capex: Money,
    pub debt_drawdown: Money,
    pub refinancing_proceeds: Money,
    pub refinancing_repayment: Money,
    pub equity_contribution: Money,
    pub dividend: Money,
    pub equity_cash_flow: Money,
    pub project_cash_flow: Money,
    // Balance sheet
    pub cash: Money,
    pub net_ppe: Money,
    pub total_assets: Money,
    pub debt: Money,
    pub total_liabilities: Money,
    pub contributed_equity: Money,
    pub retained_earnings: Money,
    pub total_equity: Money,
    pub balance_difference: Money,
    // Deferred tax memo
    pub deferred_tax_liability: Money,
    pub deferred_tax_asset: Money,
    pub tax_losses_carried_forward: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementsSummary {
    pub asset_count: usize,
    pub first_year: i32,
    pub last_year: i32,
    pub total_capex: Money,
    pub project_debt: Money,
    /// Project debt over capex.
    pub calculated_gearing: Rate,
    pub portfolio_debt: Money,
    pub total_revenue: Money,
    pub total_npat: Money,
    pub total_dividends: Money,
    pub min_dscr: Option<Decimal>,
    pub equity_irr: Option<f64>,
    pub project_irr: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementsOutput {
    pub portfolio: String,
    pub summary: StatementsSummary,
    pub years: Vec<PlatformYear>,
    pub assets: Vec<AssetFinancials>,
    pub portfolio_facility: Option<DebtSizingOutput>,
    pub deferred_tax: Vec<DeferredTaxYear>,
    /// Income statement at `statement_interval`; empty for annual runs.
    pub periods: Vec<PeriodStatement>,
    pub fiscal_years: Vec<FiscalYearSummary>,
    pub diagnostics: Vec<Diagnostic>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_unit_rate(value: Decimal, field: &str) -> FinanceResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(FinanceError::InvalidInput {
            field: field.into(),
            reason: "Must be between 0 and 1".into(),
        });
    }
    Ok(())
}

fn validate_non_negative(value: Decimal, field: &str) -> FinanceResult<()> {
    if value < Decimal::ZERO {
        return Err(FinanceError::InvalidInput {
            field: field.into(),
            reason: "Must be non-negative".into(),
        });
    }
    Ok(())
}

fn validate_platform(p: &PlatformAssumptions) -> FinanceResult<()> {
    Period::annual(p.start_year)?;
    if p.years == 0 {
        return Err(FinanceError::InvalidInput {
            field: "platform.years".into(),
            reason: "Forecast must cover at least one year".into(),
        });
    }
    if p.tax_rate < Decimal::ZERO || p.tax_rate >= Decimal::ONE {
        return Err(FinanceError::InvalidInput {
            field: "platform.tax_rate".into(),
            reason: "Tax rate must be in [0, 1)".into(),
        });
    }
    validate_unit_rate(p.dividend_payout_ratio, "platform.dividend_payout_ratio")?;
    validate_non_negative(p.platform_opex, "platform.platform_opex")?;
    validate_non_negative(p.minimum_cash_balance, "platform.minimum_cash_balance")?;
    if !(1..=12).contains(&p.fiscal_year_start_month) {
        return Err(FinanceError::InvalidInput {
            field: "platform.fiscal_year_start_month".into(),
            reason: "Must be a month between 1 and 12".into(),
        });
    }
    if p.balance_tolerance <= Decimal::ZERO {
        return Err(FinanceError::InvalidInput {
            field: "platform.balance_tolerance".into(),
            reason: "Tolerance must be positive".into(),
        });
    }
    if let Some(refi) = &p.portfolio_financing {
        let last_year = p.start_year + p.years as i32 - 1;
        if refi.refinance_year < p.start_year || refi.refinance_year > last_year {
            return Err(FinanceError::InvalidInput {
                field: "platform.portfolio_financing.refinance_year".into(),
                reason: format!("Must fall within {}..={last_year}", p.start_year),
            });
        }
        validate_unit_rate(refi.max_gearing, "platform.portfolio_financing.max_gearing")?;
        if refi.target_dscr <= Decimal::ZERO {
            return Err(FinanceError::InvalidInput {
                field: "platform.portfolio_financing.target_dscr".into(),
                reason: "DSCR target must be positive".into(),
            });
        }
        if refi.tenor_years == 0 {
            return Err(FinanceError::InvalidInput {
                field: "platform.portfolio_financing.tenor_years".into(),
                reason: "Tenor must be at least one year".into(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn year_end(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(NaiveDate::MAX)
}

fn platform_opex(p: &PlatformAssumptions, year: i32) -> Money {
    if year < p.start_year {
        return Decimal::ZERO;
    }
    p.platform_opex
        * (Decimal::ONE + p.platform_opex_escalation).powi(i64::from(year - p.start_year))
}

fn cfads_after_tax(ebitda: Money, depreciation: Money, tax_rate: Rate) -> Money {
    ebitda - (ebitda - depreciation).max(Decimal::ZERO) * tax_rate
}

fn solve_irr(series: &str, flows: &[(NaiveDate, Money)], diagnostics: &mut Vec<Diagnostic>) -> Option<f64> {
    let irr = xirr_decimal(flows);
    if irr.is_finite() {
        Some(irr)
    } else {
        warn!(series, "IRR did not converge");
        diagnostics.push(Diagnostic::IrrNotFound {
            series: series.into(),
        });
        None
    }
}

/// Which assets a portfolio facility takes out, what it repays and the
/// resulting facility.
struct Refinancing {
    year: i32,
    assets: Vec<String>,
    repayment: Money,
    facility: Option<DebtSizingOutput>,
}

impl Refinancing {
    fn covers(&self, asset: &str, year: i32) -> bool {
        year >= self.year && self.assets.iter().any(|a| a == asset)
    }
}

fn plan_refinancing(
    portfolio: &str,
    refi: &PortfolioFinancing,
    platform: &PlatformAssumptions,
    assets: &[AssetFinancials],
    diagnostics: &mut Vec<Diagnostic>,
) -> FinanceResult<Refinancing> {
    let r = refi.refinance_year;
    let refinanced: Vec<&AssetFinancials> = assets
        .iter()
        .filter(|a| {
            a.construction
                .iter()
                .any(|c| c.year < r && c.debt_drawdown > Decimal::ZERO)
        })
        .collect();

    let repayment: Money = refinanced
        .iter()
        .filter_map(|a| a.year(r - 1))
        .map(|s| s.debt_balance)
        .sum();
    let capex: Money = refinanced.iter().map(|a| a.capex).sum();

    let facility = if capex > Decimal::ZERO && refi.max_gearing > Decimal::ZERO {
        let cfads = (r..r + refi.tenor_years as i32)
            .map(|year| {
                let ebitda: Money = refinanced
                    .iter()
                    .filter_map(|a| a.year(year))
                    .map(|s| s.ebitda)
                    .sum::<Money>()
                    - platform_opex(platform, year);
                let depreciation: Money = refinanced
                    .iter()
                    .filter_map(|a| a.year(year))
                    .map(|s| s.depreciation)
                    .sum();
                cfads_after_tax(ebitda, depreciation, platform.tax_rate)
            })
            .collect();
        let sized = solve_debt_sizing(&DebtSizingInput {
            name: format!("{portfolio} portfolio facility"),
            capex,
            max_gearing: refi.max_gearing,
            terms: refi.terms(),
            first_year: r,
            cfads,
            target_dscr: vec![refi.target_dscr],
            phase: FinancingPhase::Portfolio,
            max_iterations: platform.max_sizing_iterations,
        })?;
        diagnostics.extend(sized.diagnostics.iter().cloned());
        Some(sized)
    } else {
        None
    };

    info!(
        year = r,
        assets = refinanced.len(),
        %repayment,
        "portfolio refinancing planned"
    );
    Ok(Refinancing {
        year: r,
        assets: refinanced.iter().map(|a| a.asset.clone()).collect(),
        repayment,
        facility,
    })
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// Consolidated three statements for a portfolio and its platform.
///
/// Each asset is projected and financed on its own, then rolled up with
/// platform overhead. Tax is recomputed on consolidated EBT. Opening cash
/// equals the minimum balance and is funded by equity, as is any shortfall
/// below the minimum before the first revenue. The balance sheet
/// identity `cash + net PP&E = debt + contributed equity + retained
/// earnings` is checked every year against `balance_tolerance`.
pub fn build_platform_statements(
    input: &StatementsInput,
    prices: &dyn MerchantPriceGateway,
) -> FinanceResult<ComputationOutput<StatementsOutput>> {
    let start = Instant::now();
    let platform = &input.platform;
    validate_platform(platform)?;

    let screened = screen_assets(&input.portfolio);
    let mut diagnostics = screened.diagnostics;
    let mut warnings = screened.warnings;

    let mut modelled: Vec<(&Asset, &AssetCostAssumptions)> = Vec::new();
    for asset in screened.assets {
        match input.cost_assumptions.get(&asset.name) {
            Some(costs) => match costs.validate(&asset.name) {
                Ok(()) => modelled.push((asset, costs)),
                Err(e) => diagnostics.push(Diagnostic::AssetExcluded {
                    asset: asset.name.clone(),
                    reason: e.to_string(),
                }),
            },
            None => diagnostics.push(Diagnostic::AssetExcluded {
                asset: asset.name.clone(),
                reason: "no cost assumptions".into(),
            }),
        }
    }
    if modelled.is_empty() {
        return Err(FinanceError::InsufficientData(
            "No assets with valid cost assumptions to model".into(),
        ));
    }

    let last_year = platform.start_year + platform.years as i32 - 1;
    let first_year = modelled
        .iter()
        .filter_map(|(a, c)| {
            construction_schedule(
                c.capex,
                a.commissioning_date,
                c.construction_duration_years,
                Decimal::ZERO,
                c.equity_timing,
            )
            .first()
            .map(|row| row.year)
        })
        .min()
        .map_or(platform.start_year, |y| y.min(platform.start_year));
    let model_end = platform
        .portfolio_financing
        .as_ref()
        .map_or(last_year, |r| last_year.max(r.refinance_year + r.tenor_years as i32 - 1));

    let tax = TaxSettings {
        rate: platform.tax_rate,
        lives: platform.tax_depreciation,
    };
    let mut assets = Vec::with_capacity(modelled.len());
    for (asset, costs) in &modelled {
        let financials = project_asset(
            asset,
            costs,
            tax,
            first_year,
            model_end,
            platform.max_sizing_iterations,
            prices,
        )?;
        if let Some(d) = &financials.debt {
            diagnostics.extend(d.diagnostics.iter().cloned());
        }
        assets.push(financials);
    }

    let refinancing = match &platform.portfolio_financing {
        Some(refi) => Some(plan_refinancing(
            &input.portfolio.name,
            refi,
            platform,
            &assets,
            &mut diagnostics,
        )?),
        None => None,
    };
    let facility = refinancing.as_ref().and_then(|r| r.facility.as_ref());

    // Roll up
    let mut years = Vec::new();
    let mut cash = Decimal::ZERO;
    let mut debt = Decimal::ZERO;
    let mut contributed_equity = Decimal::ZERO;
    let mut retained_earnings = Decimal::ZERO;
    let terminal_value: Money = assets.iter().map(|a| a.terminal_value).sum();

    for year in first_year..=last_year {
        let rows: Vec<_> = assets
            .iter()
            .filter_map(|a| a.year(year).map(|s| (a.asset.as_str(), s)))
            .collect();
        let sum = |f: fn(&AssetStatementYear) -> Money| -> Money {
            rows.iter().map(|(_, s)| f(s)).sum()
        };

        let project_debt_rows = rows
            .iter()
            .filter(|(name, _)| !refinancing.as_ref().is_some_and(|r| r.covers(name, year)));
        let mut interest = Decimal::ZERO;
        let mut principal = Decimal::ZERO;
        let mut debt_drawdown = Decimal::ZERO;
        for (_, s) in project_debt_rows {
            interest += s.interest;
            principal += s.principal;
            debt_drawdown += s.debt_drawdown;
        }
        if let Some(entry) = facility.and_then(|f| f.schedule.entry(year)) {
            interest += entry.interest;
            principal += entry.principal;
        }
        let (refinancing_proceeds, refinancing_repayment) = match &refinancing {
            Some(r) if r.year == year => (
                r.facility.as_ref().map_or(Decimal::ZERO, |f| f.debt_amount),
                r.repayment,
            ),
            _ => (Decimal::ZERO, Decimal::ZERO),
        };

        let revenue = sum(|s| s.revenue);
        let asset_opex = sum(|s| s.opex);
        let overhead = platform_opex(platform, year);
        let ebitda = revenue - asset_opex - overhead;
        let depreciation = sum(|s| s.depreciation);
        let ebit = ebitda - depreciation;
        let ebt = ebit - interest;
        let tax_charge = ebt.max(Decimal::ZERO) * platform.tax_rate;
        let npat = ebt - tax_charge;
        let cfads = cfads_after_tax(ebitda, depreciation, platform.tax_rate);
        let fcfe = ebitda - tax_charge - interest - principal;

        let capex = sum(|s| s.capex);
        let mut equity_contribution = sum(|s| s.equity_contribution);
        if year == first_year {
            equity_contribution += platform.minimum_cash_balance;
        }

        let mut cash_before_dividend = cash + fcfe - capex + debt_drawdown + equity_contribution
            + refinancing_proceeds
            - refinancing_repayment;
        if revenue <= Decimal::ZERO && cash_before_dividend < platform.minimum_cash_balance {
            let top_up = platform.minimum_cash_balance - cash_before_dividend;
            debug!(year, %top_up, "pre-revenue equity top-up");
            equity_contribution += top_up;
            cash_before_dividend += top_up;
        }
        let dividend = if npat > Decimal::ZERO {
            (npat * platform.dividend_payout_ratio)
                .min(cash_before_dividend - platform.minimum_cash_balance)
                .max(Decimal::ZERO)
        } else {
            Decimal::ZERO
        };
        cash = cash_before_dividend - dividend;
        debt += debt_drawdown + refinancing_proceeds - principal - refinancing_repayment;
        contributed_equity += equity_contribution;
        retained_earnings += npat - dividend;

        let net_ppe = sum(|s| s.net_ppe);
        let total_assets = cash + net_ppe;
        let total_equity = contributed_equity + retained_earnings;
        let balance_difference = total_assets - debt - total_equity;
        if balance_difference.abs() > platform.balance_tolerance {
            warn!(year, %balance_difference, "balance sheet does not balance");
            diagnostics.push(Diagnostic::BalanceSheetImbalance {
                year,
                difference: balance_difference,
            });
        }
        if cash < platform.minimum_cash_balance - platform.balance_tolerance {
            diagnostics.push(Diagnostic::CashBelowMinimum {
                year,
                cash,
                minimum: platform.minimum_cash_balance,
            });
        }

        let terminal = if year == last_year { terminal_value } else { Decimal::ZERO };
        let unlevered_tax = ebit.max(Decimal::ZERO) * platform.tax_rate;

        years.push(PlatformYear {
            year,
            revenue,
            contracted_revenue: sum(|s| s.contracted_revenue),
            merchant_revenue: sum(|s| s.merchant_revenue),
            asset_opex,
            platform_opex: overhead,
            ebitda,
            depreciation,
            ebit,
            interest,
            ebt,
            tax: tax_charge,
            npat,
            cfads,
            principal_repayment: principal,
            dscr: dscr(cfads, interest + principal),
            fcfe,
            capex,
            debt_drawdown,
            refinancing_proceeds,
            refinancing_repayment,
            equity_contribution,
            dividend,
            equity_cash_flow: fcfe - capex + debt_drawdown + refinancing_proceeds
                - refinancing_repayment
                + terminal,
            project_cash_flow: ebitda - unlevered_tax - capex + terminal,
            cash,
            net_ppe,
            total_assets,
            debt,
            total_liabilities: debt,
            contributed_equity,
            retained_earnings,
            total_equity,
            balance_difference,
            deferred_tax_liability: Decimal::ZERO,
            deferred_tax_asset: Decimal::ZERO,
            tax_losses_carried_forward: Decimal::ZERO,
        });
    }

    // Deferred tax memo
    let tax_inputs: Vec<DeferredTaxInput> = years
        .iter()
        .map(|y| DeferredTaxInput {
            year: y.year,
            capex: y.capex,
            book_depreciation: y.depreciation,
            tax_depreciation: assets
                .iter()
                .filter_map(|a| a.year(y.year))
                .map(|s| s.tax_depreciation)
                .sum(),
            ebitda: y.ebitda,
            interest: y.interest,
        })
        .collect();
    let deferred_tax = deferred_tax_schedule(&tax_inputs, platform.tax_rate);
    for (y, dt) in years.iter_mut().zip(&deferred_tax) {
        y.deferred_tax_liability = dt.deferred_tax_liability;
        y.deferred_tax_asset = dt.deferred_tax_asset + dt.loss_deferred_tax_asset;
        y.tax_losses_carried_forward = dt.losses_carried_forward;
    }

    let dated = |f: fn(&PlatformYear) -> Money| -> Vec<(NaiveDate, Money)> {
        years.iter().map(|y| (year_end(y.year), f(y))).collect()
    };
    let equity_irr = solve_irr("equity", &dated(|y| y.equity_cash_flow), &mut diagnostics);
    let project_irr = solve_irr("project", &dated(|y| y.project_cash_flow), &mut diagnostics);

    for a in &mut assets {
        a.statements.retain(|s| s.year <= last_year);
    }

    let paired: Vec<(&Asset, &AssetFinancials)> = modelled
        .iter()
        .map(|(asset, _)| *asset)
        .zip(&assets)
        .collect();
    let months = monthly_statements(&years, &paired, prices);
    let periods = match platform.statement_interval {
        PeriodKind::Annual => Vec::new(),
        kind => roll_up(&months, kind),
    };
    let fiscal_years = fiscal_year_summaries(&months, platform.fiscal_year_start_month);

    let total_capex: Money = assets.iter().map(|a| a.capex).sum();
    let project_debt: Money = assets.iter().map(|a| a.debt_amount()).sum();
    let summary = StatementsSummary {
        asset_count: assets.len(),
        first_year,
        last_year,
        total_capex,
        project_debt,
        calculated_gearing: if total_capex.is_zero() {
            Decimal::ZERO
        } else {
            project_debt / total_capex
        },
        portfolio_debt: facility.map_or(Decimal::ZERO, |f| f.debt_amount),
        total_revenue: years.iter().map(|y| y.revenue).sum(),
        total_npat: years.iter().map(|y| y.npat).sum(),
        total_dividends: years.iter().map(|y| y.dividend).sum(),
        min_dscr: years.iter().filter_map(|y| y.dscr).min(),
        equity_irr,
        project_irr,
    };
    debug!(
        assets = summary.asset_count,
        first_year, last_year, "platform statements built"
    );

    warnings.extend(diagnostic_warnings(&diagnostics));
    let output = StatementsOutput {
        portfolio: input.portfolio.name.clone(),
        summary,
        years,
        assets,
        portfolio_facility: refinancing.and_then(|r| r.facility),
        deferred_tax,
        periods,
        fiscal_years,
        diagnostics,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Portfolio three statements: asset project finance rolled up with platform costs, \
         consolidated tax, dividends, balance sheet check and XIRR returns",
        &serde_json::json!({
            "start_year": platform.start_year,
            "years": platform.years,
            "tax_rate": platform.tax_rate.to_string(),
            "dividend_payout_ratio": platform.dividend_payout_ratio.to_string(),
            "minimum_cash_balance": platform.minimum_cash_balance.to_string(),
            "refinancing": platform.portfolio_financing.is_some(),
            "statement_interval": platform.statement_interval,
            "fiscal_year_start_month": platform.fiscal_year_start_month,
            "units": "$M",
        }),
        warnings,
        elapsed,
        output,
    ))
}
