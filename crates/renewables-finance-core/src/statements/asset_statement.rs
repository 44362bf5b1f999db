use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::assets::validation::validate_asset;
use crate::assets::{Asset, Technology};
use crate::error::FinanceError;
use crate::financing::assumptions::AssetCostAssumptions;
use crate::financing::construction::{construction_schedule, ConstructionYear};
use crate::financing::debt::{solve_debt_sizing, DebtSizingInput, DebtSizingOutput, FinancingPhase};
use crate::period::Period;
use crate::pricing::gateway::MerchantPriceGateway;
use crate::revenue::engine::calculate_asset_revenue;
use crate::types::{diagnostic_warnings, with_metadata, ComputationOutput, Money, Rate};
use crate::FinanceResult;

use super::deferred_tax::TaxDepreciationLives;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One year of an asset's P&L and funding. Outflows are positive and
/// subtracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetStatementYear {
    pub year: i32,
    pub revenue: Money,
    pub contracted_revenue: Money,
    pub merchant_revenue: Money,
    pub opex: Money,
    pub ebitda: Money,
    /// Book depreciation.
    pub depreciation: Money,
    pub tax_depreciation: Money,
    pub ebit: Money,
    pub interest: Money,
    pub principal: Money,
    pub ebt: Money,
    pub tax: Money,
    pub npat: Money,
    pub cfads: Money,
    pub dscr: Option<Decimal>,
    pub capex: Money,
    pub debt_drawdown: Money,
    pub equity_contribution: Money,
    pub debt_balance: Money,
    pub net_ppe: Money,
}

/// Construction, debt and yearly statements for one asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetFinancials {
    pub asset: String,
    pub technology: Technology,
    pub capex: Money,
    pub terminal_value: Money,
    pub construction: Vec<ConstructionYear>,
    /// `None` for ungeared assets.
    pub debt: Option<DebtSizingOutput>,
    pub statements: Vec<AssetStatementYear>,
}

impl AssetFinancials {
    pub fn year(&self, year: i32) -> Option<&AssetStatementYear> {
        self.statements.iter().find(|s| s.year == year)
    }

    pub fn debt_amount(&self) -> Money {
        self.debt
            .as_ref()
            .map(|d| d.debt_amount)
            .unwrap_or(Decimal::ZERO)
    }
}

/// Tax treatment shared by every asset in a run.
#[derive(Debug, Clone, Copy)]
pub struct TaxSettings {
    pub rate: Rate,
    pub lives: TaxDepreciationLives,
}

/// Input for modelling one asset on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetFinancingInput {
    pub asset: Asset,
    pub costs: AssetCostAssumptions,
    pub start_year: i32,
    #[serde(default = "default_years")]
    pub years: u32,
    #[serde(default = "default_tax_rate")]
    pub tax_rate: Rate,
    #[serde(default)]
    pub tax_depreciation: TaxDepreciationLives,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

fn default_years() -> u32 {
    30
}

fn default_tax_rate() -> Rate {
    dec!(0.30)
}

fn default_max_iterations() -> u32 {
    60
}

/// Pre-financing view of one year, used for sizing.
#[derive(Debug, Clone)]
struct OperatingYear {
    year: i32,
    revenue: Money,
    contracted: Money,
    merchant: Money,
    opex: Money,
    ebitda: Money,
    book_depreciation: Money,
    tax_depreciation: Money,
    cfads: Money,
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Project one asset from `first_year` (or its construction start, if
/// earlier) to `last_year`.
///
/// CFADS is EBITDA less tax before financing. Debt is sized on the CFADS of
/// the tenor years following construction, which may run past
/// `last_year`; the statements stop at `last_year`.
pub fn project_asset(
    asset: &Asset,
    costs: &AssetCostAssumptions,
    tax: TaxSettings,
    first_year: i32,
    last_year: i32,
    max_iterations: u32,
    prices: &dyn MerchantPriceGateway,
) -> FinanceResult<AssetFinancials> {
    costs.validate(&asset.name)?;
    let tax_life = tax.lives.for_technology(asset.technology);
    if tax_life == 0 {
        return Err(FinanceError::InvalidInput {
            field: "tax_depreciation".into(),
            reason: format!("Tax life for {} must be at least one year", asset.technology),
        });
    }

    let cod_year = asset.commissioning_year();
    let unfunded = construction_schedule(
        costs.capex,
        asset.commissioning_date,
        costs.construction_duration_years,
        Decimal::ZERO,
        costs.equity_timing,
    );
    let first_repayment = unfunded.last().map(|c| c.year + 1).unwrap_or(cod_year);
    let repay_end = first_repayment + costs.tenor_years as i32 - 1;
    let horizon_start = unfunded
        .first()
        .map(|c| c.year)
        .unwrap_or(first_year)
        .min(first_year);
    let horizon_end = last_year.max(repay_end);

    let operating: Vec<OperatingYear> = (horizon_start..=horizon_end)
        .map(|year| operating_year(asset, costs, tax.rate, tax_life, year, prices))
        .collect();
    let at = |year: i32| operating.get((year - horizon_start) as usize);

    let debt = if costs.capex > Decimal::ZERO && costs.max_gearing > Decimal::ZERO {
        let tenor_years: Vec<&OperatingYear> = (first_repayment..=repay_end).filter_map(at).collect();
        let sizing = DebtSizingInput {
            name: asset.name.clone(),
            capex: costs.capex,
            max_gearing: costs.max_gearing,
            terms: costs.debt_terms(),
            first_year: first_repayment,
            cfads: tenor_years.iter().map(|o| o.cfads).collect(),
            target_dscr: tenor_years
                .iter()
                .map(|o| costs.blended_target_dscr(o.contracted, o.merchant))
                .collect(),
            phase: FinancingPhase::Project,
            max_iterations,
        };
        Some(solve_debt_sizing(&sizing)?)
    } else {
        None
    };
    let debt_amount = debt
        .as_ref()
        .map(|d| d.debt_amount)
        .unwrap_or(Decimal::ZERO);
    debug!(asset = %asset.name, %debt_amount, "asset debt sized");

    let construction = construction_schedule(
        costs.capex,
        asset.commissioning_date,
        costs.construction_duration_years,
        debt_amount,
        costs.equity_timing,
    );

    let mut statements = Vec::new();
    let mut debt_balance = Decimal::ZERO;
    let mut cumulative_capex = Decimal::ZERO;
    let mut cumulative_depreciation = Decimal::ZERO;
    for year in horizon_start..=last_year {
        let Some(op) = at(year) else { continue };
        let build = construction.iter().find(|c| c.year == year);
        let entry = debt
            .as_ref()
            .and_then(|d| d.schedule.entry(year));

        let interest = entry.map(|e| e.interest).unwrap_or(Decimal::ZERO);
        let principal = entry.map(|e| e.principal).unwrap_or(Decimal::ZERO);
        let capex = build.map(|c| c.capex).unwrap_or(Decimal::ZERO);
        let debt_drawdown = build.map(|c| c.debt_drawdown).unwrap_or(Decimal::ZERO);
        let equity_contribution = build
            .map(|c| c.equity_contribution)
            .unwrap_or(Decimal::ZERO);

        let ebit = op.ebitda - op.book_depreciation;
        let ebt = ebit - interest;
        let tax_charge = ebt.max(Decimal::ZERO) * tax.rate;

        debt_balance += debt_drawdown - principal;
        cumulative_capex += capex;
        cumulative_depreciation += op.book_depreciation;

        statements.push(AssetStatementYear {
            year,
            revenue: op.revenue,
            contracted_revenue: op.contracted,
            merchant_revenue: op.merchant,
            opex: op.opex,
            ebitda: op.ebitda,
            depreciation: op.book_depreciation,
            tax_depreciation: op.tax_depreciation,
            ebit,
            interest,
            principal,
            ebt,
            tax: tax_charge,
            npat: ebt - tax_charge,
            cfads: op.cfads,
            dscr: entry.and_then(|e| e.dscr),
            capex,
            debt_drawdown,
            equity_contribution,
            debt_balance,
            net_ppe: (cumulative_capex - cumulative_depreciation).max(Decimal::ZERO),
        });
    }

    Ok(AssetFinancials {
        asset: asset.name.clone(),
        technology: asset.technology,
        capex: costs.capex,
        terminal_value: costs.terminal_value,
        construction,
        debt,
        statements,
    })
}

fn operating_year(
    asset: &Asset,
    costs: &AssetCostAssumptions,
    tax_rate: Rate,
    tax_life: u32,
    year: i32,
    prices: &dyn MerchantPriceGateway,
) -> OperatingYear {
    let period = Period::Annual { year };
    let revenue = calculate_asset_revenue(asset, &period, prices);
    let cod_year = asset.commissioning_year();
    let years_since_cod = (year - cod_year).max(0);

    // Part years at either end of life carry their share of opex.
    let opex = if revenue.operational {
        costs.operating_costs
            * (Decimal::ONE + costs.operating_cost_escalation).powi(i64::from(years_since_cod))
            * asset.operating_fraction(&period)
    } else {
        Decimal::ZERO
    };
    let book_depreciation = straight_line(costs.capex, costs.depreciation_years, cod_year, year);
    let tax_depreciation = straight_line(costs.capex, tax_life, cod_year, year);

    let ebitda = revenue.total_revenue - opex;
    let pre_financing_tax = (ebitda - book_depreciation).max(Decimal::ZERO) * tax_rate;

    OperatingYear {
        year,
        revenue: revenue.total_revenue,
        contracted: revenue.contracted_revenue(),
        merchant: revenue.merchant_revenue(),
        opex,
        ebitda,
        book_depreciation,
        tax_depreciation,
        cfads: ebitda - pre_financing_tax,
    }
}

/// `amount / life` for each of the `life` years starting `from`.
fn straight_line(amount: Money, life: u32, from: i32, year: i32) -> Money {
    if life == 0 || year < from || year >= from + life as i32 {
        Decimal::ZERO
    } else {
        amount / Decimal::from(life)
    }
}

/// Model one asset's construction, debt and statements on its own.
pub fn model_asset_financing(
    input: &AssetFinancingInput,
    prices: &dyn MerchantPriceGateway,
) -> FinanceResult<ComputationOutput<AssetFinancials>> {
    let start = Instant::now();
    let mut warnings = validate_asset(&input.asset)?;
    if input.years == 0 {
        return Err(FinanceError::InvalidInput {
            field: "years".into(),
            reason: "Forecast must cover at least one year".into(),
        });
    }
    Period::annual(input.start_year)?;

    let last_year = input.start_year + input.years as i32 - 1;
    let tax = TaxSettings {
        rate: input.tax_rate,
        lives: input.tax_depreciation,
    };
    let financials = project_asset(
        &input.asset,
        &input.costs,
        tax,
        input.start_year,
        last_year,
        input.max_iterations,
        prices,
    )?;
    if let Some(d) = &financials.debt {
        warnings.extend(diagnostic_warnings(&d.diagnostics));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Asset project finance: revenue, CFADS, DSCR-sized debt and annual P&L",
        &serde_json::json!({
            "start_year": input.start_year,
            "years": input.years,
            "tax_rate": input.tax_rate.to_string(),
            "units": "$M",
        }),
        warnings,
        elapsed,
        financials,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::financing::debt::DebtStructure;
    use crate::pricing::gateway::NoMarketData;
    use chrono::NaiveDate;

    fn asset() -> Asset {
        Asset {
            name: "Solar A".into(),
            technology: Technology::Solar,
            capacity: dec!(100),
            volume: None,
            region: "QLD".into(),
            commissioning_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            asset_life_years: 30,
            annual_degradation: Decimal::ZERO,
            quarterly_capacity_factors: [Some(dec!(0.25)); 4],
            volume_loss_adjustment: dec!(0.05),
            contracts: vec![],
        }
    }

    fn costs() -> AssetCostAssumptions {
        AssetCostAssumptions {
            capex: dec!(120),
            operating_costs: dec!(3),
            operating_cost_escalation: dec!(0.025),
            terminal_value: dec!(20),
            max_gearing: dec!(0.7),
            target_dscr_contract: dec!(1.35),
            target_dscr_merchant: dec!(1.8),
            interest_rate: dec!(0.06),
            tenor_years: 15,
            debt_structure: DebtStructure::Sculpted,
            construction_duration_years: Decimal::ONE,
            equity_timing: Default::default(),
            depreciation_years: 30,
            grace_period_years: 0,
            repayment_frequency: Default::default(),
            interest_rate_curve: Vec::new(),
        }
    }

    fn tax() -> TaxSettings {
        TaxSettings {
            rate: dec!(0.30),
            lives: TaxDepreciationLives::default(),
        }
    }

    #[test]
    fn test_construction_precedes_operations() {
        let f = project_asset(&asset(), &costs(), tax(), 2025, 2034, 60, &NoMarketData).unwrap();
        let y2025 = f.year(2025).unwrap();
        assert_eq!(y2025.capex, dec!(120));
        assert_eq!(y2025.revenue, Decimal::ZERO);
        assert!((y2025.debt_drawdown - f.debt_amount()).abs() < dec!(0.000001));
        let y2026 = f.year(2026).unwrap();
        assert_eq!(y2026.revenue, dec!(20.805));
        assert_eq!(y2026.opex, dec!(3));
        assert_eq!(y2026.depreciation, dec!(4));
        assert!(y2026.interest > Decimal::ZERO);
    }

    #[test]
    fn test_opex_escalates_from_commissioning() {
        let f = project_asset(&asset(), &costs(), tax(), 2025, 2030, 60, &NoMarketData).unwrap();
        assert_eq!(f.year(2028).unwrap().opex, dec!(3) * dec!(1.025) * dec!(1.025));
    }

    #[test]
    fn test_mid_year_commissioning_halves_first_year() {
        let mut a = asset();
        a.commissioning_date = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        let f = project_asset(&a, &costs(), tax(), 2025, 2030, 60, &NoMarketData).unwrap();
        let y2026 = f.year(2026).unwrap();
        assert_eq!(y2026.revenue, dec!(10.4025));
        assert_eq!(y2026.opex, dec!(1.5));
        let y2027 = f.year(2027).unwrap();
        assert_eq!(y2027.revenue, dec!(20.805));
        assert_eq!(y2027.opex, dec!(3.075));
    }

    #[test]
    fn test_debt_balance_rolls_from_draws_and_repayments() {
        let f = project_asset(&asset(), &costs(), tax(), 2025, 2045, 60, &NoMarketData).unwrap();
        let mut balance = Decimal::ZERO;
        for s in &f.statements {
            balance += s.debt_drawdown - s.principal;
            assert_eq!(s.debt_balance, balance);
        }
        // Tenor of 15 years from 2026 ends in 2040
        assert!(f.year(2041).unwrap().debt_balance.abs() < dec!(0.000001));
    }

    #[test]
    fn test_sized_debt_holds_target_each_year() {
        let f = project_asset(&asset(), &costs(), tax(), 2025, 2040, 60, &NoMarketData).unwrap();
        let d = f.debt.as_ref().unwrap();
        assert!(!d.breach);
        for e in &d.schedule.entries {
            if let Some(dscr) = e.dscr {
                assert!(dscr >= e.target_dscr - dec!(0.0001));
            }
        }
        // Fully merchant, so the merchant target applies
        assert_eq!(d.schedule.entries[0].target_dscr, dec!(1.8));
    }

    #[test]
    fn test_ungeared_asset_has_no_debt() {
        let mut c = costs();
        c.max_gearing = Decimal::ZERO;
        let f = project_asset(&asset(), &c, tax(), 2025, 2030, 60, &NoMarketData).unwrap();
        assert!(f.debt.is_none());
        assert!(f.statements.iter().all(|s| s.interest.is_zero()));
        assert_eq!(f.year(2025).unwrap().equity_contribution, dec!(120));
    }

    #[test]
    fn test_model_asset_financing_rejects_invalid_asset() {
        let mut a = asset();
        a.capacity = Decimal::ZERO;
        let input = AssetFinancingInput {
            asset: a,
            costs: costs(),
            start_year: 2025,
            years: 10,
            tax_rate: dec!(0.3),
            tax_depreciation: TaxDepreciationLives::default(),
            max_iterations: 60,
        };
        assert!(matches!(
            model_asset_financing(&input, &NoMarketData),
            Err(FinanceError::Validation { .. })
        ));
    }
}
