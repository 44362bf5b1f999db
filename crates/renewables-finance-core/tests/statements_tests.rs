use chrono::NaiveDate;
use renewables_finance_core::assets::{Asset, Contract, ContractTerms, Technology};
use renewables_finance_core::financing::{AssetCostAssumptions, DebtStructure, EquityTiming};
use renewables_finance_core::period::{Period, PeriodKind};
use renewables_finance_core::pricing::NoMarketData;
use renewables_finance_core::revenue::Portfolio;
use renewables_finance_core::statements::{
    build_platform_statements, model_asset_financing, AssetFinancingInput, PlatformAssumptions,
    StatementsInput, TaxDepreciationLives,
};
use renewables_finance_core::Diagnostic;
use rust_decimal::Decimal;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn contracted_wind() -> Asset {
    Asset {
        name: "Wind North".into(),
        technology: Technology::Wind,
        capacity: dec!(150),
        volume: None,
        region: "NSW".into(),
        commissioning_date: date(2026, 7, 1),
        asset_life_years: 30,
        annual_degradation: dec!(0.004),
        quarterly_capacity_factors: [Some(dec!(0.32)), Some(dec!(0.38)), Some(dec!(0.41)), Some(dec!(0.33))],
        volume_loss_adjustment: dec!(0.04),
        contracts: vec![Contract {
            counterparty: Some("Retailer".into()),
            buyers_percentage: dec!(70),
            indexation: dec!(0.025),
            indexation_reference_year: Some(2025),
            floor: None,
            start_date: date(2026, 7, 1),
            end_date: date(2041, 7, 1),
            terms: ContractTerms::Bundled {
                green_price: dec!(25),
                energy_price: dec!(70),
            },
        }],
    }
}

fn storage() -> Asset {
    Asset {
        name: "Battery South".into(),
        technology: Technology::Storage,
        capacity: dec!(50),
        volume: Some(dec!(100)),
        region: "VIC".into(),
        commissioning_date: date(2027, 1, 1),
        asset_life_years: 20,
        annual_degradation: dec!(0.01),
        quarterly_capacity_factors: [None; 4],
        volume_loss_adjustment: dec!(0.1),
        contracts: vec![],
    }
}

fn costs(capex: Decimal, gearing: Decimal) -> AssetCostAssumptions {
    AssetCostAssumptions {
        capex,
        operating_costs: capex * dec!(0.02),
        operating_cost_escalation: dec!(0.025),
        terminal_value: capex * dec!(0.1),
        max_gearing: gearing,
        target_dscr_contract: dec!(1.35),
        target_dscr_merchant: dec!(1.8),
        interest_rate: dec!(0.06),
        tenor_years: 15,
        debt_structure: DebtStructure::Sculpted,
        construction_duration_years: dec!(1.5),
        equity_timing: EquityTiming::ProRata,
        depreciation_years: 25,
        grace_period_years: 0,
        repayment_frequency: Default::default(),
        interest_rate_curve: Vec::new(),
    }
}

fn platform(start_year: i32, years: u32) -> PlatformAssumptions {
    PlatformAssumptions {
        start_year,
        years,
        tax_rate: dec!(0.30),
        platform_opex: dec!(2),
        platform_opex_escalation: dec!(0.03),
        dividend_payout_ratio: dec!(0.85),
        minimum_cash_balance: dec!(10),
        balance_tolerance: dec!(0.01),
        tax_depreciation: TaxDepreciationLives::default(),
        portfolio_financing: None,
        max_sizing_iterations: 60,
        statement_interval: PeriodKind::Annual,
        fiscal_year_start_month: 7,
    }
}

fn two_asset_input() -> StatementsInput {
    let mut cost_assumptions = BTreeMap::new();
    cost_assumptions.insert("Wind North".to_string(), costs(dec!(300), dec!(0.7)));
    cost_assumptions.insert("Battery South".to_string(), costs(dec!(10), dec!(0.5)));
    StatementsInput {
        portfolio: Portfolio {
            name: "Platform".into(),
            assets: vec![contracted_wind(), storage()],
        },
        cost_assumptions,
        platform: platform(2025, 10),
    }
}

// ===========================================================================
// Platform statements
// ===========================================================================

#[test]
fn test_ten_year_two_asset_balance_sheet_identity() {
    let out = build_platform_statements(&two_asset_input(), &NoMarketData).unwrap();
    let years = &out.result.years;
    // Wind construction starts late in 2024, ahead of the forecast start
    assert_eq!(years.first().unwrap().year, 2024);
    assert_eq!(years.last().unwrap().year, 2034);
    for y in years {
        let diff = (y.total_assets - y.total_liabilities - y.total_equity).abs();
        assert!(
            diff < dec!(0.01),
            "Year {}: BS does not balance. Assets={}, L+E={}, diff={}",
            y.year,
            y.total_assets,
            y.total_liabilities + y.total_equity,
            diff
        );
    }
    assert!(!out
        .result
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::BalanceSheetImbalance { .. })));
}

#[test]
fn test_income_statement_arithmetic() {
    let out = build_platform_statements(&two_asset_input(), &NoMarketData).unwrap();
    for y in &out.result.years {
        assert_eq!(y.ebitda, y.revenue - y.asset_opex - y.platform_opex);
        assert_eq!(y.ebit, y.ebitda - y.depreciation);
        assert_eq!(y.ebt, y.ebit - y.interest);
        assert_eq!(y.tax, y.ebt.max(Decimal::ZERO) * dec!(0.30));
        assert_eq!(y.npat, y.ebt - y.tax);
        assert_eq!(y.fcfe, y.ebitda - y.tax - y.interest - y.principal_repayment);
    }
}

#[test]
fn test_asset_lines_sum_to_platform() {
    let out = build_platform_statements(&two_asset_input(), &NoMarketData).unwrap();
    let r = &out.result;
    assert_eq!(r.assets.len(), 2);
    for y in &r.years {
        let revenue: Decimal = r
            .assets
            .iter()
            .filter_map(|a| a.year(y.year))
            .map(|s| s.revenue)
            .sum();
        assert_eq!(revenue, y.revenue);
    }
    let capex: Decimal = r.years.iter().map(|y| y.capex).sum();
    assert!((capex - dec!(310)).abs() < dec!(0.000001));
}

#[test]
fn test_deferred_tax_memo_populated() {
    let out = build_platform_statements(&two_asset_input(), &NoMarketData).unwrap();
    let r = &out.result;
    assert_eq!(r.deferred_tax.len(), r.years.len());
    // Tax lives are shorter than book lives, so a liability builds up
    assert!(r.years.last().unwrap().deferred_tax_liability > Decimal::ZERO);
}

#[test]
fn test_returns_reported() {
    let mut input = two_asset_input();
    input.platform.years = 25;
    let out = build_platform_statements(&input, &NoMarketData).unwrap();
    let s = &out.result.summary;
    assert!(s.project_irr.is_some());
    assert!(s.equity_irr.is_some());
    assert!(s.calculated_gearing > Decimal::ZERO && s.calculated_gearing <= dec!(0.7));
}

#[test]
fn test_mid_year_wind_earns_from_commissioning_quarter() {
    let mut input = two_asset_input();
    input.platform.statement_interval = PeriodKind::Quarterly;
    let out = build_platform_statements(&input, &NoMarketData).unwrap();
    let r = &out.result;
    let quarter = |year, quarter| {
        r.periods
            .iter()
            .find(|p| p.period == Period::Quarterly { year, quarter })
            .unwrap()
    };
    assert_eq!(quarter(2026, 1).revenue, Decimal::ZERO);
    assert_eq!(quarter(2026, 2).revenue, Decimal::ZERO);
    assert!(quarter(2026, 3).revenue > Decimal::ZERO);
    // Contracted from the first operating day
    assert!(quarter(2026, 3).contracted_revenue > Decimal::ZERO);

    let y2026 = r.years.iter().find(|y| y.year == 2026).unwrap();
    let second_half = quarter(2026, 3).revenue + quarter(2026, 4).revenue;
    assert!((second_half - y2026.revenue).abs() < dec!(0.000001));
    let opex = quarter(2026, 3).asset_opex + quarter(2026, 4).asset_opex;
    assert!((opex - y2026.asset_opex).abs() < dec!(0.000001));
    // Half a year of opex on 300 × 2%
    assert_eq!(y2026.asset_opex, dec!(3));

    // FY2027 runs July 2026 to June 2027, the wind's first full year
    let fy2027 = r.fiscal_years.iter().find(|f| f.fiscal_year == 2027).unwrap();
    assert_eq!(fy2027.months, 12);
    assert_eq!(fy2027.start, date(2026, 7, 1));
    assert!(fy2027.revenue > y2026.revenue);
}

// ===========================================================================
// Single asset
// ===========================================================================

#[test]
fn test_model_asset_financing_envelope() {
    let input = AssetFinancingInput {
        asset: contracted_wind(),
        costs: costs(dec!(300), dec!(0.7)),
        start_year: 2025,
        years: 20,
        tax_rate: dec!(0.3),
        tax_depreciation: TaxDepreciationLives::default(),
        max_iterations: 60,
    };
    let out = model_asset_financing(&input, &NoMarketData).unwrap();
    let f = &out.result;
    // 2024 construction plus 2025..=2044
    assert_eq!(f.statements.len(), 21);
    let debt = f.debt.as_ref().unwrap();
    // Construction ends in 2026, so repayments start in 2027
    assert_eq!(debt.schedule.entries[0].year, 2027);
    assert!(f.construction.iter().all(|c| c.year <= 2026));
    assert_eq!(out.metadata.precision, "rust_decimal_128bit");
}

#[test]
fn test_sculpted_targets_follow_contract_mix() {
    let input = AssetFinancingInput {
        asset: contracted_wind(),
        costs: costs(dec!(300), dec!(0.7)),
        start_year: 2025,
        years: 20,
        tax_rate: dec!(0.3),
        tax_depreciation: TaxDepreciationLives::default(),
        max_iterations: 60,
    };
    let out = model_asset_financing(&input, &NoMarketData).unwrap();
    let f = &out.result;
    let debt = f.debt.as_ref().unwrap();
    assert!(!debt.breach);
    let entries = &debt.schedule.entries;
    for e in entries {
        let s = f.year(e.year).unwrap();
        let blended = input
            .costs
            .blended_target_dscr(s.contracted_revenue, s.merchant_revenue);
        assert_eq!(e.target_dscr, blended, "{}", e.year);
        assert!(e.target_dscr > dec!(1.35) && e.target_dscr < dec!(1.8));
        if let Some(dscr) = e.dscr {
            assert!(dscr >= e.target_dscr - dec!(0.0001), "{}: {dscr}", e.year);
        }
    }
    // The contract ends mid-2041, the last tenor year, so more of it is merchant
    let last = entries.last().unwrap();
    assert_eq!(last.year, 2041);
    let before = &entries[entries.len() - 2];
    assert!(last.target_dscr > before.target_dscr);
}
