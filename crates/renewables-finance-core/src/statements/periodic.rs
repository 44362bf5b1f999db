//! Quarterly, monthly and fiscal-year views of the consolidated statements.
//!
//! Revenue is forecast month by month per asset so seasonality shows up in
//! the shorter periods. Asset opex follows each asset's operating days.
//! Everything else in a calendar year (platform overhead, depreciation,
//! debt service and tax) is spread evenly over its twelve months, so the
//! periods of a year always add back to the annual statement.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::assets::Asset;
use crate::financing::debt::dscr;
use crate::period::{fiscal_year, fiscal_year_start, Period, PeriodKind};
use crate::pricing::gateway::MerchantPriceGateway;
use crate::revenue::engine::calculate_asset_revenue;
use crate::types::Money;

use super::asset_statement::AssetFinancials;
use super::platform::PlatformYear;

/// Income statement and cash available for debt service over one period. $M.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodStatement {
    pub period: Period,
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
    pub cfads: Money,
    pub principal_repayment: Money,
    pub fcfe: Money,
}

impl PeriodStatement {
    fn empty(period: Period) -> Self {
        PeriodStatement {
            period,
            revenue: Decimal::ZERO,
            contracted_revenue: Decimal::ZERO,
            merchant_revenue: Decimal::ZERO,
            asset_opex: Decimal::ZERO,
            platform_opex: Decimal::ZERO,
            ebitda: Decimal::ZERO,
            depreciation: Decimal::ZERO,
            ebit: Decimal::ZERO,
            interest: Decimal::ZERO,
            ebt: Decimal::ZERO,
            tax: Decimal::ZERO,
            npat: Decimal::ZERO,
            cfads: Decimal::ZERO,
            principal_repayment: Decimal::ZERO,
            fcfe: Decimal::ZERO,
        }
    }

    fn add(&mut self, other: &PeriodStatement) {
        self.revenue += other.revenue;
        self.contracted_revenue += other.contracted_revenue;
        self.merchant_revenue += other.merchant_revenue;
        self.asset_opex += other.asset_opex;
        self.platform_opex += other.platform_opex;
        self.ebitda += other.ebitda;
        self.depreciation += other.depreciation;
        self.ebit += other.ebit;
        self.interest += other.interest;
        self.ebt += other.ebt;
        self.tax += other.tax;
        self.npat += other.npat;
        self.cfads += other.cfads;
        self.principal_repayment += other.principal_repayment;
        self.fcfe += other.fcfe;
    }

    pub fn debt_service(&self) -> Money {
        self.interest + self.principal_repayment
    }
}

/// Totals for one fiscal year, labelled by the calendar year it ends in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalYearSummary {
    pub fiscal_year: i32,
    pub start: NaiveDate,
    /// Last day of the fiscal year.
    pub end: NaiveDate,
    /// Months of the fiscal year inside the forecast; 12 when complete.
    pub months: u32,
    pub revenue: Money,
    pub contracted_revenue: Money,
    pub merchant_revenue: Money,
    pub ebitda: Money,
    pub npat: Money,
    pub cfads: Money,
    pub debt_service: Money,
    pub fcfe: Money,
    pub dscr: Option<Decimal>,
}

/// Split each platform year into its calendar months.
///
/// `assets` pairs every modelled asset with its financials, in any order.
pub fn monthly_statements(
    years: &[PlatformYear],
    assets: &[(&Asset, &AssetFinancials)],
    prices: &dyn MerchantPriceGateway,
) -> Vec<PeriodStatement> {
    let twelve = dec!(12);
    let mut out = Vec::with_capacity(years.len() * 12);
    for py in years {
        let months = Period::Annual { year: py.year }.months();
        let pre_financing_tax = py.ebitda - py.cfads;

        // (asset, annual opex, operating months) for the year
        let opex: Vec<(&Asset, Money, Decimal)> = assets
            .iter()
            .filter_map(|(asset, financials)| {
                let s = financials.year(py.year)?;
                let operating: Decimal = months
                    .iter()
                    .map(|m| m.share_within(asset.commissioning_date, asset.end_of_life()))
                    .sum();
                Some((*asset, s.opex, operating))
            })
            .collect();

        for m in months {
            let mut row = PeriodStatement::empty(m);
            for (asset, annual_opex, operating) in &opex {
                let r = calculate_asset_revenue(asset, &m, prices);
                row.revenue += r.total_revenue;
                row.contracted_revenue += r.contracted_revenue();
                row.merchant_revenue += r.merchant_revenue();
                if *operating > Decimal::ZERO {
                    let share = m.share_within(asset.commissioning_date, asset.end_of_life());
                    row.asset_opex += *annual_opex * share / *operating;
                }
            }
            row.platform_opex = py.platform_opex / twelve;
            row.depreciation = py.depreciation / twelve;
            row.interest = py.interest / twelve;
            row.tax = py.tax / twelve;
            row.principal_repayment = py.principal_repayment / twelve;

            row.ebitda = row.revenue - row.asset_opex - row.platform_opex;
            row.ebit = row.ebitda - row.depreciation;
            row.ebt = row.ebit - row.interest;
            row.npat = row.ebt - row.tax;
            row.cfads = row.ebitda - pre_financing_tax / twelve;
            row.fcfe = row.ebitda - row.tax - row.interest - row.principal_repayment;
            out.push(row);
        }
    }
    out
}

/// Sum monthly rows into periods of `kind`.
pub fn roll_up(months: &[PeriodStatement], kind: PeriodKind) -> Vec<PeriodStatement> {
    let target = |p: &Period| match kind {
        PeriodKind::Monthly => *p,
        PeriodKind::Quarterly => Period::Quarterly {
            year: p.year(),
            quarter: p.quarter().unwrap_or(1),
        },
        PeriodKind::Annual => Period::Annual { year: p.year() },
    };
    let mut out: Vec<PeriodStatement> = Vec::new();
    for m in months {
        let period = target(&m.period);
        match out.last_mut() {
            Some(last) if last.period == period => last.add(m),
            _ => {
                let mut row = PeriodStatement::empty(period);
                row.add(m);
                out.push(row);
            }
        }
    }
    out
}

/// Group monthly rows into fiscal years starting in `start_month`.
pub fn fiscal_year_summaries(months: &[PeriodStatement], start_month: u32) -> Vec<FiscalYearSummary> {
    let mut out: Vec<FiscalYearSummary> = Vec::new();
    for m in months {
        let month = m.period.month().unwrap_or(1);
        let fy = fiscal_year(m.period.year(), month, start_month);
        if out.last().map(|s| s.fiscal_year) != Some(fy) {
            let start = fiscal_year_start(fy, start_month);
            out.push(FiscalYearSummary {
                fiscal_year: fy,
                start,
                end: fiscal_year_start(fy + 1, start_month)
                    .pred_opt()
                    .unwrap_or(start),
                months: 0,
                revenue: Decimal::ZERO,
                contracted_revenue: Decimal::ZERO,
                merchant_revenue: Decimal::ZERO,
                ebitda: Decimal::ZERO,
                npat: Decimal::ZERO,
                cfads: Decimal::ZERO,
                debt_service: Decimal::ZERO,
                fcfe: Decimal::ZERO,
                dscr: None,
            });
        }
        if let Some(s) = out.last_mut() {
            s.months += 1;
            s.revenue += m.revenue;
            s.contracted_revenue += m.contracted_revenue;
            s.merchant_revenue += m.merchant_revenue;
            s.ebitda += m.ebitda;
            s.npat += m.npat;
            s.cfads += m.cfads;
            s.debt_service += m.debt_service();
            s.fcfe += m.fcfe;
        }
    }
    for s in &mut out {
        s.dscr = dscr(s.cfads, s.debt_service);
    }
    out
}
