use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::assets::validation::validate_asset;
use crate::assets::Asset;
use crate::error::FinanceError;
use crate::period::{periods_for_years, Period, PeriodKind};
use crate::pricing::gateway::MerchantPriceGateway;
use crate::types::{diagnostic_warnings, with_metadata, ComputationOutput, Diagnostic, Money};
use crate::FinanceResult;

use super::engine::{calculate_asset_revenue, RevenueBreakdown};
use super::scenario::ScenarioSelection;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A named set of assets. The engine only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    pub name: String,
    pub assets: Vec<Asset>,
}

/// Which revenue streams to report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueFilter {
    #[default]
    All,
    Energy,
    Green,
}

/// Input for a portfolio revenue forecast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueForecastInput {
    pub portfolio: Portfolio,
    #[serde(default = "default_interval")]
    pub interval: PeriodKind,
    pub start_year: i32,
    /// Forecast horizon in whole years.
    #[serde(default = "default_years")]
    pub years: u32,
    /// Only include assets in this region.
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub revenue_filter: RevenueFilter,
    #[serde(default)]
    pub scenario: Option<ScenarioSelection>,
}

fn default_interval() -> PeriodKind {
    PeriodKind::Annual
}

fn default_years() -> u32 {
    30
}

/// Portfolio totals for one period, with the per-asset detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodRevenue {
    pub period: Period,
    pub contracted_green: Money,
    pub contracted_energy: Money,
    pub merchant_green: Money,
    pub merchant_energy: Money,
    pub total: Money,
    pub assets: Vec<RevenueBreakdown>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueSummary {
    /// MW across included assets.
    pub total_capacity: Decimal,
    pub total_revenue: Money,
    pub average_annual_revenue: Money,
    pub contracted_pct: Decimal,
    pub merchant_pct: Decimal,
    pub asset_count: usize,
    pub period_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueForecastOutput {
    pub portfolio: String,
    pub scenario: String,
    pub periods: Vec<PeriodRevenue>,
    pub summary: RevenueSummary,
    pub diagnostics: Vec<Diagnostic>,
}

// ---------------------------------------------------------------------------
// Asset screening
// ---------------------------------------------------------------------------

/// Assets that can be modelled, plus diagnostics for those excluded and
/// any validation warnings.
pub struct ScreenedAssets<'a> {
    pub assets: Vec<&'a Asset>,
    pub diagnostics: Vec<Diagnostic>,
    pub warnings: Vec<String>,
}

/// Validate every asset. Invalid or duplicate-named assets are excluded
/// with an [`Diagnostic::AssetExcluded`]; the rest of the portfolio runs.
pub fn screen_assets(portfolio: &Portfolio) -> ScreenedAssets<'_> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut screened = ScreenedAssets {
        assets: Vec::new(),
        diagnostics: Vec::new(),
        warnings: Vec::new(),
    };

    for asset in &portfolio.assets {
        if !seen.insert(asset.name.as_str()) {
            warn!(asset = %asset.name, "duplicate asset name, excluded");
            screened.diagnostics.push(Diagnostic::AssetExcluded {
                asset: asset.name.clone(),
                reason: "duplicate asset name".into(),
            });
            continue;
        }
        match validate_asset(asset) {
            Ok(w) => {
                screened.warnings.extend(w);
                screened.assets.push(asset);
            }
            Err(FinanceError::Validation { asset: name, reason }) => {
                warn!(asset = %name, %reason, "asset failed validation, excluded");
                screened.diagnostics.push(Diagnostic::AssetExcluded {
                    asset: name,
                    reason,
                });
            }
            Err(other) => {
                screened.diagnostics.push(Diagnostic::AssetExcluded {
                    asset: asset.name.clone(),
                    reason: other.to_string(),
                });
            }
        }
    }
    screened
}

/// Annual revenue of each asset over `years` from `start_year`.
pub fn annual_revenue_by_asset(
    assets: &[&Asset],
    start_year: i32,
    years: u32,
    prices: &dyn MerchantPriceGateway,
) -> BTreeMap<String, Vec<RevenueBreakdown>> {
    let periods = periods_for_years(PeriodKind::Annual, start_year, years);
    assets
        .iter()
        .map(|a| {
            let rows = periods
                .iter()
                .map(|p| calculate_asset_revenue(a, p, prices))
                .collect();
            (a.name.clone(), rows)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Forecast
// ---------------------------------------------------------------------------

/// Revenue forecast for a whole portfolio.
pub fn forecast_portfolio_revenue(
    input: &RevenueForecastInput,
    prices: &dyn MerchantPriceGateway,
) -> FinanceResult<ComputationOutput<RevenueForecastOutput>> {
    let start = Instant::now();

    if input.years == 0 {
        return Err(FinanceError::InvalidInput {
            field: "years".into(),
            reason: "Forecast must cover at least one year".into(),
        });
    }
    Period::annual(input.start_year)?;

    info!(
        portfolio = %input.portfolio.name,
        assets = input.portfolio.assets.len(),
        years = input.years,
        "revenue forecast started"
    );

    let screened = screen_assets(&input.portfolio);
    let region = input.region.as_deref().map(|r| r.trim().to_ascii_uppercase());
    let assets: Vec<&Asset> = screened
        .assets
        .iter()
        .copied()
        .filter(|a| match &region {
            Some(r) if r != "ALL" => a.region.trim().eq_ignore_ascii_case(r),
            _ => true,
        })
        .collect();

    let scenario = input.scenario.as_ref().map(ScenarioSelection::to_scenario);
    let periods = periods_for_years(input.interval, input.start_year, input.years);

    let rows: Vec<PeriodRevenue> = periods
        .iter()
        .map(|period| {
            let breakdowns: Vec<RevenueBreakdown> = assets
                .iter()
                .map(|a| {
                    let base = calculate_asset_revenue(a, period, prices);
                    let stressed = match &scenario {
                        Some(s) => s.apply(&base),
                        None => base,
                    };
                    apply_filter(stressed, input.revenue_filter)
                })
                .collect();
            period_totals(*period, breakdowns)
        })
        .collect();

    let total_revenue: Money = rows.iter().map(|r| r.total).sum();
    let contracted: Money = rows
        .iter()
        .map(|r| r.contracted_green + r.contracted_energy)
        .sum();
    let (contracted_pct, merchant_pct) = if total_revenue > Decimal::ZERO {
        let c = contracted / total_revenue * Decimal::ONE_HUNDRED;
        (c, Decimal::ONE_HUNDRED - c)
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    };

    let summary = RevenueSummary {
        total_capacity: assets.iter().map(|a| a.capacity).sum(),
        total_revenue,
        average_annual_revenue: total_revenue / Decimal::from(input.years),
        contracted_pct,
        merchant_pct,
        asset_count: assets.len(),
        period_count: rows.len(),
    };
    debug!(total = %summary.total_revenue, periods = summary.period_count, "revenue forecast summed");

    let mut warnings = screened.warnings;
    warnings.extend(diagnostic_warnings(&screened.diagnostics));

    let output = RevenueForecastOutput {
        portfolio: input.portfolio.name.clone(),
        scenario: scenario
            .as_ref()
            .map(|s| s.name.clone())
            .unwrap_or_else(|| "base".into()),
        periods: rows,
        summary,
        diagnostics: screened.diagnostics,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Contract waterfall revenue forecast with merchant residual",
        &serde_json::json!({
            "interval": input.interval,
            "start_year": input.start_year,
            "years": input.years,
            "region": input.region,
            "revenue_filter": input.revenue_filter,
            "units": "revenue $M, volume MWh",
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn apply_filter(mut b: RevenueBreakdown, filter: RevenueFilter) -> RevenueBreakdown {
    match filter {
        RevenueFilter::All => return b,
        RevenueFilter::Energy => {
            b.contracted_green_revenue = Decimal::ZERO;
            b.merchant_green_revenue = Decimal::ZERO;
        }
        RevenueFilter::Green => {
            b.contracted_energy_revenue = Decimal::ZERO;
            b.capacity_contracted_revenue = Decimal::ZERO;
            b.merchant_energy_revenue = Decimal::ZERO;
        }
    }
    b.with_total()
}

fn period_totals(period: Period, assets: Vec<RevenueBreakdown>) -> PeriodRevenue {
    let sum = |f: fn(&RevenueBreakdown) -> Money| assets.iter().map(f).sum::<Money>();
    PeriodRevenue {
        period,
        contracted_green: sum(|b| b.contracted_green_revenue),
        contracted_energy: sum(|b| b.contracted_energy_revenue),
        merchant_green: sum(|b| b.merchant_green_revenue),
        merchant_energy: sum(|b| b.merchant_energy_revenue),
        total: sum(|b| b.total_revenue),
        assets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{Contract, ContractTerms, Technology};
    use crate::pricing::gateway::NoMarketData;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn asset(name: &str, technology: Technology, region: &str) -> Asset {
        Asset {
            name: name.into(),
            technology,
            capacity: dec!(100),
            volume: (technology == Technology::Storage).then_some(dec!(200)),
            region: region.into(),
            commissioning_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            asset_life_years: 25,
            annual_degradation: Decimal::ZERO,
            quarterly_capacity_factors: [Some(dec!(0.25)); 4],
            volume_loss_adjustment: dec!(0.05),
            contracts: vec![],
        }
    }

    fn input(assets: Vec<Asset>) -> RevenueForecastInput {
        RevenueForecastInput {
            portfolio: Portfolio {
                name: "Test".into(),
                assets,
            },
            interval: PeriodKind::Annual,
            start_year: 2025,
            years: 3,
            region: None,
            revenue_filter: RevenueFilter::All,
            scenario: None,
        }
    }

    #[test]
    fn test_invalid_asset_excluded_not_fatal() {
        let mut bad = asset("Broken", Technology::Storage, "SA");
        bad.volume = None;
        let out = forecast_portfolio_revenue(
            &input(vec![asset("Good", Technology::Solar, "NSW"), bad]),
            &NoMarketData,
        )
        .unwrap();
        assert_eq!(out.result.summary.asset_count, 1);
        assert_eq!(out.result.diagnostics.len(), 1);
        assert!(matches!(
            &out.result.diagnostics[0],
            Diagnostic::AssetExcluded { asset, .. } if asset == "Broken"
        ));
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_region_and_revenue_filters() {
        let mut inp = input(vec![
            asset("A", Technology::Solar, "NSW"),
            asset("B", Technology::Wind, "VIC"),
        ]);
        inp.region = Some("vic".into());
        inp.revenue_filter = RevenueFilter::Green;
        let out = forecast_portfolio_revenue(&inp, &NoMarketData).unwrap().result;
        assert_eq!(out.summary.asset_count, 1);
        for row in &out.periods {
            assert_eq!(row.merchant_energy, Decimal::ZERO);
            assert_eq!(row.total, row.merchant_green + row.contracted_green);
        }
    }

    #[test]
    fn test_summary_percentages() {
        let mut a = asset("A", Technology::Solar, "NSW");
        a.contracts.push(Contract {
            counterparty: None,
            buyers_percentage: dec!(100),
            indexation: Decimal::ZERO,
            indexation_reference_year: None,
            floor: None,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2040, 1, 1).unwrap(),
            terms: ContractTerms::Bundled {
                green_price: dec!(35),
                energy_price: dec!(65),
            },
        });
        let out = forecast_portfolio_revenue(&input(vec![a]), &NoMarketData)
            .unwrap()
            .result;
        assert_eq!(out.summary.contracted_pct, dec!(100));
        assert_eq!(out.summary.merchant_pct, Decimal::ZERO);
        assert_eq!(out.summary.period_count, 3);
        assert_eq!(
            out.summary.average_annual_revenue * dec!(3),
            out.summary.total_revenue
        );
    }

    #[test]
    fn test_quarterly_sums_match_annual() {
        let a = asset("A", Technology::Solar, "NSW");
        let annual = forecast_portfolio_revenue(&input(vec![a.clone()]), &NoMarketData)
            .unwrap()
            .result;
        let mut q = input(vec![a]);
        q.interval = PeriodKind::Quarterly;
        let quarterly = forecast_portfolio_revenue(&q, &NoMarketData).unwrap().result;
        assert_eq!(quarterly.periods.len(), 12);
        assert_eq!(quarterly.summary.total_revenue, annual.summary.total_revenue);
    }

    #[test]
    fn test_duplicate_names_excluded() {
        let out = forecast_portfolio_revenue(
            &input(vec![
                asset("Same", Technology::Solar, "NSW"),
                asset("Same", Technology::Wind, "NSW"),
            ]),
            &NoMarketData,
        )
        .unwrap()
        .result;
        assert_eq!(out.summary.asset_count, 1);
        assert_eq!(out.diagnostics.len(), 1);
    }

    #[test]
    fn test_zero_years_rejected() {
        let mut inp = input(vec![]);
        inp.years = 0;
        assert!(forecast_portfolio_revenue(&inp, &NoMarketData).is_err());
    }
}
