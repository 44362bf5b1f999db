use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use statrs::distribution::Uniform;
use std::time::Instant;
use tracing::{debug, info};

use crate::error::FinanceError;
use crate::period::Period;
use crate::pricing::gateway::MerchantPriceGateway;
use crate::revenue::engine::calculate_asset_revenue;
use crate::revenue::portfolio::{screen_assets, Portfolio};
use crate::types::{diagnostic_warnings, with_metadata_f64, ComputationOutput, Diagnostic};
use crate::FinanceResult;

use super::statistics::{histogram, mean, percentile, sort_values, std_dev, HistogramBin};

/// Spreads per-scenario seeds across the generator's state space.
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarConfig {
    /// Number of simulated scenarios (minimum 100).
    #[serde(default = "default_num_scenarios")]
    pub num_scenarios: u32,
    /// Drawn at random and reported when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Half-width of the uniform volume shock, as a fraction.
    #[serde(default = "default_variation")]
    pub volume_variation: f64,
    #[serde(default = "default_variation")]
    pub green_price_variation: f64,
    #[serde(default = "default_variation")]
    pub energy_price_variation: f64,
    pub start_year: i32,
    #[serde(default = "default_years")]
    pub years: u32,
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
}

fn default_num_scenarios() -> u32 {
    1_000
}

fn default_variation() -> f64 {
    0.20
}

fn default_years() -> u32 {
    10
}

fn default_histogram_bins() -> usize {
    20
}

impl EarConfig {
    pub fn new(start_year: i32, years: u32) -> Self {
        EarConfig {
            num_scenarios: default_num_scenarios(),
            seed: None,
            volume_variation: default_variation(),
            green_price_variation: default_variation(),
            energy_price_variation: default_variation(),
            start_year,
            years,
            histogram_bins: default_histogram_bins(),
        }
    }
}

/// Portfolio plus simulation settings, as read by the CLI and bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarInput {
    pub portfolio: Portfolio,
    #[serde(flatten)]
    pub config: EarConfig,
}

/// Revenue under a fixed, deterministic shock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressTest {
    pub name: String,
    pub volume_shock: f64,
    pub green_price_shock: f64,
    pub energy_price_shock: f64,
    pub revenue: f64,
    pub change_from_base: f64,
}

/// Simulated revenue distribution for one year, $M.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarYear {
    pub year: i32,
    pub base_case: f64,
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
    pub min: f64,
    pub max: f64,
    /// P90 less P10.
    pub range: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub histogram: Vec<HistogramBin>,
    pub stress_tests: Vec<StressTest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarOutput {
    pub portfolio: String,
    pub num_scenarios: u32,
    pub seed: u64,
    pub asset_count: usize,
    pub years: Vec<EarYear>,
    pub diagnostics: Vec<Diagnostic>,
}

/// One asset-year of base revenue, split by how shocks apply to it.
#[derive(Debug, Clone, Copy)]
struct Exposure {
    contracted: f64,
    /// Fixed and tolling payments, untouched by any shock.
    capacity: f64,
    merchant_green: f64,
    merchant_energy: f64,
    renewable: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct Shock {
    volume: f64,
    green: f64,
    energy: f64,
}

/// Uniform shock distributions; `None` where the variation is zero.
struct Samplers {
    volume: Option<Uniform>,
    green: Option<Uniform>,
    energy: Option<Uniform>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_variation(value: f64, field: &str) -> FinanceResult<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(FinanceError::InvalidInput {
            field: field.into(),
            reason: "Variation must be between 0 and 1".into(),
        });
    }
    Ok(())
}

fn validate_config(config: &EarConfig) -> FinanceResult<()> {
    if config.num_scenarios < 100 {
        return Err(FinanceError::InvalidInput {
            field: "num_scenarios".into(),
            reason: "Must be at least 100".into(),
        });
    }
    if config.years == 0 {
        return Err(FinanceError::InvalidInput {
            field: "years".into(),
            reason: "Analysis must cover at least one year".into(),
        });
    }
    if config.histogram_bins == 0 {
        return Err(FinanceError::InvalidInput {
            field: "histogram_bins".into(),
            reason: "Must be at least 1".into(),
        });
    }
    Period::annual(config.start_year)?;
    validate_variation(config.volume_variation, "volume_variation")?;
    validate_variation(config.green_price_variation, "green_price_variation")?;
    validate_variation(config.energy_price_variation, "energy_price_variation")?;
    Ok(())
}

fn uniform(variation: f64, field: &str) -> FinanceResult<Option<Uniform>> {
    if variation <= 0.0 {
        return Ok(None);
    }
    Uniform::new(-variation, variation)
        .map(Some)
        .map_err(|e| FinanceError::InvalidInput {
            field: field.into(),
            reason: format!("Invalid Uniform parameters: {e}"),
        })
}

fn draw(rng: &mut StdRng, sampler: &Option<Uniform>) -> f64 {
    match sampler {
        Some(dist) => rng.sample(dist),
        None => 0.0,
    }
}

fn scenario_seed(seed: u64, index: u32) -> u64 {
    seed.wrapping_add(u64::from(index).wrapping_mul(SEED_STRIDE))
}

/// Contracted revenue moves with volume only, capacity payments not at all;
/// merchant revenue moves with volume and its own price. Storage carries no
/// green exposure.
fn shocked_revenue(e: &Exposure, shock: Shock) -> f64 {
    let volume = 1.0 + shock.volume;
    let green = if e.renewable { shock.green } else { 0.0 };
    e.capacity
        + e.contracted * volume
        + e.merchant_green * volume * (1.0 + green)
        + e.merchant_energy * volume * (1.0 + shock.energy)
}

fn year_revenue(exposures: &[Exposure], shock: Shock) -> f64 {
    exposures.iter().map(|e| shocked_revenue(e, shock)).sum()
}

fn stress_test(name: &str, exposures: &[Exposure], shock: Shock, base: f64) -> StressTest {
    let revenue = year_revenue(exposures, shock);
    StressTest {
        name: name.into(),
        volume_shock: shock.volume,
        green_price_shock: shock.green,
        energy_price_shock: shock.energy,
        revenue,
        change_from_base: revenue - base,
    }
}

/// Revenue per year for one scenario.
fn run_scenario(
    index: u32,
    seed: u64,
    exposures: &[Vec<Exposure>],
    samplers: &Samplers,
) -> FinanceResult<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(scenario_seed(seed, index));
    exposures
        .iter()
        .map(|year| {
            let total: f64 = year
                .iter()
                .map(|e| {
                    let shock = Shock {
                        volume: draw(&mut rng, &samplers.volume),
                        green: if e.renewable {
                            draw(&mut rng, &samplers.green)
                        } else {
                            0.0
                        },
                        energy: draw(&mut rng, &samplers.energy),
                    };
                    shocked_revenue(e, shock)
                })
                .sum();
            if total.is_finite() {
                Ok(total)
            } else {
                Err(FinanceError::Simulation(format!(
                    "Scenario {index} produced a non-finite revenue"
                )))
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Monte Carlo earnings at risk on portfolio revenue.
///
/// The base breakdown of every asset-year is computed once; each scenario
/// then applies independent uniform shocks to volume, green price and
/// energy price per asset-year. Scenarios run in parallel, each on its own
/// generator seeded from the run seed and its index, so results do not
/// depend on scheduling. Any failing scenario fails the run.
pub fn run_earnings_at_risk(
    portfolio: &Portfolio,
    prices: &dyn MerchantPriceGateway,
    config: &EarConfig,
) -> FinanceResult<ComputationOutput<EarOutput>> {
    let start = Instant::now();
    validate_config(config)?;

    let screened = screen_assets(portfolio);
    let mut warnings = screened.warnings;
    if screened.assets.is_empty() {
        return Err(FinanceError::InsufficientData(
            "No valid assets to simulate".into(),
        ));
    }

    let years: Vec<i32> = (0..config.years as i32)
        .map(|i| config.start_year + i)
        .collect();
    let exposures: Vec<Vec<Exposure>> = years
        .iter()
        .map(|&year| {
            let period = Period::Annual { year };
            screened
                .assets
                .iter()
                .map(|asset| {
                    let r = calculate_asset_revenue(asset, &period, prices);
                    Exposure {
                        contracted: r.volume_contracted_revenue().to_f64().unwrap_or(0.0),
                        capacity: r.capacity_contracted_revenue.to_f64().unwrap_or(0.0),
                        merchant_green: r.merchant_green_revenue.to_f64().unwrap_or(0.0),
                        merchant_energy: r.merchant_energy_revenue.to_f64().unwrap_or(0.0),
                        renewable: asset.technology.is_renewable(),
                    }
                })
                .collect()
        })
        .collect();

    let samplers = Samplers {
        volume: uniform(config.volume_variation, "volume_variation")?,
        green: uniform(config.green_price_variation, "green_price_variation")?,
        energy: uniform(config.energy_price_variation, "energy_price_variation")?,
    };
    let seed = config.seed.unwrap_or_else(rand::random);
    info!(
        scenarios = config.num_scenarios,
        seed,
        assets = screened.assets.len(),
        "running earnings at risk"
    );

    let scenarios: Vec<Vec<f64>> = (0..config.num_scenarios)
        .into_par_iter()
        .map(|i| run_scenario(i, seed, &exposures, &samplers))
        .collect::<FinanceResult<_>>()?;

    let worst = Shock {
        volume: -config.volume_variation,
        green: -config.green_price_variation,
        energy: -config.energy_price_variation,
    };
    let volume_only = Shock {
        volume: -config.volume_variation,
        ..Shock::default()
    };
    let price_only = Shock {
        volume: 0.0,
        ..worst
    };

    let ear_years: Vec<EarYear> = years
        .iter()
        .enumerate()
        .map(|(i, &year)| {
            let mut values: Vec<f64> = scenarios.iter().map(|s| s[i]).collect();
            sort_values(&mut values);
            let base = year_revenue(&exposures[i], Shock::default());
            let p10 = percentile(&values, 0.10);
            let p90 = percentile(&values, 0.90);
            EarYear {
                year,
                base_case: base,
                p10,
                p50: percentile(&values, 0.50),
                p90,
                min: values[0],
                max: values[values.len() - 1],
                range: p90 - p10,
                mean: mean(&values),
                std_dev: std_dev(&values),
                histogram: histogram(&values, config.histogram_bins),
                stress_tests: vec![
                    stress_test("worst_case", &exposures[i], worst, base),
                    stress_test("volume_stress", &exposures[i], volume_only, base),
                    stress_test("price_stress", &exposures[i], price_only, base),
                ],
            }
        })
        .collect();
    debug!(years = ear_years.len(), "earnings at risk summarised");

    warnings.extend(diagnostic_warnings(&screened.diagnostics));
    let output = EarOutput {
        portfolio: portfolio.name.clone(),
        num_scenarios: config.num_scenarios,
        seed,
        asset_count: screened.assets.len(),
        years: ear_years,
        diagnostics: screened.diagnostics,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata_f64(
        "Earnings at risk: uniform volume and price shocks on merchant revenue, \
         volume shocks on contracted revenue, sorted-index percentiles",
        &serde_json::json!({
            "num_scenarios": config.num_scenarios,
            "seed": seed,
            "volume_variation": config.volume_variation,
            "green_price_variation": config.green_price_variation,
            "energy_price_variation": config.energy_price_variation,
            "units": "$M",
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{Asset, Contract, ContractTerms, Technology};
    use crate::pricing::gateway::NoMarketData;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn solar(name: &str, contracts: Vec<Contract>) -> Asset {
        Asset {
            name: name.into(),
            technology: Technology::Solar,
            capacity: dec!(100),
            volume: None,
            region: "QLD".into(),
            commissioning_date: date(2024, 1, 1),
            asset_life_years: 30,
            annual_degradation: dec!(0.005),
            quarterly_capacity_factors: [Some(dec!(0.25)); 4],
            volume_loss_adjustment: dec!(0.05),
            contracts,
        }
    }

    fn portfolio() -> Portfolio {
        let ppa = Contract {
            counterparty: Some("Retailer".into()),
            buyers_percentage: dec!(100),
            indexation: Decimal::ZERO,
            indexation_reference_year: None,
            floor: None,
            start_date: date(2024, 1, 1),
            end_date: date(2040, 1, 1),
            terms: ContractTerms::Bundled {
                green_price: dec!(30),
                energy_price: dec!(60),
            },
        };
        Portfolio {
            name: "EaR".into(),
            assets: vec![solar("Merchant", vec![]), solar("Contracted", vec![ppa])],
        }
    }

    fn config(seed: u64) -> EarConfig {
        EarConfig {
            seed: Some(seed),
            num_scenarios: 200,
            ..EarConfig::new(2025, 3)
        }
    }

    #[test]
    fn test_zero_variation_collapses_to_base() {
        let cfg = EarConfig {
            volume_variation: 0.0,
            green_price_variation: 0.0,
            energy_price_variation: 0.0,
            ..config(7)
        };
        let out = run_earnings_at_risk(&portfolio(), &NoMarketData, &cfg).unwrap();
        for y in &out.result.years {
            assert_eq!(y.p10, y.base_case);
            assert_eq!(y.p50, y.base_case);
            assert_eq!(y.p90, y.base_case);
            assert_eq!(y.histogram.len(), 1);
        }
    }

    #[test]
    fn test_same_seed_same_distribution() {
        let a = run_earnings_at_risk(&portfolio(), &NoMarketData, &config(42)).unwrap();
        let b = run_earnings_at_risk(&portfolio(), &NoMarketData, &config(42)).unwrap();
        for (x, y) in a.result.years.iter().zip(&b.result.years) {
            assert_eq!(x.p10, y.p10);
            assert_eq!(x.p50, y.p50);
            assert_eq!(x.p90, y.p90);
            assert_eq!(x.std_dev, y.std_dev);
        }
        assert_eq!(a.result.seed, 42);
    }

    #[test]
    fn test_percentiles_ordered_and_within_bounds() {
        let out = run_earnings_at_risk(&portfolio(), &NoMarketData, &config(1)).unwrap();
        for y in &out.result.years {
            assert!(y.min <= y.p10 && y.p10 <= y.p50 && y.p50 <= y.p90 && y.p90 <= y.max);
            assert!(y.range >= 0.0);
            let worst = &y.stress_tests[0];
            assert_eq!(worst.name, "worst_case");
            assert!(worst.revenue < y.base_case);
        }
    }

    #[test]
    fn test_price_stress_leaves_contracted_revenue() {
        let contracted_only = Portfolio {
            name: "PPA".into(),
            assets: vec![portfolio().assets.remove(1)],
        };
        let out = run_earnings_at_risk(&contracted_only, &NoMarketData, &config(3)).unwrap();
        let y = &out.result.years[0];
        let price = y.stress_tests.iter().find(|s| s.name == "price_stress").unwrap();
        assert!(price.change_from_base.abs() < 1e-9);
        let volume = y.stress_tests.iter().find(|s| s.name == "volume_stress").unwrap();
        assert!((volume.revenue - 0.8 * y.base_case).abs() < 1e-9);
    }

    #[test]
    fn test_volume_stress_leaves_fixed_payments() {
        let fixed = Contract {
            counterparty: None,
            buyers_percentage: dec!(100),
            indexation: Decimal::ZERO,
            indexation_reference_year: None,
            floor: None,
            start_date: date(2024, 1, 1),
            end_date: date(2040, 1, 1),
            terms: ContractTerms::Fixed {
                annual_revenue: dec!(10),
            },
        };
        let capacity_only = Portfolio {
            name: "Fixed".into(),
            assets: vec![solar("Fixed", vec![fixed])],
        };
        let out = run_earnings_at_risk(&capacity_only, &NoMarketData, &config(5)).unwrap();
        let y = &out.result.years[0];
        let volume = y.stress_tests.iter().find(|s| s.name == "volume_stress").unwrap();
        let green = y.base_case - 10.0;
        // only the merchant green revenue falls
        assert!((volume.revenue - (10.0 + 0.8 * green)).abs() < 1e-9);
    }

    #[test]
    fn test_too_few_scenarios_rejected() {
        let cfg = EarConfig {
            num_scenarios: 50,
            ..config(1)
        };
        assert!(matches!(
            run_earnings_at_risk(&portfolio(), &NoMarketData, &cfg),
            Err(FinanceError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_missing_seed_is_reported() {
        let cfg = EarConfig {
            seed: None,
            ..config(0)
        };
        let out = run_earnings_at_risk(&portfolio(), &NoMarketData, &cfg).unwrap();
        assert_eq!(out.result.num_scenarios, 200);
        assert_eq!(
            out.assumptions["seed"].as_u64(),
            Some(out.result.seed)
        );
    }
}
