use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::assets::contract::{apply_bundled_floor, apply_floor, Contract, ContractTerms};
use crate::assets::{Asset, Technology};
use crate::period::Period;
use crate::pricing::gateway::{
    merchant_price, storage_spread, MerchantPriceGateway, PRODUCT_ENERGY, PRODUCT_GREEN,
};
use crate::types::{Money, Mwh};

/// $/MWh × MWh to $M.
const DOLLARS_PER_MILLION: Decimal = dec!(1_000_000);

/// Hours in a month on an 8,760-hour year.
const MONTH_HOURS: Decimal = dec!(730);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Revenue of one asset in one period, split by contracted and merchant
/// sales of green certificates and energy. Storage uses the energy buckets
/// only. Revenues are $M, volumes MWh, prices $/MWh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueBreakdown {
    pub asset: String,
    pub period: Period,
    pub technology: Technology,
    pub operational: bool,
    /// Output (renewables) or throughput (storage) after losses and
    /// degradation.
    pub volume: Mwh,
    pub capacity_factor: Decimal,
    pub contracted_green_volume: Mwh,
    pub contracted_energy_volume: Mwh,
    pub merchant_green_volume: Mwh,
    pub merchant_energy_volume: Mwh,
    pub contracted_green_revenue: Money,
    pub contracted_energy_revenue: Money,
    /// The part of contracted energy revenue paid on capacity (fixed and
    /// tolling contracts). It does not move with output.
    #[serde(default)]
    pub capacity_contracted_revenue: Money,
    pub merchant_green_revenue: Money,
    pub merchant_energy_revenue: Money,
    pub total_revenue: Money,
    /// Share of green output under contract, 0 to 100.
    pub green_contracted_pct: Decimal,
    /// Share of energy output under contract, 0 to 100.
    pub energy_contracted_pct: Decimal,
    pub avg_contracted_green_price: Decimal,
    pub avg_contracted_energy_price: Decimal,
    pub merchant_green_price: Decimal,
    pub merchant_energy_price: Decimal,
}

impl RevenueBreakdown {
    pub fn zero(asset: &Asset, period: Period) -> Self {
        RevenueBreakdown {
            asset: asset.name.clone(),
            period,
            technology: asset.technology,
            operational: false,
            volume: Decimal::ZERO,
            capacity_factor: Decimal::ZERO,
            contracted_green_volume: Decimal::ZERO,
            contracted_energy_volume: Decimal::ZERO,
            merchant_green_volume: Decimal::ZERO,
            merchant_energy_volume: Decimal::ZERO,
            contracted_green_revenue: Decimal::ZERO,
            contracted_energy_revenue: Decimal::ZERO,
            capacity_contracted_revenue: Decimal::ZERO,
            merchant_green_revenue: Decimal::ZERO,
            merchant_energy_revenue: Decimal::ZERO,
            total_revenue: Decimal::ZERO,
            green_contracted_pct: Decimal::ZERO,
            energy_contracted_pct: Decimal::ZERO,
            avg_contracted_green_price: Decimal::ZERO,
            avg_contracted_energy_price: Decimal::ZERO,
            merchant_green_price: Decimal::ZERO,
            merchant_energy_price: Decimal::ZERO,
        }
    }

    pub fn contracted_revenue(&self) -> Money {
        self.contracted_green_revenue + self.contracted_energy_revenue
    }

    /// Contracted revenue that scales with output.
    pub fn volume_contracted_revenue(&self) -> Money {
        self.contracted_revenue() - self.capacity_contracted_revenue
    }

    pub fn merchant_revenue(&self) -> Money {
        self.merchant_green_revenue + self.merchant_energy_revenue
    }

    pub fn green_revenue(&self) -> Money {
        self.contracted_green_revenue + self.merchant_green_revenue
    }

    pub fn energy_revenue(&self) -> Money {
        self.contracted_energy_revenue + self.merchant_energy_revenue
    }

    /// Recompute the total from the four buckets.
    pub fn with_total(mut self) -> Self {
        self.total_revenue = self.contracted_revenue() + self.merchant_revenue();
        self
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Operating weights of a period, built month by month so that a year is
/// always the sum of its quarters and months.
struct PeriodWeights {
    /// One entry per calendar month: share of the month operating, and the
    /// capacity factor that month.
    months: Vec<(Period, Decimal, Decimal)>,
    /// Operating months, e.g. 6 for a year commissioned on 1 July.
    operating_months: Decimal,
    /// Output weight: capacity factor × operating share, summed over months.
    /// Storage uses the operating share alone.
    output: Decimal,
}

impl PeriodWeights {
    fn new(asset: &Asset, period: &Period) -> Self {
        let start = asset.commissioning_date;
        let end = asset.end_of_life();
        let months: Vec<(Period, Decimal, Decimal)> = period
            .months()
            .into_iter()
            .map(|m| {
                let cf = match asset.technology {
                    Technology::Solar | Technology::Wind => non_negative(asset.capacity_factor(&m)),
                    Technology::Storage => Decimal::ONE,
                };
                (m, m.share_within(start, end), cf)
            })
            .collect();
        let operating_months = months.iter().map(|(_, share, _)| *share).sum();
        let output = months.iter().map(|(_, share, cf)| *share * *cf).sum();
        PeriodWeights {
            months,
            operating_months,
            output,
        }
    }

    /// Months and output weight of the operating time a contract covers.
    fn contract(&self, asset: &Asset, contract: &Contract) -> (Decimal, Decimal) {
        let from = contract.start_date.max(asset.commissioning_date);
        let to = contract.end_date.min(asset.end_of_life());
        self.months
            .iter()
            .map(|(m, _, cf)| {
                let share = m.share_within(from, to);
                (share, share * *cf)
            })
            .fold((Decimal::ZERO, Decimal::ZERO), |(a, b), (x, y)| (a + x, b + y))
    }
}

/// Revenue of `asset` in `period`.
///
/// Each month of the period counts for the share of its days inside the
/// operating life, so revenue starts at commissioning and stops at end of
/// life whatever the reporting interval. A contract takes its share of the
/// output only for the operating days it covers. Contracted revenue is
/// taken contract by contract; whatever share of each product is left
/// uncontracted is sold at the merchant price from `prices`, falling back
/// to the default curve. Negative or missing inputs count as zero.
pub fn calculate_asset_revenue(
    asset: &Asset,
    period: &Period,
    prices: &dyn MerchantPriceGateway,
) -> RevenueBreakdown {
    let mut out = RevenueBreakdown::zero(asset, *period);
    if !asset.is_operational(period) {
        return out;
    }
    let weights = PeriodWeights::new(asset, period);
    if weights.operating_months <= Decimal::ZERO {
        return out;
    }
    out.operational = true;

    let (volume, capacity_factor) = base_volume(asset, period, &weights);
    out.volume = volume;
    out.capacity_factor = capacity_factor;

    for contract in asset.contracts.iter().filter(|c| c.is_active(period)) {
        let (months, output) = weights.contract(asset, contract);
        let coverage = if weights.output > Decimal::ZERO {
            output / weights.output
        } else {
            months / weights.operating_months
        };
        let cover = Coverage {
            of_output: coverage.min(Decimal::ONE),
            months,
        };
        allocate_contract(&mut out, asset, contract, period, volume, cover);
    }

    let green_merchant_share = merchant_share(out.green_contracted_pct);
    let energy_merchant_share = merchant_share(out.energy_contracted_pct);
    let profile = asset.technology.profile();

    match asset.technology {
        Technology::Solar | Technology::Wind => {
            out.merchant_green_price =
                merchant_price(prices, profile, PRODUCT_GREEN, &asset.region, period);
            out.merchant_energy_price =
                merchant_price(prices, profile, PRODUCT_ENERGY, &asset.region, period);
            out.merchant_green_volume = volume * green_merchant_share;
        }
        Technology::Storage => {
            out.merchant_energy_price = storage_spread(
                prices,
                &asset.region,
                period,
                asset.storage_duration_hours(),
            );
        }
    }
    out.merchant_energy_volume = volume * energy_merchant_share;
    out.merchant_green_revenue = to_millions(out.merchant_green_volume * out.merchant_green_price);
    out.merchant_energy_revenue =
        to_millions(out.merchant_energy_volume * out.merchant_energy_price);

    out.avg_contracted_green_price =
        average_price(out.contracted_green_revenue, out.contracted_green_volume);
    out.avg_contracted_energy_price =
        average_price(out.contracted_energy_revenue, out.contracted_energy_volume);

    out.with_total()
}

/// Output or throughput after losses and degradation, with the average
/// capacity factor over the operating months (zero for storage).
fn base_volume(asset: &Asset, period: &Period, weights: &PeriodWeights) -> (Mwh, Decimal) {
    let loss = non_negative(asset.volume_loss_adjustment).min(Decimal::ONE);
    let degradation = non_negative(asset.annual_degradation).min(Decimal::ONE);
    let offset = period.degradation_offset(asset.commissioning_year());
    let degradation_factor = (Decimal::ONE - degradation).powi(i64::from(offset));
    let availability = (Decimal::ONE - loss) * degradation_factor;

    match asset.technology {
        Technology::Solar | Technology::Wind => {
            let volume = non_negative(asset.capacity) * MONTH_HOURS * weights.output * availability;
            (volume, weights.output / weights.operating_months)
        }
        Technology::Storage => {
            let storage = non_negative(asset.volume.unwrap_or(Decimal::ZERO));
            let days = dec!(365) * weights.operating_months / dec!(12);
            (storage * days * availability, Decimal::ZERO)
        }
    }
}

/// How much of the period's operation a contract covers.
#[derive(Debug, Clone, Copy)]
struct Coverage {
    /// Share of the period's output, 0 to 1.
    of_output: Decimal,
    /// Operating months covered.
    months: Decimal,
}

fn allocate_contract(
    out: &mut RevenueBreakdown,
    asset: &Asset,
    contract: &Contract,
    period: &Period,
    volume: Mwh,
    cover: Coverage,
) {
    let share = non_negative(contract.buyers_percentage) / Decimal::ONE_HUNDRED;
    let pct = non_negative(contract.buyers_percentage) * cover.of_output;
    let index = contract.index_factor(period.year());
    let contracted_volume = volume * share * cover.of_output;

    match contract.terms {
        ContractTerms::Bundled {
            green_price,
            energy_price,
        } => {
            let (green, energy) = apply_bundled_floor(
                non_negative(green_price) * index,
                non_negative(energy_price) * index,
                contract.floor,
            );
            out.contracted_green_revenue += to_millions(contracted_volume * green);
            out.contracted_energy_revenue += to_millions(contracted_volume * energy);
            out.contracted_green_volume += contracted_volume;
            out.contracted_energy_volume += contracted_volume;
            out.green_contracted_pct += pct;
            out.energy_contracted_pct += pct;
        }
        ContractTerms::Green { strike_price } => {
            let price = apply_floor(non_negative(strike_price) * index, contract.floor);
            out.contracted_green_revenue += to_millions(contracted_volume * price);
            out.contracted_green_volume += contracted_volume;
            out.green_contracted_pct += pct;
        }
        ContractTerms::Energy { strike_price } | ContractTerms::Cfd { strike_price } => {
            let price = apply_floor(non_negative(strike_price) * index, contract.floor);
            out.contracted_energy_revenue += to_millions(contracted_volume * price);
            out.contracted_energy_volume += contracted_volume;
            out.energy_contracted_pct += pct;
        }
        ContractTerms::Fixed { annual_revenue } => {
            let revenue = non_negative(annual_revenue) * cover.months * index / dec!(12);
            out.contracted_energy_revenue += revenue;
            out.capacity_contracted_revenue += revenue;
            out.contracted_energy_volume += contracted_volume;
            out.energy_contracted_pct += pct;
        }
        ContractTerms::Tolling { hourly_rate } => {
            let rate = non_negative(hourly_rate) * index;
            let hours = MONTH_HOURS * cover.months;
            let revenue = to_millions(non_negative(asset.capacity) * hours * rate * share);
            out.contracted_energy_revenue += revenue;
            out.capacity_contracted_revenue += revenue;
            out.contracted_energy_volume += contracted_volume;
            out.energy_contracted_pct += pct;
        }
    }
}

/// Uncontracted share of a product, floored at zero.
fn merchant_share(contracted_pct: Decimal) -> Decimal {
    non_negative(Decimal::ONE_HUNDRED - contracted_pct) / Decimal::ONE_HUNDRED
}

pub(crate) fn average_price(revenue: Money, volume: Mwh) -> Decimal {
    if volume > Decimal::ZERO {
        revenue * DOLLARS_PER_MILLION / volume
    } else {
        Decimal::ZERO
    }
}

fn to_millions(dollars: Decimal) -> Money {
    dollars / DOLLARS_PER_MILLION
}

fn non_negative(x: Decimal) -> Decimal {
    x.max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::gateway::NoMarketData;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn solar_100mw() -> Asset {
        Asset {
            name: "Solar A".into(),
            technology: Technology::Solar,
            capacity: dec!(100),
            volume: None,
            region: "QLD".into(),
            commissioning_date: date(2025, 1),
            asset_life_years: 25,
            annual_degradation: dec!(0.005),
            quarterly_capacity_factors: [Some(dec!(0.25)); 4],
            volume_loss_adjustment: dec!(0.05),
            contracts: vec![],
        }
    }

    fn contract(pct: Decimal, terms: ContractTerms) -> Contract {
        Contract {
            counterparty: None,
            buyers_percentage: pct,
            indexation: Decimal::ZERO,
            indexation_reference_year: None,
            floor: None,
            start_date: date(2025, 1),
            end_date: date(2035, 1),
            terms,
        }
    }

    #[test]
    fn test_reference_merchant_case() {
        let a = solar_100mw();
        let r = calculate_asset_revenue(&a, &Period::Annual { year: 2025 }, &NoMarketData);
        assert_eq!(r.volume, dec!(208050));
        assert_eq!(r.merchant_energy_revenue, dec!(13.52325));
        assert_eq!(r.merchant_green_revenue, dec!(7.28175));
        assert_eq!(r.total_revenue, dec!(20.805));
        assert_eq!(r.contracted_revenue(), Decimal::ZERO);
    }

    #[test]
    fn test_zero_before_commissioning() {
        let mut a = solar_100mw();
        a.contracts.push(contract(
            dec!(100),
            ContractTerms::Fixed {
                annual_revenue: dec!(5),
            },
        ));
        let r = calculate_asset_revenue(&a, &Period::Annual { year: 2024 }, &NoMarketData);
        assert!(!r.operational);
        assert_eq!(r.total_revenue, Decimal::ZERO);
        assert_eq!(r.contracted_energy_revenue, Decimal::ZERO);
        assert_eq!(r.volume, Decimal::ZERO);
    }

    #[test]
    fn test_zero_after_end_of_life() {
        let a = solar_100mw();
        let r = calculate_asset_revenue(&a, &Period::Annual { year: 2050 }, &NoMarketData);
        assert_eq!(r.total_revenue, Decimal::ZERO);
    }

    #[test]
    fn test_degradation_applied_by_whole_years() {
        let a = solar_100mw();
        let y0 = calculate_asset_revenue(&a, &Period::Annual { year: 2025 }, &NoMarketData);
        let y2 = calculate_asset_revenue(&a, &Period::Annual { year: 2027 }, &NoMarketData);
        assert_eq!(y2.volume, y0.volume * dec!(0.995) * dec!(0.995));
    }

    #[test]
    fn test_bundled_and_green_contracts_split_products() {
        let mut a = solar_100mw();
        a.contracts.push(contract(
            dec!(50),
            ContractTerms::Bundled {
                green_price: dec!(30),
                energy_price: dec!(70),
            },
        ));
        a.contracts.push(contract(
            dec!(30),
            ContractTerms::Green {
                strike_price: dec!(40),
            },
        ));
        let r = calculate_asset_revenue(&a, &Period::Annual { year: 2025 }, &NoMarketData);
        assert_eq!(r.green_contracted_pct, dec!(80));
        assert_eq!(r.energy_contracted_pct, dec!(50));
        assert_eq!(r.merchant_green_volume, dec!(208050) * dec!(0.2));
        assert_eq!(r.merchant_energy_volume, dec!(208050) * dec!(0.5));
        // 104,025 MWh × $30 + 62,415 MWh × $40
        assert_eq!(r.contracted_green_revenue, dec!(3.12075) + dec!(2.4966));
        assert_eq!(r.contracted_energy_revenue, dec!(7.28175));
        assert_eq!(r.total_revenue, r.contracted_revenue() + r.merchant_revenue());
    }

    #[test]
    fn test_over_contracting_floors_merchant_at_zero() {
        let mut a = solar_100mw();
        for _ in 0..2 {
            a.contracts.push(contract(
                dec!(70),
                ContractTerms::Energy {
                    strike_price: dec!(60),
                },
            ));
        }
        let r = calculate_asset_revenue(&a, &Period::Annual { year: 2025 }, &NoMarketData);
        assert_eq!(r.merchant_energy_volume, Decimal::ZERO);
        assert_eq!(r.merchant_energy_revenue, Decimal::ZERO);
    }

    #[test]
    fn test_floor_and_indexation() {
        let mut a = solar_100mw();
        let mut c = contract(
            dec!(100),
            ContractTerms::Energy {
                strike_price: dec!(40),
            },
        );
        c.indexation = dec!(0.10);
        c.floor = Some(dec!(45));
        a.contracts.push(c);
        let y0 = calculate_asset_revenue(&a, &Period::Annual { year: 2025 }, &NoMarketData);
        assert_eq!(y0.avg_contracted_energy_price, dec!(45));
        let y2 = calculate_asset_revenue(&a, &Period::Annual { year: 2027 }, &NoMarketData);
        assert_eq!(y2.avg_contracted_energy_price, dec!(48.4));
    }

    #[test]
    fn test_fixed_contract_prorated_by_period() {
        let mut a = solar_100mw();
        a.contracts.push(contract(
            dec!(100),
            ContractTerms::Fixed {
                annual_revenue: dec!(8),
            },
        ));
        let q = Period::Quarterly {
            year: 2025,
            quarter: 2,
        };
        let r = calculate_asset_revenue(&a, &q, &NoMarketData);
        assert_eq!(r.contracted_energy_revenue, dec!(2));
        assert_eq!(r.merchant_energy_revenue, Decimal::ZERO);
        assert!(r.merchant_green_revenue > Decimal::ZERO);
    }

    #[test]
    fn test_storage_tolling_and_merchant_spread() {
        let mut a = solar_100mw();
        a.name = "Battery".into();
        a.technology = Technology::Storage;
        a.capacity = dec!(50);
        a.volume = Some(dec!(100));
        a.quarterly_capacity_factors = [None; 4];
        a.annual_degradation = Decimal::ZERO;
        a.contracts.push(contract(
            dec!(60),
            ContractTerms::Tolling {
                hourly_rate: dec!(10),
            },
        ));
        let r = calculate_asset_revenue(&a, &Period::Annual { year: 2026 }, &NoMarketData);
        // 100 MWh × 365 × 0.95
        assert_eq!(r.volume, dec!(34675));
        // 50 MW × 8760 h × $10 × 60%
        assert_eq!(r.contracted_energy_revenue, dec!(2.628));
        // 40% of throughput at the 2h spread of $25
        assert_eq!(r.merchant_energy_revenue, dec!(0.34675));
        assert_eq!(r.merchant_green_revenue, Decimal::ZERO);
    }

    #[test]
    fn test_gateway_prices_override_defaults() {
        let a = solar_100mw();
        let prices = |_: &str, product: &str, _: &str, _: &Period| match product {
            PRODUCT_ENERGY => Some(dec!(100)),
            _ => None,
        };
        let r = calculate_asset_revenue(&a, &Period::Annual { year: 2025 }, &prices);
        assert_eq!(r.merchant_energy_revenue, dec!(20.805));
        assert_eq!(r.merchant_green_price, dec!(35));
    }

    fn total(a: &Asset, periods: &[Period]) -> (Decimal, Decimal) {
        periods
            .iter()
            .map(|p| calculate_asset_revenue(a, p, &NoMarketData))
            .fold((Decimal::ZERO, Decimal::ZERO), |(t, c), r| {
                (t + r.total_revenue, c + r.contracted_revenue())
            })
    }

    fn quarters(year: i32) -> Vec<Period> {
        (1..=4).map(|quarter| Period::Quarterly { year, quarter }).collect()
    }

    #[test]
    fn test_mid_year_commissioning_is_prorated() {
        let mut a = solar_100mw();
        a.commissioning_date = date(2025, 7);
        let annual = calculate_asset_revenue(&a, &Period::Annual { year: 2025 }, &NoMarketData);
        assert_eq!(annual.volume, dec!(104025));
        assert_eq!(annual.total_revenue, dec!(10.4025));
        assert_eq!(annual.capacity_factor, dec!(0.25));
        assert_eq!(total(&a, &quarters(2025)).0, annual.total_revenue);
    }

    #[test]
    fn test_mid_year_end_of_life_is_prorated() {
        let mut a = solar_100mw();
        a.commissioning_date = date(2025, 7);
        let annual = calculate_asset_revenue(&a, &Period::Annual { year: 2050 }, &NoMarketData);
        assert!(annual.operational);
        let by_quarter = total(&a, &quarters(2050)).0;
        assert!((by_quarter - annual.total_revenue).abs() < dec!(0.000000001));
        let full = calculate_asset_revenue(&a, &Period::Annual { year: 2049 }, &NoMarketData);
        // half a year, one more year of degradation
        assert!((annual.volume * dec!(2) - full.volume * dec!(0.995)).abs() < dec!(0.000001));
        let after = calculate_asset_revenue(&a, &Period::Quarterly { year: 2050, quarter: 3 }, &NoMarketData);
        assert!(!after.operational);
    }

    #[test]
    fn test_mid_month_commissioning_counts_days() {
        let mut a = solar_100mw();
        a.commissioning_date = NaiveDate::from_ymd_opt(2025, 7, 16).unwrap();
        let annual = calculate_asset_revenue(&a, &Period::Annual { year: 2025 }, &NoMarketData);
        let months: Vec<Period> = Period::Annual { year: 2025 }.months();
        let (by_month, _) = total(&a, &months);
        let (by_quarter, _) = total(&a, &quarters(2025));
        assert!((by_month - annual.total_revenue).abs() < dec!(0.000000001));
        assert!((by_quarter - annual.total_revenue).abs() < dec!(0.000000001));
        // 16 of 31 July days, then five full months
        let expected = dec!(20.805) / dec!(12) * (dec!(16) / dec!(31) + dec!(5));
        assert!((annual.total_revenue - expected).abs() < dec!(0.000000001));
    }

    #[test]
    fn test_contract_starting_mid_year_covers_its_months_only() {
        let mut a = solar_100mw();
        let mut c = contract(
            dec!(100),
            ContractTerms::Bundled {
                green_price: dec!(30),
                energy_price: dec!(70),
            },
        );
        c.start_date = date(2025, 7);
        c.end_date = date(2035, 7);
        a.contracts.push(c);

        let first = calculate_asset_revenue(&a, &Period::Annual { year: 2025 }, &NoMarketData);
        assert_eq!(first.green_contracted_pct, dec!(50));
        assert_eq!(first.energy_contracted_pct, dec!(50));
        assert_eq!(first.contracted_green_volume, dec!(104025));
        // 104,025 MWh × $100
        assert_eq!(first.contracted_revenue(), dec!(10.4025));
        assert_eq!(first.merchant_energy_volume, dec!(104025));

        let (total_2025, contracted_2025) = total(&a, &quarters(2025));
        assert_eq!(contracted_2025, first.contracted_revenue());
        assert_eq!(total_2025, first.total_revenue);

        let last = calculate_asset_revenue(&a, &Period::Annual { year: 2035 }, &NoMarketData);
        assert_eq!(last.energy_contracted_pct, dec!(50));
        let by_quarter = total(&a, &quarters(2035)).1;
        assert!((by_quarter - last.contracted_revenue()).abs() < dec!(0.000000001));
    }

    #[test]
    fn test_capacity_revenue_tracks_fixed_and_tolling() {
        let mut a = solar_100mw();
        a.contracts.push(contract(
            dec!(40),
            ContractTerms::Fixed {
                annual_revenue: dec!(3),
            },
        ));
        a.contracts.push(contract(
            dec!(30),
            ContractTerms::Energy {
                strike_price: dec!(60),
            },
        ));
        let r = calculate_asset_revenue(&a, &Period::Annual { year: 2026 }, &NoMarketData);
        assert_eq!(r.capacity_contracted_revenue, dec!(3));
        assert_eq!(
            r.volume_contracted_revenue(),
            r.contracted_revenue() - dec!(3)
        );
    }
}
