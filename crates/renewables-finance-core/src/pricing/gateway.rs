//! Merchant price lookups.
//!
//! The engine never owns a price curve. Every call takes a
//! [`MerchantPriceGateway`] and falls back to documented defaults when the
//! gateway has nothing for a key.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::period::{Period, PeriodKind};
use crate::types::Rate;

pub const PRODUCT_GREEN: &str = "green";
pub const PRODUCT_ENERGY: &str = "energy";

/// Storage spread buckets: (duration hours, product label, default $/MWh).
pub const STORAGE_BUCKETS: [(Decimal, &str, Decimal); 4] = [
    (dec!(0.5), "0.5HR", dec!(15)),
    (dec!(1), "1HR", dec!(20)),
    (dec!(2), "2HR", dec!(25)),
    (dec!(4), "4HR", dec!(35)),
];

const DEFAULT_GREEN_PRICE: Decimal = dec!(35);
const DEFAULT_ENERGY_PRICE: Decimal = dec!(65);

/// Source of merchant prices in $/MWh.
pub trait MerchantPriceGateway {
    /// Price for a profile (`solar`, `wind`, `storage`), product (`green`,
    /// `energy`, or a storage bucket such as `2HR`), region and period.
    /// `None` means no data.
    fn price(&self, profile: &str, product: &str, region: &str, period: &Period)
        -> Option<Decimal>;
}

impl<F> MerchantPriceGateway for F
where
    F: Fn(&str, &str, &str, &Period) -> Option<Decimal>,
{
    fn price(&self, profile: &str, product: &str, region: &str, period: &Period) -> Option<Decimal> {
        self(profile, product, region, period)
    }
}

/// Default price for a product, if it has one.
pub fn default_price(product: &str) -> Option<Decimal> {
    if product.eq_ignore_ascii_case(PRODUCT_GREEN) {
        return Some(DEFAULT_GREEN_PRICE);
    }
    if product.eq_ignore_ascii_case(PRODUCT_ENERGY) {
        return Some(DEFAULT_ENERGY_PRICE);
    }
    STORAGE_BUCKETS
        .iter()
        .find(|(_, label, _)| label.eq_ignore_ascii_case(product))
        .map(|(_, _, price)| *price)
}

/// Gateway price, or the product default when the gateway has none.
pub fn merchant_price(
    prices: &dyn MerchantPriceGateway,
    profile: &str,
    product: &str,
    region: &str,
    period: &Period,
) -> Decimal {
    prices
        .price(profile, product, region, period)
        .or_else(|| default_price(product))
        .unwrap_or(Decimal::ZERO)
}

/// Storage spread for an arbitrary duration, interpolated linearly between
/// the bracketing buckets and clamped to the 0.5h and 4h ends.
pub fn storage_spread(
    prices: &dyn MerchantPriceGateway,
    region: &str,
    period: &Period,
    duration_hours: Decimal,
) -> Decimal {
    let bucket_price = |i: usize| {
        let (_, label, _) = STORAGE_BUCKETS[i];
        merchant_price(prices, "storage", label, region, period)
    };
    let last = STORAGE_BUCKETS.len() - 1;

    if duration_hours <= STORAGE_BUCKETS[0].0 {
        return bucket_price(0);
    }
    if duration_hours >= STORAGE_BUCKETS[last].0 {
        return bucket_price(last);
    }

    for i in 0..last {
        let lower = STORAGE_BUCKETS[i].0;
        let upper = STORAGE_BUCKETS[i + 1].0;
        if duration_hours >= lower && duration_hours <= upper {
            let ratio = (duration_hours - lower) / (upper - lower);
            let lo = bucket_price(i);
            let hi = bucket_price(i + 1);
            return lo + ratio * (hi - lo);
        }
    }
    bucket_price(2)
}

// ---------------------------------------------------------------------------
// Gateways
// ---------------------------------------------------------------------------

/// A gateway with no data. Every lookup resolves to the defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMarketData;

impl MerchantPriceGateway for NoMarketData {
    fn price(&self, _: &str, _: &str, _: &str, _: &Period) -> Option<Decimal> {
        None
    }
}

/// One row of a price curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub profile: String,
    pub product: String,
    pub region: String,
    /// Period label, e.g. "2027" or "2027-Q2".
    pub period: Period,
    pub price: Decimal,
}

/// In-memory price curve keyed on profile, product, region and period.
///
/// Sub-annual lookups fall back to the annual entry for the same year.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<PriceEntry>", into = "Vec<PriceEntry>")]
pub struct PriceTable {
    entries: Vec<PriceEntry>,
    index: HashMap<(String, String, String, Period), Decimal>,
}

impl PriceTable {
    pub fn new(entries: Vec<PriceEntry>) -> Self {
        let index = entries
            .iter()
            .map(|e| (key(&e.profile, &e.product, &e.region, e.period), e.price))
            .collect();
        PriceTable { entries, index }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn key(profile: &str, product: &str, region: &str, period: Period) -> (String, String, String, Period) {
    (
        profile.trim().to_ascii_lowercase(),
        product.trim().to_ascii_lowercase(),
        region.trim().to_ascii_uppercase(),
        period,
    )
}

impl From<Vec<PriceEntry>> for PriceTable {
    fn from(entries: Vec<PriceEntry>) -> Self {
        PriceTable::new(entries)
    }
}

impl From<PriceTable> for Vec<PriceEntry> {
    fn from(table: PriceTable) -> Self {
        table.entries
    }
}

impl MerchantPriceGateway for PriceTable {
    fn price(&self, profile: &str, product: &str, region: &str, period: &Period) -> Option<Decimal> {
        if let Some(p) = self.index.get(&key(profile, product, region, *period)) {
            return Some(*p);
        }
        if period.kind() != PeriodKind::Annual {
            let annual = Period::Annual {
                year: period.year(),
            };
            return self.index.get(&key(profile, product, region, annual)).copied();
        }
        None
    }
}

/// Applies `(1 + rate)^(year − reference_year)` to every price, defaults
/// included.
#[derive(Debug, Clone)]
pub struct EscalatedPrices<G> {
    pub inner: G,
    pub rate: Rate,
    pub reference_year: i32,
}

/// Escalation switch as supplied in run inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_escalation_rate")]
    pub rate: Rate,
    #[serde(default = "default_reference_year")]
    pub reference_year: i32,
}

fn default_true() -> bool {
    true
}

fn default_escalation_rate() -> Rate {
    dec!(0.025)
}

fn default_reference_year() -> i32 {
    2025
}

impl Default for EscalationSettings {
    fn default() -> Self {
        EscalationSettings {
            enabled: true,
            rate: default_escalation_rate(),
            reference_year: default_reference_year(),
        }
    }
}

impl<G: MerchantPriceGateway> EscalatedPrices<G> {
    pub fn new(inner: G, rate: Rate, reference_year: i32) -> Self {
        EscalatedPrices {
            inner,
            rate,
            reference_year,
        }
    }

    fn factor(&self, year: i32) -> Decimal {
        let exponent = i64::from(year - self.reference_year);
        let base = Decimal::ONE + self.rate;
        if exponent >= 0 {
            base.powi(exponent)
        } else if base.is_zero() {
            Decimal::ZERO
        } else {
            Decimal::ONE / base.powi(-exponent)
        }
    }
}

impl<G: MerchantPriceGateway> MerchantPriceGateway for EscalatedPrices<G> {
    fn price(&self, profile: &str, product: &str, region: &str, period: &Period) -> Option<Decimal> {
        let base = self
            .inner
            .price(profile, product, region, period)
            .or_else(|| default_price(product))?;
        Some(base * self.factor(period.year()))
    }
}

/// Price curve and escalation as carried alongside a run input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketData {
    #[serde(default)]
    pub prices: PriceTable,
    #[serde(default)]
    pub escalation: Option<EscalationSettings>,
}

impl MarketData {
    /// The table, wrapped in [`EscalatedPrices`] when escalation is enabled.
    pub fn into_gateway(self) -> Box<dyn MerchantPriceGateway> {
        match self.escalation {
            Some(e) if e.enabled => Box::new(EscalatedPrices::new(self.prices, e.rate, e.reference_year)),
            _ => Box::new(self.prices),
        }
    }
}
