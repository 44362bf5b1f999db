use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::period::Period;
use crate::types::Rate;

use super::contract::Contract;

const FALLBACK_CAPACITY_FACTOR: Decimal = dec!(0.25);
const DEFAULT_STORAGE_DURATION_HOURS: Decimal = dec!(2);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technology {
    Solar,
    Wind,
    Storage,
}

impl Technology {
    pub fn is_renewable(self) -> bool {
        !matches!(self, Technology::Storage)
    }

    /// Merchant price profile name used when querying the price gateway.
    pub fn profile(self) -> &'static str {
        match self {
            Technology::Solar => "solar",
            Technology::Wind => "wind",
            Technology::Storage => "storage",
        }
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile())
    }
}

/// A generating or storage asset. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    pub technology: Technology,
    /// Nameplate capacity in MW.
    pub capacity: Decimal,
    /// Energy storage volume in MWh. Storage assets only.
    #[serde(default)]
    pub volume: Option<Decimal>,
    /// State or market region, e.g. "NSW".
    pub region: String,
    pub commissioning_date: NaiveDate,
    #[serde(default = "default_asset_life")]
    pub asset_life_years: u32,
    /// Annual output degradation as a decimal.
    #[serde(default = "default_degradation")]
    pub annual_degradation: Rate,
    /// Capacity factor per calendar quarter, Q1 first. Values above 1 are
    /// read as percentages.
    #[serde(default)]
    pub quarterly_capacity_factors: [Option<Decimal>; 4],
    /// Output lost to curtailment, availability and network losses.
    #[serde(default = "default_volume_loss")]
    pub volume_loss_adjustment: Rate,
    #[serde(default)]
    pub contracts: Vec<Contract>,
}

fn default_asset_life() -> u32 {
    25
}

fn default_degradation() -> Rate {
    dec!(0.005)
}

fn default_volume_loss() -> Rate {
    dec!(0.05)
}

// ---------------------------------------------------------------------------
// Behaviour
// ---------------------------------------------------------------------------

impl Asset {
    /// First day the asset no longer operates.
    pub fn end_of_life(&self) -> NaiveDate {
        self.commissioning_date
            .checked_add_months(Months::new(self.asset_life_years.saturating_mul(12)))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn commissioning_year(&self) -> i32 {
        self.commissioning_date.year()
    }

    /// Whether any part of the period falls inside the operating life.
    pub fn is_operational(&self, period: &Period) -> bool {
        period.end_date() > self.commissioning_date && period.start_date() < self.end_of_life()
    }

    /// Share of the period inside the operating life, measured month by
    /// month: 0.5 for a calendar year commissioned on 1 July.
    pub fn operating_fraction(&self, period: &Period) -> Decimal {
        let months = period.months();
        if months.is_empty() {
            return Decimal::ZERO;
        }
        let operating: Decimal = months
            .iter()
            .map(|m| m.share_within(self.commissioning_date, self.end_of_life()))
            .sum();
        operating / Decimal::from(months.len())
    }

    /// Capacity factor for the period.
    ///
    /// Quarterly and monthly periods use the matching quarter when it is
    /// supplied; otherwise the mean of the supplied quarters; otherwise the
    /// regional default for the technology.
    pub fn capacity_factor(&self, period: &Period) -> Decimal {
        let matching = period
            .quarter()
            .and_then(|q| q.checked_sub(1))
            .and_then(|i| self.quarterly_capacity_factors.get(i as usize).copied().flatten());
        if let Some(cf) = matching {
            return normalise_factor(cf);
        }

        let supplied: Vec<Decimal> = self
            .quarterly_capacity_factors
            .iter()
            .flatten()
            .map(|cf| normalise_factor(*cf))
            .collect();
        if !supplied.is_empty() {
            return supplied.iter().sum::<Decimal>() / Decimal::from(supplied.len());
        }

        default_capacity_factor(self.technology, &self.region)
    }

    pub fn has_capacity_factors(&self) -> bool {
        self.quarterly_capacity_factors.iter().any(Option::is_some)
    }

    /// Storage duration in hours (volume / capacity). Two hours when the
    /// capacity is not positive.
    pub fn storage_duration_hours(&self) -> Decimal {
        let volume = self.volume.unwrap_or(Decimal::ZERO);
        if self.capacity > Decimal::ZERO {
            volume / self.capacity
        } else {
            DEFAULT_STORAGE_DURATION_HOURS
        }
    }
}

fn normalise_factor(cf: Decimal) -> Decimal {
    if cf > Decimal::ONE {
        cf / Decimal::ONE_HUNDRED
    } else {
        cf
    }
}

/// Regional default capacity factors for renewables.
pub fn default_capacity_factor(technology: Technology, region: &str) -> Decimal {
    let region = region.trim().to_ascii_uppercase();
    let table: &[(&str, Decimal)] = match technology {
        Technology::Solar => &[
            ("NSW", dec!(0.28)),
            ("VIC", dec!(0.25)),
            ("QLD", dec!(0.29)),
            ("SA", dec!(0.27)),
            ("WA", dec!(0.26)),
            ("TAS", dec!(0.23)),
        ],
        Technology::Wind => &[
            ("NSW", dec!(0.35)),
            ("VIC", dec!(0.38)),
            ("QLD", dec!(0.32)),
            ("SA", dec!(0.40)),
            ("WA", dec!(0.37)),
            ("TAS", dec!(0.42)),
        ],
        Technology::Storage => &[],
    };
    table
        .iter()
        .find(|(r, _)| *r == region)
        .map(|(_, cf)| *cf)
        .unwrap_or(FALLBACK_CAPACITY_FACTOR)
}
