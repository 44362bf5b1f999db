use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};

use crate::period::Period;
use crate::types::{Money, Rate};

use super::asset::Technology;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Pricing terms of an offtake contract. Each variant carries only the
/// price fields that apply to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContractTerms {
    /// Green certificates and energy sold together, $/MWh each.
    Bundled {
        green_price: Decimal,
        energy_price: Decimal,
    },
    /// Green certificates only, $/MWh.
    Green { strike_price: Decimal },
    /// Energy only, $/MWh.
    Energy { strike_price: Decimal },
    /// Fixed payment in $M per year, pro-rated by the operating months covered.
    Fixed { annual_revenue: Money },
    /// Storage contract-for-difference on the arbitrage spread, $/MWh.
    Cfd { strike_price: Decimal },
    /// Storage capacity tolling, $/MW/h.
    Tolling { hourly_rate: Decimal },
}

/// An offtake contract on one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    #[serde(default)]
    pub counterparty: Option<String>,
    /// Share of the asset's output sold under this contract, 0 to 100.
    pub buyers_percentage: Decimal,
    /// Annual price indexation as a decimal.
    #[serde(default)]
    pub indexation: Rate,
    /// Year the contract prices are quoted in. Defaults to the start year.
    #[serde(default)]
    pub indexation_reference_year: Option<i32>,
    /// Minimum realised price, $/MWh. Bundled contracts apply it to the
    /// combined green plus energy price.
    #[serde(default)]
    pub floor: Option<Decimal>,
    pub start_date: NaiveDate,
    /// Exclusive.
    pub end_date: NaiveDate,
    #[serde(flatten)]
    pub terms: ContractTerms,
}

// ---------------------------------------------------------------------------
// Behaviour
// ---------------------------------------------------------------------------

impl ContractTerms {
    pub fn type_name(&self) -> &'static str {
        match self {
            ContractTerms::Bundled { .. } => "bundled",
            ContractTerms::Green { .. } => "green",
            ContractTerms::Energy { .. } => "energy",
            ContractTerms::Fixed { .. } => "fixed",
            ContractTerms::Cfd { .. } => "cfd",
            ContractTerms::Tolling { .. } => "tolling",
        }
    }

    pub fn is_compatible_with(&self, technology: Technology) -> bool {
        match self {
            ContractTerms::Fixed { .. } | ContractTerms::Energy { .. } => true,
            ContractTerms::Bundled { .. } | ContractTerms::Green { .. } => {
                technology.is_renewable()
            }
            ContractTerms::Cfd { .. } | ContractTerms::Tolling { .. } => {
                technology == Technology::Storage
            }
        }
    }

    /// Whether the contract takes a share of the green product.
    pub fn covers_green(&self) -> bool {
        matches!(self, ContractTerms::Bundled { .. } | ContractTerms::Green { .. })
    }

    /// Whether the contract takes a share of the energy product.
    pub fn covers_energy(&self) -> bool {
        !matches!(self, ContractTerms::Green { .. })
    }

    /// Every price or payment on the contract, for sign checks.
    pub fn prices(&self) -> Vec<Decimal> {
        match *self {
            ContractTerms::Bundled {
                green_price,
                energy_price,
            } => vec![green_price, energy_price],
            ContractTerms::Green { strike_price }
            | ContractTerms::Energy { strike_price }
            | ContractTerms::Cfd { strike_price } => vec![strike_price],
            ContractTerms::Fixed { annual_revenue } => vec![annual_revenue],
            ContractTerms::Tolling { hourly_rate } => vec![hourly_rate],
        }
    }
}

impl Contract {
    /// Whether any day of the period falls inside `[start_date, end_date)`.
    /// How much of the period it covers is weighed by the revenue engine.
    pub fn is_active(&self, period: &Period) -> bool {
        period.start_date() < self.end_date && period.end_date() > self.start_date
    }

    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date < self.end_date
    }

    pub fn reference_year(&self) -> i32 {
        self.indexation_reference_year
            .unwrap_or_else(|| self.start_date.year())
    }

    /// `(1 + indexation)^(year − reference_year)`.
    pub fn index_factor(&self, year: i32) -> Decimal {
        let base = Decimal::ONE + self.indexation;
        let exponent = i64::from(year - self.reference_year());
        if self.indexation.is_zero() || exponent == 0 {
            Decimal::ONE
        } else if exponent > 0 {
            base.powi(exponent)
        } else if base.is_zero() {
            Decimal::ZERO
        } else {
            Decimal::ONE / base.powi(-exponent)
        }
    }

    /// Buyer share as a fraction of output.
    pub fn share(&self) -> Decimal {
        self.buyers_percentage / Decimal::ONE_HUNDRED
    }
}

/// Raise a single price to the floor.
pub fn apply_floor(price: Decimal, floor: Option<Decimal>) -> Decimal {
    match floor {
        Some(f) if price < f => f,
        _ => price,
    }
}

/// Floor a bundled contract on its combined price, keeping the green and
/// energy split proportional. When both parts are zero the floor is split
/// evenly.
pub fn apply_bundled_floor(
    green: Decimal,
    energy: Decimal,
    floor: Option<Decimal>,
) -> (Decimal, Decimal) {
    let Some(floor) = floor else {
        return (green, energy);
    };
    let total = green + energy;
    if total >= floor {
        return (green, energy);
    }
    if total.is_zero() {
        let half = floor / Decimal::TWO;
        return (half, half);
    }
    let scale = floor / total;
    (green * scale, energy * scale)
}
