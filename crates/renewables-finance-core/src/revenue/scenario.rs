use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::period::Period;
use crate::types::Rate;

use super::engine::{average_price, RevenueBreakdown};

/// Stress applied by the named scenarios when none is given.
pub const DEFAULT_STRESS: Rate = dec!(0.20);

/// Inclusive range of years a scenario applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearWindow {
    pub start_year: i32,
    pub end_year: i32,
}

/// A read-only view over base revenue: volume and merchant price shifts
/// expressed as decimals (-0.2 = down 20%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub volume_change: Rate,
    #[serde(default)]
    pub green_price_change: Rate,
    #[serde(default)]
    pub energy_price_change: Rate,
    #[serde(default)]
    pub window: Option<YearWindow>,
}

/// Scenario selection as it appears in run inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioSelection {
    Base,
    Worst {
        #[serde(default = "default_stress")]
        stress: Rate,
    },
    Volume {
        #[serde(default = "default_stress")]
        stress: Rate,
    },
    Price {
        #[serde(default = "default_stress")]
        stress: Rate,
    },
    Custom(Scenario),
}

fn default_stress() -> Rate {
    DEFAULT_STRESS
}

impl ScenarioSelection {
    pub fn to_scenario(&self) -> Scenario {
        match self {
            ScenarioSelection::Base => Scenario::base(),
            ScenarioSelection::Worst { stress } => Scenario::worst_case(*stress),
            ScenarioSelection::Volume { stress } => Scenario::volume_stress(*stress),
            ScenarioSelection::Price { stress } => Scenario::price_stress(*stress),
            ScenarioSelection::Custom(s) => s.clone(),
        }
    }
}

impl Scenario {
    pub fn base() -> Self {
        Scenario {
            name: "base".into(),
            volume_change: Decimal::ZERO,
            green_price_change: Decimal::ZERO,
            energy_price_change: Decimal::ZERO,
            window: None,
        }
    }

    /// Volume and both merchant prices down by `stress`.
    pub fn worst_case(stress: Rate) -> Self {
        Scenario {
            name: "worst".into(),
            volume_change: -stress,
            green_price_change: -stress,
            energy_price_change: -stress,
            window: None,
        }
    }

    pub fn volume_stress(stress: Rate) -> Self {
        Scenario {
            name: "volume".into(),
            volume_change: -stress,
            ..Scenario::base()
        }
    }

    pub fn price_stress(stress: Rate) -> Self {
        Scenario {
            name: "price".into(),
            green_price_change: -stress,
            energy_price_change: -stress,
            ..Scenario::base()
        }
    }

    pub fn with_window(mut self, start_year: i32, end_year: i32) -> Self {
        self.window = Some(YearWindow {
            start_year,
            end_year,
        });
        self
    }

    pub fn applies_to(&self, period: &Period) -> bool {
        match self.window {
            Some(w) => (w.start_year..=w.end_year).contains(&period.year()),
            None => true,
        }
    }

    /// Stressed copy of `base`. Contracted revenue moves with volume only,
    /// except capacity payments (fixed and tolling) which do not move at all.
    /// Merchant revenue moves with volume and price. Periods outside the
    /// window come back unchanged.
    pub fn apply(&self, base: &RevenueBreakdown) -> RevenueBreakdown {
        let mut out = base.clone();
        if !self.applies_to(&base.period) {
            return out;
        }
        let v = Decimal::ONE + self.volume_change;
        let g = Decimal::ONE + self.green_price_change;
        let e = Decimal::ONE + self.energy_price_change;

        out.volume *= v;
        out.contracted_green_volume *= v;
        out.contracted_energy_volume *= v;
        out.merchant_green_volume *= v;
        out.merchant_energy_volume *= v;

        let capacity = base.capacity_contracted_revenue;
        out.contracted_green_revenue *= v;
        out.contracted_energy_revenue = (base.contracted_energy_revenue - capacity) * v + capacity;
        out.merchant_green_revenue *= v * g;
        out.merchant_energy_revenue *= v * e;
        out.merchant_green_price *= g;
        out.merchant_energy_price *= e;
        if capacity > Decimal::ZERO {
            out.avg_contracted_energy_price =
                average_price(out.contracted_energy_revenue, out.contracted_energy_volume);
        }

        out.with_total()
    }
}
