pub mod financing;
pub mod period;
pub mod revenue;
pub mod risk;
pub mod statements;
pub mod xirr;

use renewables_finance_core::pricing::MarketData;
use serde::Deserialize;

/// A model input with an optional price curve and escalation alongside it.
#[derive(Deserialize)]
pub struct Priced<T> {
    #[serde(flatten)]
    pub model: T,
    #[serde(flatten)]
    pub market: MarketData,
}
