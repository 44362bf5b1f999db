pub mod engine;
pub mod portfolio;
pub mod scenario;

pub use engine::{calculate_asset_revenue, RevenueBreakdown};
pub use portfolio::{forecast_portfolio_revenue, Portfolio, RevenueForecastInput};
pub use scenario::{Scenario, ScenarioSelection};
