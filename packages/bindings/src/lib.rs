use napi::Result as NapiResult;
use napi_derive::napi;

use renewables_finance_core::pricing::MarketData;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Price curve and escalation from an optional JSON argument.
fn market(market_json: Option<String>) -> NapiResult<MarketData> {
    match market_json {
        Some(json) => serde_json::from_str(&json).map_err(to_napi_error),
        None => Ok(MarketData::default()),
    }
}

// ---------------------------------------------------------------------------
// Periods
// ---------------------------------------------------------------------------

#[napi]
pub fn parse_period(raw: String) -> NapiResult<String> {
    let p = renewables_finance_core::period::parse_period(&raw).map_err(to_napi_error)?;
    let out = serde_json::json!({
        "period": p,
        "kind": p.kind(),
        "year": p.year(),
        "start_date": p.start_date(),
        "end_date": p.end_date(),
        "fraction_of_year": p.fraction_of_year(),
    });
    serde_json::to_string(&out).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Revenue
// ---------------------------------------------------------------------------

#[napi]
pub fn forecast_revenue(input_json: String, market_json: Option<String>) -> NapiResult<String> {
    let input: renewables_finance_core::revenue::RevenueForecastInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let prices = market(market_json)?.into_gateway();
    let output = renewables_finance_core::revenue::forecast_portfolio_revenue(&input, prices.as_ref())
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Financing
// ---------------------------------------------------------------------------

#[napi]
pub fn size_debt(input_json: String) -> NapiResult<String> {
    let input: renewables_finance_core::financing::DebtSizingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = renewables_finance_core::financing::size_debt(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn model_asset_financing(input_json: String, market_json: Option<String>) -> NapiResult<String> {
    let input: renewables_finance_core::statements::AssetFinancingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let prices = market(market_json)?.into_gateway();
    let output =
        renewables_finance_core::statements::model_asset_financing(&input, prices.as_ref())
            .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

#[napi]
pub fn build_statements(input_json: String, market_json: Option<String>) -> NapiResult<String> {
    let input: renewables_finance_core::statements::StatementsInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let prices = market(market_json)?.into_gateway();
    let output =
        renewables_finance_core::statements::build_platform_statements(&input, prices.as_ref())
            .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Risk
// ---------------------------------------------------------------------------

#[napi]
pub fn earnings_at_risk(input_json: String, market_json: Option<String>) -> NapiResult<String> {
    let input: renewables_finance_core::risk::EarInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let prices = market(market_json)?.into_gateway();
    let output = renewables_finance_core::risk::run_earnings_at_risk(
        &input.portfolio,
        prices.as_ref(),
        &input.config,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Time value
// ---------------------------------------------------------------------------

#[napi]
pub fn xirr(input_json: String) -> NapiResult<String> {
    let input: renewables_finance_core::time_value::XirrInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = renewables_finance_core::time_value::compute_xirr(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
