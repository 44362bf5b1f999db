pub mod asset_statement;
pub mod deferred_tax;
pub mod periodic;
pub mod platform;

pub use asset_statement::{
    model_asset_financing, project_asset, AssetFinancials, AssetFinancingInput, AssetStatementYear,
};
pub use deferred_tax::{deferred_tax_schedule, DeferredTaxYear, LossVintage, TaxDepreciationLives};
pub use periodic::{FiscalYearSummary, PeriodStatement};
pub use platform::{
    build_platform_statements, PlatformAssumptions, PlatformYear, PortfolioFinancing,
    StatementsInput, StatementsOutput,
};
