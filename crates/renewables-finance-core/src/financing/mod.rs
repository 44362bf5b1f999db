pub mod assumptions;
pub mod construction;
pub mod debt;

pub use assumptions::AssetCostAssumptions;
pub use construction::{construction_schedule, ConstructionYear, EquityTiming};
pub use debt::{
    build_debt_schedule, size_debt, solve_debt_sizing, DebtSchedule, DebtScheduleEntry,
    DebtSizingInput, DebtSizingOutput, DebtStructure, DebtTerms, FinancingPhase,
    RepaymentFrequency,
};
