use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinanceError;
use crate::types::{Money, Rate};
use crate::FinanceResult;

use super::construction::EquityTiming;
use super::debt::{DebtStructure, DebtTerms, RepaymentFrequency};

/// Cost and financing assumptions for one asset. Amounts in $M.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetCostAssumptions {
    pub capex: Money,
    /// Operating costs per year at commissioning.
    #[serde(default)]
    pub operating_costs: Money,
    #[serde(default)]
    pub operating_cost_escalation: Rate,
    /// Value realised at the end of the forecast horizon.
    #[serde(default)]
    pub terminal_value: Money,
    pub max_gearing: Rate,
    /// DSCR target applied to contracted revenue.
    pub target_dscr_contract: Decimal,
    /// DSCR target applied to merchant revenue.
    pub target_dscr_merchant: Decimal,
    pub interest_rate: Rate,
    pub tenor_years: u32,
    #[serde(default)]
    pub debt_structure: DebtStructure,
    /// Interest-only years after commissioning.
    #[serde(default)]
    pub grace_period_years: u32,
    #[serde(default)]
    pub repayment_frequency: RepaymentFrequency,
    /// Rate per tenor year, overriding `interest_rate` where given.
    #[serde(default)]
    pub interest_rate_curve: Vec<Rate>,
    #[serde(default = "default_construction_duration")]
    pub construction_duration_years: Decimal,
    #[serde(default)]
    pub equity_timing: EquityTiming,
    /// Straight-line book depreciation life.
    #[serde(default = "default_depreciation_years")]
    pub depreciation_years: u32,
}

fn default_construction_duration() -> Decimal {
    Decimal::ONE
}

fn default_depreciation_years() -> u32 {
    30
}

impl AssetCostAssumptions {
    pub fn debt_terms(&self) -> DebtTerms {
        DebtTerms {
            interest_rate: self.interest_rate,
            tenor_years: self.tenor_years,
            structure: self.debt_structure,
            grace_period_years: self.grace_period_years,
            repayment_frequency: self.repayment_frequency,
            interest_rate_curve: self.interest_rate_curve.clone(),
        }
    }

    /// Revenue-weighted DSCR target.
    pub fn blended_target_dscr(&self, contracted: Money, merchant: Money) -> Decimal {
        blended_target_dscr(
            contracted,
            merchant,
            self.target_dscr_contract,
            self.target_dscr_merchant,
        )
    }

    pub fn validate(&self, asset: &str) -> FinanceResult<()> {
        let field = |name: &str| format!("{asset}.{name}");
        if self.capex < Decimal::ZERO {
            return Err(FinanceError::InvalidInput {
                field: field("capex"),
                reason: "Capex cannot be negative".into(),
            });
        }
        if self.operating_costs < Decimal::ZERO {
            return Err(FinanceError::InvalidInput {
                field: field("operating_costs"),
                reason: "Operating costs cannot be negative".into(),
            });
        }
        if self.max_gearing < Decimal::ZERO || self.max_gearing > Decimal::ONE {
            return Err(FinanceError::InvalidInput {
                field: field("max_gearing"),
                reason: "Gearing must be between 0 and 1".into(),
            });
        }
        if self.target_dscr_contract <= Decimal::ZERO || self.target_dscr_merchant <= Decimal::ZERO
        {
            return Err(FinanceError::InvalidInput {
                field: field("target_dscr"),
                reason: "DSCR targets must be positive".into(),
            });
        }
        if self.interest_rate <= dec!(-1) || self.interest_rate_curve.iter().any(|r| *r <= dec!(-1)) {
            return Err(FinanceError::InvalidInput {
                field: field("interest_rate"),
                reason: "Interest rate must be greater than -100%".into(),
            });
        }
        if self.tenor_years == 0 && self.max_gearing > Decimal::ZERO {
            return Err(FinanceError::InvalidInput {
                field: field("tenor_years"),
                reason: "Geared assets need a tenor of at least one year".into(),
            });
        }
        if self.tenor_years > 0 && self.grace_period_years >= self.tenor_years {
            return Err(FinanceError::InvalidInput {
                field: field("grace_period_years"),
                reason: "Grace period must end before the tenor does".into(),
            });
        }
        if self.depreciation_years == 0 {
            return Err(FinanceError::InvalidInput {
                field: field("depreciation_years"),
                reason: "Depreciation life must be at least one year".into(),
            });
        }
        Ok(())
    }
}

/// `(contracted × contract_target + merchant × merchant_target) / total`,
/// or the contract target when there is no revenue.
pub fn blended_target_dscr(
    contracted: Money,
    merchant: Money,
    contract_target: Decimal,
    merchant_target: Decimal,
) -> Decimal {
    let contracted = contracted.max(Decimal::ZERO);
    let merchant = merchant.max(Decimal::ZERO);
    let total = contracted + merchant;
    if total.is_zero() {
        return contract_target;
    }
    (contracted * contract_target + merchant * merchant_target) / total
}
