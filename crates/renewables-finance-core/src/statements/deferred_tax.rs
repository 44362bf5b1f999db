use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::assets::Technology;
use crate::types::{Money, Rate};

/// Tax depreciation lives in years, per technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxDepreciationLives {
    #[serde(default = "default_generation_life")]
    pub solar: u32,
    #[serde(default = "default_generation_life")]
    pub wind: u32,
    #[serde(default = "default_storage_life")]
    pub storage: u32,
}

fn default_generation_life() -> u32 {
    20
}

fn default_storage_life() -> u32 {
    10
}

impl Default for TaxDepreciationLives {
    fn default() -> Self {
        Self {
            solar: default_generation_life(),
            wind: default_generation_life(),
            storage: default_storage_life(),
        }
    }
}

impl TaxDepreciationLives {
    pub fn for_technology(&self, technology: Technology) -> u32 {
        match technology {
            Technology::Solar => self.solar,
            Technology::Wind => self.wind,
            Technology::Storage => self.storage,
        }
    }
}

/// Book and tax lines for one year.
#[derive(Debug, Clone, Default)]
pub struct DeferredTaxInput {
    pub year: i32,
    pub capex: Money,
    pub book_depreciation: Money,
    pub tax_depreciation: Money,
    pub ebitda: Money,
    pub interest: Money,
}

/// Unused tax loss from one loss-making year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LossVintage {
    pub year: i32,
    pub remaining: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeferredTaxYear {
    pub year: i32,
    pub book_depreciation: Money,
    pub tax_depreciation: Money,
    pub carrying_amount: Money,
    pub tax_base: Money,
    /// Carrying amount less tax base.
    pub temporary_difference: Money,
    pub deferred_tax_liability: Money,
    /// From deductible temporary differences only.
    pub deferred_tax_asset: Money,
    pub taxable_income: Money,
    pub losses_used: Money,
    pub losses_carried_forward: Money,
    /// Losses still carried, oldest first.
    #[serde(default)]
    pub loss_vintages: Vec<LossVintage>,
    pub loss_deferred_tax_asset: Money,
    /// Liability less both deferred tax assets.
    pub net_deferred_tax: Money,
}

/// Deferred tax memo schedule.
///
/// Temporary differences come from cumulative book against tax
/// depreciation on the same cost base. Taxable income is
/// `EBITDA − tax depreciation − interest`; losses carry forward without
/// expiry and are used first in, first out.
pub fn deferred_tax_schedule(years: &[DeferredTaxInput], tax_rate: Rate) -> Vec<DeferredTaxYear> {
    let mut cost = Decimal::ZERO;
    let mut book_accumulated = Decimal::ZERO;
    let mut tax_accumulated = Decimal::ZERO;
    // Oldest at the front.
    let mut vintages: VecDeque<LossVintage> = VecDeque::new();
    let mut out = Vec::with_capacity(years.len());

    for y in years {
        cost += y.capex;
        book_accumulated += y.book_depreciation;
        tax_accumulated += y.tax_depreciation;

        let carrying_amount = (cost - book_accumulated).max(Decimal::ZERO);
        let tax_base = (cost - tax_accumulated).max(Decimal::ZERO);
        let temporary_difference = carrying_amount - tax_base;
        let (deferred_tax_liability, deferred_tax_asset) = if temporary_difference > Decimal::ZERO {
            (temporary_difference * tax_rate, Decimal::ZERO)
        } else {
            (Decimal::ZERO, -temporary_difference * tax_rate)
        };

        let taxable_income = y.ebitda - y.tax_depreciation - y.interest;
        let mut losses_used = Decimal::ZERO;
        if taxable_income < Decimal::ZERO {
            vintages.push_back(LossVintage {
                year: y.year,
                remaining: -taxable_income,
            });
        } else {
            let mut available = taxable_income;
            while available > Decimal::ZERO {
                let Some(oldest) = vintages.front_mut() else { break };
                let used = oldest.remaining.min(available);
                oldest.remaining -= used;
                available -= used;
                losses_used += used;
                if oldest.remaining.is_zero() {
                    vintages.pop_front();
                }
            }
        }

        let losses_carried_forward: Money = vintages.iter().map(|v| v.remaining).sum();
        let loss_deferred_tax_asset = losses_carried_forward * tax_rate;

        out.push(DeferredTaxYear {
            year: y.year,
            book_depreciation: y.book_depreciation,
            tax_depreciation: y.tax_depreciation,
            carrying_amount,
            tax_base,
            temporary_difference,
            deferred_tax_liability,
            deferred_tax_asset,
            taxable_income,
            losses_used,
            losses_carried_forward,
            loss_vintages: vintages.iter().copied().collect(),
            loss_deferred_tax_asset,
            net_deferred_tax: deferred_tax_liability - deferred_tax_asset - loss_deferred_tax_asset,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn year(year: i32, capex: Decimal, book: Decimal, tax: Decimal, ebitda: Decimal) -> DeferredTaxInput {
        DeferredTaxInput {
            year,
            capex,
            book_depreciation: book,
            tax_depreciation: tax,
            ebitda,
            interest: Decimal::ZERO,
        }
    }

    #[test]
    fn test_accelerated_tax_depreciation_creates_liability() {
        let rows = deferred_tax_schedule(
            &[
                year(2025, dec!(100), Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
                year(2026, Decimal::ZERO, dec!(5), dec!(10), dec!(30)),
            ],
            dec!(0.30),
        );
        assert_eq!(rows[1].carrying_amount, dec!(95));
        assert_eq!(rows[1].tax_base, dec!(90));
        assert_eq!(rows[1].deferred_tax_liability, dec!(1.5));
        assert_eq!(rows[1].deferred_tax_asset, Decimal::ZERO);
    }

    #[test]
    fn test_losses_used_first_in_first_out() {
        let rows = deferred_tax_schedule(
            &[
                year(2025, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, dec!(-10)),
                year(2026, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, dec!(-5)),
                year(2027, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, dec!(12)),
            ],
            dec!(0.30),
        );
        assert_eq!(rows[1].losses_carried_forward, dec!(15));
        assert_eq!(rows[1].loss_deferred_tax_asset, dec!(4.5));
        assert_eq!(rows[2].losses_used, dec!(12));
        assert_eq!(rows[2].losses_carried_forward, dec!(3));
    }

    #[test]
    fn test_older_vintage_absorbs_income_before_newer() {
        let income = |y, ebitda| year(y, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, ebitda);
        let rows = deferred_tax_schedule(
            &[
                income(2025, dec!(-10)),
                income(2026, dec!(-4)),
                income(2027, dec!(8)),
                income(2028, dec!(3)),
            ],
            dec!(0.30),
        );
        assert_eq!(
            rows[1].loss_vintages,
            vec![
                LossVintage { year: 2025, remaining: dec!(10) },
                LossVintage { year: 2026, remaining: dec!(4) },
            ]
        );
        assert_eq!(rows[2].losses_used, dec!(8));
        assert_eq!(
            rows[2].loss_vintages,
            vec![
                LossVintage { year: 2025, remaining: dec!(2) },
                LossVintage { year: 2026, remaining: dec!(4) },
            ]
        );
        // 2 clears the 2025 loss, 1 comes off 2026
        assert_eq!(rows[3].losses_used, dec!(3));
        assert_eq!(
            rows[3].loss_vintages,
            vec![LossVintage { year: 2026, remaining: dec!(3) }]
        );
        assert_eq!(rows[3].loss_deferred_tax_asset, dec!(0.9));
    }

    #[test]
    fn test_differences_reverse_once_both_lives_end() {
        let mut input = vec![year(2025, dec!(100), Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)];
        for y in 0..20 {
            input.push(year(
                2026 + y,
                Decimal::ZERO,
                dec!(5),
                if y < 10 { dec!(10) } else { Decimal::ZERO },
                dec!(20),
            ));
        }
        let rows = deferred_tax_schedule(&input, dec!(0.30));
        assert_eq!(rows.last().unwrap().temporary_difference, Decimal::ZERO);
        assert_eq!(rows[10].deferred_tax_liability, dec!(15));
    }
}
