use rust_decimal::Decimal;

use crate::error::FinanceError;
use crate::FinanceResult;

use super::asset::{Asset, Technology};

/// Check an asset and its contracts before modelling.
///
/// Returns the non-fatal warnings when the asset can be modelled, or a
/// [`FinanceError::Validation`] listing every problem found.
pub fn validate_asset(asset: &Asset) -> FinanceResult<Vec<String>> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    if asset.name.trim().is_empty() {
        errors.push("name is required".into());
    }
    if asset.capacity <= Decimal::ZERO {
        errors.push("capacity must be positive".into());
    }
    if asset.region.trim().is_empty() {
        errors.push("region is required".into());
    }
    if asset.asset_life_years == 0 {
        errors.push("asset life must be at least one year".into());
    }
    if asset.annual_degradation < Decimal::ZERO || asset.annual_degradation >= Decimal::ONE {
        errors.push("annual degradation must be in [0, 1)".into());
    }
    if asset.volume_loss_adjustment < Decimal::ZERO || asset.volume_loss_adjustment >= Decimal::ONE
    {
        errors.push("volume loss adjustment must be in [0, 1)".into());
    }

    match asset.technology {
        Technology::Storage => match asset.volume {
            Some(v) if v > Decimal::ZERO => {}
            _ => errors.push("storage assets need a positive volume".into()),
        },
        Technology::Solar | Technology::Wind => {
            if asset.quarterly_capacity_factors.iter().flatten().any(|cf| *cf < Decimal::ZERO) {
                errors.push("capacity factors cannot be negative".into());
            }
            if !asset.has_capacity_factors() {
                warnings.push(format!(
                    "Asset {}: no quarterly capacity factors, using {} default for {}",
                    asset.name, asset.technology, asset.region
                ));
            }
        }
    }

    for (i, c) in asset.contracts.iter().enumerate() {
        let label = format!("contract {} ({})", i + 1, c.terms.type_name());
        if c.end_date <= c.start_date {
            errors.push(format!("{label}: end date must be after start date"));
        }
        if c.buyers_percentage < Decimal::ZERO || c.buyers_percentage > Decimal::ONE_HUNDRED {
            errors.push(format!("{label}: buyers percentage must be between 0 and 100"));
        }
        if !c.terms.is_compatible_with(asset.technology) {
            errors.push(format!(
                "{label}: not applicable to {} assets",
                asset.technology
            ));
        }
        if c.terms.prices().iter().any(|p| *p < Decimal::ZERO) {
            errors.push(format!("{label}: prices cannot be negative"));
        }
        if c.indexation <= Decimal::NEGATIVE_ONE {
            errors.push(format!("{label}: indexation must be greater than -100%"));
        }
    }

    errors.extend(over_allocations(asset));

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(FinanceError::Validation {
            asset: asset.name.clone(),
            reason: errors.join("; "),
        })
    }
}

/// Per-product buyer shares above 100% at any point in time. Overlaps can
/// only start at a contract start date, so those are the dates checked.
fn over_allocations(asset: &Asset) -> Vec<String> {
    let mut problems = Vec::new();
    for contract in &asset.contracts {
        let date = contract.start_date;
        let active: Vec<_> = asset
            .contracts
            .iter()
            .filter(|c| c.is_active_on(date))
            .collect();

        let green: Decimal = active
            .iter()
            .filter(|c| c.terms.covers_green())
            .map(|c| c.buyers_percentage)
            .sum();
        let energy: Decimal = active
            .iter()
            .filter(|c| c.terms.covers_energy())
            .map(|c| c.buyers_percentage)
            .sum();

        for (product, total) in [("green", green), ("energy", energy)] {
            if total > Decimal::ONE_HUNDRED {
                let msg = format!("{product} contracted {total}% from {date}, above 100%");
                if !problems.contains(&msg) {
                    problems.push(msg);
                }
            }
        }
    }
    problems
}
