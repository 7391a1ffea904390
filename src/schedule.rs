//! Naive water allocation across houses.

use crate::errors::ValidationError;
use crate::utils::round_to;

/// Largest number of houses a single allocation may cover.
pub const MAX_HOUSES: u32 = 100_000;

/// Splits `total_water` liters across houses, rounded to 2 decimals.
///
/// With a non-empty `forecasted_demand` each house gets its share of the
/// total demand; otherwise the water is split equally over `houses`.
pub fn allocate(
    total_water: f64,
    houses: u32,
    forecasted_demand: Option<&[f64]>,
) -> Result<Vec<f64>, ValidationError> {
    if !total_water.is_finite() || total_water < 0.0 {
        return Err(ValidationError::invalid(
            "total_water",
            "must be a finite, non-negative number",
        ));
    }

    match forecasted_demand {
        Some(demand) if !demand.is_empty() => proportional(total_water, demand),
        _ => equal_split(total_water, houses),
    }
}

fn proportional(total_water: f64, demand: &[f64]) -> Result<Vec<f64>, ValidationError> {
    if demand.len() > MAX_HOUSES as usize {
        return Err(ValidationError::invalid(
            "forecasted_demand",
            format!("must have at most {} entries", MAX_HOUSES),
        ));
    }
    if demand.iter().any(|d| !d.is_finite() || *d < 0.0) {
        return Err(ValidationError::invalid(
            "forecasted_demand",
            "entries must be finite, non-negative numbers",
        ));
    }

    let total_demand: f64 = demand.iter().sum();
    if total_demand <= 0.0 {
        return Err(ValidationError::invalid(
            "forecasted_demand",
            "total demand must be positive",
        ));
    }

    Ok(demand
        .iter()
        .map(|d| round_to(d / total_demand * total_water, 2))
        .collect())
}

fn equal_split(total_water: f64, houses: u32) -> Result<Vec<f64>, ValidationError> {
    if houses == 0 {
        return Err(ValidationError::invalid("houses", "must be at least 1"));
    }
    if houses > MAX_HOUSES {
        return Err(ValidationError::invalid(
            "houses",
            format!("must be at most {}", MAX_HOUSES),
        ));
    }
    let share = round_to(total_water / f64::from(houses), 2);
    Ok(vec![share; houses as usize])
}
