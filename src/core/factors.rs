use super::types::SimulationError;

const TABLE_MIN_AGE: u32 = 55;
const TABLE_MAX_AGE: u32 = 75;
const ANNUAL_DIVISOR_REDUCTION: f64 = 0.9;

// Ages 55..=75. The 62..=67 band is the published 1963-cohort delingstall;
// earlier ages extend it by 0.81 a year, later ages by 0.90 a year.
const DIVISION_FACTORS: [f64; 21] = [
    25.73, 24.92, 24.11, 23.30, 22.49, 21.68, 20.87, 20.06, 19.25, 18.44, 17.63, 16.83, 16.02,
    15.12, 14.22, 13.32, 12.42, 11.52, 10.62, 9.72, 8.82,
];

/// Division factor used to annuitize the folketrygd balance at `age`.
/// Ages below the table clamp to its first entry; ages above it shrink the
/// last entry by `ANNUAL_DIVISOR_REDUCTION` per extra year.
pub fn get_division_factor(age: u32) -> Result<f64, SimulationError> {
    let factor = if age < TABLE_MIN_AGE {
        DIVISION_FACTORS[0]
    } else if age <= TABLE_MAX_AGE {
        DIVISION_FACTORS[(age - TABLE_MIN_AGE) as usize]
    } else {
        let years_above = i32::try_from(age - TABLE_MAX_AGE).unwrap_or(i32::MAX);
        DIVISION_FACTORS[DIVISION_FACTORS.len() - 1] * ANNUAL_DIVISOR_REDUCTION.powi(years_above)
    };
    if factor <= 0.0 {
        return Err(SimulationError::NonPositiveDivisor { age, factor });
    }
    Ok(factor)
}
