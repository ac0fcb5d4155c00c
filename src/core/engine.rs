use super::factors::get_division_factor;
use super::types::{
    AgeResult, Balances, ComparisonResult, Inputs, PayoutStyle, SimulationError, SimulationResult,
    SkippedAge, YearSnapshot,
};

/// Claiming age the comparison highlights by default.
pub const STANDARD_PENSION_AGE: u32 = 67;

const SALARY_CAP_IN_G: f64 = 7.1;
const OTP_SALARY_LIMIT_IN_G: f64 = 12.0;
const MAX_VALID_AGE: u32 = 120;

pub fn validate_inputs(inputs: &Inputs) -> Result<(), SimulationError> {
    if inputs.current_age == 0 || inputs.current_age > MAX_VALID_AGE {
        return Err(SimulationError::Validation(format!(
            "current_age must be between 1 and {MAX_VALID_AGE}"
        )));
    }

    if inputs.life_expectancy > MAX_VALID_AGE {
        return Err(SimulationError::Validation(format!(
            "life_expectancy must be <= {MAX_VALID_AGE}"
        )));
    }

    if inputs.pension_age <= inputs.current_age {
        return Err(SimulationError::Validation(
            "pension_age must be > current_age".to_string(),
        ));
    }

    if inputs.pension_age > inputs.life_expectancy {
        return Err(SimulationError::Validation(
            "pension_age must be <= life_expectancy".to_string(),
        ));
    }

    if inputs.employment_end_age < inputs.current_age {
        return Err(SimulationError::Validation(
            "employment_end_age must be >= current_age".to_string(),
        ));
    }

    if inputs.employment_end_age > inputs.pension_age {
        return Err(SimulationError::Validation(
            "employment_end_age must be <= pension_age".to_string(),
        ));
    }

    if !inputs.g_amount.is_finite() || inputs.g_amount <= 0.0 {
        return Err(SimulationError::Validation(
            "g_amount must be > 0".to_string(),
        ));
    }

    for (name, value) in [
        ("folketrygd_start", inputs.folketrygd_start),
        ("otp_start", inputs.otp_start),
        ("savings_start", inputs.savings_start),
        ("annual_savings", inputs.annual_savings),
        ("annual_rental_savings", inputs.annual_rental_savings),
        ("salary_in_g", inputs.salary_in_g),
        ("state_accrual_rate", inputs.state_accrual_rate),
        ("otp_below_rate", inputs.otp_below_rate),
        ("otp_above_rate", inputs.otp_above_rate),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(SimulationError::Validation(format!("{name} must be >= 0")));
        }
    }

    for (name, rate) in [
        ("salary_growth_rate", inputs.salary_growth_rate),
        ("folketrygd_growth_rate", inputs.folketrygd_growth_rate),
        ("otp_growth_rate", inputs.otp_growth_rate),
        ("savings_growth_rate", inputs.savings_growth_rate),
    ] {
        if !rate.is_finite() || rate <= -1.0 {
            return Err(SimulationError::Validation(format!("{name} must be > -1")));
        }
    }

    Ok(())
}

/// Runs the accumulation phase year by year from `current_age` up to (not
/// including) `pension_age`, recording one snapshot per simulated year.
pub fn simulate(inputs: &Inputs) -> Result<SimulationResult, SimulationError> {
    validate_inputs(inputs)?;

    let mut balances = Balances {
        folketrygd: inputs.folketrygd_start,
        otp: inputs.otp_start,
        savings: inputs.savings_start,
    };
    let mut salary_in_g = inputs.salary_in_g;
    let mut snapshots = Vec::with_capacity((inputs.pension_age - inputs.current_age) as usize);

    for age in inputs.current_age..inputs.pension_age {
        let employed = age < inputs.employment_end_age;

        // The year's contributions land before its growth is applied.
        if employed {
            balances.folketrygd += folketrygd_accrual(inputs, salary_in_g);
            balances.otp += otp_accrual(inputs, salary_in_g);
            balances.savings += inputs.annual_savings + inputs.annual_rental_savings;
        }

        balances.folketrygd *= 1.0 + inputs.folketrygd_growth_rate;
        balances.otp *= 1.0 + inputs.otp_growth_rate;
        balances.savings *= 1.0 + inputs.savings_growth_rate;

        if employed {
            salary_in_g *= 1.0 + inputs.salary_growth_rate;
        }

        snapshots.push(YearSnapshot {
            age,
            folketrygd_balance: balances.folketrygd,
            otp_balance: balances.otp,
            savings_balance: balances.savings,
        });
    }

    Ok(SimulationResult { balances, snapshots })
}

fn folketrygd_accrual(inputs: &Inputs, salary_in_g: f64) -> f64 {
    inputs.state_accrual_rate * salary_in_g.min(SALARY_CAP_IN_G) * inputs.g_amount
}

fn otp_accrual(inputs: &Inputs, salary_in_g: f64) -> f64 {
    let below_cap = inputs.otp_below_rate * salary_in_g.min(SALARY_CAP_IN_G);
    let above_cap =
        inputs.otp_above_rate * (salary_in_g.min(OTP_SALARY_LIMIT_IN_G) - SALARY_CAP_IN_G).max(0.0);
    (below_cap + above_cap) * inputs.g_amount
}

/// Converts an accumulated balance into an annual payout from `pension_age`.
pub fn annual_pension_from_balance(
    balance: f64,
    pension_age: u32,
    life_expectancy: u32,
    style: PayoutStyle,
) -> Result<f64, SimulationError> {
    match style {
        PayoutStyle::DivisionFactor => Ok(balance / get_division_factor(pension_age)?),
        PayoutStyle::StraightLine => {
            if life_expectancy <= pension_age {
                return Err(SimulationError::EmptyPayoutHorizon {
                    pension_age,
                    life_expectancy,
                });
            }
            Ok(balance / f64::from(life_expectancy - pension_age))
        }
    }
}

/// Evaluates every candidate claiming age independently; a candidate that
/// fails is reported as skipped without affecting the others.
pub fn run_comparison(inputs: &Inputs, pension_ages: &[u32]) -> ComparisonResult {
    let mut age_results = Vec::with_capacity(pension_ages.len());
    let mut skipped = Vec::new();

    for &pension_age in pension_ages {
        let candidate = candidate_inputs(inputs, pension_age);
        match evaluate_pension_age(&candidate) {
            Ok(result) => age_results.push(result),
            Err(err) => skipped.push(SkippedAge {
                pension_age,
                error: err.to_string(),
            }),
        }
    }

    build_comparison_result(age_results, skipped)
}

pub fn run_snapshot_trace(
    inputs: &Inputs,
    pension_age: u32,
) -> Result<Vec<YearSnapshot>, SimulationError> {
    let candidate = candidate_inputs(inputs, pension_age);
    Ok(simulate(&candidate)?.snapshots)
}

fn candidate_inputs(inputs: &Inputs, pension_age: u32) -> Inputs {
    let mut candidate = inputs.clone();
    candidate.pension_age = pension_age;
    // Working past the candidate claiming age is not modelled.
    candidate.employment_end_age = inputs.employment_end_age.min(pension_age);
    candidate
}

fn evaluate_pension_age(inputs: &Inputs) -> Result<AgeResult, SimulationError> {
    let result = simulate(inputs)?;
    let division_factor = get_division_factor(inputs.pension_age)?;

    let annual_folketrygd = annual_pension_from_balance(
        result.balances.folketrygd,
        inputs.pension_age,
        inputs.life_expectancy,
        PayoutStyle::DivisionFactor,
    )?;
    let annual_otp = annual_pension_from_balance(
        result.balances.otp,
        inputs.pension_age,
        inputs.life_expectancy,
        PayoutStyle::StraightLine,
    )?;
    let annual_savings = annual_pension_from_balance(
        result.balances.savings,
        inputs.pension_age,
        inputs.life_expectancy,
        PayoutStyle::StraightLine,
    )?;

    Ok(AgeResult {
        pension_age: inputs.pension_age,
        employment_end_age: inputs.employment_end_age,
        division_factor,
        payout_years: inputs.life_expectancy - inputs.pension_age,
        folketrygd_balance: result.balances.folketrygd,
        otp_balance: result.balances.otp,
        savings_balance: result.balances.savings,
        total_balance: result.balances.folketrygd + result.balances.otp + result.balances.savings,
        annual_folketrygd,
        annual_otp,
        annual_savings,
        annual_total: annual_folketrygd + annual_otp + annual_savings,
    })
}

fn build_comparison_result(
    age_results: Vec<AgeResult>,
    skipped: Vec<SkippedAge>,
) -> ComparisonResult {
    let selected_index = age_results
        .iter()
        .position(|r| r.pension_age == STANDARD_PENSION_AGE);
    let best_index = age_results
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.annual_total.total_cmp(&b.annual_total))
        .map(|(idx, _)| idx);

    ComparisonResult {
        age_results,
        skipped,
        selected_index,
        best_index,
    }
}
