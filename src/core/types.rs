use serde::Serialize;
use thiserror::Error;

/// How a lump balance is turned into an annual payout.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PayoutStyle {
    /// NAV-style annuitization via the age-indexed division factor.
    DivisionFactor,
    /// Spread the balance evenly over the years left to `life_expectancy`.
    StraightLine,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("{0}")]
    Validation(String),
    #[error("division factor for age {age} is not positive ({factor})")]
    NonPositiveDivisor { age: u32, factor: f64 },
    #[error(
        "no payout years: life_expectancy ({life_expectancy}) must exceed pension_age ({pension_age})"
    )]
    EmptyPayoutHorizon { pension_age: u32, life_expectancy: u32 },
}

/// Parameter bundle for one simulation run. Ages are whole years; salary and
/// the accrual thresholds are in G-units, all balances and contributions in
/// NOK; rates are fractions (0.02 = 2%).
#[derive(Debug, Clone)]
pub struct Inputs {
    pub current_age: u32,
    pub pension_age: u32,
    pub life_expectancy: u32,
    pub employment_end_age: u32,
    pub folketrygd_start: f64,
    pub otp_start: f64,
    pub savings_start: f64,
    pub annual_savings: f64,
    pub annual_rental_savings: f64,
    pub g_amount: f64,
    pub salary_in_g: f64,
    pub salary_growth_rate: f64,
    pub state_accrual_rate: f64,
    pub otp_below_rate: f64,
    pub otp_above_rate: f64,
    pub folketrygd_growth_rate: f64,
    pub otp_growth_rate: f64,
    pub savings_growth_rate: f64,
}

/// The three pension balances at one point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Balances {
    pub folketrygd: f64,
    pub otp: f64,
    pub savings: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearSnapshot {
    pub age: u32,
    pub folketrygd_balance: f64,
    pub otp_balance: f64,
    pub savings_balance: f64,
}

#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub balances: Balances,
    pub snapshots: Vec<YearSnapshot>,
}

/// One row of the claiming-age comparison table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeResult {
    pub pension_age: u32,
    pub employment_end_age: u32,
    pub division_factor: f64,
    pub payout_years: u32,
    pub folketrygd_balance: f64,
    pub otp_balance: f64,
    pub savings_balance: f64,
    pub total_balance: f64,
    pub annual_folketrygd: f64,
    pub annual_otp: f64,
    pub annual_savings: f64,
    pub annual_total: f64,
}

/// A candidate claiming age that could not be evaluated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedAge {
    pub pension_age: u32,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct ComparisonResult {
    pub age_results: Vec<AgeResult>,
    pub skipped: Vec<SkippedAge>,
    pub selected_index: Option<usize>,
    pub best_index: Option<usize>,
}
