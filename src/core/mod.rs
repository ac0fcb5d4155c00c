mod engine;
mod factors;
mod types;

pub use engine::{
    STANDARD_PENSION_AGE, annual_pension_from_balance, run_comparison, run_snapshot_trace,
    simulate, validate_inputs,
};
pub use factors::get_division_factor;
pub use types::{
    AgeResult, Balances, ComparisonResult, Inputs, PayoutStyle, SimulationError, SimulationResult,
    SkippedAge, YearSnapshot,
};
