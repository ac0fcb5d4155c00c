use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    AgeResult, ComparisonResult, Inputs, STANDARD_PENSION_AGE, SkippedAge, YearSnapshot,
    run_comparison, run_snapshot_trace,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    current_age: Option<u32>,
    life_expectancy: Option<u32>,
    employment_end_age: Option<u32>,

    folketrygd_start: Option<f64>,
    otp_start: Option<f64>,
    savings_start: Option<f64>,
    annual_savings: Option<f64>,
    annual_rental_savings: Option<f64>,

    g_amount: Option<f64>,
    salary_in_g: Option<f64>,
    salary_growth: Option<f64>,

    state_accrual_rate: Option<f64>,
    otp_below_rate: Option<f64>,
    otp_above_rate: Option<f64>,

    folketrygd_growth: Option<f64>,
    otp_growth: Option<f64>,
    savings_growth: Option<f64>,

    pension_ages: Option<Vec<u32>>,
}

#[derive(Parser, Debug)]
#[command(
    name = "pensjon",
    about = "Norwegian three-pillar pension simulator (folketrygd + OTP + personal savings)"
)]
struct Cli {
    #[arg(long, default_value_t = 36)]
    current_age: u32,
    #[arg(
        long,
        default_value_t = 90,
        help = "Age the payout phase is funded through"
    )]
    life_expectancy: u32,
    #[arg(
        long,
        default_value_t = 67,
        help = "Age when salary and contributions stop"
    )]
    employment_end_age: u32,
    #[arg(
        long,
        default_value_t = 1_697_820.0,
        help = "Current folketrygd balance in NOK"
    )]
    folketrygd_start: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Current occupational (OTP) balance in NOK"
    )]
    otp_start: f64,
    #[arg(
        long,
        default_value_t = 660_000.0,
        help = "Current personal savings balance in NOK"
    )]
    savings_start: f64,
    #[arg(
        long,
        default_value_t = 120_000.0,
        help = "Annual personal savings contribution in NOK"
    )]
    annual_savings: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Additional annual savings from rental income in NOK"
    )]
    annual_rental_savings: f64,
    #[arg(long, default_value_t = 124_028.0, help = "Grunnbeløp (G) in NOK")]
    g_amount: f64,
    #[arg(long, default_value_t = 7.1, help = "Annual salary in G units")]
    salary_in_g: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Annual salary growth in percent, e.g. 2.5"
    )]
    salary_growth_rate: f64,
    #[arg(
        long,
        default_value_t = 18.0,
        help = "Folketrygd accrual as percent of capped salary"
    )]
    state_accrual_rate: f64,
    #[arg(
        long,
        default_value_t = 7.0,
        help = "OTP rate on salary below 7.1 G in percent"
    )]
    otp_below_rate: f64,
    #[arg(
        long,
        default_value_t = 18.0,
        help = "OTP rate on salary between 7.1 and 12 G in percent"
    )]
    otp_above_rate: f64,
    #[arg(
        long,
        default_value_t = 2.0,
        help = "Expected annual folketrygd regulation in percent, e.g. 2"
    )]
    folketrygd_growth_rate: f64,
    #[arg(
        long,
        default_value_t = 4.0,
        help = "Expected annual OTP return in percent"
    )]
    otp_growth_rate: f64,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Expected annual savings return in percent"
    )]
    savings_growth_rate: f64,
    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = vec![62, 67, 70],
        help = "Claiming ages to compare"
    )]
    pension_ages: Vec<u32>,
}

#[derive(Debug, Clone)]
struct ApiOptions {
    pension_ages: Vec<u32>,
}

#[derive(Debug)]
struct ApiRequest {
    inputs: Inputs,
    options: ApiOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    life_expectancy: u32,
    g_amount: f64,
    selected_pension_age: Option<u32>,
    best_pension_age: Option<u32>,
    snapshot_pension_age: Option<u32>,
    age_results: Vec<AgeResult>,
    skipped_ages: Vec<SkippedAge>,
    snapshots: Vec<YearSnapshot>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_inputs(cli: Cli) -> Result<Inputs, String> {
    if cli.current_age == 0 || cli.current_age > 120 {
        return Err("--current-age must be between 1 and 120".to_string());
    }

    if cli.life_expectancy > 120 {
        return Err("--life-expectancy must be <= 120".to_string());
    }

    if cli.life_expectancy <= cli.current_age {
        return Err("--life-expectancy must be > --current-age".to_string());
    }

    if cli.employment_end_age < cli.current_age {
        return Err("--employment-end-age must be >= --current-age".to_string());
    }

    if !cli.g_amount.is_finite() || cli.g_amount <= 0.0 {
        return Err("--g-amount must be > 0".to_string());
    }

    for (name, value) in [
        ("--folketrygd-start", cli.folketrygd_start),
        ("--otp-start", cli.otp_start),
        ("--savings-start", cli.savings_start),
        ("--annual-savings", cli.annual_savings),
        ("--annual-rental-savings", cli.annual_rental_savings),
        ("--salary-in-g", cli.salary_in_g),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("{name} must be >= 0"));
        }
    }

    for (name, rate) in [
        ("--state-accrual-rate", cli.state_accrual_rate),
        ("--otp-below-rate", cli.otp_below_rate),
        ("--otp-above-rate", cli.otp_above_rate),
    ] {
        if !(0.0..=100.0).contains(&rate) {
            return Err(format!("{name} must be between 0 and 100"));
        }
    }

    for (name, rate) in [
        ("--salary-growth-rate", cli.salary_growth_rate),
        ("--folketrygd-growth-rate", cli.folketrygd_growth_rate),
        ("--otp-growth-rate", cli.otp_growth_rate),
        ("--savings-growth-rate", cli.savings_growth_rate),
    ] {
        if !rate.is_finite() || rate <= -100.0 {
            return Err(format!("{name} must be > -100"));
        }
    }

    Ok(Inputs {
        current_age: cli.current_age,
        // Claiming ages are swept per candidate; the comparison overrides this.
        pension_age: STANDARD_PENSION_AGE,
        life_expectancy: cli.life_expectancy,
        employment_end_age: cli.employment_end_age,
        folketrygd_start: cli.folketrygd_start,
        otp_start: cli.otp_start,
        savings_start: cli.savings_start,
        annual_savings: cli.annual_savings,
        annual_rental_savings: cli.annual_rental_savings,
        g_amount: cli.g_amount,
        salary_in_g: cli.salary_in_g,
        salary_growth_rate: cli.salary_growth_rate / 100.0,
        state_accrual_rate: cli.state_accrual_rate / 100.0,
        otp_below_rate: cli.otp_below_rate / 100.0,
        otp_above_rate: cli.otp_above_rate / 100.0,
        folketrygd_growth_rate: cli.folketrygd_growth_rate / 100.0,
        otp_growth_rate: cli.otp_growth_rate / 100.0,
        savings_growth_rate: cli.savings_growth_rate / 100.0,
    })
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("Pension HTTP API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/api/simulate");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let inputs = &request.inputs;
    let comparison = run_comparison(inputs, &request.options.pension_ages);

    let trace_index = comparison.selected_index.or(comparison.best_index);
    let (snapshot_pension_age, snapshots) = match trace_index {
        Some(idx) => {
            let age = comparison.age_results[idx].pension_age;
            match run_snapshot_trace(inputs, age) {
                Ok(snapshots) => (Some(age), snapshots),
                Err(err) => {
                    return error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string());
                }
            }
        }
        None => (None, Vec::new()),
    };

    let response = build_simulate_response(inputs, &comparison, snapshot_pension_age, snapshots);
    json_response(StatusCode::OK, response)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: SimulatePayload) -> Result<ApiRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.current_age {
        cli.current_age = v;
    }
    if let Some(v) = payload.life_expectancy {
        cli.life_expectancy = v;
    }
    if let Some(v) = payload.employment_end_age {
        cli.employment_end_age = v;
    }

    if let Some(v) = payload.folketrygd_start {
        cli.folketrygd_start = v;
    }
    if let Some(v) = payload.otp_start {
        cli.otp_start = v;
    }
    if let Some(v) = payload.savings_start {
        cli.savings_start = v;
    }
    if let Some(v) = payload.annual_savings {
        cli.annual_savings = v;
    }
    if let Some(v) = payload.annual_rental_savings {
        cli.annual_rental_savings = v;
    }

    if let Some(v) = payload.g_amount {
        cli.g_amount = v;
    }
    if let Some(v) = payload.salary_in_g {
        cli.salary_in_g = v;
    }
    if let Some(v) = payload.salary_growth {
        cli.salary_growth_rate = v;
    }

    if let Some(v) = payload.state_accrual_rate {
        cli.state_accrual_rate = v;
    }
    if let Some(v) = payload.otp_below_rate {
        cli.otp_below_rate = v;
    }
    if let Some(v) = payload.otp_above_rate {
        cli.otp_above_rate = v;
    }

    if let Some(v) = payload.folketrygd_growth {
        cli.folketrygd_growth_rate = v;
    }
    if let Some(v) = payload.otp_growth {
        cli.otp_growth_rate = v;
    }
    if let Some(v) = payload.savings_growth {
        cli.savings_growth_rate = v;
    }

    if let Some(v) = payload.pension_ages {
        cli.pension_ages = v;
    }

    let options = ApiOptions {
        pension_ages: cli.pension_ages.clone(),
    };
    let inputs = build_inputs(cli)?;
    if options.pension_ages.is_empty() {
        return Err("pensionAges must not be empty".to_string());
    }

    Ok(ApiRequest { inputs, options })
}

fn default_cli_for_api() -> Cli {
    Cli {
        current_age: 36,
        life_expectancy: 90,
        employment_end_age: 67,
        folketrygd_start: 1_697_820.0,
        otp_start: 0.0,
        savings_start: 660_000.0,
        annual_savings: 120_000.0,
        annual_rental_savings: 0.0,
        g_amount: 124_028.0,
        salary_in_g: 7.1,
        salary_growth_rate: 0.0,
        state_accrual_rate: 18.0,
        otp_below_rate: 7.0,
        otp_above_rate: 18.0,
        folketrygd_growth_rate: 2.0,
        otp_growth_rate: 4.0,
        savings_growth_rate: 5.0,
        pension_ages: vec![62, 67, 70],
    }
}

fn build_simulate_response(
    inputs: &Inputs,
    comparison: &ComparisonResult,
    snapshot_pension_age: Option<u32>,
    snapshots: Vec<YearSnapshot>,
) -> SimulateResponse {
    SimulateResponse {
        life_expectancy: inputs.life_expectancy,
        g_amount: inputs.g_amount,
        selected_pension_age: comparison
            .selected_index
            .map(|idx| comparison.age_results[idx].pension_age),
        best_pension_age: comparison
            .best_index
            .map(|idx| comparison.age_results[idx].pension_age),
        snapshot_pension_age,
        age_results: comparison.age_results.clone(),
        skipped_ages: comparison.skipped.clone(),
        snapshots,
    }
}
