use crate::backtest;
use crate::errors::EngineError;
use crate::models::valuation::{self, default_sample};
use crate::simulation::engine::MonteCarloEngine;
use crate::simulation::projection::{self, ProjectionInputs};
use crate::simulation::summary;
use crate::state::{AppState, FactorSample, SimulationRequest};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use portable_atomic::Ordering::Relaxed;
use std::sync::Arc;
use std::time::Instant;

type ApiResult = Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)>;

/// Monte Carlo request body, named as the dashboard sends it.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonteCarloParams {
    pub btc_target_price: f64,
    pub sigma: f64,
    pub btc_holdings: f64,
    pub acquisition_mnav: f64,
    #[serde(default)]
    pub factor_values: FactorSample,
    pub num_trials: Option<usize>,
    pub num_steps: Option<usize>,
    pub seed: Option<u64>,
}

fn reject(state: &AppState, e: EngineError) -> (StatusCode, Json<serde_json::Value>) {
    let status = if e.is_client_error() {
        state.record_rejection();
        tracing::warn!(error = %e, "request rejected");
        StatusCode::BAD_REQUEST
    } else {
        tracing::error!(error = %e, "request failed");
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(serde_json::json!({ "error": e.to_string() })))
}

fn check_factors(state: &AppState, sample: &FactorSample) -> Vec<String> {
    let unknown = valuation::unknown_factors(sample, &state.reference.mnav_model);
    if !unknown.is_empty() {
        tracing::warn!(unknown = ?unknown, "ignoring unknown mNAV factors");
    }
    unknown
}

/// Fill request sizing from config defaults and enforce the hard caps.
fn build_request(state: &AppState, params: MonteCarloParams) -> Result<SimulationRequest, EngineError> {
    let defaults = &state.config.simulation;
    let num_trials = params.num_trials.unwrap_or(defaults.num_trials);
    let num_steps = params.num_steps.unwrap_or(defaults.num_steps);

    if num_trials > defaults.max_trials {
        return Err(EngineError::Validation(format!(
            "numTrials {num_trials} exceeds limit {}",
            defaults.max_trials
        )));
    }
    if num_steps > defaults.max_steps {
        return Err(EngineError::Validation(format!(
            "numSteps {num_steps} exceeds limit {}",
            defaults.max_steps
        )));
    }

    Ok(SimulationRequest {
        target_price: params.btc_target_price,
        volatility: params.sigma,
        target_btc_holdings: params.btc_holdings,
        acquisition_mnav: params.acquisition_mnav,
        factor_sample: params.factor_values,
        live_state: state.reference.live,
        num_trials,
        num_steps,
        seed: params.seed.or(defaults.seed),
    })
}

/// GET /api/config -- reference data plus derived headline numbers
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let reference = &state.reference;
    let live = &reference.live;
    let nav = valuation::nav_per_share(live.btc_price, live.btc_held, live.shares, live.cash, live.debt);
    let default_mnav = valuation::mnav_multiplier(&default_sample(&reference.mnav_model), &reference.mnav_model);
    let market_mnav = if nav > 0.0 { reference.market_share_price / nav } else { 0.0 };

    Json(serde_json::json!({
        "live": live,
        "marketSharePrice": reference.market_share_price,
        "mnavModel": reference.mnav_model,
        "navPerShare": nav,
        "defaultMnav": default_mnav,
        "marketMnav": market_mnav,
        "peer": {
            "name": reference.peer.name,
            "mnav": valuation::peer_mnav(&reference.peer, live.btc_price),
        },
        "simulation": state.config.simulation,
    }))
}

/// POST /api/projection -- deterministic point-in-time fair value
pub async fn post_projection(
    State(state): State<Arc<AppState>>,
    Json(inputs): Json<ProjectionInputs>,
) -> Json<serde_json::Value> {
    let unknown = check_factors(&state, &inputs.factor_values);
    let result = projection::project(&inputs, &state.reference.live, &state.reference.mnav_model);
    state.counters.projections_served.fetch_add(1, Relaxed);

    Json(serde_json::json!({
        "projection": result,
        "unknownFactors": unknown,
    }))
}

/// POST /api/montecarlo -- fair value distribution (CPU-bound, off the reactor)
pub async fn post_montecarlo(
    State(state): State<Arc<AppState>>,
    Json(params): Json<MonteCarloParams>,
) -> ApiResult {
    let unknown = check_factors(&state, &params.factor_values);
    let request = build_request(&state, params).map_err(|e| reject(&state, e))?;

    let run_id = uuid::Uuid::new_v4();
    let num_trials = request.num_trials;
    let num_steps = request.num_steps;
    tracing::info!(%run_id, num_trials, num_steps, seeded = request.seed.is_some(), "monte carlo run started");

    let reference = state.reference.clone();
    let sample_paths = state.config.simulation.sample_paths;
    let started = Instant::now();
    let outcome = tokio::task::spawn_blocking(move || {
        MonteCarloEngine::new(&reference.mnav_model)
            .with_sample_paths(sample_paths)
            .run(&request)
    })
    .await
    .map_err(|e| EngineError::Worker(e.to_string()))
    .and_then(|r| r);

    let result = outcome.map_err(|e| reject(&state, e))?;
    let stats = summary::summarize(&result, state.reference.market_share_price);

    state.counters.simulations_run.fetch_add(1, Relaxed);
    state.counters.trials_simulated.fetch_add(num_trials as u64, Relaxed);
    tracing::info!(
        %run_id,
        elapsed_ms = started.elapsed().as_millis() as u64,
        p50 = ?stats.map(|s| s.p50),
        "monte carlo run finished"
    );

    Ok(Json(serde_json::json!({
        "runId": run_id,
        "finalValues": result.final_values,
        "samplePaths": result.sample_paths,
        "summary": stats,
        "unknownFactors": unknown,
    })))
}

/// GET /api/backtest -- implied vs realized price over reference history
pub async fn get_backtest(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let reference = &state.reference;
    let report = backtest::run_backtest(&reference.history, &reference.live, &reference.mnav_model);
    state.counters.backtests_served.fetch_add(1, Relaxed);
    Json(serde_json::json!(report))
}

/// GET /api/counters -- request counters (lock-free reads)
pub async fn get_counters(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "projections_served": state.counters.projections_served.load(Relaxed),
        "simulations_run": state.counters.simulations_run.load(Relaxed),
        "trials_simulated": state.counters.trials_simulated.load(Relaxed),
        "backtests_served": state.counters.backtests_served.load(Relaxed),
        "validation_failures": state.counters.validation_failures.load(Relaxed),
    }))
}
