use crate::config::AppConfig;
use portable_atomic::{AtomicU64, Ordering};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

/// Number of full price paths kept per run for visualization.
pub const SAMPLE_PATHS: usize = 10;

// ── Balance sheet snapshot ──

/// Current balance sheet of the bitcoin treasury company.
/// Immutable input to every valuation; the engine never mutates it.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveState {
    pub btc_price: f64,
    pub btc_held: f64,
    pub shares: f64,
    pub cash: f64,
    pub debt: f64,
}

// ── mNAV factor model ──

/// One weighted term of the linear mNAV model.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorWeight {
    pub key: String,
    pub label: String,
    pub weight: f64,
    pub min: f64,
    pub max: f64,
    pub default_value: f64,
}

/// Static mNAV configuration: base premium plus weighted, z-score scaled factors.
/// Loaded once at startup and shared read-only.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MnavModel {
    pub base_premium: f64,
    pub scale: f64,
    pub factors: Vec<FactorWeight>,
}

impl MnavModel {
    pub fn factor(&self, key: &str) -> Option<&FactorWeight> {
        self.factors.iter().find(|f| f.key == key)
    }
}

/// Factor key -> chosen value. Values outside [min, max] extrapolate linearly.
pub type FactorSample = HashMap<String, f64>;

// ── Derived valuation outputs ──

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DilutionResult {
    pub new_shares: f64,
    pub future_shares: f64,
}

/// Point-in-time fair value at a chosen bitcoin price.
#[derive(Debug, Clone, Copy, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub nav_per_share: f64,
    pub mnav: f64,
    pub base_price: f64,
    pub final_price: f64,
    pub dilution: DilutionResult,
}

// ── Monte Carlo run ──

/// Fully specifies one Monte Carlo run. Immutable for the run's duration.
#[derive(Debug, Clone)]
pub struct SimulationRequest {
    pub target_price: f64,
    pub volatility: f64,
    pub target_btc_holdings: f64,
    pub acquisition_mnav: f64,
    pub factor_sample: FactorSample,
    pub live_state: LiveState,
    pub num_trials: usize,
    pub num_steps: usize,
    /// Fixed seed makes the run reproducible; None draws from OS entropy.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    /// Fair value per trial, sorted ascending.
    pub final_values: Vec<f64>,
    /// Full trajectories of the first trials, in trial order.
    pub sample_paths: SmallVec<[Vec<f64>; SAMPLE_PATHS]>,
}

/// Nearest-rank summary of a run's fair-value distribution.
#[derive(Debug, Clone, Copy, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionSummary {
    pub p5: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub prob_above_market: f64,
}

// ── Reference data (startup configuration) ──

/// Quarterly snapshot used by the backtest.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalSnapshot {
    pub date: chrono::NaiveDate,
    pub btc_price: f64,
    pub actual_price: f64,
    pub btc_held: f64,
    pub shares: f64,
    pub factors: FactorSample,
}

/// Larger listed bitcoin holder used as an mNAV benchmark.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerCompany {
    pub name: String,
    pub market_cap: f64,
    pub btc_held: f64,
    pub share_price: f64,
}

/// Everything the engine needs that is fixed for the process lifetime.
/// Built once in main and threaded through explicitly.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceData {
    pub live: LiveState,
    pub market_share_price: f64,
    pub mnav_model: MnavModel,
    pub peer: PeerCompany,
    pub history: Vec<HistoricalSnapshot>,
}

// ── Performance Counters (lock-free) ──

pub struct PerfCounters {
    pub projections_served: AtomicU64,
    pub simulations_run: AtomicU64,
    pub trials_simulated: AtomicU64,
    pub backtests_served: AtomicU64,
    pub validation_failures: AtomicU64,
}

impl PerfCounters {
    pub fn new() -> Self {
        Self {
            projections_served: AtomicU64::new(0),
            simulations_run: AtomicU64::new(0),
            trials_simulated: AtomicU64::new(0),
            backtests_served: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
        }
    }
}

// ── Application shared state (read-only config, lock-free counters) ──

pub struct AppState {
    pub config: AppConfig,
    pub reference: Arc<ReferenceData>,
    pub counters: PerfCounters,
}

impl AppState {
    pub fn new(config: AppConfig, reference: ReferenceData) -> Arc<Self> {
        Arc::new(Self {
            config,
            reference: Arc::new(reference),
            counters: PerfCounters::new(),
        })
    }

    #[inline]
    pub fn record_rejection(&self) {
        self.counters.validation_failures.fetch_add(1, Ordering::Relaxed);
    }
}
