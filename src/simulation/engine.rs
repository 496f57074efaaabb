use crate::errors::{EngineError, EngineResult};
use crate::models::dilution::simulate_dilution;
use crate::models::path::PathSimulator;
use crate::models::valuation::{mnav_multiplier, nav_per_share};
use crate::models::{RngSource, UniformSource};
use crate::state::{MnavModel, SimulationRequest, SimulationResult, SAMPLE_PATHS};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use smallvec::SmallVec;

/// Annualized volatility above this is rejected as nonsensical input.
pub const MAX_VOLATILITY: f64 = 10.0;

/// SplitMix64 increment (2^64 / golden ratio).
const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

// ═══════════════════════════════════════════════════════════════════════════════
// MONTE CARLO FAIR VALUE
//
// Per trial:
//   1. Simulate one GBM bitcoin path to the horizon
//   2. Dilute: shares issued at the terminal price to reach target holdings
//   3. Fair value = NAV/share(terminal, target holdings, diluted shares) * mNAV
//
// drift = ln(target / spot) and mNAV are fixed for the run; only the price
// path is stochastic. Trials share nothing mutable, so the parallel and
// sequential drivers differ only in where the uniforms come from.
// ═══════════════════════════════════════════════════════════════════════════════

/// Run-wide constants derived from a validated request.
#[derive(Debug, Clone, Copy)]
struct Prepared {
    simulator: PathSimulator,
    mnav: f64,
}

pub struct MonteCarloEngine<'a> {
    model: &'a MnavModel,
    sample_paths: usize,
}

impl<'a> MonteCarloEngine<'a> {
    pub fn new(model: &'a MnavModel) -> Self {
        Self {
            model,
            sample_paths: SAMPLE_PATHS,
        }
    }

    /// Number of leading trials whose full path is retained (capped at `SAMPLE_PATHS`).
    pub fn with_sample_paths(mut self, count: usize) -> Self {
        self.sample_paths = count.min(SAMPLE_PATHS);
        self
    }

    /// Parallel run on the rayon pool.
    ///
    /// Trial `i` draws from its own generator seeded with `trial_seed(seed, i)`,
    /// so a fixed seed reproduces the result exactly regardless of thread
    /// scheduling. Without a seed the base is drawn from OS entropy.
    pub fn run(&self, request: &SimulationRequest) -> EngineResult<SimulationResult> {
        let prepared = self.prepare(request)?;
        let base_seed = request.seed.unwrap_or_else(rand::random::<u64>);
        let keep = self.sample_paths.min(request.num_trials);

        let trials: Vec<(f64, Option<Vec<f64>>)> = (0..request.num_trials)
            .into_par_iter()
            .map(|i| {
                let mut source = RngSource(StdRng::seed_from_u64(trial_seed(base_seed, i as u64)));
                self.trial(&prepared, request, &mut source, i < keep)
            })
            .collect();

        let mut final_values = Vec::with_capacity(trials.len());
        let mut sample_paths = SmallVec::new();
        for (value, path) in trials {
            final_values.push(value);
            if let Some(p) = path {
                sample_paths.push(p);
            }
        }

        Ok(finish(final_values, sample_paths))
    }

    /// Sequential run drawing every uniform from `source`, in trial order.
    pub fn run_with_source<U: UniformSource + ?Sized>(
        &self,
        request: &SimulationRequest,
        source: &mut U,
    ) -> EngineResult<SimulationResult> {
        let prepared = self.prepare(request)?;
        let keep = self.sample_paths.min(request.num_trials);

        let mut final_values = Vec::with_capacity(request.num_trials);
        let mut sample_paths = SmallVec::new();
        for i in 0..request.num_trials {
            let (value, path) = self.trial(&prepared, request, source, i < keep);
            final_values.push(value);
            if let Some(p) = path {
                sample_paths.push(p);
            }
        }

        Ok(finish(final_values, sample_paths))
    }

    fn prepare(&self, request: &SimulationRequest) -> EngineResult<Prepared> {
        if request.num_trials == 0 {
            return Err(EngineError::Validation("trial count must be positive".into()));
        }
        if !request.target_price.is_finite() || request.target_price <= 0.0 {
            return Err(EngineError::Validation(format!(
                "target price must be positive and finite, got {}",
                request.target_price
            )));
        }
        let spot = request.live_state.btc_price;
        if !spot.is_finite() || spot <= 0.0 {
            return Err(EngineError::Validation(format!(
                "current bitcoin price must be positive and finite, got {spot}"
            )));
        }
        if request.volatility > MAX_VOLATILITY {
            return Err(EngineError::Validation(format!(
                "volatility {} exceeds maximum {MAX_VOLATILITY}",
                request.volatility
            )));
        }
        if !request.target_btc_holdings.is_finite() || request.target_btc_holdings < 0.0 {
            return Err(EngineError::Validation(format!(
                "target holdings must be non-negative and finite, got {}",
                request.target_btc_holdings
            )));
        }
        if !request.acquisition_mnav.is_finite() {
            return Err(EngineError::Validation("acquisition mNAV must be finite".into()));
        }

        let mnav = mnav_multiplier(&request.factor_sample, self.model);
        if !mnav.is_finite() {
            return Err(EngineError::Validation("factor values must be finite".into()));
        }

        let drift = (request.target_price / spot).ln();
        // Remaining checks (step count, volatility sign) live with the simulator
        let simulator = PathSimulator::new(spot, drift, request.volatility, request.num_steps)?;

        Ok(Prepared { simulator, mnav })
    }

    #[inline]
    fn trial<U: UniformSource + ?Sized>(
        &self,
        prepared: &Prepared,
        request: &SimulationRequest,
        source: &mut U,
        keep_path: bool,
    ) -> (f64, Option<Vec<f64>>) {
        if keep_path {
            let path = prepared.simulator.path(source);
            let terminal = path[prepared.simulator.num_steps()];
            (fair_value(terminal, prepared.mnav, request), Some(path))
        } else {
            let terminal = prepared.simulator.terminal(source);
            (fair_value(terminal, prepared.mnav, request), None)
        }
    }
}

/// Generator seed for one trial of a seeded run. The base seed is scrambled
/// before the trial index is folded in, so nearby base seeds give unrelated
/// streams instead of index-shifted copies of each other.
#[inline]
fn trial_seed(base_seed: u64, trial: u64) -> u64 {
    splitmix64(splitmix64(base_seed).wrapping_add(trial.wrapping_mul(GOLDEN_GAMMA)))
}

#[inline]
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Fair value per share at a terminal bitcoin price.
#[inline]
fn fair_value(terminal_price: f64, mnav: f64, request: &SimulationRequest) -> f64 {
    let live = &request.live_state;
    let dilution = simulate_dilution(
        terminal_price,
        request.target_btc_holdings,
        request.acquisition_mnav,
        live,
    );
    let nav = nav_per_share(
        terminal_price,
        request.target_btc_holdings,
        dilution.future_shares,
        live.cash,
        live.debt,
    );
    nav * mnav
}

fn finish(
    mut final_values: Vec<f64>,
    sample_paths: SmallVec<[Vec<f64>; SAMPLE_PATHS]>,
) -> SimulationResult {
    final_values.sort_unstable_by(f64::total_cmp);
    SimulationResult {
        final_values,
        sample_paths,
    }
}
