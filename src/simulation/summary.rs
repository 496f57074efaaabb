/// Distribution statistics over a finished run.
/// All functions are pure and expect `final_values` sorted ascending.
use crate::state::{DistributionSummary, SimulationResult};
use statrs::statistics::Statistics;

/// Nearest-rank percentile: `sorted[floor(p * n)]`, clamped to the last
/// element for p = 1. No interpolation. None for empty input or p outside [0, 1].
#[inline]
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    let idx = ((p * sorted.len() as f64).floor() as usize).min(sorted.len() - 1);
    Some(sorted[idx])
}

/// Summary for the dashboard. `market_price` is the current share price, used
/// for the probability that fair value ends above it. None for an empty run.
pub fn summarize(result: &SimulationResult, market_price: f64) -> Option<DistributionSummary> {
    let values = &result.final_values;
    let n = values.len();
    if n == 0 {
        return None;
    }

    let mean = values.iter().mean();
    let std_dev = if n > 1 { values.iter().std_dev() } else { 0.0 };
    let above = n - values.partition_point(|&v| v <= market_price);

    Some(DistributionSummary {
        p5: percentile(values, 0.05)?,
        p25: percentile(values, 0.25)?,
        p50: percentile(values, 0.50)?,
        p75: percentile(values, 0.75)?,
        p95: percentile(values, 0.95)?,
        mean,
        std_dev,
        min: values[0],
        max: values[n - 1],
        prob_above_market: above as f64 / n as f64,
    })
}
