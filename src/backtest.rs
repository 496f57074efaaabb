/// Historical backtest of the factor model.
///
/// For each snapshot the model-implied price (NAV/share * implied mNAV) is
/// compared with the realized share price. Pure functions over reference data.
use crate::models::valuation::{mnav_multiplier, nav_per_share};
use crate::state::{HistoricalSnapshot, LiveState, MnavModel};

/// |error| at or below this is a good fit (percent).
const GOOD_ERROR_PCT: f64 = 5.0;
/// |error| at or below this is a fair fit (percent).
const FAIR_ERROR_PCT: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorBand {
    Good,
    Fair,
    Poor,
}

impl ErrorBand {
    #[inline]
    pub fn classify(error_pct: f64) -> Self {
        let e = error_pct.abs();
        if e > FAIR_ERROR_PCT {
            ErrorBand::Poor
        } else if e > GOOD_ERROR_PCT {
            ErrorBand::Fair
        } else {
            ErrorBand::Good
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestRow {
    pub date: chrono::NaiveDate,
    pub actual_price: f64,
    pub nav_per_share: f64,
    pub implied_mnav: f64,
    pub implied_price: f64,
    pub error_pct: f64,
    pub error_band: ErrorBand,
    /// Realized premium of market price over NAV; None when NAV is not positive.
    pub realized_premium_pct: Option<f64>,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestReport {
    pub rows: Vec<BacktestRow>,
    pub mean_abs_error_pct: f64,
}

/// Evaluate one snapshot. Cash and debt come from the live balance sheet,
/// since snapshots only record holdings and share count.
pub fn evaluate(row: &HistoricalSnapshot, live: &LiveState, model: &MnavModel) -> BacktestRow {
    let nav = nav_per_share(row.btc_price, row.btc_held, row.shares, live.cash, live.debt);
    let implied_mnav = mnav_multiplier(&row.factors, model);
    let implied_price = nav * implied_mnav;

    let error_pct = if row.actual_price > 0.0 {
        (implied_price / row.actual_price - 1.0) * 100.0
    } else {
        0.0
    };
    let realized_premium_pct = (nav > 0.0).then(|| (row.actual_price / nav - 1.0) * 100.0);

    BacktestRow {
        date: row.date,
        actual_price: row.actual_price,
        nav_per_share: nav,
        implied_mnav,
        implied_price,
        error_pct,
        error_band: ErrorBand::classify(error_pct),
        realized_premium_pct,
    }
}

pub fn run_backtest(history: &[HistoricalSnapshot], live: &LiveState, model: &MnavModel) -> BacktestReport {
    let rows: Vec<BacktestRow> = history.iter().map(|r| evaluate(r, live, model)).collect();
    let mean_abs_error_pct = if rows.is_empty() {
        0.0
    } else {
        rows.iter().map(|r| r.error_pct.abs()).sum::<f64>() / rows.len() as f64
    };
    BacktestReport {
        rows,
        mean_abs_error_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data;

    #[test]
    fn test_band_boundaries_inclusive() {
        assert_eq!(ErrorBand::classify(0.0), ErrorBand::Good);
        assert_eq!(ErrorBand::classify(5.0), ErrorBand::Good);
        assert_eq!(ErrorBand::classify(-5.01), ErrorBand::Fair);
        assert_eq!(ErrorBand::classify(15.0), ErrorBand::Fair);
        assert_eq!(ErrorBand::classify(15.01), ErrorBand::Poor);
        assert_eq!(ErrorBand::classify(-40.0), ErrorBand::Poor);
    }

    #[test]
    fn test_latest_snapshot_matches_formulas() {
        let reference = data::builtin();
        let row = reference.history.last().unwrap();
        let out = evaluate(row, &reference.live, &reference.mnav_model);

        let live = reference.live;
        let nav = nav_per_share(107_750.0, 10_000.0, 600_710_000.0, live.cash, live.debt);
        assert_eq!(out.nav_per_share, nav);
        let expected_mnav = 2.0 + 5.0 * (1.5 * 0.30 + 0.8 * 0.25 + 0.5 * 0.15 - 0.2 * 0.20 + 0.1 * 0.10);
        assert!((out.implied_mnav - expected_mnav).abs() < 1e-12);
        let expected_err = (nav * out.implied_mnav / 13.15 - 1.0) * 100.0;
        assert!((out.error_pct - expected_err).abs() < 1e-9);
        let premium = out.realized_premium_pct.unwrap();
        assert!((premium - (13.15 / nav - 1.0) * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_report_covers_history() {
        let reference = data::builtin();
        let report = run_backtest(&reference.history, &reference.live, &reference.mnav_model);
        assert_eq!(report.rows.len(), reference.history.len());
        let mean = report.rows.iter().map(|r| r.error_pct.abs()).sum::<f64>() / 5.0;
        assert!((report.mean_abs_error_pct - mean).abs() < 1e-12);
        assert!(report.rows.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn test_degenerate_rows() {
        let reference = data::builtin();
        let mut row = reference.history[0].clone();
        row.shares = 0.0;
        row.actual_price = 0.0;
        let out = evaluate(&row, &reference.live, &reference.mnav_model);
        assert_eq!(out.nav_per_share, 0.0);
        assert_eq!(out.error_pct, 0.0);
        assert!(out.realized_premium_pct.is_none());
        assert!(run_backtest(&[], &reference.live, &reference.mnav_model).rows.is_empty());
    }
}
