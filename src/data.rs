use crate::errors::{EngineError, EngineResult};
use crate::state::{
    FactorSample, FactorWeight, HistoricalSnapshot, LiveState, MnavModel, PeerCompany,
    ReferenceData,
};
use chrono::NaiveDate;
use std::path::Path;

/// Load reference data from a JSON file, or fall back to the built-in set.
pub fn load_reference_data(path: Option<&Path>) -> EngineResult<ReferenceData> {
    let data = match path {
        Some(p) => {
            let raw = std::fs::read_to_string(p)?;
            serde_json::from_str::<ReferenceData>(&raw)?
        }
        None => builtin(),
    };
    validate(&data)?;
    Ok(data)
}

/// Startup sanity checks. Runtime formulas tolerate degenerate values, but a
/// configuration that can never produce a simulation is rejected up front.
fn validate(data: &ReferenceData) -> EngineResult<()> {
    let live = &data.live;
    if !(live.btc_price.is_finite() && live.btc_price > 0.0) {
        return Err(EngineError::Config("live.btcPrice must be positive".into()));
    }
    if !(live.btc_held.is_finite() && live.btc_held >= 0.0) {
        return Err(EngineError::Config("live.btcHeld must be non-negative".into()));
    }
    if !(live.shares.is_finite() && live.shares > 0.0) {
        return Err(EngineError::Config("live.shares must be positive".into()));
    }
    if !data.mnav_model.scale.is_finite() || !data.mnav_model.base_premium.is_finite() {
        return Err(EngineError::Config("mnavModel constants must be finite".into()));
    }
    for (i, f) in data.mnav_model.factors.iter().enumerate() {
        let fields = [f.weight, f.min, f.max, f.default_value];
        if !fields.iter().all(|v| v.is_finite()) {
            return Err(EngineError::Config(format!("factor {}: non-finite weight or bound", f.key)));
        }
        if f.min > f.max {
            return Err(EngineError::Config(format!("factor {}: min > max", f.key)));
        }
        if data.mnav_model.factors[..i].iter().any(|g| g.key == f.key) {
            return Err(EngineError::Config(format!("factor {}: duplicate key", f.key)));
        }
    }
    Ok(())
}

/// Reference snapshot for the modeled treasury company (mid-June 2025).
pub fn builtin() -> ReferenceData {
    ReferenceData {
        live: LiveState {
            btc_price: 107_750.0,
            btc_held: 10_000.0,
            shares: 600_710_000.0,
            cash: 22_000_000.0,
            debt: 18_000_000.0,
        },
        market_share_price: 13.15,
        mnav_model: builtin_model(),
        peer: PeerCompany {
            name: "MSTR".into(),
            market_cap: 26_000_000_000.0,
            btc_held: 226_331.0,
            share_price: 1450.0,
        },
        history: builtin_history(),
    }
}

fn builtin_model() -> MnavModel {
    MnavModel {
        base_premium: 2.0,
        scale: 5.0,
        factors: vec![
            factor("beta", "Leveraged BTC Beta", 0.30, -1.0, 3.0, 1.5),
            factor("flows", "Institutional Demand", 0.25, -2.0, 2.0, 0.8),
            factor("sentiment", "Market Sentiment", 0.15, -2.0, 2.0, 0.5),
            factor("macro", "Macro-Risk Environment", 0.20, -2.0, 2.0, -0.2),
            factor("native", "Crypto-Native Value", 0.10, -2.0, 2.0, 0.1),
        ],
    }
}

fn factor(key: &str, label: &str, weight: f64, min: f64, max: f64, default_value: f64) -> FactorWeight {
    FactorWeight {
        key: key.into(),
        label: label.into(),
        weight,
        min,
        max,
        default_value,
    }
}

fn builtin_history() -> Vec<HistoricalSnapshot> {
    // (y, m, d, btc, actual, btc_held, shares, [beta, flows, sentiment, macro, native])
    let rows: [(i32, u32, u32, f64, f64, f64, f64, [f64; 5]); 5] = [
        (2024, 7, 1, 65_000.0, 7.50, 10_000.0, 600_000_000.0, [1.2, 0.5, 0.3, 0.1, 0.2]),
        (2024, 10, 1, 85_000.0, 9.80, 10_000.0, 600_000_000.0, [1.8, 1.1, 0.8, -0.1, 0.0]),
        (2025, 1, 15, 115_000.0, 11.20, 10_000.0, 600_000_000.0, [1.5, 0.6, 0.4, -0.3, -0.1]),
        (2025, 4, 15, 135_000.0, 18.00, 10_000.0, 600_000_000.0, [2.2, 1.5, 1.2, 0.0, 0.3]),
        (2025, 6, 15, 107_750.0, 13.15, 10_000.0, 600_710_000.0, [1.5, 0.8, 0.5, -0.2, 0.1]),
    ];
    const KEYS: [&str; 5] = ["beta", "flows", "sentiment", "macro", "native"];

    rows.iter()
        .filter_map(|&(y, m, d, btc_price, actual_price, btc_held, shares, values)| {
            let date = NaiveDate::from_ymd_opt(y, m, d)?;
            let factors: FactorSample = KEYS
                .iter()
                .zip(values)
                .map(|(k, v)| (k.to_string(), v))
                .collect();
            Some(HistoricalSnapshot {
                date,
                btc_price,
                actual_price,
                btc_held,
                shares,
                factors,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_is_valid() {
        let data = load_reference_data(None).expect("builtin data must validate");
        assert_eq!(data.mnav_model.factors.len(), 5);
        assert_eq!(data.history.len(), 5);
        assert_eq!(data.live.shares, 600_710_000.0);
    }

    #[test]
    fn test_json_round_trip_loads() {
        let json = serde_json::to_string(&builtin()).unwrap();
        let parsed: ReferenceData = serde_json::from_str(&json).unwrap();
        assert!(validate(&parsed).is_ok());
        assert_eq!(parsed.history[0].date, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        let keys: Vec<&str> = parsed.mnav_model.factors.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, ["beta", "flows", "sentiment", "macro", "native"]);
    }

    #[test]
    fn test_rejects_zero_shares() {
        let mut data = builtin();
        data.live.shares = 0.0;
        assert!(matches!(validate(&data), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_rejects_duplicate_factor() {
        let mut data = builtin();
        let dup = data.mnav_model.factors[0].clone();
        data.mnav_model.factors.push(dup);
        assert!(validate(&data).is_err());
    }

    #[test]
    fn test_rejects_non_finite_factor_fields() {
        let corruptions: [fn(&mut FactorWeight); 5] = [
            |f| f.weight = f64::NAN,
            |f| f.weight = f64::INFINITY,
            |f| f.min = f64::NAN,
            |f| f.max = f64::NAN,
            |f| f.default_value = f64::NEG_INFINITY,
        ];
        for set in corruptions {
            let mut data = builtin();
            set(&mut data.mnav_model.factors[2]);
            let err = validate(&data).unwrap_err();
            assert!(matches!(err, EngineError::Config(ref m) if m.contains("sentiment")), "got {err}");
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_reference_data(Some(Path::new("/nonexistent/mnav/reference.json"))).unwrap_err();
        assert!(matches!(err, EngineError::Io(_)), "got {err}");
    }
}
