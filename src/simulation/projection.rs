use crate::models::dilution::simulate_dilution;
use crate::models::valuation::{mnav_multiplier, nav_per_share};
use crate::state::{FactorSample, LiveState, MnavModel, Projection};

fn default_overshoot() -> f64 {
    1.0
}

/// Inputs of a single deterministic projection, named as the dashboard sends them.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ProjectionInputs {
    #[serde(rename = "btcTarget")]
    pub btc_price: f64,
    #[serde(rename = "btcHoldings")]
    pub target_holdings: f64,
    #[serde(rename = "acquisitionMnav")]
    pub acquisition_mnav: f64,
    /// Momentum overshoot applied on top of fair value.
    #[serde(default = "default_overshoot")]
    pub overshoot: f64,
    #[serde(rename = "factorValues", default)]
    pub factor_values: FactorSample,
}

/// Fair value at one bitcoin price, without randomness.
///
/// base  = NAV/share(P, H_target, diluted shares) * mNAV
/// final = base * overshoot
pub fn project(inputs: &ProjectionInputs, live: &LiveState, model: &MnavModel) -> Projection {
    let dilution = simulate_dilution(
        inputs.btc_price,
        inputs.target_holdings,
        inputs.acquisition_mnav,
        live,
    );
    let mnav = mnav_multiplier(&inputs.factor_values, model);
    let nav = nav_per_share(
        inputs.btc_price,
        inputs.target_holdings,
        dilution.future_shares,
        live.cash,
        live.debt,
    );
    let base_price = nav * mnav;

    Projection {
        nav_per_share: nav,
        mnav,
        base_price,
        final_price: base_price * inputs.overshoot,
        dilution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data;

    fn inputs(btc_price: f64, target_holdings: f64, overshoot: f64) -> ProjectionInputs {
        ProjectionInputs {
            btc_price,
            target_holdings,
            acquisition_mnav: 2.0,
            overshoot,
            factor_values: FactorSample::new(),
        }
    }

    #[test]
    fn test_no_acquisition_is_plain_nav_times_mnav() {
        let reference = data::builtin();
        let live = reference.live;
        let p = project(&inputs(live.btc_price, live.btc_held, 1.0), &live, &reference.mnav_model);

        let nav = nav_per_share(live.btc_price, live.btc_held, live.shares, live.cash, live.debt);
        assert_eq!(p.nav_per_share, nav);
        assert_eq!(p.mnav, 2.0);
        assert_eq!(p.base_price, nav * 2.0);
        assert_eq!(p.final_price, p.base_price);
        assert_eq!(p.dilution.new_shares, 0.0);
    }

    #[test]
    fn test_overshoot_scales_final_only() {
        let reference = data::builtin();
        let p = project(&inputs(150_000.0, 12_000.0, 1.25), &reference.live, &reference.mnav_model);
        assert!(p.dilution.new_shares > 0.0);
        assert!((p.final_price - p.base_price * 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_deserializes_dashboard_names() {
        let json = r#"{"btcTarget":200000,"btcHoldings":15000,"acquisitionMnav":2.5,"factorValues":{"beta":1.0}}"#;
        let parsed: ProjectionInputs = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.btc_price, 200_000.0);
        assert_eq!(parsed.overshoot, 1.0);
        assert_eq!(parsed.factor_values.get("beta"), Some(&1.0));
    }
}
