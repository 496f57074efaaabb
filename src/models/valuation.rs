/// NAV-per-share and mNAV multiplier.
///
/// NAV/share = (P_btc * H + cash - debt) / shares
///
/// mNAV = base_premium + sum_k value_k * weight_k * scale
///
/// Pure functions. Degenerate denominators resolve to 0, never to an error.
use crate::state::{FactorSample, MnavModel, PeerCompany};

/// Net asset value per share. Returns 0 when `shares <= 0`.
#[inline]
pub fn nav_per_share(btc_price: f64, btc_held: f64, shares: f64, cash: f64, debt: f64) -> f64 {
    if shares <= 0.0 {
        return 0.0;
    }
    let net_assets = btc_price * btc_held + cash - debt;
    net_assets / shares
}

/// Linear mNAV multiplier. Sample keys unknown to the model are ignored; the
/// result is not clamped and may be negative.
///
/// Terms are summed in model declaration order so the result is bit-stable
/// regardless of the sample map's iteration order.
pub fn mnav_multiplier(sample: &FactorSample, model: &MnavModel) -> f64 {
    let mut mnav = model.base_premium;
    for factor in &model.factors {
        if let Some(&value) = sample.get(&factor.key) {
            mnav += value * factor.weight * model.scale;
        }
    }
    mnav
}

/// Sample keys the model does not recognise, sorted. Empty when every key matches.
pub fn unknown_factors(sample: &FactorSample, model: &MnavModel) -> Vec<String> {
    let mut unknown: Vec<String> = sample
        .keys()
        .filter(|k| model.factor(k).is_none())
        .cloned()
        .collect();
    unknown.sort();
    unknown
}

/// Sample with every factor at its default value.
pub fn default_sample(model: &MnavModel) -> FactorSample {
    model
        .factors
        .iter()
        .map(|f| (f.key.clone(), f.default_value))
        .collect()
}

/// Market cap over bitcoin holdings value for a peer company. 0 when holdings are worthless.
#[inline]
pub fn peer_mnav(peer: &PeerCompany, btc_price: f64) -> f64 {
    let holdings_value = peer.btc_held * btc_price;
    if holdings_value <= 0.0 {
        return 0.0;
    }
    peer.market_cap / holdings_value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data;

    fn zero_sample(model: &MnavModel) -> FactorSample {
        model.factors.iter().map(|f| (f.key.clone(), 0.0)).collect()
    }

    #[test]
    fn test_nav_matches_formula() {
        let nav = nav_per_share(107_750.0, 10_000.0, 600_710_000.0, 22_000_000.0, 18_000_000.0);
        let expected = (107_750.0 * 10_000.0 + 22_000_000.0 - 18_000_000.0) / 600_710_000.0;
        assert_eq!(nav, expected);
        assert!((nav - 1.800_369).abs() < 1e-6, "nav={nav}");
    }

    #[test]
    fn test_nav_zero_shares_fallback() {
        assert_eq!(nav_per_share(100_000.0, 5.0, 0.0, 10.0, 1.0), 0.0);
        assert_eq!(nav_per_share(100_000.0, 5.0, -10.0, 10.0, 1.0), 0.0);
    }

    #[test]
    fn test_nav_can_be_negative() {
        let nav = nav_per_share(10.0, 1.0, 100.0, 0.0, 1_000.0);
        assert!(nav < 0.0, "debt above assets should give negative nav: {nav}");
    }

    #[test]
    fn test_mnav_zero_factors_is_base() {
        let model = data::builtin().mnav_model;
        assert_eq!(mnav_multiplier(&zero_sample(&model), &model), 2.0);
        assert_eq!(mnav_multiplier(&FactorSample::new(), &model), 2.0);
    }

    #[test]
    fn test_mnav_defaults() {
        let model = data::builtin().mnav_model;
        let m = mnav_multiplier(&default_sample(&model), &model);
        // 2 + 5 * (1.5*0.30 + 0.8*0.25 + 0.5*0.15 - 0.2*0.20 + 0.1*0.10)
        let expected = 2.0 + 5.0 * (0.45 + 0.2 + 0.075 - 0.04 + 0.01);
        assert!((m - expected).abs() < 1e-12, "mnav={m} expected={expected}");
    }

    #[test]
    fn test_mnav_single_factor_and_extrapolation() {
        let model = data::builtin().mnav_model;
        let mut sample = zero_sample(&model);
        sample.insert("beta".into(), 10.0); // far above max=3
        let m = mnav_multiplier(&sample, &model);
        assert!((m - (2.0 + 10.0 * 0.30 * 5.0)).abs() < 1e-12, "mnav={m}");

        sample.insert("beta".into(), -10.0);
        assert!(mnav_multiplier(&sample, &model) < 0.0, "no clamping below zero");
    }

    #[test]
    fn test_unknown_keys_ignored_and_reported() {
        let model = data::builtin().mnav_model;
        let mut sample = zero_sample(&model);
        sample.insert("sentimnet".into(), 2.0);
        sample.insert("alpha".into(), 1.0);
        assert_eq!(mnav_multiplier(&sample, &model), 2.0);
        assert_eq!(unknown_factors(&sample, &model), vec!["alpha".to_string(), "sentimnet".to_string()]);
        assert!(unknown_factors(&default_sample(&model), &model).is_empty());
    }

    #[test]
    fn test_peer_mnav() {
        let peer = data::builtin().peer;
        let m = peer_mnav(&peer, 107_750.0);
        let expected = 26_000_000_000.0 / (226_331.0 * 107_750.0);
        assert!((m - expected).abs() < 1e-12);
        assert_eq!(peer_mnav(&peer, 0.0), 0.0);
    }
}
