use crate::models::valuation::nav_per_share;
use crate::state::{DilutionResult, LiveState};

/// Share issuance needed to grow bitcoin holdings to `target_holdings`.
///
/// capital     = (H_target - H_now) * P_sim
/// issue_price = NAV/share(P_sim, H_now, shares_now) * acquisition_mnav
/// new_shares  = capital / issue_price
///
/// New equity is priced at a premium (or discount) to pre-dilution NAV, not at
/// spot. A target at or below current holdings issues nothing; buybacks are
/// not modeled. A non-positive issue price also issues nothing.
#[inline]
pub fn simulate_dilution(
    simulated_price: f64,
    target_holdings: f64,
    acquisition_mnav: f64,
    live: &LiveState,
) -> DilutionResult {
    let btc_to_acquire = target_holdings - live.btc_held;
    if btc_to_acquire <= 0.0 {
        return DilutionResult {
            new_shares: 0.0,
            future_shares: live.shares,
        };
    }

    let capital_needed = btc_to_acquire * simulated_price;
    let issuance_price =
        nav_per_share(simulated_price, live.btc_held, live.shares, live.cash, live.debt) * acquisition_mnav;

    let new_shares = if issuance_price > 0.0 {
        capital_needed / issuance_price
    } else {
        0.0
    };

    DilutionResult {
        new_shares,
        future_shares: live.shares + new_shares,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live() -> LiveState {
        LiveState {
            btc_price: 107_750.0,
            btc_held: 10_000.0,
            shares: 600_710_000.0,
            cash: 22_000_000.0,
            debt: 18_000_000.0,
        }
    }

    #[test]
    fn test_no_dilution_without_increase() {
        let live = live();
        for price in [1.0, 107_750.0, 1e7] {
            for target in [0.0, 5_000.0, 10_000.0] {
                let d = simulate_dilution(price, target, 2.0, &live);
                assert_eq!(d.new_shares, 0.0, "price={price} target={target}");
                assert_eq!(d.future_shares, live.shares);
            }
        }
    }

    #[test]
    fn test_reference_acquisition() {
        let live = live();
        let d = simulate_dilution(200_000.0, 15_000.0, 2.0, &live);

        let capital = 5_000.0 * 200_000.0;
        assert_eq!(capital, 1_000_000_000.0);
        let issue = nav_per_share(200_000.0, 10_000.0, 600_710_000.0, 22_000_000.0, 18_000_000.0) * 2.0;
        let expected_new = capital / issue;
        let expected_future = live.shares + expected_new;

        assert!(((d.future_shares - expected_future) / expected_future).abs() < 1e-6);
        assert!(((d.new_shares * issue - capital) / capital).abs() < 1e-9, "capital not conserved");
        assert_eq!(d.future_shares, live.shares + d.new_shares);
    }

    #[test]
    fn test_zero_issue_price_fallback() {
        let live = live();
        let d = simulate_dilution(200_000.0, 15_000.0, 0.0, &live);
        assert_eq!(d.new_shares, 0.0);
        assert_eq!(d.future_shares, live.shares);

        // Negative NAV (debt swamps assets) also yields no issuance
        let underwater = LiveState { debt: 1e13, ..live };
        let d = simulate_dilution(200_000.0, 15_000.0, 2.0, &underwater);
        assert_eq!(d.new_shares, 0.0);
    }

    #[test]
    fn test_higher_premium_dilutes_less() {
        let live = live();
        let low = simulate_dilution(150_000.0, 20_000.0, 1.0, &live);
        let high = simulate_dilution(150_000.0, 20_000.0, 3.0, &live);
        assert!(high.new_shares < low.new_shares);
        assert!(((low.new_shares / high.new_shares) - 3.0).abs() < 1e-9);
    }
}
