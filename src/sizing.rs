/// Stake for a percentage-of-bankroll policy
///
/// `percentage` is expressed 0-100. The stake never exceeds the balance,
/// so a malformed percentage above 100 risks at most the whole bankroll.
pub fn stake_for_percentage(balance: f64, percentage: f64) -> f64 {
    if balance <= 0.0 || percentage <= 0.0 {
        return 0.0;
    }
    (balance * percentage / 100.0).min(balance)
}

/// Percentage a scored recommendation may stake: the bot's default,
/// capped by its risk profile
pub fn effective_bet_percentage(max_bet_percentage: f64, default_percentage: f64) -> f64 {
    max_bet_percentage.min(default_percentage).max(0.0)
}

/// Net profit of a winning bet at a payout multiplier
pub fn win_profit(stake: f64, multiplier: f64) -> f64 {
    stake * (multiplier - 1.0)
}

/// Expected value of a single bet
///
/// EV = p_win * stake * (multiplier - 1) - p_lose * stake
pub fn calculate_expected_value(win_probability: f64, multiplier: f64, stake: f64) -> f64 {
    let lose_probability = 1.0 - win_probability;
    win_probability * win_profit(stake, multiplier) - lose_probability * stake
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stake_for_percentage() {
        assert!((stake_for_percentage(1000.0, 2.0) - 20.0).abs() < 1e-9);
        assert_eq!(stake_for_percentage(0.0, 2.0), 0.0);
        assert_eq!(stake_for_percentage(1000.0, 0.0), 0.0);
        // Capped at the balance
        assert!((stake_for_percentage(1000.0, 150.0) - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_effective_bet_percentage() {
        assert_eq!(effective_bet_percentage(5.0, 2.0), 2.0);
        assert_eq!(effective_bet_percentage(3.0, 10.0), 3.0);
    }

    #[test]
    fn test_expected_value() {
        // 52% at 1.8x, $100 stake: 0.52 * 80 - 0.48 * 100 = -6.4
        let ev = calculate_expected_value(0.52, 1.8, 100.0);
        assert!((ev - (-6.4)).abs() < 1e-9);

        // Even money coin flip has zero EV
        let ev = calculate_expected_value(0.5, 2.0, 10.0);
        assert!(ev.abs() < 1e-9);
    }
}
