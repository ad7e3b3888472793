use crate::models::{BetOutcome, EquityPoint};

/// Z-score for 95% confidence interval
const Z_95: f64 = 1.96;

/// Calculate Wilson Score Confidence Interval for a binomial proportion
///
/// Returns (lower_bound, upper_bound) for P(success) at 95% confidence
pub fn wilson_score_interval(successes: u32, total: u32) -> (f64, f64) {
    if total == 0 {
        return (0.0, 1.0);
    }

    let n = total as f64;
    let p_hat = successes as f64 / n;
    let z_squared = Z_95 * Z_95;

    let denominator = 1.0 + z_squared / n;
    let center = (p_hat + z_squared / (2.0 * n)) / denominator;
    let margin =
        Z_95 * ((p_hat * (1.0 - p_hat) + z_squared / (4.0 * n)) / n).sqrt() / denominator;

    ((center - margin).max(0.0), (center + margin).min(1.0))
}

/// Bayesian Beta-Binomial posterior
///
/// Prior: Beta(alpha_prior, beta_prior), Beta(1, 1) being uniform.
/// Returns (posterior_alpha, posterior_beta)
pub fn beta_posterior(wins: u32, losses: u32, alpha_prior: f64, beta_prior: f64) -> (f64, f64) {
    (alpha_prior + wins as f64, beta_prior + losses as f64)
}

pub fn beta_mean(alpha: f64, beta: f64) -> f64 {
    alpha / (alpha + beta)
}

/// Credible interval for a Beta distribution using quantiles
pub fn beta_credible_interval(alpha: f64, beta: f64, credible_level: f64) -> (f64, f64) {
    use statrs::distribution::{Beta, ContinuousCDF};

    let tail = (1.0 - credible_level) / 2.0;

    match Beta::new(alpha, beta) {
        Ok(dist) => (dist.inverse_cdf(tail), dist.inverse_cdf(1.0 - tail)),
        Err(_) => (0.0, 1.0),
    }
}

/// Largest peak-to-trough drop of an equity curve
///
/// Returns (absolute drawdown, drawdown as a fraction of the peak)
pub fn max_drawdown(curve: &[EquityPoint]) -> (f64, f64) {
    let mut peak = f64::MIN;
    let mut worst = 0.0;
    let mut worst_pct = 0.0;

    for point in curve {
        if point.balance > peak {
            peak = point.balance;
        }
        let drawdown = peak - point.balance;
        if drawdown > worst {
            worst = drawdown;
            worst_pct = if peak > 0.0 { drawdown / peak } else { 0.0 };
        }
    }

    (worst, worst_pct)
}

/// Running win/loss streak bookkeeping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreakTracker {
    current_wins: u32,
    current_losses: u32,
    pub longest_wins: u32,
    pub longest_losses: u32,
}

impl StreakTracker {
    pub fn record(&mut self, outcome: BetOutcome) {
        match outcome {
            BetOutcome::Win => {
                self.current_wins += 1;
                self.current_losses = 0;
                self.longest_wins = self.longest_wins.max(self.current_wins);
            }
            BetOutcome::Loss => {
                self.current_losses += 1;
                self.current_wins = 0;
                self.longest_losses = self.longest_losses.max(self.current_losses);
            }
        }
    }
}
