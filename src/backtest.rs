//! Backtest Runner
//!
//! Drives the [`OutcomeSimulator`] for N steps on a private copy of a bot's
//! bankroll and folds the receipts into a [`BacktestReport`].

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::info;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{BacktestReport, BotProfile, EquityPoint};
use crate::simulator::OutcomeSimulator;
use crate::sizing::calculate_expected_value;
use crate::stats::{max_drawdown, wilson_score_interval, StreakTracker};

#[derive(Debug, Clone)]
pub struct BacktestRunner {
    simulator: OutcomeSimulator,
    max_bets: u32,
    step_interval_secs: i64,
    started_at: DateTime<Utc>,
}

impl BacktestRunner {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            simulator: OutcomeSimulator::new(&config.simulation),
            max_bets: config.backtest.max_bets,
            step_interval_secs: config.simulation.step_interval_secs,
            started_at: DateTime::<Utc>::default(),
        }
    }

    /// Timestamp of the first simulated receipt's clock origin
    pub fn with_start_time(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self
    }

    pub fn with_simulator(mut self, simulator: OutcomeSimulator) -> Self {
        self.simulator = simulator;
        self
    }

    pub fn simulator(&self) -> &OutcomeSimulator {
        &self.simulator
    }

    /// Simulated clock reading for the receipt of `step`
    fn step_timestamp(&self, step: u32) -> EngineResult<DateTime<Utc>> {
        self.step_interval_secs
            .checked_mul(i64::from(step))
            .and_then(Duration::try_seconds)
            .and_then(|offset| self.started_at.checked_add_signed(offset))
            .ok_or_else(|| {
                EngineError::InvalidConfig(format!(
                    "step {} at {}s intervals overflows the simulated clock",
                    step, self.step_interval_secs
                ))
            })
    }

    /// Run `num_bets` simulated bets for a bot
    ///
    /// The profile is only read; all mutation happens on a copied
    /// [`crate::models::BotState`]. `num_bets == 0` yields a flat report.
    pub fn run<R: Rng + ?Sized>(
        &self,
        profile: &BotProfile,
        num_bets: u32,
        rng: &mut R,
    ) -> EngineResult<BacktestReport> {
        let mut state = profile.state()?;
        if num_bets > self.max_bets {
            return Err(EngineError::InvalidBetCount {
                requested: num_bets,
                max: self.max_bets,
            });
        }

        let params = self.simulator.params;
        let initial_balance = state.current_balance;

        let mut equity_curve = Vec::with_capacity(num_bets as usize + 1);
        equity_curve.push(EquityPoint {
            step: 0,
            balance: initial_balance,
        });
        let mut bets = Vec::with_capacity(num_bets as usize);

        let mut total_wagered = 0.0;
        let mut total_profit = 0.0;
        let mut expected_profit = 0.0;
        let mut total_wins = 0u32;
        let mut total_losses = 0u32;
        let mut streaks = StreakTracker::default();

        for step in 1..=num_bets {
            let timestamp = self.step_timestamp(step)?;
            let (next, receipt) = self.simulator.simulate_bet(state, timestamp, rng)?;
            state = next;

            total_wagered += receipt.wager_amount.abs();
            total_profit += receipt.payout;
            expected_profit += calculate_expected_value(
                params.win_probability,
                params.payout_multiplier,
                receipt.wager_amount,
            );
            if receipt.is_win() {
                total_wins += 1;
            } else {
                total_losses += 1;
            }
            streaks.record(receipt.outcome);

            equity_curve.push(EquityPoint {
                step,
                balance: state.current_balance,
            });
            bets.push(receipt);
        }

        let win_rate = if num_bets == 0 {
            0.0
        } else {
            total_wins as f64 / num_bets as f64
        };
        let roi = if total_wagered > 0.0 {
            total_profit / total_wagered
        } else {
            0.0
        };
        let (win_rate_lower, win_rate_upper) = wilson_score_interval(total_wins, num_bets);
        let (max_drawdown, max_drawdown_pct) = max_drawdown(&equity_curve);

        info!(
            "Backtest {}: {} bets, {}W/{}L, balance ${:.2} -> ${:.2} ({:+.2})",
            profile.id,
            num_bets,
            total_wins,
            total_losses,
            initial_balance,
            state.current_balance,
            total_profit
        );

        Ok(BacktestReport {
            bot_id: profile.id.clone(),
            num_bets,
            initial_balance,
            final_balance: state.current_balance,
            total_wagered,
            total_profit,
            total_wins,
            total_losses,
            win_rate,
            win_rate_lower,
            win_rate_upper,
            roi,
            expected_profit,
            max_drawdown,
            max_drawdown_pct,
            longest_win_streak: streaks.longest_wins,
            longest_loss_streak: streaks.longest_losses,
            equity_curve,
            bets,
        })
    }

    /// Run with a deterministic RNG seeded from `seed`
    pub fn run_seeded(
        &self,
        profile: &BotProfile,
        num_bets: u32,
        seed: u64,
    ) -> EngineResult<BacktestReport> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.run(profile, num_bets, &mut rng)
    }

    /// Backtest one bot at several bet percentages concurrently
    ///
    /// Every run gets its own copy of the profile and an RNG seeded with
    /// `seed`, so results differ only by the percentage. Output order
    /// follows `percentages`.
    pub fn sweep(
        &self,
        profile: &BotProfile,
        percentages: &[f64],
        num_bets: u32,
        seed: u64,
    ) -> EngineResult<Vec<BacktestReport>> {
        percentages
            .par_iter()
            .map(|&percentage| {
                let variant = BotProfile {
                    bet_percentage: percentage,
                    ..profile.clone()
                };
                self.run_seeded(&variant, num_bets, seed)
            })
            .collect()
    }
}

impl Default for BacktestRunner {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

/// Seeded backtest with the default model parameters
pub fn run_backtest(
    profile: &BotProfile,
    num_bets: u32,
    seed: u64,
) -> EngineResult<BacktestReport> {
    BacktestRunner::default().run_seeded(profile, num_bets, seed)
}
