//! Outcome Simulator
//!
//! Draws one win/loss outcome per call against a bot's bankroll. The state
//! is taken by value and the updated copy is returned with the receipt, so
//! a caller's stored bot record is never touched.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::config::SimulationConfig;
use crate::error::EngineResult;
use crate::models::{BetOutcome, BetReceipt, BotState};
use crate::sizing::{stake_for_percentage, win_profit};

/// Model parameters of a simulated bet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    pub win_probability: f64,
    pub payout_multiplier: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            win_probability: 0.52,
            payout_multiplier: 1.8,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutcomeSimulator {
    pub params: SimulationParams,
    match_labels: Vec<String>,
}

impl OutcomeSimulator {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            params: SimulationParams {
                win_probability: config.win_probability,
                payout_multiplier: config.payout_multiplier,
            },
            match_labels: config.match_labels.clone(),
        }
    }

    pub fn with_params(mut self, params: SimulationParams) -> Self {
        self.params = params;
        self
    }

    /// Simulate one bet, returning the new state and its receipt
    ///
    /// Rejects a negative balance or a percentage outside [0, 100] before
    /// drawing anything from `rng`.
    pub fn simulate_bet<R: Rng + ?Sized>(
        &self,
        state: BotState,
        timestamp: DateTime<Utc>,
        rng: &mut R,
    ) -> EngineResult<(BotState, BetReceipt)> {
        state.validate()?;

        let draw: f64 = rng.gen();
        let match_label = self
            .match_labels
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| "Home vs Away".to_string());

        Ok(self.settle(state, draw, match_label, timestamp))
    }

    /// Resolve a bet from a uniform draw in [0, 1)
    ///
    /// WIN iff `draw < win_probability`.
    pub fn settle(
        &self,
        state: BotState,
        draw: f64,
        match_label: String,
        timestamp: DateTime<Utc>,
    ) -> (BotState, BetReceipt) {
        let wager = stake_for_percentage(state.current_balance, state.bet_percentage);
        let multiplier = self.params.payout_multiplier;

        let (outcome, payout) = if draw < self.params.win_probability {
            (BetOutcome::Win, win_profit(wager, multiplier))
        } else {
            (BetOutcome::Loss, -wager)
        };

        // Wager is capped at the balance, so a loss bottoms out at zero
        let new_balance = (state.current_balance + payout).max(0.0);
        let next = BotState {
            current_balance: new_balance,
            ..state
        };

        debug!(
            "{:?} {} wager=${:.2} payout=${:+.2} balance=${:.2}",
            outcome, match_label, wager, payout, new_balance
        );

        let receipt = BetReceipt {
            timestamp,
            match_label,
            wager_amount: wager,
            odds: multiplier,
            payout,
            outcome,
            balance_after: new_balance,
        };

        (next, receipt)
    }
}

impl Default for OutcomeSimulator {
    fn default() -> Self {
        Self::new(&SimulationConfig::default())
    }
}
