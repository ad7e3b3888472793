use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{validate_balance, validate_bet_percentage, EngineError, EngineResult};

/// Mutable bankroll state of a bot being simulated
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BotState {
    /// Available capital, never negative
    pub current_balance: f64,
    /// Percentage of the balance wagered per bet (0-100)
    pub bet_percentage: f64,
}

impl BotState {
    /// Build a validated state
    pub fn new(current_balance: f64, bet_percentage: f64) -> EngineResult<Self> {
        let state = Self {
            current_balance,
            bet_percentage,
        };
        state.validate()?;
        Ok(state)
    }

    pub fn validate(&self) -> EngineResult<()> {
        validate_balance(self.current_balance)?;
        validate_bet_percentage(self.bet_percentage)
    }
}

/// Per-bot risk limits applied by the recommendation scorer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskProfile {
    /// Recommendations below this confidence are dropped (0-100)
    pub min_confidence: f64,
    /// Upper bound on the stake as % of balance (0-100]
    pub max_bet_percentage: f64,
}

impl Default for RiskProfile {
    fn default() -> Self {
        Self {
            min_confidence: 60.0,
            max_bet_percentage: 5.0,
        }
    }
}

/// Bot configuration record supplied by the persistence layer
///
/// The engine treats it as read-only and copies its bankroll into a
/// [`BotState`] before simulating anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotProfile {
    pub id: String,
    pub current_balance: f64,
    pub bet_percentage: f64,
    #[serde(default)]
    pub risk_profile: RiskProfile,
    /// Restrict recommendations to a single sport (None = all sports)
    #[serde(default)]
    pub sport_filter: Option<String>,
    #[serde(default = "default_strategy_label")]
    pub strategy_label: String,
}

fn default_strategy_label() -> String {
    "Balanced".to_string()
}

impl BotProfile {
    pub fn new(id: impl Into<String>, current_balance: f64, bet_percentage: f64) -> Self {
        Self {
            id: id.into(),
            current_balance,
            bet_percentage,
            risk_profile: RiskProfile::default(),
            sport_filter: None,
            strategy_label: default_strategy_label(),
        }
    }

    pub fn with_risk_profile(mut self, risk_profile: RiskProfile) -> Self {
        self.risk_profile = risk_profile;
        self
    }

    pub fn with_sport_filter(mut self, sport: impl Into<String>) -> Self {
        self.sport_filter = Some(sport.into());
        self
    }

    pub fn with_strategy_label(mut self, label: impl Into<String>) -> Self {
        self.strategy_label = label.into();
        self
    }

    /// Private copy of the bankroll for simulation
    pub fn state(&self) -> EngineResult<BotState> {
        BotState::new(self.current_balance, self.bet_percentage)
    }

    pub fn validate(&self) -> EngineResult<()> {
        self.state()?;

        let risk = &self.risk_profile;
        if !(0.0..=100.0).contains(&risk.min_confidence) {
            return Err(EngineError::InvalidRiskProfile {
                bot_id: self.id.clone(),
                reason: format!("min confidence {} outside [0, 100]", risk.min_confidence),
            });
        }
        if !(risk.max_bet_percentage > 0.0 && risk.max_bet_percentage <= 100.0) {
            return Err(EngineError::InvalidRiskProfile {
                bot_id: self.id.clone(),
                reason: format!(
                    "max bet percentage {} outside (0, 100]",
                    risk.max_bet_percentage
                ),
            });
        }
        Ok(())
    }

    /// Whether this bot accepts games of the given sport
    pub fn accepts_sport(&self, sport: &str) -> bool {
        match &self.sport_filter {
            Some(filter) => filter.eq_ignore_ascii_case(sport),
            None => true,
        }
    }
}

/// Outcome of a simulated wager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BetOutcome {
    Win,
    Loss,
}

/// Immutable record of one simulated bet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetReceipt {
    pub timestamp: DateTime<Utc>,
    pub match_label: String,
    pub wager_amount: f64,
    /// Payout multiplier applied on a win
    pub odds: f64,
    /// Signed profit: -wager on a loss, wager * (odds - 1) on a win
    pub payout: f64,
    pub outcome: BetOutcome,
    /// Balance right after this bet settled
    pub balance_after: f64,
}

impl BetReceipt {
    pub fn is_win(&self) -> bool {
        self.outcome == BetOutcome::Win
    }
}

/// One point of the equity curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityPoint {
    pub step: u32,
    pub balance: f64,
}

/// Aggregate result of a backtest run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestReport {
    pub bot_id: String,
    pub num_bets: u32,
    pub initial_balance: f64,
    pub final_balance: f64,
    pub total_wagered: f64,
    pub total_profit: f64,
    pub total_wins: u32,
    pub total_losses: u32,
    pub win_rate: f64,
    /// 95% Wilson interval on the win rate
    pub win_rate_lower: f64,
    pub win_rate_upper: f64,
    pub roi: f64,
    /// Theoretical profit under the model's win probability and multiplier
    pub expected_profit: f64,
    pub max_drawdown: f64,
    pub max_drawdown_pct: f64,
    pub longest_win_streak: u32,
    pub longest_loss_streak: u32,
    /// numBets + 1 entries, starting at (0, initial balance)
    pub equity_curve: Vec<EquityPoint>,
    pub bets: Vec<BetReceipt>,
}

/// Bookmaker odds and model signals for a single game
///
/// Odds are optional at the type level because upstream feeds routinely
/// drop them; the scorer treats a missing price as a malformed record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOdds {
    pub game_id: String,
    pub sport: String,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub home_odds: Option<f64>,
    #[serde(default)]
    pub away_odds: Option<f64>,
    #[serde(default)]
    pub true_probability_of_home: Option<f64>,
    #[serde(default)]
    pub expected_value_percent: Option<f64>,
}

impl GameOdds {
    pub fn match_label(&self) -> String {
        format!("{} vs {}", self.home_team, self.away_team)
    }
}

/// Which side of a game a recommendation backs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

/// A sized betting recommendation for one (bot, game) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub bot_id: String,
    pub game_id: String,
    pub match_label: String,
    pub side: Side,
    /// Team name backed
    pub selection: String,
    pub odds: f64,
    /// Synthetic score in [50, 95]
    pub confidence: f64,
    pub recommended_amount: f64,
    pub potential_payout: f64,
    pub sportsbook: String,
    pub reasoning: String,
}

/// A (bot, game) pair dropped from a batch because of bad input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedPair {
    pub bot_id: String,
    pub game_id: String,
    pub reason: String,
}

/// Joined result of scoring many (bot, game) pairs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationBatch {
    /// game_id -> recommendations ranked by confidence (highest first)
    pub recommendations: BTreeMap<String, Vec<Recommendation>>,
    pub skipped: Vec<SkippedPair>,
}

impl RecommendationBatch {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn total_recommendations(&self) -> usize {
        self.recommendations.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }

    /// All recommendations for one bot across games
    pub fn for_bot<'a>(&'a self, bot_id: &'a str) -> impl Iterator<Item = &'a Recommendation> + 'a {
        self.recommendations
            .values()
            .flatten()
            .filter(move |r| r.bot_id == bot_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bot_state_rejects_negative_balance() {
        assert!(BotState::new(-1.0, 2.0).is_err());
        assert!(BotState::new(1000.0, 101.0).is_err());
        assert!(BotState::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn test_profile_state_is_a_copy() {
        let profile = BotProfile::new("bot-1", 1000.0, 2.0);
        let mut state = profile.state().unwrap();
        state.current_balance = 10.0;
        assert_eq!(profile.current_balance, 1000.0);
    }

    #[test]
    fn test_profile_validate_risk_profile() {
        let bad = BotProfile::new("bot-1", 1000.0, 2.0).with_risk_profile(RiskProfile {
            min_confidence: 120.0,
            max_bet_percentage: 5.0,
        });
        assert!(matches!(
            bad.validate(),
            Err(EngineError::InvalidRiskProfile { .. })
        ));

        let zero_max = BotProfile::new("bot-2", 1000.0, 2.0).with_risk_profile(RiskProfile {
            min_confidence: 60.0,
            max_bet_percentage: 0.0,
        });
        assert!(zero_max.validate().is_err());
    }

    #[test]
    fn test_accepts_sport() {
        let any = BotProfile::new("a", 100.0, 1.0);
        assert!(any.accepts_sport("nba"));

        let nba = BotProfile::new("b", 100.0, 1.0).with_sport_filter("NBA");
        assert!(nba.accepts_sport("nba"));
        assert!(!nba.accepts_sport("nfl"));
    }

    #[test]
    fn test_game_odds_deserialize_missing_fields() {
        let json = r#"{
            "gameId": "g1",
            "sport": "nba",
            "homeTeam": "Lakers",
            "awayTeam": "Celtics",
            "homeOdds": 1.9
        }"#;
        let game: GameOdds = serde_json::from_str(json).unwrap();
        assert_eq!(game.home_odds, Some(1.9));
        assert_eq!(game.away_odds, None);
        assert_eq!(game.true_probability_of_home, None);
        assert_eq!(game.match_label(), "Lakers vs Celtics");
    }

    #[test]
    fn test_bot_profile_deserialize_defaults() {
        let json = r#"{ "id": "bot-7", "currentBalance": 500.0, "betPercentage": 3.0 }"#;
        let profile: BotProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.strategy_label, "Balanced");
        assert!(profile.sport_filter.is_none());
        assert_eq!(profile.risk_profile, RiskProfile::default());
    }

    #[test]
    fn test_outcome_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&BetOutcome::Win).unwrap(), "\"WIN\"");
        assert_eq!(serde_json::to_string(&BetOutcome::Loss).unwrap(), "\"LOSS\"");
    }
}
