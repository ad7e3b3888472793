//! Recommendation Scorer
//!
//! Scores a bot's risk profile against live game odds. Each (bot, game)
//! pair runs through a short pipeline that can stop early at two gates:
//! the bot's sport filter and its minimum confidence.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::ScoringConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    BotProfile, GameOdds, Recommendation, RecommendationBatch, Side, SkippedPair,
};
use crate::sizing::{effective_bet_percentage, stake_for_percentage};

/// Bookmaker prices of a game that passed validation
#[derive(Debug, Clone, Copy, PartialEq)]
struct ValidatedOdds {
    home: f64,
    away: f64,
}

fn require_odds(game: &GameOdds, odds: Option<f64>, side: &str) -> EngineResult<f64> {
    match odds {
        None => Err(EngineError::MalformedGame {
            game_id: game.game_id.clone(),
            reason: format!("missing {} odds", side),
        }),
        Some(value) if !value.is_finite() || value <= 1.0 => Err(EngineError::MalformedGame {
            game_id: game.game_id.clone(),
            reason: format!("{} odds {} must be a finite decimal price > 1", side, value),
        }),
        Some(value) => Ok(value),
    }
}

fn validate_game(game: &GameOdds) -> EngineResult<ValidatedOdds> {
    let home = require_odds(game, game.home_odds, "home")?;
    let away = require_odds(game, game.away_odds, "away")?;

    if let Some(p) = game.true_probability_of_home {
        if !(0.0..=1.0).contains(&p) {
            return Err(EngineError::MalformedGame {
                game_id: game.game_id.clone(),
                reason: format!("home win probability {} outside [0, 1]", p),
            });
        }
    }

    Ok(ValidatedOdds { home, away })
}

/// Seed for the pair at `index` of a batch
fn pair_seed(seed: u64, index: usize) -> u64 {
    seed.wrapping_add((index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

#[derive(Debug, Clone)]
pub struct RecommendationScorer {
    config: ScoringConfig,
}

impl RecommendationScorer {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Confidence from the game's model signals, before noise and clamping
    ///
    /// Positive EV adds `ev * ev_weight` up to `ev_cap`. A home win
    /// probability adds its distance from a coin flip, in either direction.
    pub fn signal_confidence(&self, game: &GameOdds) -> f64 {
        let mut confidence = self.config.base_confidence;

        if let Some(ev) = game.expected_value_percent {
            if ev > 0.0 {
                confidence += (ev * self.config.ev_weight).min(self.config.ev_cap);
            }
        }

        if let Some(p) = game.true_probability_of_home {
            confidence += (p - 0.5).abs() * 100.0;
        }

        confidence
    }

    /// Bound `confidence` to `[confidence_floor, confidence_ceiling]`
    ///
    /// A NaN bound is ignored and an inverted range yields the ceiling.
    pub fn clamp_confidence(&self, confidence: f64) -> f64 {
        confidence
            .max(self.config.confidence_floor)
            .min(self.config.confidence_ceiling)
    }

    fn draw_noise<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let amplitude = self.config.noise_amplitude;
        if amplitude.is_finite() && amplitude > 0.0 {
            rng.gen_range(-amplitude..=amplitude)
        } else {
            0.0
        }
    }

    /// Score one (bot, game) pair
    ///
    /// `Ok(None)` means the pair was filtered out. `Err` means the input
    /// itself is unusable (malformed odds or an invalid bot profile).
    pub fn score<R: Rng + ?Sized>(
        &self,
        bot: &BotProfile,
        game: &GameOdds,
        rng: &mut R,
    ) -> EngineResult<Option<Recommendation>> {
        if !bot.accepts_sport(&game.sport) {
            return Ok(None);
        }

        bot.validate()?;
        let odds = validate_game(game)?;

        let confidence = self.clamp_confidence(self.signal_confidence(game) + self.draw_noise(rng));

        if confidence < bot.risk_profile.min_confidence {
            debug!(
                "Skip {} for {}: confidence {:.1} < {:.1} min",
                game.game_id, bot.id, confidence, bot.risk_profile.min_confidence
            );
            return Ok(None);
        }

        let percentage =
            effective_bet_percentage(bot.risk_profile.max_bet_percentage, bot.bet_percentage);
        let amount = stake_for_percentage(bot.current_balance, percentage);

        // Majority rule on the model probability, not an EV comparison
        // against the offered prices. Without a probability the away side
        // is taken.
        let (side, selection, selected_odds) = match game.true_probability_of_home {
            Some(p) if p > 0.5 => (Side::Home, &game.home_team, odds.home),
            _ => (Side::Away, &game.away_team, odds.away),
        };

        let sportsbook = self
            .config
            .sportsbooks
            .choose(rng)
            .cloned()
            .unwrap_or_default();

        let ev_label = match game.expected_value_percent {
            Some(ev) => format!("{:+.1}%", ev),
            None => "n/a".to_string(),
        };
        let reasoning = format!(
            "{} strategy: {:.1}% confidence on {} @ {:.2}, EV {}",
            bot.strategy_label, confidence, selection, selected_odds, ev_label
        );

        Ok(Some(Recommendation {
            bot_id: bot.id.clone(),
            game_id: game.game_id.clone(),
            match_label: game.match_label(),
            side,
            selection: selection.clone(),
            odds: selected_odds,
            confidence,
            recommended_amount: amount,
            potential_payout: amount * selected_odds,
            sportsbook,
            reasoning,
        }))
    }

    /// Score every (bot, game) pair concurrently
    ///
    /// Each pair draws from its own RNG derived from `seed` and its position
    /// in the bots x games grid, so the result is reproducible regardless of
    /// scheduling. A failing pair is logged and recorded in
    /// [`RecommendationBatch::skipped`] without affecting the others.
    pub fn score_batch(
        &self,
        bots: &[BotProfile],
        games: &[GameOdds],
        seed: u64,
    ) -> RecommendationBatch {
        let pairs: Vec<(&BotProfile, &GameOdds)> = bots
            .iter()
            .flat_map(|bot| games.iter().map(move |game| (bot, game)))
            .collect();

        let results: Vec<_> = pairs
            .par_iter()
            .enumerate()
            .map(|(index, &(bot, game))| {
                let mut rng = StdRng::seed_from_u64(pair_seed(seed, index));
                (bot, game, self.score(bot, game, &mut rng))
            })
            .collect();

        let mut batch = RecommendationBatch::default();
        for (bot, game, result) in results {
            match result {
                Ok(Some(recommendation)) => batch
                    .recommendations
                    .entry(game.game_id.clone())
                    .or_default()
                    .push(recommendation),
                Ok(None) => {}
                Err(e) => {
                    warn!("Skipping bot {} / game {}: {}", bot.id, game.game_id, e);
                    batch.skipped.push(SkippedPair {
                        bot_id: bot.id.clone(),
                        game_id: game.game_id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        for list in batch.recommendations.values_mut() {
            list.sort_by(|a, b| {
                b.confidence
                    .total_cmp(&a.confidence)
                    .then_with(|| a.bot_id.cmp(&b.bot_id))
            });
        }

        info!(
            "Scored {} pairs: {} recommendations across {} games, {} skipped",
            pairs.len(),
            batch.total_recommendations(),
            batch.recommendations.len(),
            batch.skipped_count()
        );

        batch
    }
}

impl Default for RecommendationScorer {
    fn default() -> Self {
        Self::new(&ScoringConfig::default())
    }
}
