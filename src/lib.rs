//! Bankroll simulation and betting recommendation engine
//!
//! - [`simulator`]: one randomized win/loss bet against a bot's bankroll
//! - [`backtest`]: N simulated bets folded into an equity-curve report
//! - [`scorer`]: confidence-scored, sized recommendations from live odds
//!
//! Every random draw goes through an RNG handle passed by the caller, so a
//! seeded `StdRng` reproduces any run exactly.
//!
//! ```no_run
//! use bankroll_engine::backtest::run_backtest;
//! use bankroll_engine::models::BotProfile;
//!
//! let bot = BotProfile::new("bot-1", 1000.0, 2.0);
//! let report = run_backtest(&bot, 100, 42).unwrap();
//! println!("Final balance: {:.2}", report.final_balance);
//! ```

pub mod backtest;
pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod scorer;
pub mod simulator;
pub mod sizing;
pub mod stats;

pub use backtest::{run_backtest, BacktestRunner};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use models::{
    BacktestReport, BetOutcome, BetReceipt, BotProfile, BotState, GameOdds, Recommendation,
    RecommendationBatch, RiskProfile,
};
pub use scorer::RecommendationScorer;
pub use simulator::{OutcomeSimulator, SimulationParams};
