use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use crate::error::{EngineError, EngineResult};

/// Longest simulated gap between two receipts (one day)
pub const MAX_STEP_INTERVAL_SECS: i64 = 86_400;

/// Hard ceiling on `backtest.max_bets`
pub const MAX_BETS_LIMIT: u32 = 10_000_000;

/// Engine configuration loaded from YAML file
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub backtest: BacktestConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Probability a simulated bet wins
    #[serde(default = "default_win_probability")]
    pub win_probability: f64,
    /// Payout multiplier applied to winning wagers
    #[serde(default = "default_payout_multiplier")]
    pub payout_multiplier: f64,
    /// Cosmetic match labels drawn for receipts
    #[serde(default = "default_match_labels")]
    pub match_labels: Vec<String>,
    /// Simulated seconds between consecutive receipts
    #[serde(default = "default_step_interval_secs")]
    pub step_interval_secs: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_base_confidence")]
    pub base_confidence: f64,
    /// Confidence points added per EV percent
    #[serde(default = "default_ev_weight")]
    pub ev_weight: f64,
    /// Max confidence contributed by EV
    #[serde(default = "default_ev_cap")]
    pub ev_cap: f64,
    /// Uniform noise in [-amplitude, +amplitude]
    #[serde(default = "default_noise_amplitude")]
    pub noise_amplitude: f64,
    /// Lowest confidence a scored pair can end up with
    #[serde(default = "default_confidence_floor")]
    pub confidence_floor: f64,
    /// Highest confidence a scored pair can end up with
    #[serde(default = "default_confidence_ceiling")]
    pub confidence_ceiling: f64,
    #[serde(default = "default_sportsbooks")]
    pub sportsbooks: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BacktestConfig {
    /// Largest accepted number of bets per backtest
    #[serde(default = "default_max_bets")]
    pub max_bets: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_win_probability() -> f64 { 0.52 }
fn default_payout_multiplier() -> f64 { 1.8 }
fn default_step_interval_secs() -> i64 { 60 }
fn default_base_confidence() -> f64 { 50.0 }
fn default_ev_weight() -> f64 { 2.0 }
fn default_ev_cap() -> f64 { 25.0 }
fn default_noise_amplitude() -> f64 { 5.0 }
fn default_confidence_floor() -> f64 { 50.0 }
fn default_confidence_ceiling() -> f64 { 95.0 }
fn default_max_bets() -> u32 { 100_000 }
fn default_log_level() -> String { "info,bankroll_engine=debug".to_string() }

fn default_match_labels() -> Vec<String> {
    [
        "Lakers vs Celtics",
        "Warriors vs Nets",
        "Chiefs vs Bills",
        "Yankees vs Red Sox",
        "Arsenal vs Chelsea",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_sportsbooks() -> Vec<String> {
    ["DraftKings", "FanDuel", "BetMGM", "Caesars"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            win_probability: default_win_probability(),
            payout_multiplier: default_payout_multiplier(),
            match_labels: default_match_labels(),
            step_interval_secs: default_step_interval_secs(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_confidence: default_base_confidence(),
            ev_weight: default_ev_weight(),
            ev_cap: default_ev_cap(),
            noise_amplitude: default_noise_amplitude(),
            confidence_floor: default_confidence_floor(),
            confidence_ceiling: default_confidence_ceiling(),
            sportsbooks: default_sportsbooks(),
        }
    }
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            max_bets: default_max_bets(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            scoring: ScoringConfig::default(),
            backtest: BacktestConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: EngineConfig =
            serde_yaml::from_str(contents).context("Failed to parse YAML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Load with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("ENGINE_WIN_PROBABILITY") {
            self.simulation.win_probability =
                val.parse().unwrap_or(self.simulation.win_probability);
        }
        if let Ok(val) = std::env::var("ENGINE_PAYOUT_MULTIPLIER") {
            self.simulation.payout_multiplier =
                val.parse().unwrap_or(self.simulation.payout_multiplier);
        }
        if let Ok(val) = std::env::var("ENGINE_NOISE_AMPLITUDE") {
            self.scoring.noise_amplitude = val.parse().unwrap_or(self.scoring.noise_amplitude);
        }
        if let Ok(val) = std::env::var("ENGINE_MAX_BETS") {
            self.backtest.max_bets = val.parse().unwrap_or(self.backtest.max_bets);
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        let sim = &self.simulation;
        if !(0.0..=1.0).contains(&sim.win_probability) {
            return Err(EngineError::InvalidConfig(format!(
                "win_probability {} outside [0, 1]",
                sim.win_probability
            )));
        }
        if !(sim.payout_multiplier.is_finite() && sim.payout_multiplier >= 1.0) {
            return Err(EngineError::InvalidConfig(format!(
                "payout_multiplier {} must be >= 1",
                sim.payout_multiplier
            )));
        }
        if sim.match_labels.is_empty() {
            return Err(EngineError::InvalidConfig("match_labels is empty".to_string()));
        }
        if !(0..=MAX_STEP_INTERVAL_SECS).contains(&sim.step_interval_secs) {
            return Err(EngineError::InvalidConfig(format!(
                "step_interval_secs {} outside [0, {}]",
                sim.step_interval_secs, MAX_STEP_INTERVAL_SECS
            )));
        }

        let scoring = &self.scoring;
        let (floor, ceiling) = (scoring.confidence_floor, scoring.confidence_ceiling);
        if !(0.0..=100.0).contains(&floor) || !(0.0..=100.0).contains(&ceiling) {
            return Err(EngineError::InvalidConfig(format!(
                "confidence bounds [{}, {}] must lie within [0, 100]",
                floor, ceiling
            )));
        }
        if floor > ceiling {
            return Err(EngineError::InvalidConfig(format!(
                "confidence range [{}, {}] is empty",
                floor, ceiling
            )));
        }
        for (name, value) in [
            ("base_confidence", scoring.base_confidence),
            ("ev_weight", scoring.ev_weight),
            ("ev_cap", scoring.ev_cap),
        ] {
            if !value.is_finite() {
                return Err(EngineError::InvalidConfig(format!("{} must be finite", name)));
            }
        }
        if !(scoring.noise_amplitude.is_finite() && scoring.noise_amplitude >= 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "noise_amplitude {} must be >= 0",
                scoring.noise_amplitude
            )));
        }
        if scoring.sportsbooks.is_empty() {
            return Err(EngineError::InvalidConfig("sportsbooks is empty".to_string()));
        }

        if self.backtest.max_bets > MAX_BETS_LIMIT {
            return Err(EngineError::InvalidConfig(format!(
                "max_bets {} above {}",
                self.backtest.max_bets, MAX_BETS_LIMIT
            )));
        }

        if let Err(e) = EnvFilter::try_new(&self.logging.level) {
            return Err(EngineError::InvalidConfig(format!(
                "logging level '{}': {}",
                self.logging.level, e
            )));
        }
        Ok(())
    }

    /// Log filter directive: RUST_LOG when given, else `logging.level`
    pub fn log_filter(&self, rust_log: Option<String>) -> String {
        rust_log
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| self.logging.level.clone())
    }
}
