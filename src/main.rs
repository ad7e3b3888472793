use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bankroll_engine::models::{BotProfile, GameOdds, RiskProfile};
use bankroll_engine::output::{
    export_report, export_to_json, generate_report, recommendations_table, sweep_table,
};
use bankroll_engine::{BacktestRunner, EngineConfig, OutcomeSimulator, RecommendationScorer};

#[derive(Parser)]
#[command(name = "bankroll-engine")]
#[command(about = "Simulate betting bots and score recommendations against live odds")]
struct Cli {
    /// Path to engine YAML config (default: $ENGINE_CONFIG_PATH or config/engine.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a single bet
    Bet {
        #[arg(short, long, default_value = "1000")]
        balance: f64,

        /// Percentage of balance wagered (0-100)
        #[arg(short = 'p', long, default_value = "2")]
        bet_pct: f64,

        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Run a backtest of N simulated bets
    Backtest {
        #[arg(short, long, default_value = "1000")]
        balance: f64,

        #[arg(short = 'p', long, default_value = "2")]
        bet_pct: f64,

        /// Number of bets to simulate
        #[arg(short = 'n', long, default_value = "100")]
        bets: u32,

        #[arg(short, long)]
        seed: Option<u64>,

        /// Directory for backtest.json, equity_curve.csv and bets.csv
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Compare several bet percentages on the same outcome sequence
    Sweep {
        #[arg(short, long, default_value = "1000")]
        balance: f64,

        /// Comma-separated bet percentages (e.g. "1,2,5")
        #[arg(long, default_value = "1,2,5,10")]
        percentages: String,

        #[arg(short = 'n', long, default_value = "100")]
        bets: u32,

        #[arg(short, long, default_value = "42")]
        seed: u64,
    },

    /// Score bots against a set of games
    Recommend {
        /// JSON array of bot profiles
        #[arg(long)]
        bots: PathBuf,

        /// JSON array of game odds records
        #[arg(long)]
        games: PathBuf,

        #[arg(short, long)]
        seed: Option<u64>,

        /// Write the recommendation batch as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn config_path(path: Option<PathBuf>) -> PathBuf {
    path.unwrap_or_else(|| {
        PathBuf::from(
            std::env::var("ENGINE_CONFIG_PATH")
                .unwrap_or_else(|_| "config/engine.yaml".to_string()),
        )
    })
}

/// Runs before the subscriber exists, so callers log the outcome themselves
fn load_config(path: &Path) -> Result<EngineConfig> {
    if path.exists() {
        EngineConfig::load_with_env(path).context("Failed to load configuration")
    } else {
        let mut config = EngineConfig::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}

fn seed_or_random(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(rand::random)
}

fn parse_percentages(raw: &str) -> Result<Vec<f64>> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .with_context(|| format!("Invalid bet percentage: {}", s))
        })
        .collect()
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

fn cli_profile(balance: f64, bet_pct: f64) -> BotProfile {
    BotProfile::new("cli", balance, bet_pct).with_risk_profile(RiskProfile {
        min_confidence: 0.0,
        max_bet_percentage: 100.0,
    })
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config_path = config_path(cli.config);
    let config = load_config(&config_path)?;

    let log_filter = config.log_filter(std::env::var("RUST_LOG").ok());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&log_filter))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    if config_path.exists() {
        info!("Loaded config from: {}", config_path.display());
    } else {
        warn!("Config file not found, using defaults: {}", config_path.display());
    }

    match cli.command {
        Commands::Bet {
            balance,
            bet_pct,
            seed,
        } => {
            let seed = seed_or_random(seed);
            let mut rng = StdRng::seed_from_u64(seed);
            let simulator = OutcomeSimulator::new(&config.simulation);
            let state = cli_profile(balance, bet_pct).state()?;

            let (next, receipt) = simulator.simulate_bet(state, Utc::now(), &mut rng)?;

            println!("Seed: {}", seed);
            println!("{}", serde_json::to_string_pretty(&receipt)?);
            println!("New balance: ${:.2}", next.current_balance);
        }
        Commands::Backtest {
            balance,
            bet_pct,
            bets,
            seed,
            output_dir,
        } => {
            let seed = seed_or_random(seed);
            let runner = BacktestRunner::new(&config).with_start_time(Utc::now());
            let report = runner.run_seeded(&cli_profile(balance, bet_pct), bets, seed)?;

            println!("Seed: {}", seed);
            println!("{}", generate_report(&report));

            if let Some(dir) = output_dir {
                export_report(&report, &dir)
                    .with_context(|| format!("Failed to export report to {}", dir.display()))?;
                info!("Report written to {}", dir.display());
            }
        }
        Commands::Sweep {
            balance,
            percentages,
            bets,
            seed,
        } => {
            let percentages = parse_percentages(&percentages)?;
            let runner = BacktestRunner::new(&config);
            let reports = runner.sweep(&cli_profile(balance, 0.0), &percentages, bets, seed)?;

            println!("{}", sweep_table(&percentages, &reports));
        }
        Commands::Recommend {
            bots,
            games,
            seed,
            output,
        } => {
            let bots: Vec<BotProfile> = read_json(&bots)?;
            let games: Vec<GameOdds> = read_json(&games)?;
            let scorer = RecommendationScorer::new(&config.scoring);

            let batch = scorer.score_batch(&bots, &games, seed_or_random(seed));

            println!("{}", recommendations_table(&batch));
            if batch.skipped_count() > 0 {
                warn!("{} (bot, game) pairs skipped due to bad input", batch.skipped_count());
            }

            if let Some(path) = output {
                export_to_json(&batch, &path)?;
                info!("Recommendations written to {}", path.display());
            }
        }
    }

    Ok(())
}
