use anyhow::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{BacktestReport, RecommendationBatch};
use crate::stats::{beta_credible_interval, beta_mean, beta_posterior};

/// Export any serializable result as pretty JSON
pub fn export_to_json<T: serde::Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

/// Export the equity curve to CSV
/// Format: step, balance
pub fn export_equity_curve_csv(report: &BacktestReport, path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["step", "balance"])?;
    for point in &report.equity_curve {
        wtr.write_record(&[point.step.to_string(), format!("{:.4}", point.balance)])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Export every simulated receipt to CSV
pub fn export_bets_csv(report: &BacktestReport, path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "step",
        "timestamp",
        "match_label",
        "wager_amount",
        "odds",
        "payout",
        "outcome",
        "balance_after",
    ])?;

    for (i, bet) in report.bets.iter().enumerate() {
        wtr.write_record(&[
            (i + 1).to_string(),
            bet.timestamp.to_rfc3339(),
            bet.match_label.clone(),
            format!("{:.4}", bet.wager_amount),
            format!("{:.2}", bet.odds),
            format!("{:.4}", bet.payout),
            format!("{:?}", bet.outcome).to_uppercase(),
            format!("{:.4}", bet.balance_after),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write report JSON plus equity/bets CSVs into a directory
pub fn export_report(report: &BacktestReport, output_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(output_dir)?;
    export_to_json(report, &output_dir.join("backtest.json"))?;
    export_equity_curve_csv(report, &output_dir.join("equity_curve.csv"))?;
    export_bets_csv(report, &output_dir.join("bets.csv"))?;
    Ok(())
}

/// Generate a human-readable backtest summary
pub fn generate_report(report: &BacktestReport) -> String {
    let mut out = String::new();

    out.push_str("╔══════════════════════════════════════════════════════════════════╗\n");
    out.push_str("║                  BANKROLL BACKTEST - SUMMARY                     ║\n");
    out.push_str("╚══════════════════════════════════════════════════════════════════╝\n\n");

    out.push_str(&format!("Bot: {}\n", report.bot_id));
    out.push_str(&format!("Bets simulated: {}\n\n", report.num_bets));

    out.push_str("BANKROLL\n");
    out.push_str("─────────────────────────────────────────\n");
    out.push_str(&format!("  Initial balance:  ${:.2}\n", report.initial_balance));
    out.push_str(&format!("  Final balance:    ${:.2}\n", report.final_balance));
    out.push_str(&format!("  Total wagered:    ${:.2}\n", report.total_wagered));
    out.push_str(&format!("  Total profit:     ${:+.2}\n", report.total_profit));
    out.push_str(&format!("  Expected profit:  ${:+.2}\n", report.expected_profit));
    out.push_str(&format!("  ROI:              {:+.2}%\n", report.roi * 100.0));
    out.push_str(&format!(
        "  Max drawdown:     ${:.2} ({:.1}%)\n\n",
        report.max_drawdown,
        report.max_drawdown_pct * 100.0
    ));

    out.push_str("OUTCOMES\n");
    out.push_str("─────────────────────────────────────────\n");
    out.push_str(&format!(
        "  Wins / losses:    {} / {}\n",
        report.total_wins, report.total_losses
    ));
    out.push_str(&format!(
        "  Win rate:         {:.1}% (95% CI {:.1}%-{:.1}%)\n",
        report.win_rate * 100.0,
        report.win_rate_lower * 100.0,
        report.win_rate_upper * 100.0
    ));

    let (alpha, beta) = beta_posterior(report.total_wins, report.total_losses, 1.0, 1.0);
    let (lower, upper) = beta_credible_interval(alpha, beta, 0.95);
    out.push_str(&format!(
        "  Posterior P(win): {:.1}% ({:.1}%-{:.1}%)\n",
        beta_mean(alpha, beta) * 100.0,
        lower * 100.0,
        upper * 100.0
    ));
    out.push_str(&format!(
        "  Longest streaks:  {}W / {}L\n",
        report.longest_win_streak, report.longest_loss_streak
    ));

    out
}

#[derive(Tabled)]
struct SweepRow {
    #[tabled(rename = "Bet %")]
    bet_percentage: String,
    #[tabled(rename = "Final")]
    final_balance: String,
    #[tabled(rename = "Profit")]
    profit: String,
    #[tabled(rename = "ROI")]
    roi: String,
    #[tabled(rename = "Max DD")]
    max_drawdown: String,
}

/// Side-by-side table of a bet-percentage sweep
pub fn sweep_table(percentages: &[f64], reports: &[BacktestReport]) -> String {
    let rows: Vec<SweepRow> = percentages
        .iter()
        .zip(reports)
        .map(|(pct, r)| SweepRow {
            bet_percentage: format!("{:.2}", pct),
            final_balance: format!("${:.2}", r.final_balance),
            profit: format!("${:+.2}", r.total_profit),
            roi: format!("{:+.2}%", r.roi * 100.0),
            max_drawdown: format!("{:.1}%", r.max_drawdown_pct * 100.0),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

#[derive(Tabled)]
struct RecommendationRow {
    #[tabled(rename = "Game")]
    game: String,
    #[tabled(rename = "Bot")]
    bot: String,
    #[tabled(rename = "Pick")]
    selection: String,
    #[tabled(rename = "Odds")]
    odds: String,
    #[tabled(rename = "Conf")]
    confidence: String,
    #[tabled(rename = "Stake")]
    amount: String,
    #[tabled(rename = "Payout")]
    payout: String,
    #[tabled(rename = "Book")]
    sportsbook: String,
}

/// Table of all recommendations, grouped by game in rank order
pub fn recommendations_table(batch: &RecommendationBatch) -> String {
    let rows: Vec<RecommendationRow> = batch
        .recommendations
        .values()
        .flatten()
        .map(|r| RecommendationRow {
            game: r.match_label.clone(),
            bot: r.bot_id.clone(),
            selection: r.selection.clone(),
            odds: format!("{:.2}", r.odds),
            confidence: format!("{:.1}", r.confidence),
            amount: format!("${:.2}", r.recommended_amount),
            payout: format!("${:.2}", r.potential_payout),
            sportsbook: r.sportsbook.clone(),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}
