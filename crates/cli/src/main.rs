// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Tablesight CLI.
#![warn(clippy::all, rust_2018_idioms, missing_docs)]
use anyhow::{Result, bail};
use clap::{Parser, Subcommand};

use tablesight_analysis::{Analyzer, DecisionEngine, EquityEstimator, PotContext};
use tablesight_cards::Card;
use tablesight_vision::DetectionFusion;

pub mod scenario;

#[derive(Debug, Parser)]
#[command(about = "Card table capture to decision analysis")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyzes a single hand given on the command line.
    Analyze {
        /// The two hole cards, like AH,KD.
        #[clap(long, short = 'c', value_delimiter = ',')]
        hole: Vec<String>,
        /// The community cards, like 7S,8S,9S.
        #[clap(long, short, value_delimiter = ',')]
        board: Vec<String>,
        /// Number of opponents.
        #[clap(long, short, default_value_t = 1)]
        opponents: usize,
        /// The pot size.
        #[clap(long)]
        pot: Option<f64>,
        /// The bet to call.
        #[clap(long)]
        bet: Option<f64>,
        /// Number of Monte Carlo trials.
        #[clap(long, short, default_value_t = 10_000)]
        trials: usize,
        /// Prints the analysis as JSON.
        #[clap(long)]
        json: bool,
    },
    /// Runs the live capture loop against a synthetic table.
    Watch {
        /// Number of analysis cycles to run.
        #[clap(long, short, default_value_t = 10)]
        cycles: usize,
        /// Capture interval in milliseconds, clamped to [500, 2000].
        #[clap(long, default_value_t = 500)]
        interval_ms: u64,
    },
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .format_timestamp_millis()
        .init();

    match Cli::parse().command {
        Command::Analyze {
            hole,
            board,
            opponents,
            pot,
            bet,
            trials,
            json,
        } => analyze(&hole, &board, opponents, pot, bet, trials, json),
        Command::Watch {
            cycles,
            interval_ms,
        } => scenario::watch(cycles, interval_ms),
    }
}

fn analyze(
    hole: &[String],
    board: &[String],
    opponents: usize,
    pot: Option<f64>,
    bet: Option<f64>,
    trials: usize,
    json: bool,
) -> Result<()> {
    let hole = parse_cards(hole)?;
    let board = parse_cards(board)?;

    if hole.len() != 2 {
        bail!("expected two hole cards, got {}", hole.len());
    }

    if board.len() > 5 {
        bail!("expected at most five community cards, got {}", board.len());
    }

    let ctx = PotContext {
        pot,
        current_bet: bet,
        ..PotContext::default()
    };

    let analyzer = Analyzer::new(
        EquityEstimator::with_trials(trials),
        DecisionEngine::new(),
        DetectionFusion::default(),
    );

    let analysis = analyzer.analyze_cards(&hole, &board, opponents, &ctx, None, None)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    println!("Hand:      {} | {}", join_cards(&hole), join_cards(&board));
    if let Some(hand) = &analysis.hand {
        println!("Made hand: {}", hand.label());
    }
    println!(
        "Equity:    {:.1}% over {} trials against {} opponent(s)",
        analysis.equity.equity * 100.0,
        analysis.equity.trials,
        analysis.opponents,
    );
    if analysis.pot_odds > 0.0 {
        println!("Pot odds:  {:.1}%", analysis.pot_odds * 100.0);
    }

    let decision = &analysis.decision;
    let amount = decision
        .amount
        .map(|a| format!(" {a:.2}"))
        .unwrap_or_default();
    println!(
        "Decision:  {}{} ({:.0}% confidence, EV {:+.2}, {} urgency)",
        decision.action,
        amount,
        decision.confidence * 100.0,
        decision.expected_value,
        decision.urgency,
    );
    println!("           {}", decision.rationale);

    Ok(())
}

fn parse_cards(cards: &[String]) -> Result<Vec<Card>> {
    cards
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| Ok(s.trim().parse::<Card>()?))
        .collect()
}

fn join_cards(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
