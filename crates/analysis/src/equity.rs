// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Monte Carlo equity estimation.
use parking_lot::Mutex;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::{
    sync::atomic::{AtomicU64, Ordering},
    thread,
};

use tablesight_cards::{Card, Deck};
use tablesight_eval::{EvalError, HandValue};

/// Equity estimator configuration.
#[derive(Debug, Clone, Copy)]
pub struct EquityConfig {
    /// Number of simulated deals per estimate.
    ///
    /// The dominant cost driver; reduce it for latency constrained calls at
    /// the price of a higher variance.
    pub trials: usize,
    /// Number of worker threads the trials are split across.
    pub tasks: usize,
}

impl Default for EquityConfig {
    fn default() -> Self {
        Self {
            trials: 10_000,
            tasks: 4,
        }
    }
}

/// An equity estimate.
///
/// The estimate is the probability of winning plus half the probability of
/// tying over the simulated deals. Estimates are computed fresh for every
/// analysis cycle, the board context changes from frame to frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityEstimate {
    /// Estimated P(win) + 0.5 * P(tie) in [0, 1].
    pub equity: f64,
    /// Number of simulated deals behind the estimate.
    pub trials: usize,
}

impl EquityEstimate {
    /// An estimate for an unplayable hand.
    pub const ZERO: EquityEstimate = EquityEstimate {
        equity: 0.0,
        trials: 0,
    };
}

/// The outcome of one simulated deal.
enum Outcome {
    Win,
    Tie,
    Loss,
}

/// Monte Carlo equity estimator.
///
/// Every trial removes the known cards from a full deck, deals two cards to
/// each opponent, completes the board to five cards, and compares the
/// player's best hand against every opponent's best hand. The player wins a
/// trial only with the strictly greatest hand; sharing the greatest hand
/// counts as a tie.
#[derive(Debug, Clone, Default)]
pub struct EquityEstimator {
    config: EquityConfig,
}

impl EquityEstimator {
    /// Creates an estimator with the given configuration.
    pub fn new(config: EquityConfig) -> Self {
        Self { config }
    }

    /// Creates an estimator with the given trials count.
    pub fn with_trials(trials: usize) -> Self {
        Self {
            config: EquityConfig {
                trials,
                ..EquityConfig::default()
            },
        }
    }

    /// The estimator configuration.
    pub fn config(&self) -> &EquityConfig {
        &self.config
    }

    /// Estimates the player equity against `opponents` random hands.
    ///
    /// `board` holds the known community cards, from none before the flop to
    /// five on the river. A hole hand that is not exactly two cards is not
    /// playable and yields [EquityEstimate::ZERO] without simulating.
    pub fn estimate(
        &self,
        hole: &[Card],
        board: &[Card],
        opponents: usize,
    ) -> Result<EquityEstimate, EvalError> {
        if hole.len() != 2 {
            return Ok(EquityEstimate::ZERO);
        }

        let board = &board[..board.len().min(5)];
        let opponents = opponents.clamp(1, 9);
        let trials = self.config.trials.max(1);

        let mut deck = Deck::default();
        for &card in hole.iter().chain(board) {
            deck.remove(card);
        }
        let pool = deck.cards().to_vec();

        let wins = AtomicU64::new(0);
        let ties = AtomicU64::new(0);
        let error: Mutex<Option<EvalError>> = Mutex::new(None);

        let tasks = self.config.tasks.clamp(1, trials);
        let per_task = trials / tasks;
        let extra = trials % tasks;

        thread::scope(|s| {
            for task in 0..tasks {
                let task_trials = per_task + usize::from(task < extra);
                let (pool, wins, ties, error) = (&pool, &wins, &ties, &error);

                s.spawn(move || {
                    let mut rng = SmallRng::from_os_rng();
                    let mut pool = pool.clone();
                    let mut won = 0u64;
                    let mut tied = 0u64;

                    for _ in 0..task_trials {
                        match run_trial(&mut pool, hole, board, opponents, &mut rng) {
                            Ok(Outcome::Win) => won += 1,
                            Ok(Outcome::Tie) => tied += 1,
                            Ok(Outcome::Loss) => {}
                            Err(err) => {
                                *error.lock() = Some(err);
                                return;
                            }
                        }
                    }

                    wins.fetch_add(won, Ordering::Relaxed);
                    ties.fetch_add(tied, Ordering::Relaxed);
                });
            }
        });

        if let Some(err) = error.into_inner() {
            return Err(err);
        }

        let wins = wins.into_inner() as f64;
        let ties = ties.into_inner() as f64;
        Ok(EquityEstimate {
            equity: (wins + 0.5 * ties) / trials as f64,
            trials,
        })
    }
}

/// Runs a single simulated deal.
fn run_trial(
    pool: &mut [Card],
    hole: &[Card],
    board: &[Card],
    opponents: usize,
    rng: &mut SmallRng,
) -> Result<Outcome, EvalError> {
    let needed = opponents * 2 + (5 - board.len());
    let (draw, _) = pool.partial_shuffle(rng, needed);

    let (opponent_cards, board_fill) = draw.split_at(opponents * 2);

    let mut hand = Vec::with_capacity(7);
    hand.extend_from_slice(hole);
    hand.extend_from_slice(board);
    hand.extend_from_slice(board_fill);
    let player = HandValue::eval(&hand)?;

    let mut best_opponent: Option<HandValue> = None;
    for cards in opponent_cards.chunks(2) {
        hand.clear();
        hand.extend_from_slice(cards);
        hand.extend_from_slice(board);
        hand.extend_from_slice(board_fill);

        let value = HandValue::eval(&hand)?;
        if best_opponent.as_ref().is_none_or(|b| &value > b) {
            best_opponent = Some(value);
        }
    }

    let best_opponent = best_opponent.expect("at least one opponent");
    Ok(if player > best_opponent {
        Outcome::Win
    } else if player == best_opponent {
        Outcome::Tie
    } else {
        Outcome::Loss
    })
}
