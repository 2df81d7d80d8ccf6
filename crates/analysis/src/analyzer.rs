// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! The per-frame analysis cycle.
use serde::Serialize;
use std::time::{Duration, Instant};

use tablesight_cards::Card;
use tablesight_eval::HandValue;
use tablesight_vision::{Detection, DetectionFusion};

use crate::{
    AnalysisError, Decision, DecisionEngine, EquityEstimate, EquityEstimator, OpponentProfile,
    PotContext, StrategyBaseline,
};

/// The outcome of one analysis cycle.
#[derive(Debug, Clone, Serialize)]
pub struct HandAnalysis {
    /// The player hole cards.
    pub hole: Vec<Card>,
    /// The known community cards.
    pub board: Vec<Card>,
    /// The current made hand, when at least five cards are known.
    pub hand: Option<HandValue>,
    /// The estimated equity.
    pub equity: EquityEstimate,
    /// The pot odds the decision used.
    pub pot_odds: f64,
    /// Number of opponents simulated against.
    pub opponents: usize,
    /// The recommendation.
    pub decision: Decision,
    /// Time spent in the cycle.
    pub elapsed: Duration,
}

/// Runs the analysis cycle: fused card observations to equity to one
/// recommended action.
///
/// All components are owned and injected at construction, an analyzer holds
/// no global state and analyzers on different threads never interfere.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    estimator: EquityEstimator,
    engine: DecisionEngine,
    fusion: DetectionFusion,
}

impl Analyzer {
    /// Creates an analyzer from its components.
    pub fn new(estimator: EquityEstimator, engine: DecisionEngine, fusion: DetectionFusion) -> Self {
        Self {
            estimator,
            engine,
            fusion,
        }
    }

    /// The fusion layer used for detector observations.
    pub fn fusion(&self) -> &DetectionFusion {
        &self.fusion
    }

    /// Analyzes a hand already resolved to cards.
    ///
    /// Fails loudly on invalid input; use [Analyzer::analyze_detections] for
    /// the fail-safe boundary.
    pub fn analyze_cards(
        &self,
        hole: &[Card],
        board: &[Card],
        opponents: usize,
        ctx: &PotContext,
        baseline: Option<&StrategyBaseline>,
        opponent: Option<&OpponentProfile>,
    ) -> Result<HandAnalysis, AnalysisError> {
        let started = Instant::now();

        if hole.len() != 2 {
            return Err(AnalysisError::MissingHoleCards(hole.len()));
        }

        let equity = self.estimator.estimate(hole, board, opponents)?;

        let hand = if hole.len() + board.len() >= 5 {
            let cards = hole.iter().chain(board).copied().collect::<Vec<_>>();
            Some(HandValue::eval(&cards)?)
        } else {
            None
        };

        let decision = self.engine.decide(&equity, ctx, baseline, opponent);

        Ok(HandAnalysis {
            hole: hole.to_vec(),
            board: board.to_vec(),
            hand,
            equity,
            pot_odds: ctx.pot_odds(),
            opponents,
            decision,
            elapsed: started.elapsed(),
        })
    }

    /// Analyzes one frame worth of detector observations.
    ///
    /// This is the fail-safe boundary of the pipeline: whatever goes wrong
    /// inside the cycle, the result is a decision, degraded to a fold when
    /// the inputs could not be analyzed.
    pub fn analyze_detections(
        &self,
        hole: Vec<Detection>,
        board: Vec<Detection>,
        opponents: usize,
        ctx: &PotContext,
        baseline: Option<&StrategyBaseline>,
        opponent: Option<&OpponentProfile>,
    ) -> HandAnalysis {
        let started = Instant::now();

        let hole = self.consensus_cards(hole, 2);
        let mut board = self.consensus_cards(board, 5);
        // A strategy can report a hole card again in the board region.
        board.retain(|card| !hole.contains(card));

        match self.analyze_cards(&hole, &board, opponents, ctx, baseline, opponent) {
            Ok(analysis) => analysis,
            Err(err) => HandAnalysis {
                hole,
                board,
                hand: None,
                equity: EquityEstimate::ZERO,
                pot_odds: ctx.pot_odds(),
                opponents,
                decision: DecisionEngine::safe_fold(err),
                elapsed: started.elapsed(),
            },
        }
    }

    /// Fuses raw observations and keeps the most confident distinct cards.
    fn consensus_cards(&self, detections: Vec<Detection>, limit: usize) -> Vec<Card> {
        let mut cards = Vec::with_capacity(limit);
        for detection in self.fusion.fuse(detections) {
            if !cards.contains(&detection.card) {
                cards.push(detection.card);
                if cards.len() == limit {
                    break;
                }
            }
        }

        cards
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Action, EquityConfig};
    use tablesight_vision::{DetectorKind, Point};

    fn analyzer() -> Analyzer {
        let estimator = EquityEstimator::new(EquityConfig {
            trials: 2_000,
            tasks: 2,
        });
        Analyzer::new(estimator, DecisionEngine::new(), DetectionFusion::default())
    }

    fn card(s: &str) -> Card {
        s.parse().unwrap()
    }

    fn det(s: &str, confidence: f64, x: f64) -> Detection {
        Detection::new(card(s), confidence, Point::new(x, 100.0), DetectorKind::Model)
    }

    #[test]
    fn analyze_cards_strong_hand() {
        let analyzer = analyzer();
        let ctx = PotContext::new(100.0, 20.0);

        let analysis = analyzer
            .analyze_cards(
                &[card("AS"), card("AH")],
                &[card("AD"), card("AC"), card("KS")],
                1,
                &ctx,
                None,
                None,
            )
            .unwrap();

        assert_eq!(analysis.decision.action, Action::Bet);
        assert!(analysis.equity.equity > 0.9);
        assert!(analysis.hand.is_some());
        assert_eq!(analysis.hand.unwrap().label(), "Four As");
    }

    #[test]
    fn analyze_cards_preflop_has_no_made_hand() {
        let analyzer = analyzer();
        let analysis = analyzer
            .analyze_cards(
                &[card("KH"), card("QH")],
                &[],
                2,
                &PotContext::default(),
                None,
                None,
            )
            .unwrap();

        assert!(analysis.hand.is_none());
        assert_eq!(analysis.equity.trials, 2_000);
    }

    #[test]
    fn analyze_cards_rejects_bad_hole() {
        let analyzer = analyzer();
        let res = analyzer.analyze_cards(
            &[card("KH")],
            &[],
            1,
            &PotContext::default(),
            None,
            None,
        );
        assert_eq!(res.unwrap_err(), AnalysisError::MissingHoleCards(1));
    }

    #[test]
    fn analyze_detections_full_cycle() {
        let analyzer = analyzer();
        let ctx = PotContext::new(150.0, 30.0);

        // Two strategies agree on both hole cards.
        let hole = vec![
            det("AS", 0.92, 100.0),
            Detection::new(card("AS"), 0.88, Point::new(104.0, 102.0), DetectorKind::Template),
            det("AH", 0.90, 180.0),
            Detection::new(card("AH"), 0.85, Point::new(183.0, 99.0), DetectorKind::Template),
        ];
        let board = vec![det("AD", 0.95, 400.0), det("AC", 0.94, 470.0), det("KS", 0.91, 540.0)];

        let analysis = analyzer.analyze_detections(hole, board, 2, &ctx, None, None);

        assert_eq!(analysis.hole, vec![card("AS"), card("AH")]);
        assert_eq!(analysis.board.len(), 3);
        assert_eq!(analysis.decision.action, Action::Bet);
    }

    #[test]
    fn analyze_detections_degrades_to_fold() {
        let analyzer = analyzer();

        // Only one hole card seen, the boundary still produces a decision.
        let hole = vec![det("AS", 0.92, 100.0)];
        let analysis =
            analyzer.analyze_detections(hole, Vec::new(), 1, &PotContext::default(), None, None);

        assert_eq!(analysis.decision.action, Action::Fold);
        assert_eq!(analysis.decision.confidence, 1.0);
        assert_eq!(analysis.equity, EquityEstimate::ZERO);
    }

    #[test]
    fn analyze_detections_drops_hole_cards_from_board() {
        let analyzer = analyzer();
        let ctx = PotContext::new(100.0, 20.0);

        let hole = vec![det("KH", 0.95, 100.0), det("QH", 0.94, 180.0)];
        // The board region detector picked up a hole card again.
        let board = vec![det("KH", 0.90, 400.0), det("2C", 0.92, 470.0)];

        let analysis = analyzer.analyze_detections(hole, board, 1, &ctx, None, None);
        assert_eq!(analysis.board, vec![card("2C")]);
    }
}
