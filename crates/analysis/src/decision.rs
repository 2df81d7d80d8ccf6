// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Decision synthesis.
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::{collections::VecDeque, fmt};

use crate::{AnalysisError, EquityEstimate};

/// A recommended poker action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Give up the hand.
    Fold,
    /// Stay in without betting.
    Check,
    /// Match the current bet.
    Call,
    /// Open the betting.
    Bet,
    /// Increase the current bet.
    Raise,
    /// Bet the whole stack.
    AllIn,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self {
            Action::Fold => "Fold",
            Action::Check => "Check",
            Action::Call => "Call",
            Action::Bet => "Bet",
            Action::Raise => "Raise",
            Action::AllIn => "All-in",
        };

        write!(f, "{action}")
    }
}

/// How decisively a recommendation should be acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Urgency {
    /// Routine spot.
    Low,
    /// Confident recommendation or meaningful pot odds.
    Medium,
    /// Extreme equity or a stack decision.
    High,
    /// Low confidence ambiguous spot that needs attention.
    Critical,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let urgency = match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
            Urgency::Critical => "critical",
        };

        write!(f, "{urgency}")
    }
}

/// The betting round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Street {
    /// Before the flop.
    Preflop,
    /// Three community cards.
    Flop,
    /// Four community cards.
    Turn,
    /// All five community cards.
    River,
}

/// Table money context supplied by external table reading collaborators.
///
/// Every field is optional, values the reader could not extract degrade the
/// decision confidence but never make the cycle fail.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PotContext {
    /// The pot size before the current bet.
    pub pot: Option<f64>,
    /// The bet the player is facing.
    pub current_bet: Option<f64>,
    /// The betting round.
    pub street: Option<Street>,
    /// The small blind amount.
    pub small_blind: Option<f64>,
    /// The big blind amount.
    pub big_blind: Option<f64>,
}

impl PotContext {
    /// Creates a context with a known pot and current bet.
    pub fn new(pot: f64, current_bet: f64) -> Self {
        Self {
            pot: Some(pot),
            current_bet: Some(current_bet),
            ..Self::default()
        }
    }

    /// The cost to call relative to the resulting pot, 0.0 when unknown.
    pub fn pot_odds(&self) -> f64 {
        match (self.pot, self.current_bet) {
            (Some(pot), Some(bet)) if pot + bet > 0.0 => bet / (pot + bet),
            _ => 0.0,
        }
    }

    /// Checks that the money fields needed for pot odds are present.
    pub fn is_complete(&self) -> bool {
        self.pot.is_some() && self.current_bet.is_some()
    }
}

/// A probability distribution over actions from an external strategy
/// baseline.
///
/// The synthesizer treats this as an opaque prior: it never overrides the
/// rule based action, it only lowers confidence when the prior strongly
/// disagrees with it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyBaseline {
    probabilities: AHashMap<Action, f64>,
}

impl StrategyBaseline {
    /// Creates a baseline from action probabilities, normalized to sum to
    /// one when possible.
    pub fn new(probabilities: impl IntoIterator<Item = (Action, f64)>) -> Self {
        let mut probabilities: AHashMap<_, _> = probabilities
            .into_iter()
            .filter(|(_, p)| *p > 0.0)
            .collect();

        let total = probabilities.values().sum::<f64>();
        if total > 0.0 {
            for p in probabilities.values_mut() {
                *p /= total;
            }
        }

        Self { probabilities }
    }

    /// The prior probability of an action, 0.0 when absent.
    pub fn probability(&self, action: Action) -> f64 {
        self.probabilities.get(&action).copied().unwrap_or(0.0)
    }

    /// Checks the baseline has no entries.
    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }
}

/// Observed tendencies of the opponent the decision is against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OpponentProfile {
    /// How often the opponent voluntarily puts money in the pot.
    pub vpip: f64,
    /// How often the opponent raises before the flop.
    pub pfr: f64,
    /// Bets and raises relative to calls.
    pub aggression: f64,
    /// Number of hands behind the statistics.
    pub hands_observed: u32,
}

/// One action recommendation produced per analysis cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// The recommended action.
    pub action: Action,
    /// Suggested amount for bets and raises.
    pub amount: Option<f64>,
    /// Confidence in the recommendation in [0, 1].
    pub confidence: f64,
    /// Expected value against a break even reference, positive is favorable.
    pub expected_value: f64,
    /// How decisively to act on the recommendation.
    pub urgency: Urgency,
    /// Why the action was recommended.
    pub rationale: String,
}

/// Synthesizes equity, pot odds, the strategy prior, and opponent
/// tendencies into one [Decision].
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    /// Equity above this bets for value.
    value_bet_equity: f64,
    /// Equity above this calls on strength.
    call_equity: f64,
    /// Pot odds above this call without the equity.
    pot_odds_call: f64,
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self {
            value_bet_equity: 0.70,
            call_equity: 0.50,
            pot_odds_call: 0.30,
        }
    }
}

impl DecisionEngine {
    /// Minimum opponent sample before tendencies adjust the thresholds.
    const OPPONENT_MIN_HANDS: u32 = 20;

    /// Creates an engine with the default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Produces the decision for one analysis cycle.
    ///
    /// This boundary never fails: any error inside the synthesis degrades to
    /// a fold recommendation with full confidence and the error as the
    /// rationale, a missing recommendation at the table is worse than an
    /// overly conservative one.
    pub fn decide(
        &self,
        equity: &EquityEstimate,
        ctx: &PotContext,
        baseline: Option<&StrategyBaseline>,
        opponent: Option<&OpponentProfile>,
    ) -> Decision {
        self.synthesize(equity, ctx, baseline, opponent)
            .unwrap_or_else(Self::safe_fold)
    }

    /// The fail-safe recommendation used when synthesis errors out.
    pub fn safe_fold(err: impl fmt::Display) -> Decision {
        Decision {
            action: Action::Fold,
            amount: None,
            confidence: 1.0,
            expected_value: 0.0,
            urgency: Urgency::Medium,
            rationale: format!("Analysis failed, folding to be safe: {err}"),
        }
    }

    /// Classifies how urgently a recommendation should be acted on.
    pub fn classify_urgency(
        &self,
        action: Action,
        equity: f64,
        confidence: f64,
        pot_odds: f64,
    ) -> Urgency {
        if action == Action::AllIn || equity >= 0.95 || equity <= 0.05 {
            Urgency::High
        } else if confidence > 0.8 || pot_odds > 0.4 {
            Urgency::Medium
        } else if confidence > 0.6 {
            Urgency::Low
        } else {
            // Low confidence ambiguous spots get flagged rather than buried.
            Urgency::Critical
        }
    }

    fn synthesize(
        &self,
        equity: &EquityEstimate,
        ctx: &PotContext,
        baseline: Option<&StrategyBaseline>,
        opponent: Option<&OpponentProfile>,
    ) -> Result<Decision, AnalysisError> {
        let equity = equity.equity;
        if !(0.0..=1.0).contains(&equity) {
            return Err(AnalysisError::InvalidEquity(equity));
        }

        let pot_odds = ctx.pot_odds();

        let mut value_bet_equity = self.value_bet_equity;
        let mut pot_odds_call = self.pot_odds_call;
        if let Some(opp) = opponent {
            if opp.hands_observed >= Self::OPPONENT_MIN_HANDS {
                if opp.aggression > 2.0 {
                    // Aggressive opponents devalue thin pot odds calls.
                    pot_odds_call += 0.05;
                }
                if opp.vpip > 0.4 {
                    // Loose opponents pay off thinner value bets.
                    value_bet_equity -= 0.02;
                }
            }
        }

        let (mut action, mut confidence, mut rationale) = if equity > value_bet_equity {
            (Action::Bet, 0.90, "Strong hand, betting for value".to_string())
        } else if equity > self.call_equity {
            (Action::Call, 0.70, "Medium strength, calling".to_string())
        } else if pot_odds > pot_odds_call {
            (Action::Call, 0.60, "Priced in by the pot, calling".to_string())
        } else {
            (Action::Fold, 0.80, "Weak hand, folding".to_string())
        };

        // With nothing to call staying in is a check.
        if action == Action::Call && ctx.current_bet.unwrap_or(0.0) == 0.0 {
            action = Action::Check;
        }

        if !ctx.is_complete() {
            confidence = (confidence - 0.1_f64).max(0.1);
            rationale.push_str(", table info incomplete");
        }

        if let Some(baseline) = baseline {
            if !baseline.is_empty() && baseline.probability(action) < 0.05 {
                confidence *= 0.85;
                rationale.push_str(", baseline prior disagrees");
            }
        }

        let amount = match action {
            Action::Bet | Action::Raise => ctx.pot.map(|pot| round_cents(pot * 2.0 / 3.0)),
            _ => None,
        };

        let urgency = self.classify_urgency(action, equity, confidence, pot_odds);

        Ok(Decision {
            action,
            amount,
            confidence,
            expected_value: equity - 0.5,
            urgency,
            rationale,
        })
    }
}

/// Bounded in-memory log of produced decisions, for audit and export.
#[derive(Debug, Clone)]
pub struct DecisionHistory {
    decisions: VecDeque<Decision>,
    capacity: usize,
}

impl Default for DecisionHistory {
    fn default() -> Self {
        Self::new(1_000)
    }
}

impl DecisionHistory {
    /// Creates a history holding at most `capacity` decisions.
    pub fn new(capacity: usize) -> Self {
        Self {
            decisions: VecDeque::with_capacity(capacity.min(1_024)),
            capacity: capacity.max(1),
        }
    }

    /// Records a decision, evicting the oldest one when full.
    pub fn push(&mut self, decision: Decision) {
        if self.decisions.len() == self.capacity {
            self.decisions.pop_front();
        }
        self.decisions.push_back(decision);
    }

    /// Number of recorded decisions.
    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    /// Checks if the history is empty.
    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    /// The most recent `count` decisions, newest last.
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &Decision> {
        self.decisions
            .iter()
            .skip(self.decisions.len().saturating_sub(count))
    }

    /// All recorded decisions for the given action.
    pub fn by_action(&self, action: Action) -> impl Iterator<Item = &Decision> {
        self.decisions.iter().filter(move |d| d.action == action)
    }
}

/// Rounds an amount to cents.
fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimate(equity: f64) -> EquityEstimate {
        EquityEstimate {
            equity,
            trials: 10_000,
        }
    }

    #[test]
    fn strong_hand_bets() {
        let engine = DecisionEngine::new();
        // Pot odds 0.2.
        let ctx = PotContext::new(100.0, 25.0);

        let decision = engine.decide(&estimate(0.95), &ctx, None, None);
        assert_eq!(decision.action, Action::Bet);
        assert!((decision.confidence - 0.90).abs() < 1e-9);
        assert_eq!(decision.urgency, Urgency::High);
        assert_eq!(decision.amount, Some(66.67));
        assert!((decision.expected_value - 0.45).abs() < 1e-9);
    }

    #[test]
    fn medium_hand_calls() {
        let engine = DecisionEngine::new();
        let ctx = PotContext::new(100.0, 25.0);

        let decision = engine.decide(&estimate(0.60), &ctx, None, None);
        assert_eq!(decision.action, Action::Call);
        assert!((decision.confidence - 0.70).abs() < 1e-9);
        assert_eq!(decision.amount, None);
    }

    #[test]
    fn call_without_bet_is_check() {
        let engine = DecisionEngine::new();
        let ctx = PotContext::new(100.0, 0.0);

        let decision = engine.decide(&estimate(0.60), &ctx, None, None);
        assert_eq!(decision.action, Action::Check);
    }

    #[test]
    fn pot_odds_call() {
        let engine = DecisionEngine::new();
        // Pot odds ~0.33.
        let ctx = PotContext::new(100.0, 50.0);

        let decision = engine.decide(&estimate(0.40), &ctx, None, None);
        assert_eq!(decision.action, Action::Call);
        assert!((decision.confidence - 0.60).abs() < 1e-9);
    }

    #[test]
    fn weak_hand_folds() {
        let engine = DecisionEngine::new();
        // Pot odds 0.1.
        let ctx = PotContext::new(90.0, 10.0);

        let decision = engine.decide(&estimate(0.30), &ctx, None, None);
        assert_eq!(decision.action, Action::Fold);
        assert!((decision.confidence - 0.80).abs() < 1e-9);
        assert_eq!(decision.urgency, Urgency::Low);
        assert!(decision.expected_value < 0.0);
    }

    #[test]
    fn missing_context_degrades_confidence() {
        let engine = DecisionEngine::new();

        let decision = engine.decide(&estimate(0.80), &PotContext::default(), None, None);
        assert_eq!(decision.action, Action::Bet);
        assert!((decision.confidence - 0.80).abs() < 1e-9);
        assert!(decision.rationale.contains("incomplete"));
        // No known pot, no suggested amount.
        assert_eq!(decision.amount, None);
    }

    #[test]
    fn baseline_disagreement_lowers_confidence() {
        let engine = DecisionEngine::new();
        let ctx = PotContext::new(100.0, 25.0);
        let baseline = StrategyBaseline::new([(Action::Fold, 0.9), (Action::Call, 0.1)]);

        let decision = engine.decide(&estimate(0.80), &ctx, Some(&baseline), None);
        assert_eq!(decision.action, Action::Bet);
        assert!((decision.confidence - 0.90 * 0.85).abs() < 1e-9);
        assert!(decision.rationale.contains("baseline"));

        // A prior that backs the action leaves confidence alone.
        let baseline = StrategyBaseline::new([(Action::Bet, 0.6), (Action::Call, 0.4)]);
        let decision = engine.decide(&estimate(0.80), &ctx, Some(&baseline), None);
        assert!((decision.confidence - 0.90).abs() < 1e-9);
    }

    #[test]
    fn aggressive_opponent_tightens_pot_odds_call() {
        let engine = DecisionEngine::new();
        // Pot odds ~0.32, just above the default call threshold.
        let ctx = PotContext::new(85.0, 40.0);

        let passive = OpponentProfile {
            vpip: 0.2,
            pfr: 0.1,
            aggression: 1.0,
            hands_observed: 100,
        };
        let decision = engine.decide(&estimate(0.30), &ctx, None, Some(&passive));
        assert_eq!(decision.action, Action::Call);

        let aggressive = OpponentProfile {
            aggression: 2.5,
            ..passive
        };
        let decision = engine.decide(&estimate(0.30), &ctx, None, Some(&aggressive));
        assert_eq!(decision.action, Action::Fold);

        // Small samples never adjust thresholds.
        let unknown = OpponentProfile {
            hands_observed: 5,
            ..aggressive
        };
        let decision = engine.decide(&estimate(0.30), &ctx, None, Some(&unknown));
        assert_eq!(decision.action, Action::Call);
    }

    #[test]
    fn invalid_equity_degrades_to_safe_fold() {
        let engine = DecisionEngine::new();
        let ctx = PotContext::new(100.0, 25.0);

        for equity in [f64::NAN, -0.1, 1.5] {
            let decision = engine.decide(&estimate(equity), &ctx, None, None);
            assert_eq!(decision.action, Action::Fold);
            assert_eq!(decision.confidence, 1.0);
            assert!(decision.rationale.contains("folding to be safe"));
        }
    }

    #[test]
    fn urgency_tiers() {
        let engine = DecisionEngine::new();

        // Stack decisions and extreme equity are high urgency.
        assert_eq!(
            engine.classify_urgency(Action::AllIn, 0.5, 0.5, 0.1),
            Urgency::High
        );
        assert_eq!(
            engine.classify_urgency(Action::Bet, 0.96, 0.9, 0.1),
            Urgency::High
        );
        assert_eq!(
            engine.classify_urgency(Action::Fold, 0.03, 0.8, 0.1),
            Urgency::High
        );

        // Confident or odds heavy spots are medium.
        assert_eq!(
            engine.classify_urgency(Action::Bet, 0.80, 0.9, 0.1),
            Urgency::Medium
        );
        assert_eq!(
            engine.classify_urgency(Action::Call, 0.40, 0.6, 0.45),
            Urgency::Medium
        );

        // Routine spots are low.
        assert_eq!(
            engine.classify_urgency(Action::Fold, 0.30, 0.8, 0.1),
            Urgency::Low
        );

        // Low confidence ambiguous spots are flagged critical.
        assert_eq!(
            engine.classify_urgency(Action::Call, 0.40, 0.6, 0.35),
            Urgency::Critical
        );
    }

    #[test]
    fn history_is_bounded() {
        let engine = DecisionEngine::new();
        let ctx = PotContext::new(100.0, 25.0);
        let mut history = DecisionHistory::new(100);

        for idx in 0..150 {
            let equity = if idx % 2 == 0 { 0.9 } else { 0.2 };
            history.push(engine.decide(&estimate(equity), &ctx, None, None));
        }

        assert_eq!(history.len(), 100);
        assert_eq!(history.recent(10).count(), 10);
        assert!(history.by_action(Action::Bet).count() > 0);
        assert!(history.by_action(Action::Fold).count() > 0);
        assert_eq!(history.by_action(Action::AllIn).count(), 0);
    }
}
