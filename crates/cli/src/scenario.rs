// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Synthetic table scenarios for the watch loop.
//!
//! The watch command exercises the whole pipeline without a real platform
//! adapter: a test pattern backend produces frames, scripted detectors
//! observe a randomly dealt table with positional jitter and occasional
//! misses, and every frame runs through fusion, equity, and decision
//! synthesis.
use anyhow::Result;
use log::info;
use parking_lot::Mutex;
use rand::prelude::*;
use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use tablesight_analysis::{
    Action, Analyzer, DecisionEngine, DecisionHistory, EquityConfig, EquityEstimator, PerfMonitor,
    PotContext, StrategyBaseline,
};
use tablesight_capture::{
    CaptureConfig, CaptureEngine, CaptureRegion, Frame, TestPatternBackend,
};
use tablesight_cards::{Card, Deck};
use tablesight_vision::{CardDetector, Detection, DetectionFusion, DetectorKind, Point};

/// Backoff when no frame is ready.
const IDLE_BACKOFF: Duration = Duration::from_millis(100);

/// Detections below this line belong to the hole cards region.
const HOLE_REGION_Y: f64 = 450.0;

/// The table state a frame is observed from.
struct Scene {
    hole: Vec<Card>,
    board: Vec<Card>,
    pot: f64,
    bet: f64,
    opponents: usize,
}

impl Scene {
    /// Deals a random table state.
    fn deal(rng: &mut SmallRng) -> Self {
        let mut deck = Deck::new_and_shuffled(rng);
        let hole = vec![deck.deal(), deck.deal()];

        let board_len = *[0usize, 3, 4, 5]
            .choose(rng)
            .expect("street choices are not empty");
        let board = (0..board_len).map(|_| deck.deal()).collect();

        let pot = rng.random_range(40.0..400.0);
        let bet = if rng.random_bool(0.7) {
            rng.random_range(1.0..pot / 2.0)
        } else {
            0.0
        };

        Self {
            hole,
            board,
            pot,
            bet,
            opponents: rng.random_range(1..=4),
        }
    }
}

/// A detection strategy observing the scripted scene.
///
/// Observations carry positional jitter and random confidences, and each
/// card is missed now and then, so fusion sees realistic disagreement
/// between strategies.
struct ScriptedDetector {
    kind: DetectorKind,
    scene: Arc<Mutex<Scene>>,
    rng: SmallRng,
    miss_rate: f64,
}

impl ScriptedDetector {
    fn new(kind: DetectorKind, scene: Arc<Mutex<Scene>>, miss_rate: f64) -> Self {
        Self {
            kind,
            scene,
            rng: SmallRng::from_os_rng(),
            miss_rate,
        }
    }

    fn observe(&mut self, card: Card, x: f64, y: f64) -> Option<Detection> {
        if self.rng.random::<f64>() < self.miss_rate {
            return None;
        }

        let jx = self.rng.random_range(-4.0..4.0);
        let jy = self.rng.random_range(-4.0..4.0);
        let confidence = self.rng.random_range(0.75..0.98);

        Some(Detection::new(
            card,
            confidence,
            Point::new(x + jx, y + jy),
            self.kind,
        ))
    }
}

impl CardDetector for ScriptedDetector {
    fn kind(&self) -> DetectorKind {
        self.kind
    }

    fn detect(&mut self, _frame: &Frame) -> Vec<Detection> {
        let (hole, board) = {
            let scene = self.scene.lock();
            (scene.hole.clone(), scene.board.clone())
        };

        let mut detections = Vec::new();
        for (idx, &card) in hole.iter().enumerate() {
            detections.extend(self.observe(card, 120.0 + idx as f64 * 80.0, 600.0));
        }
        for (idx, &card) in board.iter().enumerate() {
            detections.extend(self.observe(card, 500.0 + idx as f64 * 80.0, 300.0));
        }

        detections
    }
}

/// Runs the producer/consumer analysis loop for `cycles` frames.
pub fn watch(cycles: usize, interval_ms: u64) -> Result<()> {
    let mut rng = SmallRng::from_os_rng();
    let scene = Arc::new(Mutex::new(Scene::deal(&mut rng)));

    let backend = TestPatternBackend::new(1920, 1080);
    let mut engine = CaptureEngine::new(
        Box::new(backend),
        CaptureConfig {
            interval: Duration::from_millis(interval_ms),
            queue_capacity: 10,
        },
    );
    engine.start(CaptureRegion::new(0, 0, 1280, 720))?;
    info!(
        "Watching synthetic table, {} cycles at {:?} intervals",
        cycles,
        engine.interval()
    );

    let mut detectors: Vec<Box<dyn CardDetector>> = vec![
        Box::new(ScriptedDetector::new(
            DetectorKind::Template,
            scene.clone(),
            0.15,
        )),
        Box::new(ScriptedDetector::new(
            DetectorKind::Model,
            scene.clone(),
            0.05,
        )),
    ];

    let analyzer = Analyzer::new(
        EquityEstimator::new(EquityConfig {
            trials: 2_000,
            tasks: 4,
        }),
        DecisionEngine::new(),
        DetectionFusion::default(),
    );

    // A fixed position prior stands in for the strategy collaborator.
    let baseline = StrategyBaseline::new([
        (Action::Fold, 0.35),
        (Action::Check, 0.15),
        (Action::Call, 0.25),
        (Action::Bet, 0.15),
        (Action::Raise, 0.10),
    ]);

    let mut history = DecisionHistory::default();
    let mut monitor = PerfMonitor::default();

    let mut completed = 0;
    while completed < cycles {
        let Some(frame) = engine.latest() else {
            thread::sleep(IDLE_BACKOFF);
            continue;
        };

        let started = Instant::now();

        let mut observations = Vec::new();
        for detector in detectors.iter_mut() {
            observations.extend(detector.detect(&frame));
        }

        let (hole, board): (Vec<_>, Vec<_>) = observations
            .into_iter()
            .partition(|d| d.center.y > HOLE_REGION_Y);

        let (ctx, opponents) = {
            let scene = scene.lock();
            (PotContext::new(scene.pot, scene.bet), scene.opponents)
        };

        let analysis =
            analyzer.analyze_detections(hole, board, opponents, &ctx, Some(&baseline), None);

        let decision = &analysis.decision;
        info!(
            "[{}|{}] {} ({:.0}% conf, equity {:.1}%, {} urgency) in {:.0}ms",
            join_cards(&analysis.hole),
            join_cards(&analysis.board),
            decision.action,
            decision.confidence * 100.0,
            analysis.equity.equity * 100.0,
            decision.urgency,
            analysis.elapsed.as_secs_f64() * 1_000.0,
        );

        monitor.record("analysis", started.elapsed(), None, true);
        history.push(analysis.decision);
        completed += 1;

        // Next frame observes a fresh deal.
        *scene.lock() = Scene::deal(&mut rng);
    }

    engine.stop();

    let capture = engine.stats();
    let report = monitor.report();
    info!(
        "Analyzed {} hands from {} frames ({} capture errors), grade {}, avg cycle {:.0}ms",
        history.len(),
        capture.captures,
        capture.errors,
        report.grade,
        report.avg_latency_ms,
    );

    Ok(())
}

fn join_cards(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
