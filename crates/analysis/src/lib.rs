// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Tablesight equity estimation and decision synthesis.
//!
//! This crate turns the fused card observations of one frame into a single
//! ranked action recommendation. The [EquityEstimator] scores the player
//! hand by Monte Carlo simulation against random opponents, the
//! [DecisionEngine] combines equity, pot odds, an external strategy prior
//! and opponent tendencies into a [Decision], and the [Analyzer] runs the
//! whole cycle:
//!
//! ```no_run
//! # use tablesight_analysis::*;
//! # use tablesight_cards::Card;
//! let analyzer = Analyzer::default();
//!
//! let hole = ["AH".parse::<Card>().unwrap(), "AD".parse::<Card>().unwrap()];
//! let ctx = PotContext::new(120.0, 40.0);
//!
//! let analysis = analyzer
//!     .analyze_cards(&hole, &[], 2, &ctx, None, None)
//!     .unwrap();
//! println!("{} ({:.0}%)", analysis.decision.action, analysis.decision.confidence * 100.0);
//! ```
//!
//! Failures below the decision boundary are explicit errors; the boundary
//! itself never fails, it degrades to a safe fold recommendation instead.
#![warn(clippy::all, rust_2018_idioms, missing_docs)]
mod analyzer;
mod decision;
mod equity;
mod error;
mod monitor;

pub use analyzer::{Analyzer, HandAnalysis};
pub use decision::{
    Action, Decision, DecisionEngine, DecisionHistory, OpponentProfile, PotContext,
    StrategyBaseline, Street, Urgency,
};
pub use equity::{EquityConfig, EquityEstimate, EquityEstimator};
pub use error::AnalysisError;
pub use monitor::{Grade, PerfMonitor, PerfReport, PerfTargets};
