// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Analysis errors.
use tablesight_eval::EvalError;

/// Errors raised by the analysis cycle.
///
/// These fail loudly out of the lower layers; the decision boundary is the
/// single place that converts them into a safe fold recommendation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    /// A hand evaluation rejected its input.
    #[error(transparent)]
    Eval(#[from] EvalError),
    /// The equity input is not a probability.
    #[error("equity {0} is not a probability in [0, 1]")]
    InvalidEquity(f64),
    /// The fused detections did not yield two hole cards.
    #[error("expected two hole cards, detected {0}")]
    MissingHoleCards(usize),
}
