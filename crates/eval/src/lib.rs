// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Tablesight poker hand evaluator.
//!
//! Evaluator for 5, 6 and 7 cards poker hands. A hand evaluates to a
//! [HandValue] that orders hands first by [HandRank] category and then by
//! the category tie-break ranks, so values from different hands compare
//! directly:
//!
//! ```
//! # use tablesight_eval::*;
//! // 2C, 3C, .., JC
//! let cards = Deck::default().into_iter().take(10).collect::<Vec<_>>();
//! let v1 = HandValue::eval(&cards[0..5]).unwrap();
//! let v2 = HandValue::eval(&cards[5..]).unwrap();
//! assert!(v2 > v1);
//! ```
//!
//! For 6 and 7 cards hands the evaluator returns the value of the best five
//! cards hand.
#![warn(clippy::all, rust_2018_idioms, missing_docs)]
mod eval;
pub use eval::{EvalError, HandRank, HandValue};

// Reexport cards types.
pub use tablesight_cards::{Card, Deck, Rank, Suit};
