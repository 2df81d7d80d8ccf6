// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Tablesight playing cards types.
//!
//! This crate defines the card value types shared by the detection and
//! analysis crates:
//!
//! ```
//! # use tablesight_cards::{Card, Rank, Suit};
//! let ah = Card::new(Rank::Ace, Suit::Hearts);
//! let kd = Card::new(Rank::King, Suit::Diamonds);
//! ```
//!
//! cards can also be parsed from the two character notation used by
//! detector outputs and the command line:
//!
//! ```
//! # use tablesight_cards::{Card, Rank, Suit};
//! let th = "TH".parse::<Card>().unwrap();
//! assert_eq!(th, Card::new(Rank::Ten, Suit::Hearts));
//! ```
//!
//! and a [Deck] type for shuffling, sampling, and iterating hands:
//!
//! ```no_run
//! # use tablesight_cards::{Card, Deck, Rank, Suit};
//! // Iterate through all 5 cards hands (2.6M hands).
//! let mut counter = 0u32;
//! Deck::default().for_each(5, |hand| {
//!     assert_eq!(hand.len(), 5);
//!     counter += 1;
//! });
//! assert_eq!(counter, 2_598_960);
//! ```
#![warn(clippy::all, rust_2018_idioms, missing_docs)]
mod cards;
pub use cards::{Card, Deck, ParseCardError, Rank, Suit};
