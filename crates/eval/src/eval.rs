// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Poker hand evaluation.
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};

use tablesight_cards::{Card, Rank};

/// Hand evaluation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    /// The hand has fewer than 5 or more than 7 cards.
    #[error("invalid hand size {0}, expected 5 to 7 cards")]
    InvalidHandSize(usize),
}

/// The rank of a poker hand from the weakest high card to the strongest
/// straight flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HandRank {
    /// Five unpaired cards.
    HighCard = 0,
    /// A pair and three kickers.
    OnePair,
    /// Two pairs and a kicker.
    TwoPair,
    /// Three cards of the same rank and two kickers.
    ThreeOfAKind,
    /// Five cards with consecutive ranks.
    Straight,
    /// Five cards of the same suit.
    Flush,
    /// Three cards of one rank and a pair of another.
    FullHouse,
    /// Four cards of the same rank and a kicker.
    FourOfAKind,
    /// A straight of a single suit.
    StraightFlush,
}

impl fmt::Display for HandRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandRank::HighCard => "High Card",
            HandRank::OnePair => "One Pair",
            HandRank::TwoPair => "Two Pair",
            HandRank::ThreeOfAKind => "Three of a Kind",
            HandRank::Straight => "Straight",
            HandRank::Flush => "Flush",
            HandRank::FullHouse => "Full House",
            HandRank::FourOfAKind => "Four of a Kind",
            HandRank::StraightFlush => "Straight Flush",
        };

        write!(f, "{name}")
    }
}

/// The value of an evaluated hand.
///
/// Values order by [HandRank] first and then by the tie-break ranks, most
/// significant first, so two values compare like the hands they came from.
/// Equal values mean the hands have exactly the same strength.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandValue {
    rank: HandRank,
    tiebreaks: Vec<Rank>,
}

impl HandValue {
    /// Evaluates a 5, 6, or 7 cards hand returning the value of its best
    /// five cards.
    ///
    /// Cards must be unique, the value of a hand with duplicate cards is
    /// unspecified.
    pub fn eval(cards: &[Card]) -> Result<HandValue, EvalError> {
        match cards.len() {
            5 => Ok(Self::eval5(cards)),
            6 => {
                let mut hand = [cards[0]; 5];
                let mut best: Option<HandValue> = None;

                for skip in 0..6 {
                    let mut pos = 0;
                    for (idx, &card) in cards.iter().enumerate() {
                        if idx != skip {
                            hand[pos] = card;
                            pos += 1;
                        }
                    }

                    let value = Self::eval5(&hand);
                    if best.as_ref().is_none_or(|b| &value > b) {
                        best = Some(value);
                    }
                }

                Ok(best.expect("six cards hand has five cards subsets"))
            }
            7 => {
                let mut hand = [cards[0]; 5];
                let mut best: Option<HandValue> = None;

                for skip1 in 0..7 {
                    for skip2 in (skip1 + 1)..7 {
                        let mut pos = 0;
                        for (idx, &card) in cards.iter().enumerate() {
                            if idx != skip1 && idx != skip2 {
                                hand[pos] = card;
                                pos += 1;
                            }
                        }

                        let value = Self::eval5(&hand);
                        if best.as_ref().is_none_or(|b| &value > b) {
                            best = Some(value);
                        }
                    }
                }

                Ok(best.expect("seven cards hand has five cards subsets"))
            }
            n => Err(EvalError::InvalidHandSize(n)),
        }
    }

    /// The rank of this hand.
    pub fn rank(&self) -> HandRank {
        self.rank
    }

    /// The tie-break ranks for this hand, most significant first.
    pub fn tiebreaks(&self) -> &[Rank] {
        &self.tiebreaks
    }

    /// A readable description of this hand, like `Full House, Ks full of 3s`.
    pub fn label(&self) -> String {
        let tb = &self.tiebreaks;
        match self.rank {
            HandRank::HighCard => format!("{} high", tb[0]),
            HandRank::OnePair => format!("Pair of {}s", tb[0]),
            HandRank::TwoPair => format!("Two Pair, {}s and {}s", tb[0], tb[1]),
            HandRank::ThreeOfAKind => format!("Three {}s", tb[0]),
            HandRank::Straight => format!("Straight, {} high", tb[0]),
            HandRank::Flush => format!("Flush, {} high", tb[0]),
            HandRank::FullHouse => format!("Full House, {}s full of {}s", tb[0], tb[1]),
            HandRank::FourOfAKind => format!("Four {}s", tb[0]),
            HandRank::StraightFlush => format!("Straight Flush, {} high", tb[0]),
        }
    }

    /// Evaluates exactly five cards.
    fn eval5(cards: &[Card]) -> HandValue {
        debug_assert_eq!(cards.len(), 5);

        let mut counts = [0u8; 13];
        for card in cards {
            counts[card.rank_bits() as usize] += 1;
        }

        let is_flush = cards
            .iter()
            .all(|c| c.suit_bits() == cards[0].suit_bits());
        let straight_high = straight_high(&counts);

        if let Some(high) = straight_high {
            let rank = if is_flush {
                HandRank::StraightFlush
            } else {
                HandRank::Straight
            };

            return HandValue {
                rank,
                tiebreaks: vec![Rank::ALL[high]],
            };
        }

        // Rank groups ordered by count and then rank, strongest first.
        let mut groups = counts
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count > 0)
            .map(|(idx, &count)| (count, idx))
            .collect::<Vec<_>>();
        groups.sort_unstable_by(|a, b| b.cmp(a));

        let tiebreaks = |groups: &[(u8, usize)]| {
            groups.iter().map(|&(_, idx)| Rank::ALL[idx]).collect()
        };

        match (groups[0].0, groups.get(1).map(|g| g.0)) {
            (4, _) => HandValue {
                rank: HandRank::FourOfAKind,
                tiebreaks: tiebreaks(&groups),
            },
            (3, Some(2)) => HandValue {
                rank: HandRank::FullHouse,
                tiebreaks: tiebreaks(&groups),
            },
            (3, _) => HandValue {
                rank: HandRank::ThreeOfAKind,
                tiebreaks: tiebreaks(&groups),
            },
            (2, Some(2)) => HandValue {
                rank: HandRank::TwoPair,
                tiebreaks: tiebreaks(&groups),
            },
            (2, _) => HandValue {
                rank: HandRank::OnePair,
                tiebreaks: tiebreaks(&groups),
            },
            _ => HandValue {
                rank: if is_flush {
                    HandRank::Flush
                } else {
                    HandRank::HighCard
                },
                tiebreaks: tiebreaks(&groups),
            },
        }
    }
}

impl PartialOrd for HandValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HandValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank
            .cmp(&other.rank)
            .then_with(|| self.tiebreaks.cmp(&other.tiebreaks))
    }
}

impl fmt::Display for HandValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Returns the high rank index of a straight, with the wheel A-2-3-4-5
/// counting as a five high straight.
fn straight_high(counts: &[u8; 13]) -> Option<usize> {
    if counts.iter().any(|&c| c > 1) {
        return None;
    }

    let ranks = counts
        .iter()
        .enumerate()
        .filter(|&(_, &c)| c == 1)
        .map(|(idx, _)| idx)
        .collect::<Vec<_>>();

    if ranks.len() != 5 {
        return None;
    }

    if ranks[4] - ranks[0] == 4 {
        Some(ranks[4])
    } else if ranks == [0, 1, 2, 3, 12] {
        // The wheel, the ace plays low.
        Some(3)
    } else {
        None
    }
}
