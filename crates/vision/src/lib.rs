// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Tablesight card detection types and fusion.
//!
//! Detection strategies observe playing cards in a captured frame and report
//! them as [Detection] values. This crate defines the [CardDetector] contract
//! those strategies implement, and the [DetectionFusion] layer that merges
//! the observations from all active strategies for one frame into a single
//! consensus list:
//!
//! ```
//! # use tablesight_vision::*;
//! # use tablesight_cards::{Card, Rank, Suit};
//! let ah = Card::new(Rank::Ace, Suit::Hearts);
//! let detections = vec![
//!     Detection::new(ah, 0.80, Point::new(100.0, 100.0), DetectorKind::Template),
//!     Detection::new(ah, 0.85, Point::new(104.0, 98.0), DetectorKind::Model),
//! ];
//!
//! let fusion = DetectionFusion::default();
//! let fused = fusion.fuse(detections);
//!
//! // The two observations agree and merge into one boosted detection.
//! assert_eq!(fused.len(), 1);
//! assert_eq!(fused[0].kind, DetectorKind::Hybrid);
//! assert!(fused[0].confidence > 0.85);
//! ```
#![warn(clippy::all, rust_2018_idioms, missing_docs)]
mod detection;
mod fusion;

pub use detection::{BoundingBox, CardDetector, Detection, DetectorKind, Point};
pub use fusion::{DetectionFusion, FusionConfig};
