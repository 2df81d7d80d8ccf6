// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Tablesight screen frame acquisition.
//!
//! A [CaptureEngine] drives a [CaptureBackend] from a dedicated thread,
//! producing timestamped [Frame]s at an adaptive interval into a bounded
//! queue. The consumer polls [CaptureEngine::latest] without blocking; when
//! frames arrive faster than they are consumed the oldest unconsumed frame
//! is dropped so the producer never blocks and the backlog stays bounded.
//!
//! Platform backends live outside this crate, the engine takes any
//! [CaptureBackend] at construction:
//!
//! ```
//! # use std::time::Duration;
//! # use tablesight_capture::*;
//! let backend = TestPatternBackend::new(640, 480);
//! let mut engine = CaptureEngine::new(Box::new(backend), CaptureConfig::default());
//!
//! engine.start(CaptureRegion::new(0, 0, 640, 480)).unwrap();
//! std::thread::sleep(Duration::from_millis(50));
//!
//! if let Some(frame) = engine.latest() {
//!     assert_eq!(frame.width, 640);
//! }
//!
//! engine.stop();
//! ```
#![warn(clippy::all, rust_2018_idioms, missing_docs)]
mod engine;
mod frame;

pub use engine::{CaptureConfig, CaptureEngine, CaptureStats};
pub use frame::{CaptureBackend, CaptureError, CaptureRegion, Frame, TestPatternBackend};
