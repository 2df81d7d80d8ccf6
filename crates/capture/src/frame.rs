// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Frames and capture backends.
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// A screen region to capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRegion {
    /// X coordinate of the top-left corner.
    pub x: i32,
    /// Y coordinate of the top-left corner.
    pub y: i32,
    /// Region width in pixels.
    pub width: u32,
    /// Region height in pixels.
    pub height: u32,
    /// Monitor index for multi-monitor setups.
    pub monitor: u32,
}

impl CaptureRegion {
    /// Creates a region on the primary monitor.
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            monitor: 0,
        }
    }

    /// Checks the region has a non zero area.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A captured frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw RGB pixels, row major, three bytes per pixel.
    pub pixels: Vec<u8>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// The region this frame was captured from.
    pub region: CaptureRegion,
    /// When the capture completed.
    pub captured_at: Instant,
}

impl Frame {
    /// Creates a frame captured now.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, region: CaptureRegion) -> Self {
        Self {
            pixels,
            width,
            height,
            region,
            captured_at: Instant::now(),
        }
    }

    /// The age of this frame.
    pub fn age(&self) -> std::time::Duration {
        self.captured_at.elapsed()
    }
}

/// Frame acquisition errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    /// A single capture attempt failed, the loop retries after a backoff.
    #[error("capture failed: {0}")]
    Failed(String),
    /// The engine is already capturing.
    #[error("capture already running")]
    AlreadyRunning,
    /// The capture region has a zero area.
    #[error("capture region is empty")]
    EmptyRegion,
}

/// A screen capture backend.
///
/// Platform adapters implement this trait; the backend is picked once at
/// startup and injected into the [CaptureEngine](crate::CaptureEngine), the
/// engine never branches on the platform per capture.
pub trait CaptureBackend: Send {
    /// Captures a single frame of the given region.
    fn capture(&mut self, region: &CaptureRegion) -> Result<Frame, CaptureError>;

    /// The size of the given monitor.
    fn screen_size(&self, monitor: u32) -> (u32, u32);
}

/// A backend producing synthetic frames, used by tests and demos.
#[derive(Debug)]
pub struct TestPatternBackend {
    width: u32,
    height: u32,
    sequence: u64,
    fail_every: Option<u64>,
}

impl TestPatternBackend {
    /// Creates a backend emitting frames of the given screen size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            sequence: 0,
            fail_every: None,
        }
    }

    /// Makes every nth capture fail, for retry and stats tests.
    pub fn fail_every(mut self, nth: u64) -> Self {
        self.fail_every = Some(nth);
        self
    }

    /// Number of captures attempted so far.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl CaptureBackend for TestPatternBackend {
    fn capture(&mut self, region: &CaptureRegion) -> Result<Frame, CaptureError> {
        self.sequence += 1;

        if let Some(nth) = self.fail_every {
            if self.sequence % nth == 0 {
                return Err(CaptureError::Failed(format!(
                    "synthetic failure at capture {}",
                    self.sequence
                )));
            }
        }

        // Fill with a shade derived from the sequence so consecutive frames
        // are distinguishable.
        let shade = (self.sequence % 251) as u8;
        let pixels = vec![shade; (region.width * region.height * 3) as usize];
        Ok(Frame::new(pixels, region.width, region.height, *region))
    }

    fn screen_size(&self, _monitor: u32) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_frames() {
        let mut backend = TestPatternBackend::new(800, 600);
        let region = CaptureRegion::new(10, 10, 64, 48);

        let frame = backend.capture(&region).unwrap();
        assert_eq!(frame.width, 64);
        assert_eq!(frame.height, 48);
        assert_eq!(frame.pixels.len(), 64 * 48 * 3);
        assert_eq!(frame.region, region);
        assert_eq!(backend.screen_size(0), (800, 600));
    }

    #[test]
    fn test_pattern_failures() {
        let mut backend = TestPatternBackend::new(800, 600).fail_every(3);
        let region = CaptureRegion::new(0, 0, 8, 8);

        assert!(backend.capture(&region).is_ok());
        assert!(backend.capture(&region).is_ok());
        assert!(backend.capture(&region).is_err());
        assert!(backend.capture(&region).is_ok());
    }

    #[test]
    fn empty_region() {
        assert!(CaptureRegion::new(0, 0, 0, 100).is_empty());
        assert!(CaptureRegion::new(0, 0, 100, 0).is_empty());
        assert!(!CaptureRegion::new(0, 0, 1, 1).is_empty());
    }
}
