// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Continuous capture engine.
use log::debug;
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use crate::{CaptureBackend, CaptureError, CaptureRegion, Frame};

/// The shortest capture interval.
const MIN_INTERVAL: Duration = Duration::from_millis(500);

/// The longest capture interval.
const MAX_INTERVAL: Duration = Duration::from_secs(2);

/// Pause after a failed capture attempt before retrying.
const ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Capture engine configuration.
#[derive(Debug, Clone, Copy)]
pub struct CaptureConfig {
    /// Time between captures, clamped to [0.5s, 2.0s].
    pub interval: Duration,
    /// Maximum number of unconsumed frames to keep.
    pub queue_capacity: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            queue_capacity: 10,
        }
    }
}

/// Capture statistics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CaptureStats {
    /// Successful captures since start.
    pub captures: u64,
    /// Failed capture attempts since start.
    pub errors: u64,
    /// Frames waiting in the queue.
    pub queued: usize,
    /// Time since the engine started.
    pub uptime: Duration,
    /// Average successful captures per second.
    pub rate: f64,
    /// Whether the capture loop is running.
    pub running: bool,
}

/// State shared with the capture thread.
struct Shared {
    backend: Mutex<Box<dyn CaptureBackend>>,
    queue: Mutex<VecDeque<Frame>>,
    capacity: usize,
    stop: Mutex<bool>,
    wakeup: Condvar,
    interval_ms: AtomicU64,
    captures: AtomicU64,
    errors: AtomicU64,
}

impl Shared {
    /// Queues a frame evicting the oldest one when full.
    fn push(&self, frame: Frame) {
        let mut queue = self.queue.lock();
        if queue.len() == self.capacity {
            queue.pop_front();
        }
        queue.push_back(frame);
    }
}

/// Continuous frame acquisition with a dedicated capture thread.
///
/// The engine owns a bounded frame queue with drop-oldest overflow so a slow
/// consumer never blocks the capture thread and stale frames never pile up.
pub struct CaptureEngine {
    shared: Arc<Shared>,
    worker: Option<thread::JoinHandle<()>>,
    started_at: Option<Instant>,
}

impl CaptureEngine {
    /// Creates an engine that captures with the given backend.
    pub fn new(backend: Box<dyn CaptureBackend>, config: CaptureConfig) -> Self {
        let interval = config.interval.clamp(MIN_INTERVAL, MAX_INTERVAL);

        Self {
            shared: Arc::new(Shared {
                backend: Mutex::new(backend),
                queue: Mutex::new(VecDeque::with_capacity(config.queue_capacity)),
                capacity: config.queue_capacity.max(1),
                stop: Mutex::new(false),
                wakeup: Condvar::new(),
                interval_ms: AtomicU64::new(interval.as_millis() as u64),
                captures: AtomicU64::new(0),
                errors: AtomicU64::new(0),
            }),
            worker: None,
            started_at: None,
        }
    }

    /// Starts continuous capture of the given region.
    pub fn start(&mut self, region: CaptureRegion) -> Result<(), CaptureError> {
        if self.worker.is_some() {
            return Err(CaptureError::AlreadyRunning);
        }

        if region.is_empty() {
            return Err(CaptureError::EmptyRegion);
        }

        *self.shared.stop.lock() = false;
        self.shared.captures.store(0, Ordering::Relaxed);
        self.shared.errors.store(0, Ordering::Relaxed);
        self.started_at = Some(Instant::now());

        let shared = self.shared.clone();
        let worker = thread::Builder::new()
            .name("tablesight-capture".to_string())
            .spawn(move || capture_loop(&shared, region))
            .map_err(|e| CaptureError::Failed(format!("spawn capture thread: {e}")))?;
        self.worker = Some(worker);

        Ok(())
    }

    /// Returns the most recent captured frame without blocking.
    ///
    /// Frames older than the returned one are discarded, `None` when no
    /// frame arrived since the last call.
    pub fn latest(&self) -> Option<Frame> {
        let mut queue = self.shared.queue.lock();
        let frame = queue.pop_back();
        queue.clear();
        frame
    }

    /// Captures a single frame outside the continuous loop.
    pub fn capture_once(&self, region: CaptureRegion) -> Result<Frame, CaptureError> {
        if region.is_empty() {
            return Err(CaptureError::EmptyRegion);
        }

        self.shared.backend.lock().capture(&region)
    }

    /// Sets the capture interval, clamped to [0.5s, 2.0s].
    ///
    /// Takes effect from the next capture.
    pub fn set_interval(&self, interval: Duration) {
        let interval = interval.clamp(MIN_INTERVAL, MAX_INTERVAL);
        self.shared
            .interval_ms
            .store(interval.as_millis() as u64, Ordering::Relaxed);
    }

    /// The current capture interval.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.shared.interval_ms.load(Ordering::Relaxed))
    }

    /// Whether the capture loop is running.
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Stops the capture loop and drains pending frames.
    ///
    /// The loop observes the stop request within one capture interval; the
    /// queue never blocks it, so stopping cannot deadlock on a full queue.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        *self.shared.stop.lock() = true;
        self.shared.wakeup.notify_all();

        if worker.join().is_err() {
            log::warn!("Capture thread panicked");
        }

        self.shared.queue.lock().clear();
    }

    /// Capture statistics since the last start.
    pub fn stats(&self) -> CaptureStats {
        let captures = self.shared.captures.load(Ordering::Relaxed);
        let errors = self.shared.errors.load(Ordering::Relaxed);
        let uptime = self
            .started_at
            .map(|t| t.elapsed())
            .unwrap_or(Duration::ZERO);

        let secs = uptime.as_secs_f64();
        CaptureStats {
            captures,
            errors,
            queued: self.shared.queue.lock().len(),
            uptime,
            rate: if secs > 0.0 { captures as f64 / secs } else { 0.0 },
            running: self.worker.is_some(),
        }
    }
}

impl Drop for CaptureEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The capture thread loop.
///
/// A failed capture is counted and retried after a short backoff, it never
/// terminates the loop.
fn capture_loop(shared: &Shared, region: CaptureRegion) {
    loop {
        let wait = match shared.backend.lock().capture(&region) {
            Ok(frame) => {
                shared.captures.fetch_add(1, Ordering::Relaxed);
                shared.push(frame);
                Duration::from_millis(shared.interval_ms.load(Ordering::Relaxed))
            }
            Err(err) => {
                shared.errors.fetch_add(1, Ordering::Relaxed);
                debug!("Capture attempt failed: {err}");
                ERROR_BACKOFF
            }
        };

        let mut stop = shared.stop.lock();
        if *stop {
            break;
        }

        let _ = shared.wakeup.wait_for(&mut stop, wait);
        if *stop {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestPatternBackend;

    fn shared(capacity: usize) -> Shared {
        Shared {
            backend: Mutex::new(Box::new(TestPatternBackend::new(64, 64))),
            queue: Mutex::new(VecDeque::new()),
            capacity,
            stop: Mutex::new(false),
            wakeup: Condvar::new(),
            interval_ms: AtomicU64::new(1000),
            captures: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    fn frame(shade: u8) -> Frame {
        let region = CaptureRegion::new(0, 0, 2, 2);
        Frame::new(vec![shade; 12], 2, 2, region)
    }

    #[test]
    fn queue_drops_oldest() {
        let shared = shared(3);

        for shade in 0..10 {
            shared.push(frame(shade));
            assert!(shared.queue.lock().len() <= 3);
        }

        // The three newest frames survive in order.
        let queue = shared.queue.lock();
        let shades = queue.iter().map(|f| f.pixels[0]).collect::<Vec<_>>();
        assert_eq!(shades, vec![7, 8, 9]);
    }

    #[test]
    fn latest_returns_newest() {
        let backend = TestPatternBackend::new(64, 64);
        let mut engine = CaptureEngine::new(Box::new(backend), CaptureConfig::default());

        for shade in 0..5 {
            engine.shared.push(frame(shade));
        }

        // Newest frame wins, older ones are discarded.
        let latest = engine.latest().unwrap();
        assert_eq!(latest.pixels[0], 4);
        assert!(engine.latest().is_none());

        engine.stop();
    }

    #[test]
    fn start_stop_lifecycle() {
        let backend = TestPatternBackend::new(640, 480);
        let mut engine = CaptureEngine::new(Box::new(backend), CaptureConfig::default());
        let region = CaptureRegion::new(0, 0, 32, 32);

        assert!(!engine.is_running());
        engine.start(region).unwrap();
        assert!(engine.is_running());

        // The first capture happens as soon as the loop starts.
        thread::sleep(Duration::from_millis(50));
        let frame = engine.latest().expect("first frame captured");
        assert_eq!(frame.width, 32);

        // A second start is rejected while running.
        assert_eq!(engine.start(region), Err(CaptureError::AlreadyRunning));

        engine.stop();
        assert!(!engine.is_running());

        // Pending frames are drained on stop.
        assert!(engine.latest().is_none());

        let stats = engine.stats();
        assert!(stats.captures >= 1);
        assert!(!stats.running);
    }

    #[test]
    fn failed_captures_retry_with_backoff() {
        // Every capture attempt fails.
        let backend = TestPatternBackend::new(640, 480).fail_every(1);
        let mut engine = CaptureEngine::new(Box::new(backend), CaptureConfig::default());

        engine.start(CaptureRegion::new(0, 0, 32, 32)).unwrap();
        thread::sleep(Duration::from_millis(350));
        engine.stop();

        // The loop kept retrying on the error backoff instead of dying or
        // waiting a full interval.
        let stats = engine.stats();
        assert!(stats.errors >= 2, "errors: {}", stats.errors);
        assert_eq!(stats.captures, 0);
    }

    #[test]
    fn interval_clamped() {
        let backend = TestPatternBackend::new(640, 480);
        let engine = CaptureEngine::new(
            Box::new(backend),
            CaptureConfig {
                interval: Duration::from_millis(10),
                queue_capacity: 10,
            },
        );

        assert_eq!(engine.interval(), MIN_INTERVAL);

        engine.set_interval(Duration::from_secs(60));
        assert_eq!(engine.interval(), MAX_INTERVAL);

        engine.set_interval(Duration::from_millis(750));
        assert_eq!(engine.interval(), Duration::from_millis(750));
    }

    #[test]
    fn invalid_start_region() {
        let backend = TestPatternBackend::new(640, 480);
        let mut engine = CaptureEngine::new(Box::new(backend), CaptureConfig::default());

        let res = engine.start(CaptureRegion::new(0, 0, 0, 32));
        assert_eq!(res, Err(CaptureError::EmptyRegion));
        assert!(!engine.is_running());
    }

    #[test]
    fn capture_once_without_loop() {
        let backend = TestPatternBackend::new(640, 480);
        let engine = CaptureEngine::new(Box::new(backend), CaptureConfig::default());

        let frame = engine.capture_once(CaptureRegion::new(0, 0, 16, 16)).unwrap();
        assert_eq!(frame.pixels.len(), 16 * 16 * 3);
    }
}
