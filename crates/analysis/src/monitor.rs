// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Latency and accuracy monitoring.
use ahash::AHashMap;
use log::warn;
use serde::Serialize;
use std::{collections::VecDeque, fmt, time::Duration};

/// Number of recent samples behind the trend metrics.
const WINDOW: usize = 100;

/// The performance targets the pipeline is graded against.
#[derive(Debug, Clone, Copy)]
pub struct PerfTargets {
    /// End to end budget for one analysis cycle.
    pub max_latency: Duration,
    /// Required detection and analysis accuracy.
    pub min_accuracy: f64,
}

impl Default for PerfTargets {
    fn default() -> Self {
        Self {
            max_latency: Duration::from_millis(500),
            min_accuracy: 0.995,
        }
    }
}

/// Rolling performance grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    /// Exceeds all targets.
    APlus,
    /// Meets the targets.
    A,
    /// Acceptable.
    B,
    /// Needs improvement.
    C,
    /// Below standards.
    D,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grade = match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        };

        write!(f, "{grade}")
    }
}

/// Per component aggregates.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ComponentReport {
    /// Operations recorded for the component.
    pub operations: u64,
    /// Average latency in milliseconds.
    pub avg_latency_ms: f64,
    /// Average reported accuracy, 1.0 when never reported.
    pub accuracy: f64,
    /// Failed operations over total.
    pub error_rate: f64,
}

/// A point in time performance summary.
#[derive(Debug, Clone, Serialize)]
pub struct PerfReport {
    /// Total recorded operations.
    pub operations: u64,
    /// Successful operations over total.
    pub success_rate: f64,
    /// Average latency over all operations in milliseconds.
    pub avg_latency_ms: f64,
    /// Average latency over the recent window in milliseconds.
    pub recent_latency_ms: f64,
    /// Average accuracy over the recent window.
    pub recent_accuracy: f64,
    /// Whether the recent latency meets the target.
    pub meets_latency_target: bool,
    /// Whether the recent accuracy meets the target.
    pub meets_accuracy_target: bool,
    /// The rolling grade.
    pub grade: Grade,
    /// Aggregates per component.
    pub components: AHashMap<String, ComponentReport>,
}

#[derive(Debug, Default)]
struct ComponentStats {
    operations: u64,
    errors: u64,
    total_latency: Duration,
    accuracy_sum: f64,
    accuracy_samples: u64,
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    latency: Duration,
    accuracy: f64,
}

/// Tracks per component latency and accuracy against the pipeline targets.
///
/// Target misses are logged as warnings and lower the rolling grade, they
/// never block the pipeline output.
#[derive(Debug, Default)]
pub struct PerfMonitor {
    targets: PerfTargets,
    window: VecDeque<Sample>,
    components: AHashMap<String, ComponentStats>,
    operations: u64,
    successes: u64,
    total_latency: Duration,
}

impl PerfMonitor {
    /// Creates a monitor with the given targets.
    pub fn new(targets: PerfTargets) -> Self {
        Self {
            targets,
            ..Self::default()
        }
    }

    /// The targets this monitor grades against.
    pub fn targets(&self) -> &PerfTargets {
        &self.targets
    }

    /// Records one operation.
    pub fn record(
        &mut self,
        component: &str,
        latency: Duration,
        accuracy: Option<f64>,
        success: bool,
    ) {
        self.operations += 1;
        if success {
            self.successes += 1;
        }
        self.total_latency += latency;

        if self.window.len() == WINDOW {
            self.window.pop_front();
        }
        self.window.push_back(Sample {
            latency,
            accuracy: accuracy.unwrap_or(1.0),
        });

        let stats = self.components.entry(component.to_string()).or_default();
        stats.operations += 1;
        stats.total_latency += latency;
        if !success {
            stats.errors += 1;
        }
        if let Some(accuracy) = accuracy {
            stats.accuracy_sum += accuracy;
            stats.accuracy_samples += 1;
        }

        if latency > self.targets.max_latency {
            warn!(
                "{component} latency {}ms exceeds the {}ms target",
                latency.as_millis(),
                self.targets.max_latency.as_millis()
            );
        }

        if let Some(accuracy) = accuracy {
            if accuracy < self.targets.min_accuracy {
                warn!(
                    "{component} accuracy {accuracy:.3} below the {:.3} target",
                    self.targets.min_accuracy
                );
            }
        }
    }

    /// Number of recorded operations.
    pub fn operations(&self) -> u64 {
        self.operations
    }

    /// Builds a summary of the recorded metrics.
    pub fn report(&self) -> PerfReport {
        let avg_latency_ms = if self.operations > 0 {
            self.total_latency.as_secs_f64() * 1_000.0 / self.operations as f64
        } else {
            0.0
        };

        let (recent_latency_ms, recent_accuracy) = if self.window.is_empty() {
            (0.0, 1.0)
        } else {
            let count = self.window.len() as f64;
            let latency = self
                .window
                .iter()
                .map(|s| s.latency.as_secs_f64())
                .sum::<f64>()
                * 1_000.0
                / count;
            let accuracy = self.window.iter().map(|s| s.accuracy).sum::<f64>() / count;
            (latency, accuracy)
        };

        let components = self
            .components
            .iter()
            .map(|(name, stats)| {
                let ops = stats.operations.max(1) as f64;
                (
                    name.clone(),
                    ComponentReport {
                        operations: stats.operations,
                        avg_latency_ms: stats.total_latency.as_secs_f64() * 1_000.0 / ops,
                        accuracy: if stats.accuracy_samples > 0 {
                            stats.accuracy_sum / stats.accuracy_samples as f64
                        } else {
                            1.0
                        },
                        error_rate: stats.errors as f64 / ops,
                    },
                )
            })
            .collect();

        let target_ms = self.targets.max_latency.as_secs_f64() * 1_000.0;
        let target_accuracy = self.targets.min_accuracy;
        let grade = grade(recent_latency_ms, recent_accuracy, target_ms, target_accuracy);

        PerfReport {
            operations: self.operations,
            success_rate: if self.operations > 0 {
                self.successes as f64 / self.operations as f64
            } else {
                1.0
            },
            avg_latency_ms,
            recent_latency_ms,
            recent_accuracy,
            meets_latency_target: recent_latency_ms <= target_ms,
            meets_accuracy_target: recent_accuracy >= target_accuracy,
            grade,
            components,
        }
    }

    /// Clears all recorded metrics.
    pub fn reset(&mut self) {
        self.window.clear();
        self.components.clear();
        self.operations = 0;
        self.successes = 0;
        self.total_latency = Duration::ZERO;
    }
}

fn grade(latency_ms: f64, accuracy: f64, target_ms: f64, target_accuracy: f64) -> Grade {
    if latency_ms <= target_ms && accuracy >= target_accuracy {
        Grade::APlus
    } else if latency_ms <= target_ms * 1.1 && accuracy >= target_accuracy * 0.99 {
        Grade::A
    } else if latency_ms <= target_ms * 1.25 && accuracy >= target_accuracy * 0.95 {
        Grade::B
    } else if latency_ms <= target_ms * 1.5 && accuracy >= target_accuracy * 0.90 {
        Grade::C
    } else {
        Grade::D
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grades_follow_targets() {
        let mut monitor = PerfMonitor::default();

        for _ in 0..10 {
            monitor.record("analysis", Duration::from_millis(120), Some(0.999), true);
        }

        let report = monitor.report();
        assert_eq!(report.operations, 10);
        assert_eq!(report.success_rate, 1.0);
        assert!(report.meets_latency_target);
        assert!(report.meets_accuracy_target);
        assert_eq!(report.grade, Grade::APlus);
    }

    #[test]
    fn slow_cycles_lower_the_grade() {
        let mut monitor = PerfMonitor::default();

        for _ in 0..10 {
            monitor.record("analysis", Duration::from_millis(900), Some(0.999), true);
        }

        let report = monitor.report();
        assert!(!report.meets_latency_target);
        assert_eq!(report.grade, Grade::D);
    }

    #[test]
    fn inaccurate_cycles_lower_the_grade() {
        let mut monitor = PerfMonitor::default();

        for _ in 0..10 {
            monitor.record("detection", Duration::from_millis(50), Some(0.96), true);
        }

        let report = monitor.report();
        assert!(!report.meets_accuracy_target);
        assert_eq!(report.grade, Grade::B);
    }

    #[test]
    fn component_aggregates() {
        let mut monitor = PerfMonitor::default();

        monitor.record("capture", Duration::from_millis(10), None, true);
        monitor.record("capture", Duration::from_millis(30), None, false);
        monitor.record("analysis", Duration::from_millis(200), Some(0.99), true);

        let report = monitor.report();
        assert_eq!(report.operations, 3);
        assert!((report.success_rate - 2.0 / 3.0).abs() < 1e-9);

        let capture = &report.components["capture"];
        assert_eq!(capture.operations, 2);
        assert!((capture.avg_latency_ms - 20.0).abs() < 1e-9);
        assert!((capture.error_rate - 0.5).abs() < 1e-9);
        // Never reported accuracy defaults to full marks.
        assert_eq!(capture.accuracy, 1.0);

        let analysis = &report.components["analysis"];
        assert_eq!(analysis.operations, 1);
        assert!((analysis.accuracy - 0.99).abs() < 1e-9);
    }

    #[test]
    fn window_is_bounded() {
        let mut monitor = PerfMonitor::default();

        // Old slow samples age out of the trend window.
        for _ in 0..WINDOW {
            monitor.record("analysis", Duration::from_secs(2), Some(0.5), true);
        }
        for _ in 0..WINDOW {
            monitor.record("analysis", Duration::from_millis(100), Some(1.0), true);
        }

        let report = monitor.report();
        assert!((report.recent_latency_ms - 100.0).abs() < 1.0);
        assert_eq!(report.grade, Grade::APlus);
    }

    #[test]
    fn reset_clears_metrics() {
        let mut monitor = PerfMonitor::default();
        monitor.record("analysis", Duration::from_millis(100), None, true);
        monitor.reset();

        let report = monitor.report();
        assert_eq!(report.operations, 0);
        assert_eq!(report.grade, Grade::APlus);
    }
}
