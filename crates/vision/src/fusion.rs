// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Consensus fusion of card detections.
use serde::{Deserialize, Serialize};

use crate::{Detection, DetectorKind, Point};

/// Detection fusion parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Detections below this confidence are dropped before grouping.
    pub min_confidence: f64,
    /// Observations of the same card within this distance agree.
    pub proximity_px: f64,
    /// Confidence added for each extra agreeing observation.
    pub consensus_boost: f64,
    /// Overlap above this ratio suppresses the lower confidence detection.
    pub iou_threshold: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.7,
            proximity_px: 50.0,
            consensus_boost: 0.1,
            iou_threshold: 0.5,
        }
    }
}

/// Merges the observations of every active detection strategy for one frame
/// into a deduplicated, confidence boosted list.
#[derive(Debug, Clone, Default)]
pub struct DetectionFusion {
    config: FusionConfig,
}

impl DetectionFusion {
    /// Creates a fusion layer with the given parameters.
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    /// The fusion parameters.
    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Fuses the detections of all strategies for one frame.
    ///
    /// Observations of the same card whose centers fall within the proximity
    /// threshold are merged into one consensus detection positioned at the
    /// mean of the members, with the best member confidence boosted for each
    /// extra agreeing observation and capped at 1.0. The output is sorted by
    /// descending confidence.
    pub fn fuse(&self, detections: Vec<Detection>) -> Vec<Detection> {
        let mut groups: Vec<Vec<Detection>> = Vec::new();

        for detection in detections {
            if detection.confidence < self.config.min_confidence {
                continue;
            }

            // Nearest-fit assignment: a detection joins the first group with
            // a member it agrees with.
            let group = groups.iter_mut().find(|group| {
                group.iter().any(|other| {
                    other.card == detection.card
                        && (other.center.x - detection.center.x).abs() < self.config.proximity_px
                        && (other.center.y - detection.center.y).abs() < self.config.proximity_px
                })
            });

            match group {
                Some(group) => group.push(detection),
                None => groups.push(vec![detection]),
            }
        }

        let mut fused = groups
            .into_iter()
            .map(|group| self.consensus(group))
            .collect::<Vec<_>>();

        fused.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        fused
    }

    /// Non-maximum suppression for a single strategy list.
    ///
    /// Candidates are processed in descending confidence order, dropping any
    /// detection whose box overlaps an already accepted one beyond the IoU
    /// threshold. Returns the survivors sorted by descending confidence.
    pub fn suppress(&self, mut detections: Vec<Detection>) -> Vec<Detection> {
        detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        let mut accepted: Vec<Detection> = Vec::with_capacity(detections.len());
        for detection in detections {
            let overlaps = accepted
                .iter()
                .any(|a| a.bbox.iou(&detection.bbox) > self.config.iou_threshold);
            if !overlaps {
                accepted.push(detection);
            }
        }

        accepted
    }

    /// Collapses a group of agreeing observations into one detection.
    fn consensus(&self, mut group: Vec<Detection>) -> Detection {
        if group.len() == 1 {
            return group.remove(0);
        }

        let size = group.len();
        let mean_x = group.iter().map(|d| d.center.x).sum::<f64>() / size as f64;
        let mean_y = group.iter().map(|d| d.center.y).sum::<f64>() / size as f64;

        let mixed = group.iter().any(|d| d.kind != group[0].kind);

        let best = group
            .into_iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
            .expect("consensus group is not empty");

        Detection {
            confidence: (best.confidence + (size - 1) as f64 * self.config.consensus_boost)
                .min(1.0),
            center: Point::new(mean_x, mean_y),
            kind: if mixed { DetectorKind::Hybrid } else { best.kind },
            ..best
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoundingBox;
    use tablesight_cards::{Card, Rank, Suit};

    fn det(card: Card, confidence: f64, x: f64, y: f64, kind: DetectorKind) -> Detection {
        Detection::new(card, confidence, Point::new(x, y), kind)
    }

    #[test]
    fn empty_input() {
        let fusion = DetectionFusion::default();
        assert!(fusion.fuse(Vec::new()).is_empty());
        assert!(fusion.suppress(Vec::new()).is_empty());
    }

    #[test]
    fn agreeing_detections_merge() {
        let ah = Card::new(Rank::Ace, Suit::Hearts);
        let fusion = DetectionFusion::default();

        let fused = fusion.fuse(vec![
            det(ah, 0.80, 100.0, 100.0, DetectorKind::Template),
            det(ah, 0.90, 106.0, 102.0, DetectorKind::Model),
        ]);

        assert_eq!(fused.len(), 1);
        let consensus = &fused[0];
        assert_eq!(consensus.card, ah);
        assert_eq!(consensus.kind, DetectorKind::Hybrid);
        // Best member confidence boosted once.
        assert!((consensus.confidence - 1.0f64.min(0.90 + 0.1)).abs() < 1e-9);
        assert!(consensus.confidence >= 0.90);
        // Mean of the member centers.
        assert!((consensus.center.x - 103.0).abs() < 1e-9);
        assert!((consensus.center.y - 101.0).abs() < 1e-9);
    }

    #[test]
    fn consensus_confidence_caps_at_one() {
        let kd = Card::new(Rank::King, Suit::Diamonds);
        let fusion = DetectionFusion::default();

        let fused = fusion.fuse(vec![
            det(kd, 0.95, 10.0, 10.0, DetectorKind::Template),
            det(kd, 0.96, 12.0, 10.0, DetectorKind::Template),
            det(kd, 0.97, 14.0, 10.0, DetectorKind::Template),
        ]);

        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].confidence, 1.0);
        // All members from one strategy keep its tag.
        assert_eq!(fused[0].kind, DetectorKind::Template);
    }

    #[test]
    fn different_cards_never_merge() {
        let ah = Card::new(Rank::Ace, Suit::Hearts);
        let ad = Card::new(Rank::Ace, Suit::Diamonds);
        let fusion = DetectionFusion::default();

        // Same position but different identity.
        let fused = fusion.fuse(vec![
            det(ah, 0.80, 100.0, 100.0, DetectorKind::Template),
            det(ad, 0.90, 100.0, 100.0, DetectorKind::Model),
        ]);

        assert_eq!(fused.len(), 2);
        // Sorted by descending confidence.
        assert_eq!(fused[0].card, ad);
        assert_eq!(fused[1].card, ah);
    }

    #[test]
    fn distant_detections_stay_separate() {
        let qs = Card::new(Rank::Queen, Suit::Spades);
        let fusion = DetectionFusion::default();

        let fused = fusion.fuse(vec![
            det(qs, 0.80, 100.0, 100.0, DetectorKind::Template),
            det(qs, 0.85, 200.0, 100.0, DetectorKind::Model),
        ]);

        assert_eq!(fused.len(), 2);
    }

    #[test]
    fn low_confidence_filtered() {
        let ah = Card::new(Rank::Ace, Suit::Hearts);
        let fusion = DetectionFusion::default();

        let fused = fusion.fuse(vec![
            det(ah, 0.69, 100.0, 100.0, DetectorKind::Template),
            det(ah, 0.75, 104.0, 100.0, DetectorKind::Model),
        ]);

        // Only the detection above the threshold survives, unmerged.
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].confidence, 0.75);
        assert_eq!(fused[0].kind, DetectorKind::Model);
    }

    #[test]
    fn suppress_overlapping() {
        let ah = Card::new(Rank::Ace, Suit::Hearts);
        let kd = Card::new(Rank::King, Suit::Diamonds);
        let fusion = DetectionFusion::default();

        let bbox = BoundingBox::new(100.0, 100.0, 60.0, 84.0);
        let shifted = BoundingBox::new(105.0, 100.0, 60.0, 84.0);
        let far = BoundingBox::new(300.0, 100.0, 60.0, 84.0);

        let survivors = fusion.suppress(vec![
            Detection::with_bbox(ah, 0.80, bbox.center(), bbox, DetectorKind::Template),
            Detection::with_bbox(kd, 0.90, shifted.center(), shifted, DetectorKind::Template),
            Detection::with_bbox(ah, 0.75, far.center(), far, DetectorKind::Template),
        ]);

        // The overlapping lower confidence detection is suppressed.
        assert_eq!(survivors.len(), 2);
        assert_eq!(survivors[0].card, kd);
        assert_eq!(survivors[1].bbox, far);
    }
}
