// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Card detection types.
use serde::{Deserialize, Serialize};
use std::fmt;

use tablesight_capture::Frame;
use tablesight_cards::Card;

/// A point in frame pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal pixel coordinate.
    pub x: f64,
    /// Vertical pixel coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis aligned bounding box in frame pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge pixel coordinate.
    pub x: f64,
    /// Top edge pixel coordinate.
    pub y: f64,
    /// Box width in pixels.
    pub width: f64,
    /// Box height in pixels.
    pub height: f64,
}

impl BoundingBox {
    /// Creates a new bounding box.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A box of the given size centered on a point.
    pub fn centered(center: Point, width: f64, height: f64) -> Self {
        Self {
            x: center.x - width / 2.0,
            y: center.y - height / 2.0,
            width,
            height,
        }
    }

    /// The center of this box.
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// The area of this box.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Intersection over union with another box, 0.0 when disjoint.
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);

        if left >= right || top >= bottom {
            return 0.0;
        }

        let intersection = (right - left) * (bottom - top);
        let union = self.area() + other.area() - intersection;
        if union > 0.0 { intersection / union } else { 0.0 }
    }
}

/// The detection strategy that produced an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectorKind {
    /// Multi-scale template matching.
    Template,
    /// Learned object detection model.
    Model,
    /// Consensus of more than one strategy.
    Hybrid,
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            DetectorKind::Template => "template",
            DetectorKind::Model => "model",
            DetectorKind::Hybrid => "hybrid",
        };

        write!(f, "{kind}")
    }
}

/// A single card observation produced by a detection strategy for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// The observed card.
    pub card: Card,
    /// Detection confidence in [0, 1].
    pub confidence: f64,
    /// Center of the observation in frame coordinates.
    pub center: Point,
    /// Bounding box of the observation.
    pub bbox: BoundingBox,
    /// The strategy that produced this observation.
    pub kind: DetectorKind,
}

impl Detection {
    /// Card dimensions used when a strategy reports only a center point.
    const CARD_WIDTH: f64 = 60.0;
    const CARD_HEIGHT: f64 = 84.0;

    /// Creates a detection with a bounding box derived from the center.
    pub fn new(card: Card, confidence: f64, center: Point, kind: DetectorKind) -> Self {
        Self {
            card,
            confidence,
            center,
            bbox: BoundingBox::centered(center, Self::CARD_WIDTH, Self::CARD_HEIGHT),
            kind,
        }
    }

    /// Creates a detection with an explicit bounding box.
    pub fn with_bbox(
        card: Card,
        confidence: f64,
        center: Point,
        bbox: BoundingBox,
        kind: DetectorKind,
    ) -> Self {
        Self {
            card,
            confidence,
            center,
            bbox,
            kind,
        }
    }
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.3}) via {}", self.card, self.confidence, self.kind)
    }
}

/// A card detection strategy.
///
/// Implementations scan a captured frame and report every card they observe;
/// observations from all active strategies for one frame are merged by
/// [DetectionFusion](crate::DetectionFusion).
pub trait CardDetector: Send {
    /// The strategy tag stamped on this detector observations.
    fn kind(&self) -> DetectorKind;

    /// Detects cards in a frame.
    fn detect(&mut self, frame: &Frame) -> Vec<Detection>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_iou() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);

        // Identical boxes.
        assert!((a.iou(&a) - 1.0).abs() < 1e-9);

        // Half overlap along one axis.
        let b = BoundingBox::new(5.0, 0.0, 10.0, 10.0);
        assert!((a.iou(&b) - 50.0 / 150.0).abs() < 1e-9);

        // Disjoint boxes.
        let c = BoundingBox::new(20.0, 20.0, 10.0, 10.0);
        assert_eq!(a.iou(&c), 0.0);

        // Touching edges do not intersect.
        let d = BoundingBox::new(10.0, 0.0, 10.0, 10.0);
        assert_eq!(a.iou(&d), 0.0);
    }

    #[test]
    fn bbox_centered() {
        let bbox = BoundingBox::centered(Point::new(50.0, 50.0), 20.0, 10.0);
        assert_eq!(bbox.x, 40.0);
        assert_eq!(bbox.y, 45.0);
        assert_eq!(bbox.center(), Point::new(50.0, 50.0));
    }
}
