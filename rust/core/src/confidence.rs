// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Detection confidence from region size and shape

use crate::config::ClassMap;
use crate::error::Result;
use crate::mask_ops::{largest_component, Component};
use crate::segmentation::{BinaryMask, SegmentationMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Classes that receive a detection confidence, in reporting order
pub const TRACKED_CLASSES: &[&str] = &["stairs", "door", "building", "sidewalk"];

/// Ratio multiplier for the size term; 1% of the frame saturates it
pub const SIZE_CONFIDENCE_SCALE: f64 = 100.0;
/// Height/width ratio at which a door is fully vertical
pub const IDEAL_DOOR_ASPECT: f64 = 2.0;

pub const HIGH_RELIABILITY: f64 = 0.8;
pub const MEDIUM_RELIABILITY: f64 = 0.5;

/// Qualitative trust in the whole detection set
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Reliability {
    Low,
    Medium,
    High,
}

impl Reliability {
    pub fn from_mean(mean: f64) -> Self {
        if mean > HIGH_RELIABILITY {
            Reliability::High
        } else if mean > MEDIUM_RELIABILITY {
            Reliability::Medium
        } else {
            Reliability::Low
        }
    }
}

/// Per-class confidences keyed `"{class}_detection"` plus the overall label
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScores {
    #[serde(flatten)]
    pub detections: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_reliability: Option<Reliability>,
}

impl ConfidenceScores {
    pub fn get(&self, class_name: &str) -> Option<f64> {
        self.detections.get(&detection_key(class_name)).copied()
    }
}

pub fn detection_key(class_name: &str) -> String {
    format!("{}_detection", class_name)
}

/// Shape score of the largest component for one class
pub fn shape_confidence(mask: &BinaryMask, class_name: &str) -> Result<f64> {
    let Some(largest) = largest_component(mask)? else {
        return Ok(0.0);
    };

    let score = match class_name {
        "stairs" => largest.rectangularity(),
        "door" => (verticality(&largest) + largest.rectangularity()) / 2.0,
        _ => (largest.area as f64 / mask.count() as f64).min(1.0),
    };
    Ok(score)
}

fn verticality(component: &Component) -> f64 {
    let aspect = component.height() as f64 / component.width() as f64;
    (aspect / IDEAL_DOOR_ASPECT).min(1.0)
}

/// Combined size and shape confidence for one class mask; 0 for an empty mask
pub fn class_confidence(mask: &BinaryMask, class_name: &str) -> Result<f64> {
    if mask.is_empty() {
        return Ok(0.0);
    }
    let size = (mask.ratio() * SIZE_CONFIDENCE_SCALE).min(1.0);
    let shape = shape_confidence(mask, class_name)?;
    Ok((size + shape) / 2.0)
}

/// Confidence for every tracked class the class map knows about.
///
/// A class whose shape analysis fails is scored as absent.
pub fn confidence_scores(seg: &SegmentationMap, class_map: &ClassMap) -> ConfidenceScores {
    let mut detections = BTreeMap::new();

    for &class_name in TRACKED_CLASSES {
        let Some(id) = class_map.id(class_name) else {
            continue;
        };
        let mask = seg.mask(id);
        let confidence = class_confidence(&mask, class_name).unwrap_or_else(|e| {
            tracing::warn!(class = class_name, error = %e, "Shape confidence failed, scoring as absent");
            0.0
        });
        detections.insert(detection_key(class_name), confidence);
    }

    let overall_reliability = if detections.is_empty() {
        None
    } else {
        let mean = detections.values().sum::<f64>() / detections.len() as f64;
        Some(Reliability::from_mean(mean))
    };

    ConfidenceScores {
        detections,
        overall_reliability,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn map_with(rects: &[(usize, usize, usize, usize, u32)]) -> SegmentationMap {
        let mut map = SegmentationMap::filled(100, 100, 0).unwrap();
        for &(x0, y0, x1, y1, id) in rects {
            map.fill_rect(x0, y0, x1, y1, id);
        }
        map
    }

    #[test]
    fn test_stairs_rectangularity() {
        // Solid 20x5 block: ratio 0.01 saturates size, rectangularity 1
        let map = map_with(&[(10, 10, 30, 15, 53)]);
        assert_relative_eq!(class_confidence(&map.mask(53), "stairs").unwrap(), 1.0);
    }

    #[test]
    fn test_door_verticality() {
        // 10 wide, 10 tall: ratio 0.01 -> size 1, verticality 0.5, rect 1
        let map = map_with(&[(0, 0, 10, 10, 14)]);
        let shape = shape_confidence(&map.mask(14), "door").unwrap();
        assert_relative_eq!(shape, 0.75);
        assert_relative_eq!(class_confidence(&map.mask(14), "door").unwrap(), 0.875);

        // 5 wide, 20 tall: fully vertical
        let map = map_with(&[(0, 0, 5, 20, 14)]);
        assert_relative_eq!(shape_confidence(&map.mask(14), "door").unwrap(), 1.0);
    }

    #[test]
    fn test_connectivity_for_other_classes() {
        // Building split into 60 + 40 pixel parts
        let map = map_with(&[(0, 0, 10, 6, 1), (50, 50, 60, 54, 1)]);
        assert_relative_eq!(shape_confidence(&map.mask(1), "building").unwrap(), 0.6);
    }

    #[test]
    fn test_absent_classes_zero() {
        let map = map_with(&[]);
        let scores = confidence_scores(&map, &ClassMap::default());
        assert_eq!(scores.detections.len(), 4);
        for &class_name in TRACKED_CLASSES {
            assert_eq!(scores.get(class_name), Some(0.0));
        }
        assert_eq!(scores.overall_reliability, Some(Reliability::Low));
    }

    #[test]
    fn test_untracked_class_map() {
        let map = map_with(&[]);
        let class_map = ClassMap::new([("car", 20)]).unwrap();
        let scores = confidence_scores(&map, &class_map);
        assert!(scores.detections.is_empty());
        assert!(scores.overall_reliability.is_none());
    }

    #[test]
    fn test_reliability_bands() {
        assert_eq!(Reliability::from_mean(0.81), Reliability::High);
        assert_eq!(Reliability::from_mean(0.8), Reliability::Medium);
        assert_eq!(Reliability::from_mean(0.51), Reliability::Medium);
        assert_eq!(Reliability::from_mean(0.5), Reliability::Low);
    }

    #[test]
    fn test_serialized_shape() {
        let map = map_with(&[(10, 10, 30, 15, 53)]);
        let scores = confidence_scores(&map, &ClassMap::default());
        let json = serde_json::to_value(&scores).unwrap();
        assert_eq!(json["stairs_detection"], 1.0);
        assert_eq!(json["door_detection"], 0.0);
        assert_eq!(json["overall_reliability"], "low");
    }
}
