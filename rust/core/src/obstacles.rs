// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Obstacle vocabulary, detection thresholds and categories

use crate::config::ClassMap;
use crate::sizing::ClassPresence;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Obstacle classes in detection order with their minimum pixel counts
pub const OBSTACLE_THRESHOLDS: &[(&str, usize)] = &[
    ("car", 100),
    ("truck", 100),
    ("motorcycle", 50),
    ("bicycle", 30),
    ("pole", 20),
    ("fire_hydrant", 15),
    ("potted_plant", 25),
    ("chair", 20),
    ("bench", 30),
    ("barrier", 40),
    ("person", 50),
    ("traffic_sign", 15),
];

pub const FIXED_OBSTACLES: &[&str] = &["pole", "fire_hydrant", "barrier", "traffic_sign"];
pub const MOVABLE_OBSTACLES: &[&str] = &[
    "car",
    "truck",
    "motorcycle",
    "bicycle",
    "chair",
    "potted_plant",
];
pub const TEMPORARY_OBSTACLES: &[&str] = &["person", "bench"];

/// How permanent an obstacle is
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleCategory {
    Fixed,
    Movable,
    Temporary,
    Unknown,
}

impl ObstacleCategory {
    pub fn of(name: &str) -> Self {
        if FIXED_OBSTACLES.contains(&name) {
            ObstacleCategory::Fixed
        } else if MOVABLE_OBSTACLES.contains(&name) {
            ObstacleCategory::Movable
        } else if TEMPORARY_OBSTACLES.contains(&name) {
            ObstacleCategory::Temporary
        } else {
            ObstacleCategory::Unknown
        }
    }
}

/// Minimum pixel count for a catalog obstacle, `None` if not catalogued
pub fn threshold_for(name: &str) -> Option<usize> {
    OBSTACLE_THRESHOLDS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, t)| t)
}

/// One detected obstacle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleRecord {
    pub name: String,
    pub pixel_count: usize,
    pub ratio: f64,
    pub category: ObstacleCategory,
}

/// Obstacles found in one segmentation map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObstacleScan {
    /// Names in catalog order
    pub names: Vec<String>,
    pub records: BTreeMap<String, ObstacleRecord>,
}

impl ObstacleScan {
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Run the catalog against a class histogram.
///
/// `histogram` maps class id to pixel count and `total_cells` is the size of
/// the segmentation map. Catalog names missing from the class map are skipped.
pub fn detect_obstacles(
    class_map: &ClassMap,
    histogram: &FxHashMap<u32, usize>,
    total_cells: usize,
) -> ObstacleScan {
    let mut scan = ObstacleScan::default();

    for &(name, min_pixels) in OBSTACLE_THRESHOLDS {
        let Some(id) = class_map.id(name) else {
            continue;
        };
        let count = histogram.get(&id).copied().unwrap_or(0);
        if count == 0 || count < min_pixels {
            continue;
        }

        let presence = ClassPresence::from_count(count, total_cells);
        tracing::debug!(obstacle = name, pixels = count, ratio = presence.ratio, "Obstacle detected");

        scan.names.push(name.to_string());
        scan.records.insert(
            name.to_string(),
            ObstacleRecord {
                name: name.to_string(),
                pixel_count: count,
                ratio: presence.ratio,
                category: ObstacleCategory::of(name),
            },
        );
    }

    scan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::SegmentationMap;

    fn obstacle_class_map() -> ClassMap {
        ClassMap::new([("car", 20), ("pole", 93), ("person", 12), ("bench", 69)]).unwrap()
    }

    #[test]
    fn test_threshold_table() {
        let expected = [
            ("car", 100),
            ("truck", 100),
            ("motorcycle", 50),
            ("bicycle", 30),
            ("pole", 20),
            ("fire_hydrant", 15),
            ("potted_plant", 25),
            ("chair", 20),
            ("bench", 30),
            ("barrier", 40),
            ("person", 50),
            ("traffic_sign", 15),
        ];
        assert_eq!(OBSTACLE_THRESHOLDS, &expected);
        for (name, threshold) in expected {
            assert_eq!(threshold_for(name), Some(threshold));
        }
        assert_eq!(threshold_for("stairs"), None);
    }

    #[test]
    fn test_categories() {
        for &(name, _) in OBSTACLE_THRESHOLDS {
            assert_ne!(ObstacleCategory::of(name), ObstacleCategory::Unknown, "{}", name);
        }
        assert_eq!(ObstacleCategory::of("pole"), ObstacleCategory::Fixed);
        assert_eq!(ObstacleCategory::of("truck"), ObstacleCategory::Movable);
        assert_eq!(ObstacleCategory::of("bench"), ObstacleCategory::Temporary);
        assert_eq!(ObstacleCategory::of("kiosk"), ObstacleCategory::Unknown);
    }

    #[test]
    fn test_detect_in_catalog_order() {
        let mut map = SegmentationMap::filled(50, 50, 0).unwrap();
        map.fill_rect(0, 0, 5, 4, 93); // 20 pole pixels
        map.fill_rect(10, 10, 30, 15, 20); // 100 car pixels

        let scan = detect_obstacles(&obstacle_class_map(), &map.histogram(), map.len());
        assert_eq!(scan.names, vec!["car", "pole"]);
        assert_eq!(scan.records["car"].category, ObstacleCategory::Movable);
        assert_eq!(scan.records["pole"].category, ObstacleCategory::Fixed);
        assert_eq!(scan.records["car"].pixel_count, 100);
        assert!((scan.records["pole"].ratio - 20.0 / 2500.0).abs() < 1e-12);
    }

    #[test]
    fn test_below_threshold_ignored() {
        let mut map = SegmentationMap::filled(50, 50, 0).unwrap();
        map.fill_rect(0, 0, 7, 7, 12); // 49 person pixels, threshold 50
        map.fill_rect(20, 20, 26, 25, 69); // 30 bench pixels, threshold 30

        let scan = detect_obstacles(&obstacle_class_map(), &map.histogram(), map.len());
        assert_eq!(scan.names, vec!["bench"]);
        assert_eq!(scan.records["bench"].category, ObstacleCategory::Temporary);
    }
}
