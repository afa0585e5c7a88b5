// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Accessibility analysis of one segmentation map
//!
//! The analyzer derives class masks, measures them, relates stairs, doors,
//! sidewalk and railing by pixel distance and folds the results into an
//! [`AccessibilityInfo`] whose score is computed last.

use crate::config::AnalyzerConfig;
use crate::confidence::confidence_scores;
use crate::error::{Error, Result};
use crate::obstacles::detect_obstacles;
use crate::relation::min_distance;
use crate::segmentation::{BinaryMask, SegmentationMap};
use crate::sizing::{ClassPresence, DoorWidth};
use crate::stairs::{estimate_stair_count, stair_segments, StairSegment, StairSeverity};
use crate::scoring::accessibility_score;
use crate::types::{
    AccessibilityInfo, ObstacleDetail, RegionDetail, DISCONNECTED_SIDEWALK,
    RAILING_TO_STAIRS_DISTANCE, SIDEWALK_TO_DOOR_DISTANCE, STAIRS_AT_ENTRANCE,
    STAIRS_TO_DOOR_DISTANCE,
};
use rand::Rng;

/// Stateless analyzer over an immutable configuration
#[derive(Debug, Clone)]
pub struct AccessibilityAnalyzer {
    config: AnalyzerConfig,
}

/// Mask and measurements of one named class
struct ClassRegion {
    mask: BinaryMask,
    presence: ClassPresence,
}

impl ClassRegion {
    fn is_present(&self) -> bool {
        self.presence.is_present()
    }
}

impl AccessibilityAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze with the thread-local generator
    pub fn analyze(&self, seg: &SegmentationMap) -> Result<AccessibilityInfo> {
        self.analyze_with_rng(seg, &mut rand::thread_rng())
    }

    /// Analyze with a caller-supplied generator; a seeded generator makes
    /// the distance estimates and therefore the whole bundle repeatable
    pub fn analyze_with_rng<R: Rng + ?Sized>(
        &self,
        seg: &SegmentationMap,
        rng: &mut R,
    ) -> Result<AccessibilityInfo> {
        self.check_dimensions(seg)?;

        let threshold = self.config.threshold_distance;
        let samples = self.config.max_distance_samples;
        let mut info = AccessibilityInfo::default();

        let histogram = seg.histogram();
        let region = |name: &str| -> ClassRegion {
            match self.config.class_map.id(name) {
                Some(id) => {
                    let count = histogram.get(&id).copied().unwrap_or(0);
                    ClassRegion {
                        mask: seg.mask(id),
                        presence: ClassPresence::from_count(count, seg.len()),
                    }
                }
                None => ClassRegion {
                    mask: seg.empty_mask(),
                    presence: ClassPresence::from_count(0, seg.len()),
                },
            }
        };

        let stairs = region("stairs");
        if stairs.is_present() {
            info.has_stairs = true;
            info.obstacles.push("stairs".to_string());

            let count = estimate_stair_count(&stairs.mask).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Stair count failed, treating as no steps");
                0
            });
            let severity = StairSeverity::grade(count, stairs.presence.ratio);
            info.stair_severity = severity;
            info.obstacle_details.insert(
                "stairs".to_string(),
                ObstacleDetail::Region(RegionDetail {
                    pixel_count: stairs.presence.pixel_count,
                    ratio: stairs.presence.ratio,
                    estimated_size: Some(stairs.presence.size_bucket()),
                    estimated_count: Some(count),
                    stair_severity: Some(severity),
                    ..Default::default()
                }),
            );
        }

        let scan = detect_obstacles(&self.config.class_map, &histogram, seg.len());
        for name in &scan.names {
            info.obstacle_details
                .insert(name.clone(), ObstacleDetail::Region((&scan.records[name]).into()));
        }
        info.obstacles.extend(scan.names.iter().cloned());
        info.additional_obstacles = scan.names;

        let door = region("door");
        if door.is_present() {
            info.has_door = true;
            info.obstacle_details.insert(
                "door".to_string(),
                ObstacleDetail::Region(RegionDetail {
                    pixel_count: door.presence.pixel_count,
                    ratio: door.presence.ratio,
                    estimated_width: Some(DoorWidth::from_ratio(door.presence.ratio)),
                    ..Default::default()
                }),
            );

            if info.has_stairs {
                let distance = min_distance(&stairs.mask, &door.mask, samples, rng);
                info.obstacle_details
                    .insert(STAIRS_TO_DOOR_DISTANCE.to_string(), ObstacleDetail::Distance(distance));
                if distance < threshold {
                    info.entrance_accessible = false;
                    info.obstacles.push(STAIRS_AT_ENTRANCE.to_string());
                }
            }
        }

        let sidewalk = region("sidewalk");
        if sidewalk.is_present() {
            info.has_sidewalk = true;
            if info.has_door {
                let distance = min_distance(&sidewalk.mask, &door.mask, samples, rng);
                info.obstacle_details.insert(
                    SIDEWALK_TO_DOOR_DISTANCE.to_string(),
                    ObstacleDetail::Distance(distance),
                );
                if distance > threshold {
                    info.obstacles.push(DISCONNECTED_SIDEWALK.to_string());
                }
            }
        }

        let building = region("building");
        if building.is_present() {
            info.has_building = true;
            info.obstacle_details.insert(
                "building".to_string(),
                ObstacleDetail::Region(RegionDetail {
                    pixel_count: building.presence.pixel_count,
                    ratio: building.presence.ratio,
                    ..Default::default()
                }),
            );
        }

        let railing = region("railing");
        if railing.is_present() {
            info.has_railing = true;
            if info.has_stairs {
                let distance = min_distance(&railing.mask, &stairs.mask, samples, rng);
                info.obstacle_details.insert(
                    RAILING_TO_STAIRS_DISTANCE.to_string(),
                    ObstacleDetail::Distance(distance),
                );
                if distance < threshold {
                    info.has_stairs_railing = true;
                }
            }
        }

        info.confidence_scores = confidence_scores(seg, &self.config.class_map);
        info.accessibility_score = accessibility_score(&info);

        tracing::debug!(
            score = info.accessibility_score,
            obstacles = ?info.obstacles,
            severity = ?info.stair_severity,
            "Analysis complete"
        );
        Ok(info)
    }

    /// Bounding boxes of the stairs components, empty without a stairs class
    pub fn stair_segments(&self, seg: &SegmentationMap) -> Result<Vec<StairSegment>> {
        self.check_dimensions(seg)?;
        match self.config.class_map.id("stairs") {
            Some(id) => stair_segments(&seg.mask(id)),
            None => Ok(Vec::new()),
        }
    }

    fn check_dimensions(&self, seg: &SegmentationMap) -> Result<()> {
        if let Some((expected_width, expected_height)) = self.config.expected_dimensions {
            if (seg.width(), seg.height()) != (expected_width, expected_height) {
                return Err(Error::UnexpectedDimensions {
                    expected_width,
                    expected_height,
                    actual_width: seg.width(),
                    actual_height: seg.height(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const STAIRS: u32 = 53;
    const DOOR: u32 = 14;
    const SIDEWALK: u32 = 11;
    const BUILDING: u32 = 1;
    const RAILING: u32 = 95;

    fn analyzer() -> AccessibilityAnalyzer {
        AccessibilityAnalyzer::new(AnalyzerConfig::default()).unwrap()
    }

    fn entrance_scene() -> SegmentationMap {
        let mut map = SegmentationMap::filled(200, 200, 0).unwrap();
        map.fill_rect(0, 0, 200, 100, BUILDING);
        map.fill_rect(90, 50, 110, 100, DOOR); // 1000 px, ratio 0.025
        map.fill_rect(80, 100, 120, 130, STAIRS); // directly below the door
        map.fill_rect(0, 150, 200, 200, SIDEWALK);
        map
    }

    #[test]
    fn test_stairs_at_entrance() {
        let mut rng = StdRng::seed_from_u64(7);
        let info = analyzer().analyze_with_rng(&entrance_scene(), &mut rng).unwrap();

        assert!(info.has_stairs);
        assert!(info.has_door);
        assert!(info.has_building);
        assert!(!info.entrance_accessible);
        assert!(!info.has_ramp);
        assert_eq!(
            info.obstacles,
            vec!["stairs", STAIRS_AT_ENTRANCE, DISCONNECTED_SIDEWALK]
        );
        assert!(info.additional_obstacles.is_empty());
        assert_eq!(info.door_width(), Some(DoorWidth::Standard));
        assert!(info.distance(STAIRS_TO_DOOR_DISTANCE).unwrap() < 50.0);
        // Sidewalk starts 51 rows below the door
        assert!(info.distance(SIDEWALK_TO_DOOR_DISTANCE).unwrap() >= 51.0);
        // 10 - 5 - 2
        assert_eq!(info.accessibility_score, 3);
        assert!(info.region("building").is_some());
        assert_eq!(info.region("stairs").unwrap().estimated_count, Some(1));
    }

    #[test]
    fn test_railing_next_to_stairs() {
        let mut map = entrance_scene();
        map.fill_rect(122, 100, 124, 130, RAILING);
        let mut rng = StdRng::seed_from_u64(1);
        let info = analyzer().analyze_with_rng(&map, &mut rng).unwrap();
        assert!(info.has_railing);
        assert!(info.has_stairs_railing);
        let distance = info.distance(RAILING_TO_STAIRS_DISTANCE).unwrap();
        assert!((3.0..50.0).contains(&distance));
    }

    #[test]
    fn test_missing_class_is_absent() {
        let config = AnalyzerConfig {
            class_map: crate::config::ClassMap::new([("door", DOOR)]).unwrap(),
            ..Default::default()
        };
        let analyzer = AccessibilityAnalyzer::new(config).unwrap();
        let info = analyzer.analyze(&entrance_scene()).unwrap();
        assert!(!info.has_stairs);
        assert!(info.has_door);
        assert_eq!(info.obstacles, Vec::<String>::new());
        assert_eq!(info.confidence_scores.get("stairs"), None);
        assert!(info.confidence_scores.get("door").is_some());
        assert!(analyzer.stair_segments(&entrance_scene()).unwrap().is_empty());
    }

    #[test]
    fn test_expected_dimensions() {
        let config = AnalyzerConfig {
            expected_dimensions: Some((640, 480)),
            ..Default::default()
        };
        let analyzer = AccessibilityAnalyzer::new(config).unwrap();
        let err = analyzer.analyze(&entrance_scene()).unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedDimensions {
                actual_width: 200,
                actual_height: 200,
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AnalyzerConfig {
            threshold_distance: f64::NAN,
            ..Default::default()
        };
        assert!(AccessibilityAnalyzer::new(config).is_err());
    }

    #[test]
    fn test_analyzer_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AccessibilityAnalyzer>();
    }
}
