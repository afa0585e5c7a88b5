// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The accessibility signal bundle produced for one segmentation map

use crate::confidence::ConfidenceScores;
use crate::obstacles::{ObstacleCategory, ObstacleRecord};
use crate::sizing::{DoorWidth, SizeBucket};
use crate::stair_validation::StairValidation;
use crate::stairs::StairSeverity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Obstacle names that are derived from relations rather than classes
pub const STAIRS_AT_ENTRANCE: &str = "stairs_at_entrance";
pub const DISCONNECTED_SIDEWALK: &str = "disconnected_sidewalk";

/// Detail keys for inter-object distances
pub const STAIRS_TO_DOOR_DISTANCE: &str = "stairs_to_door_distance";
pub const SIDEWALK_TO_DOOR_DISTANCE: &str = "sidewalk_to_door_distance";
pub const RAILING_TO_STAIRS_DISTANCE: &str = "railing_to_stairs_distance";

/// Size and class-specific measurements of one detected region
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionDetail {
    pub pixel_count: usize,
    pub ratio: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_size: Option<SizeBucket>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stair_severity: Option<StairSeverity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_width: Option<DoorWidth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obstacle_type: Option<ObstacleCategory>,
}

impl From<&ObstacleRecord> for RegionDetail {
    fn from(record: &ObstacleRecord) -> Self {
        Self {
            pixel_count: record.pixel_count,
            ratio: record.ratio,
            obstacle_type: Some(record.category),
            ..Default::default()
        }
    }
}

/// Entry of `obstacle_details`: a region record or a pixel distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObstacleDetail {
    Distance(f64),
    Region(RegionDetail),
}

impl ObstacleDetail {
    pub fn as_region(&self) -> Option<&RegionDetail> {
        match self {
            ObstacleDetail::Region(r) => Some(r),
            ObstacleDetail::Distance(_) => None,
        }
    }

    pub fn as_distance(&self) -> Option<f64> {
        match self {
            ObstacleDetail::Distance(d) => Some(*d),
            ObstacleDetail::Region(_) => None,
        }
    }
}

/// Accessibility signals derived from one segmentation map
///
/// Missing fields deserialize to the values of an empty scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessibilityInfo {
    pub has_stairs: bool,
    pub has_ramp: bool,
    pub entrance_accessible: bool,
    pub has_door: bool,
    pub has_sidewalk: bool,
    pub has_building: bool,
    pub has_railing: bool,
    pub has_stairs_railing: bool,
    pub obstacles: Vec<String>,
    pub additional_obstacles: Vec<String>,
    pub obstacle_details: BTreeMap<String, ObstacleDetail>,
    pub stair_severity: StairSeverity,
    pub confidence_scores: ConfidenceScores,
    pub accessibility_score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stair_validation: Option<StairValidation>,
}

impl Default for AccessibilityInfo {
    fn default() -> Self {
        Self {
            has_stairs: false,
            has_ramp: false,
            entrance_accessible: true,
            has_door: false,
            has_sidewalk: false,
            has_building: false,
            has_railing: false,
            has_stairs_railing: false,
            obstacles: Vec::new(),
            additional_obstacles: Vec::new(),
            obstacle_details: BTreeMap::new(),
            stair_severity: StairSeverity::None,
            confidence_scores: ConfidenceScores::default(),
            accessibility_score: crate::scoring::BASE_SCORE as u8,
            stair_validation: None,
        }
    }
}

impl AccessibilityInfo {
    pub fn has_obstacle(&self, name: &str) -> bool {
        self.obstacles.iter().any(|o| o == name)
    }

    pub fn region(&self, name: &str) -> Option<&RegionDetail> {
        self.obstacle_details.get(name).and_then(ObstacleDetail::as_region)
    }

    pub fn distance(&self, key: &str) -> Option<f64> {
        self.obstacle_details.get(key).and_then(ObstacleDetail::as_distance)
    }

    pub fn door_width(&self) -> Option<DoorWidth> {
        self.region("door").and_then(|d| d.estimated_width)
    }

    /// Apply an external stair validation result.
    ///
    /// `has_stairs` follows whether any validated stair group remains. When
    /// validation rejects every stair segment, the signals derived from the
    /// stairs mask are withdrawn as well (the `stairs` and
    /// `stairs_at_entrance` obstacles, their details, severity, railing
    /// relation and entrance block) and the score is recomputed.
    pub fn apply_stair_validation(&mut self, validation: StairValidation) {
        let has_stairs = validation.final_stair_groups > 0;
        if has_stairs != self.has_stairs {
            tracing::info!(
                before = self.has_stairs,
                after = has_stairs,
                groups = validation.final_stair_groups,
                "Stair validation overrides stairs presence"
            );
        }
        self.has_stairs = has_stairs;
        if !has_stairs {
            self.clear_stair_signals();
        }
        self.stair_validation = Some(validation);
        self.accessibility_score = crate::scoring::accessibility_score(self);
    }

    fn clear_stair_signals(&mut self) {
        self.obstacles
            .retain(|o| o != "stairs" && o != STAIRS_AT_ENTRANCE);
        for key in ["stairs", STAIRS_TO_DOOR_DISTANCE, RAILING_TO_STAIRS_DISTANCE] {
            self.obstacle_details.remove(key);
        }
        self.stair_severity = StairSeverity::None;
        self.has_stairs_railing = false;
        self.entrance_accessible = true;
    }
}
