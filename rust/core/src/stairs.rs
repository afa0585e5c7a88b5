// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Stair counting and severity grading

use crate::error::Result;
use crate::mask_ops::{components, open_3x3};
use crate::segmentation::BinaryMask;
use serde::{Deserialize, Serialize};

/// Components at or below this many pixels are noise
pub const MIN_STAIR_COMPONENT_AREA: usize = 10;
/// Stairs ratio above which the area-based estimate kicks in
pub const LARGE_STAIRS_RATIO: f64 = 0.05;
/// Steps per unit of stairs ratio for the area-based estimate
pub const STEPS_PER_RATIO: f64 = 50.0;
/// Floor of the area-based estimate
pub const MIN_STEPS_FROM_RATIO: u32 = 3;

pub const SEVERE_STAIR_COUNT: u32 = 5;
pub const SEVERE_STAIR_RATIO: f64 = 0.1;
pub const MODERATE_STAIR_COUNT: u32 = 3;
pub const MODERATE_STAIR_RATIO: f64 = 0.05;

/// How much the stairs obstruct a wheelchair user
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum StairSeverity {
    #[default]
    None,
    Mild,
    Moderate,
    Severe,
}

impl StairSeverity {
    pub fn grade(count: u32, ratio: f64) -> Self {
        if count == 0 {
            StairSeverity::None
        } else if count >= SEVERE_STAIR_COUNT || ratio > SEVERE_STAIR_RATIO {
            StairSeverity::Severe
        } else if count >= MODERATE_STAIR_COUNT || ratio > MODERATE_STAIR_RATIO {
            StairSeverity::Moderate
        } else {
            StairSeverity::Mild
        }
    }
}

/// Estimate the number of steps in a non-empty stairs mask.
///
/// Components that survive a 3x3 opening with more than
/// [`MIN_STAIR_COMPONENT_AREA`] pixels each count as one step. Large stair
/// regions fall back to an area-based estimate. The result is at least 1.
pub fn estimate_stair_count(mask: &BinaryMask) -> Result<u32> {
    let opened = open_3x3(mask)?;
    let valid = components(&opened)?
        .iter()
        .filter(|c| c.area > MIN_STAIR_COMPONENT_AREA)
        .count() as u32;

    let ratio = mask.ratio();
    let estimate = if ratio > LARGE_STAIRS_RATIO {
        let from_ratio = MIN_STEPS_FROM_RATIO.max((ratio * STEPS_PER_RATIO).floor() as u32);
        valid.max(from_ratio)
    } else {
        valid.max(1)
    };

    tracing::debug!(components = valid, ratio, estimate, "Estimated stair count");
    Ok(estimate)
}

/// Bounding box of one stairs component, handed to segment validation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StairSegment {
    pub id: u32,
    /// `[x, y, width, height]` in segmentation pixels
    pub bbox: [u32; 4],
}

impl StairSegment {
    pub fn area(&self) -> u64 {
        self.bbox[2] as u64 * self.bbox[3] as u64
    }

    pub fn center(&self) -> (f64, f64) {
        let [x, y, w, h] = self.bbox;
        (x as f64 + w as f64 / 2.0, y as f64 + h as f64 / 2.0)
    }
}

/// One segment per 4-connected component of the raw stairs mask
pub fn stair_segments(mask: &BinaryMask) -> Result<Vec<StairSegment>> {
    Ok(components(mask)?
        .into_iter()
        .map(|c| StairSegment {
            id: c.label,
            bbox: [c.min_x, c.min_y, c.width(), c.height()],
        })
        .collect())
}
