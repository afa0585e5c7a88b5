// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Class presence, area ratios and qualitative size buckets

use crate::segmentation::SegmentationMap;
use serde::{Deserialize, Serialize};

/// Upper ratio bounds for each size bucket, checked in order
pub const SIZE_BUCKETS: &[(f64, SizeBucket)] = &[
    (0.01, SizeBucket::VerySmall),
    (0.05, SizeBucket::Small),
    (0.15, SizeBucket::Medium),
    (0.3, SizeBucket::Large),
];

/// Door ratio below which a door reads as narrow
pub const NARROW_DOOR_RATIO: f64 = 0.01;
/// Door ratio below which a door reads as standard width
pub const STANDARD_DOOR_RATIO: f64 = 0.03;

/// Relative size of a region against the whole frame
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SizeBucket {
    #[serde(rename = "very small")]
    VerySmall,
    #[serde(rename = "small")]
    Small,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "large")]
    Large,
    #[serde(rename = "very large")]
    VeryLarge,
}

impl SizeBucket {
    pub fn from_ratio(ratio: f64) -> Self {
        SIZE_BUCKETS
            .iter()
            .find(|(bound, _)| ratio < *bound)
            .map_or(SizeBucket::VeryLarge, |&(_, bucket)| bucket)
    }
}

/// Door width estimate from its share of the frame
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DoorWidth {
    Narrow,
    Standard,
    Wide,
}

impl DoorWidth {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < NARROW_DOOR_RATIO {
            DoorWidth::Narrow
        } else if ratio < STANDARD_DOOR_RATIO {
            DoorWidth::Standard
        } else {
            DoorWidth::Wide
        }
    }
}

/// Pixel count and frame ratio of one class
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassPresence {
    pub pixel_count: usize,
    pub ratio: f64,
}

impl ClassPresence {
    pub fn measure(seg: &SegmentationMap, class_id: u32) -> Self {
        let pixel_count = seg.data().iter().filter(|&&id| id == class_id).count();
        Self::from_count(pixel_count, seg.len())
    }

    pub fn from_count(pixel_count: usize, total_cells: usize) -> Self {
        let ratio = if total_cells == 0 {
            0.0
        } else {
            pixel_count as f64 / total_cells as f64
        };
        Self { pixel_count, ratio }
    }

    pub fn is_present(&self) -> bool {
        self.pixel_count > 0
    }

    pub fn size_bucket(&self) -> SizeBucket {
        SizeBucket::from_ratio(self.ratio)
    }
}
