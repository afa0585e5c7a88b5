// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Stair segment validation
//!
//! Segmentation models label many stair-like textures as stairs. Each
//! candidate segment is checked against size, shape, border, edge-direction
//! and position rules; survivors are grouped into stair flights and a
//! confidence is derived from how many segments passed.

use crate::stairs::StairSegment;
use image::imageops;
use image::GrayImage;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use serde::{Deserialize, Serialize};

/// Thresholds for [`StairValidator`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StairValidationConfig {
    /// Minimum bounding-box area in pixels
    pub min_area: u64,
    /// Allowed `width / height` range, inclusive
    pub aspect_ratio_range: (f64, f64),
    /// Fraction of the shorter frame side treated as border
    pub edge_margin_fraction: f64,
    /// Minimum ratio of horizontal to vertical edge strength
    pub min_edge_ratio: f64,
    /// Segments whose centre lies above this fraction of the height are rejected
    pub min_center_fraction: f64,
    /// Centre distance below which two segments belong to one flight
    pub group_distance: f64,
}

impl Default for StairValidationConfig {
    fn default() -> Self {
        Self {
            min_area: 500,
            aspect_ratio_range: (0.2, 5.0),
            edge_margin_fraction: 0.05,
            min_edge_ratio: 1.2,
            min_center_fraction: 0.3,
            group_distance: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    AreaTooSmall,
    InvalidAspectRatio,
    EdgeNoise,
    InsufficientHorizontalEdges,
    WrongPosition,
}

/// Outcome of the checks on one segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentCheck {
    pub segment_id: u32,
    pub area: u64,
    pub is_valid: bool,
    pub rejection_reasons: Vec<RejectionReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_ratio: Option<f64>,
}

/// Summary of a validation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StairValidation {
    /// Valid segments grouped into flights
    pub valid_stairs: Vec<Vec<StairSegment>>,
    pub total_segments: usize,
    pub filtered_count: usize,
    pub final_stair_groups: usize,
    pub validation_details: Vec<SegmentCheck>,
    pub confidence_score: f64,
}

/// Validates stair segments against a frame and an optional photo
#[derive(Debug, Clone, Default)]
pub struct StairValidator {
    config: StairValidationConfig,
}

impl StairValidator {
    pub fn new(config: StairValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StairValidationConfig {
        &self.config
    }

    /// Validate segments given in a `width x height` frame.
    ///
    /// When `photo` is supplied it must have the frame's dimensions; the
    /// edge-direction check is skipped otherwise.
    pub fn validate(
        &self,
        segments: &[StairSegment],
        width: u32,
        height: u32,
        photo: Option<&GrayImage>,
    ) -> StairValidation {
        let photo = photo.filter(|p| {
            let matches = p.dimensions() == (width, height);
            if !matches {
                tracing::warn!(
                    photo_width = p.width(),
                    photo_height = p.height(),
                    width,
                    height,
                    "Photo does not match the segment frame, skipping edge check"
                );
            }
            matches
        });

        let mut details = Vec::with_capacity(segments.len());
        let mut valid = Vec::new();
        for segment in segments {
            let check = self.check_segment(segment, width, height, photo);
            if check.is_valid {
                valid.push(*segment);
            }
            details.push(check);
        }

        let groups = group_adjacent(&valid, self.config.group_distance);
        let confidence_score = confidence(&details, groups.len());

        tracing::debug!(
            total = segments.len(),
            valid = valid.len(),
            groups = groups.len(),
            confidence = confidence_score,
            "Stair segments validated"
        );

        StairValidation {
            final_stair_groups: groups.len(),
            valid_stairs: groups,
            total_segments: segments.len(),
            filtered_count: valid.len(),
            validation_details: details,
            confidence_score,
        }
    }

    fn check_segment(
        &self,
        segment: &StairSegment,
        width: u32,
        height: u32,
        photo: Option<&GrayImage>,
    ) -> SegmentCheck {
        let config = &self.config;
        let area = segment.area();
        let mut check = SegmentCheck {
            segment_id: segment.id,
            area,
            is_valid: false,
            rejection_reasons: Vec::new(),
            edge_ratio: None,
        };

        let [x, y, w, h] = segment.bbox;

        if area < config.min_area {
            check.rejection_reasons.push(RejectionReason::AreaTooSmall);
            return check;
        }

        let aspect = if h > 0 { w as f64 / h as f64 } else { f64::INFINITY };
        let (min_aspect, max_aspect) = config.aspect_ratio_range;
        if !(min_aspect..=max_aspect).contains(&aspect) {
            check.rejection_reasons.push(RejectionReason::InvalidAspectRatio);
            return check;
        }

        let margin = width.min(height) as f64 * config.edge_margin_fraction;
        let near_border = (x as f64) < margin
            || (y as f64) < margin
            || x as f64 + w as f64 > width as f64 - margin
            || y as f64 + h as f64 > height as f64 - margin;
        if near_border && area < config.min_area * 2 {
            check.rejection_reasons.push(RejectionReason::EdgeNoise);
            return check;
        }

        if let Some(photo) = photo {
            if let Some(ratio) = horizontal_edge_ratio(photo, segment) {
                check.edge_ratio = Some(ratio);
                if ratio < config.min_edge_ratio {
                    check
                        .rejection_reasons
                        .push(RejectionReason::InsufficientHorizontalEdges);
                    return check;
                }
            }
        }

        let (_, center_y) = segment.center();
        if center_y < height as f64 * config.min_center_fraction {
            check.rejection_reasons.push(RejectionReason::WrongPosition);
            return check;
        }

        check.is_valid = true;
        check
    }
}

/// Mean |d/dy| over mean |d/dx| inside the segment, `None` for an empty ROI
pub fn horizontal_edge_ratio(photo: &GrayImage, segment: &StairSegment) -> Option<f64> {
    let [x, y, w, h] = segment.bbox;
    if x >= photo.width() || y >= photo.height() {
        return None;
    }
    let w = w.min(photo.width() - x);
    let h = h.min(photo.height() - y);
    if w == 0 || h == 0 {
        return None;
    }

    let roi = imageops::crop_imm(photo, x, y, w, h).to_image();
    let dx = horizontal_sobel(&roi);
    let dy = vertical_sobel(&roi);

    let vertical_edges = mean_abs(dx.as_raw());
    let horizontal_edges = mean_abs(dy.as_raw());

    Some(horizontal_edges / (vertical_edges + 1e-6))
}

fn mean_abs(pixels: &[i16]) -> f64 {
    pixels.iter().map(|&v| (v as f64).abs()).sum::<f64>() / pixels.len() as f64
}

/// Greedy grouping: each unused segment seeds a group and absorbs every
/// unused segment whose centre is within `distance` of the seed
fn group_adjacent(segments: &[StairSegment], distance: f64) -> Vec<Vec<StairSegment>> {
    let mut used = vec![false; segments.len()];
    let mut groups = Vec::new();

    for (i, seed) in segments.iter().enumerate() {
        if used[i] {
            continue;
        }
        used[i] = true;
        let mut group = vec![*seed];
        let (sx, sy) = seed.center();

        for (j, other) in segments.iter().enumerate() {
            if used[j] {
                continue;
            }
            let (ox, oy) = other.center();
            if ((sx - ox).powi(2) + (sy - oy).powi(2)).sqrt() < distance {
                group.push(*other);
                used[j] = true;
            }
        }
        groups.push(group);
    }

    groups
}

fn confidence(details: &[SegmentCheck], group_count: usize) -> f64 {
    if details.is_empty() {
        return 0.0;
    }
    let valid = details.iter().filter(|d| d.is_valid).count();
    let base = valid as f64 / details.len() as f64;

    match group_count {
        1 => (base + 0.2).min(1.0),
        n if n > 3 => (base - 0.1).max(0.0),
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::Luma;

    fn segment(id: u32, bbox: [u32; 4]) -> StairSegment {
        StairSegment { id, bbox }
    }

    fn striped_photo(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |_, y| {
            if (y / 4) % 2 == 0 {
                Luma([220u8])
            } else {
                Luma([30u8])
            }
        })
    }

    #[test]
    fn test_rejection_order() {
        let validator = StairValidator::default();
        let segments = [
            segment(1, [100, 300, 20, 20]),  // 400 px
            segment(2, [100, 300, 200, 10]), // aspect 20
            segment(3, [0, 300, 30, 30]),    // 900 px touching the border
            segment(4, [100, 20, 40, 40]),   // centre y 40 in a 400 high frame
            segment(5, [150, 250, 40, 40]),
        ];
        let result = validator.validate(&segments, 400, 400, None);

        let reasons: Vec<Vec<RejectionReason>> = result
            .validation_details
            .iter()
            .map(|d| d.rejection_reasons.clone())
            .collect();
        assert_eq!(
            reasons,
            vec![
                vec![RejectionReason::AreaTooSmall],
                vec![RejectionReason::InvalidAspectRatio],
                vec![RejectionReason::EdgeNoise],
                vec![RejectionReason::WrongPosition],
                vec![],
            ]
        );
        assert_eq!(result.total_segments, 5);
        assert_eq!(result.filtered_count, 1);
        assert_eq!(result.final_stair_groups, 1);
        // 1/5 plus the single-group bonus
        assert_relative_eq!(result.confidence_score, 0.4);
    }

    #[test]
    fn test_large_border_segment_survives() {
        let validator = StairValidator::default();
        let result = validator.validate(&[segment(1, [0, 300, 40, 40])], 400, 400, None);
        assert!(result.validation_details[0].is_valid);
    }

    #[test]
    fn test_edge_direction_check() {
        let validator = StairValidator::default();
        let seg = [segment(1, [100, 200, 60, 40])];

        let striped = striped_photo(400, 400);
        let result = validator.validate(&seg, 400, 400, Some(&striped));
        assert!(result.validation_details[0].is_valid);
        assert!(result.validation_details[0].edge_ratio.unwrap() > 1.2);

        let flat = GrayImage::from_pixel(400, 400, Luma([128u8]));
        let result = validator.validate(&seg, 400, 400, Some(&flat));
        assert_eq!(
            result.validation_details[0].rejection_reasons,
            vec![RejectionReason::InsufficientHorizontalEdges]
        );
        assert_eq!(result.final_stair_groups, 0);
        assert_relative_eq!(result.confidence_score, 0.0);
    }

    #[test]
    fn test_mismatched_photo_skips_edge_check() {
        let validator = StairValidator::default();
        let flat = GrayImage::from_pixel(200, 200, Luma([128u8]));
        let result = validator.validate(&[segment(1, [100, 200, 60, 40])], 400, 400, Some(&flat));
        assert!(result.validation_details[0].is_valid);
        assert!(result.validation_details[0].edge_ratio.is_none());
    }

    #[test]
    fn test_grouping_and_confidence() {
        let validator = StairValidator::default();
        // Two close flights and three far apart ones
        let segments = [
            segment(1, [40, 200, 30, 30]),
            segment(2, [60, 210, 30, 30]),
            segment(3, [200, 200, 30, 30]),
            segment(4, [300, 300, 30, 30]),
            segment(5, [400, 300, 30, 30]),
        ];
        let result = validator.validate(&segments, 500, 500, None);
        assert_eq!(result.filtered_count, 5);
        assert_eq!(result.final_stair_groups, 4);
        assert_eq!(result.valid_stairs[0].len(), 2);
        // Too many flights lowers confidence
        assert_relative_eq!(result.confidence_score, 0.9);
    }

    #[test]
    fn test_no_segments() {
        let result = StairValidator::default().validate(&[], 100, 100, None);
        assert_eq!(result.total_segments, 0);
        assert_eq!(result.final_stair_groups, 0);
        assert_eq!(result.confidence_score, 0.0);
    }
}
