// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Composite 1-10 accessibility score and its explanation band

use crate::sizing::DoorWidth;
use crate::types::{AccessibilityInfo, DISCONNECTED_SIDEWALK, STAIRS_AT_ENTRANCE};
use serde::{Deserialize, Serialize};

pub const BASE_SCORE: i32 = 10;
pub const MIN_SCORE: i32 = 1;
pub const MAX_SCORE: i32 = 10;

pub const ENTRANCE_STAIRS_PENALTY: i32 = 5;
pub const STAIRS_RAILING_BONUS: i32 = 1;
pub const DISTANT_STAIRS_PENALTY: i32 = 2;
pub const DISCONNECTED_SIDEWALK_PENALTY: i32 = 2;
pub const NARROW_DOOR_PENALTY: i32 = 3;
pub const WIDE_DOOR_BONUS: i32 = 1;

/// Deterministic score from the signal bundle, clamped to [1, 10]
pub fn accessibility_score(info: &AccessibilityInfo) -> u8 {
    let mut score = BASE_SCORE;

    if info.has_obstacle(STAIRS_AT_ENTRANCE) {
        score -= ENTRANCE_STAIRS_PENALTY;
        if info.has_stairs_railing {
            score += STAIRS_RAILING_BONUS;
        }
    } else if info.has_stairs {
        score -= DISTANT_STAIRS_PENALTY;
    }

    if info.has_obstacle(DISCONNECTED_SIDEWALK) {
        score -= DISCONNECTED_SIDEWALK_PENALTY;
    }

    if info.has_door {
        match info.door_width() {
            Some(DoorWidth::Narrow) => score -= NARROW_DOOR_PENALTY,
            Some(DoorWidth::Wide) => score += WIDE_DOOR_BONUS,
            Some(DoorWidth::Standard) | None => {}
        }
    }

    score.clamp(MIN_SCORE, MAX_SCORE) as u8
}

/// Explanation language
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    English,
    Korean,
}

/// Qualitative band of a score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccessibilityBand {
    VeryHigh,
    Good,
    Moderate,
    Low,
    VeryLow,
}

impl AccessibilityBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            9.. => AccessibilityBand::VeryHigh,
            7..=8 => AccessibilityBand::Good,
            5..=6 => AccessibilityBand::Moderate,
            3..=4 => AccessibilityBand::Low,
            _ => AccessibilityBand::VeryLow,
        }
    }

    pub fn text(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::English, AccessibilityBand::VeryHigh) => {
                "Very high accessibility: wheelchair users can reach the entrance easily."
            }
            (Locale::English, AccessibilityBand::Good) => {
                "Good accessibility: mostly reachable by wheelchair, with minor inconvenience."
            }
            (Locale::English, AccessibilityBand::Moderate) => {
                "Moderate accessibility: reachable by wheelchair, but some assistance may be needed."
            }
            (Locale::English, AccessibilityBand::Low) => {
                "Low accessibility: wheelchair users may face significant difficulty."
            }
            (Locale::English, AccessibilityBand::VeryLow) => {
                "Very low accessibility: hard to reach by wheelchair without assistance."
            }
            (Locale::Korean, AccessibilityBand::VeryHigh) => {
                "매우 높은 접근성: 휠체어 사용자가 쉽게 접근 가능한 환경입니다."
            }
            (Locale::Korean, AccessibilityBand::Good) => {
                "좋은 접근성: 휠체어 사용자가 대부분 접근 가능하나 약간의 불편함이 있을 수 있습니다."
            }
            (Locale::Korean, AccessibilityBand::Moderate) => {
                "보통 접근성: 휠체어 사용자가 접근 가능하나 일부 도움이 필요할 수 있습니다."
            }
            (Locale::Korean, AccessibilityBand::Low) => {
                "낮은 접근성: 휠체어 사용자는 접근에 상당한 어려움이 있을 수 있습니다."
            }
            (Locale::Korean, AccessibilityBand::VeryLow) => {
                "매우 낮은 접근성: 휠체어 사용자는 도움 없이 접근하기 어렵습니다."
            }
        }
    }
}

/// English explanation of the bundle's score
pub fn explain(info: &AccessibilityInfo) -> &'static str {
    explain_in(info, Locale::English)
}

pub fn explain_in(info: &AccessibilityInfo, locale: Locale) -> &'static str {
    AccessibilityBand::from_score(info.accessibility_score).text(locale)
}
