// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entrance accessibility signals from semantic segmentation maps
//!
//! This crate turns a per-pixel class-id map of a street-level photo into
//! wheelchair accessibility signals:
//! 1. Class presence and size of stairs, doors, sidewalk, building and railing
//! 2. Obstacle detection against a fixed catalog
//! 3. Stair step estimation and severity grading
//! 4. Pixel-distance relations (stairs at the entrance, disconnected sidewalk,
//!    railing beside the stairs)
//! 5. Shape-based detection confidence
//! 6. A deterministic 1-10 accessibility score
//!
//! # Usage
//!
//! ```rust,ignore
//! use ablemap_core::{AccessibilityAnalyzer, AnalyzerConfig, SegmentationMap};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let analyzer = AccessibilityAnalyzer::new(AnalyzerConfig::default())?;
//! let seg = SegmentationMap::new(width, height, class_ids)?;
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let info = analyzer.analyze_with_rng(&seg, &mut rng)?;
//! println!("{} ({})", info.accessibility_score, ablemap_core::explain(&info));
//! ```
//!
//! Stair segment validation, facility records, model-answer normalization
//! and report documents live in their own modules and are used by the
//! pipeline crate.

pub mod analyzer;
pub mod confidence;
pub mod config;
pub mod error;
pub mod facility;
pub mod llm;
pub mod mask_ops;
pub mod obstacles;
pub mod relation;
pub mod report;
pub mod scoring;
pub mod segmentation;
pub mod sizing;
pub mod stair_validation;
pub mod stairs;
pub mod types;

pub use analyzer::AccessibilityAnalyzer;
pub use confidence::{ConfidenceScores, Reliability};
pub use config::{AnalyzerConfig, ClassMap};
pub use error::{Error, Result};
pub use facility::{AnalysisMode, FacilityDirectory, FacilityInfo, FacilityRecord};
pub use llm::LlmAnalysis;
pub use obstacles::{ObstacleCategory, ObstacleRecord};
pub use relation::min_distance;
pub use report::{
    AccessibilityRecord, AnalysisReport, ErrorReport, KakaoMapping, LocationInfo, StoreResponse,
    StoreStatus,
};
pub use scoring::{accessibility_score, explain, explain_in, AccessibilityBand, Locale};
pub use segmentation::{BinaryMask, SegmentationMap};
pub use sizing::{ClassPresence, DoorWidth, SizeBucket};
pub use stair_validation::{StairValidation, StairValidationConfig, StairValidator};
pub use stairs::{estimate_stair_count, StairSegment, StairSeverity};
pub use types::{AccessibilityInfo, ObstacleDetail, RegionDetail};
