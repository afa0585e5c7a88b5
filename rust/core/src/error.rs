// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for accessibility analysis
pub type Result<T> = std::result::Result<T, Error>;

/// Caller contract violations.
///
/// Missing classes are never reported here: an absent class is a content
/// signal and flows through the bundle as `false`, `0` or `+inf`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Segmentation map has zero cells ({width}x{height})")]
    EmptySegmentationMap { width: usize, height: usize },

    #[error("Segmentation data has {actual} cells, expected {width}x{height}")]
    DimensionMismatch {
        width: usize,
        height: usize,
        actual: usize,
    },

    #[error("Segmentation row {row} has {actual} cells, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Segmentation map is {actual_width}x{actual_height}, configured for {expected_width}x{expected_height}")]
    UnexpectedDimensions {
        expected_width: usize,
        expected_height: usize,
        actual_width: usize,
        actual_height: usize,
    },

    #[error("Segmentation map of {width}x{height} cells does not fit in memory")]
    TooManyCells { width: usize, height: usize },

    #[error("Invalid class map: {0}")]
    InvalidClassMap(String),

    #[error("Invalid analyzer configuration: {0}")]
    InvalidConfig(String),

    #[error("Mask of {width}x{height} cannot be represented as an image")]
    MaskTooLarge { width: usize, height: usize },

    #[error("Configuration JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
