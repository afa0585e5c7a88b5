// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while processing an image
#[derive(Error, Debug)]
pub enum Error {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported segmentation map format: {0}")]
    UnsupportedSegmap(String),

    #[error("No segmentation map found for {0}")]
    MissingSegmap(PathBuf),

    #[error("Class id {0} does not fit a 16-bit PNG")]
    ClassIdOverflow(u32),

    #[error("Invalid mapping row: {0}")]
    InvalidMapping(String),

    #[error("Storage API returned {status}: {body}")]
    Storage { status: u16, body: String },

    #[error("Analysis error: {0}")]
    Analysis(#[from] ablemap_core::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
