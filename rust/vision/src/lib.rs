// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Batch analysis of entrance photos
//!
//! Reads photos with their segmentation maps, runs
//! [`ablemap_core::AccessibilityAnalyzer`], renders overlays and writes
//! report documents. Reports can be uploaded to the storage API.

pub mod error;
pub mod location;
pub mod overlay;
pub mod pipeline;
pub mod segmap_io;
pub mod storage_client;

pub use error::{Error, Result};
pub use location::{location_from_stem, MappingEntry, PlaceMapping};
pub use overlay::{render_overlay, ColorMap, DEFAULT_ALPHA};
pub use pipeline::{list_images, ImageJob, OutputPaths, Pipeline, PipelineOptions, RunSummary};
pub use segmap_io::{load_segmap, save_segmap_png, segmap_from_image, segmap_from_json};
pub use storage_client::{StorageClient, DEFAULT_API_KEY, DEFAULT_API_URL};
