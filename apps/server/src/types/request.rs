// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request types for the API.

use ablemap_core::{Locale, SegmentationMap};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    /// Row-major class ids with their dimensions.
    pub segmentation: SegmentationMap,

    /// Seed for distance sampling; seeded requests are cached.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Language of the explanation.
    #[serde(default)]
    pub locale: Locale,
}
