// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response types for the API.

use ablemap_core::AccessibilityInfo;
use serde::{Deserialize, Serialize};

/// Analysis result for one segmentation map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    /// Cache key for this result (SHA256 of the request), seeded requests only.
    pub cache_key: Option<String>,
    pub accessibility_info: AccessibilityInfo,
    pub explanation: String,
    /// Whether result was from cache.
    #[serde(default)]
    pub from_cache: bool,
}

/// Stored record ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordList {
    pub count: usize,
    pub data_ids: Vec<String>,
}

/// Answer to `POST /ping`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResponse {
    pub status: String,
    pub message: String,
    pub received: serde_json::Value,
}
