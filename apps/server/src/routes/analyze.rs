// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Segmentation map analysis endpoint.

use crate::error::ApiError;
use crate::services::DiskCache;
use crate::types::{AnalyzeRequest, AnalyzeResponse};
use crate::AppState;
use ablemap_core::explain_in;
use axum::{extract::State, Json};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// POST /api/v1/analyze - Analyze one segmentation map.
pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    // Unseeded results are not reproducible, so only seeded ones are cached
    let cache_key = match request.seed {
        Some(_) => Some(DiskCache::generate_key(&serde_json::to_vec(&request)?)),
        None => None,
    };

    if let Some(key) = &cache_key {
        if let Some(mut cached) = state.cache.get::<AnalyzeResponse>(key).await? {
            tracing::info!(cache_key = %key, "Cache HIT");
            cached.from_cache = true;
            return Ok(Json(cached));
        }
        tracing::info!(cache_key = %key, "Cache MISS - analyzing");
    }

    let AnalyzeRequest {
        segmentation,
        seed,
        locale,
    } = request;
    let analyzer = state.analyzer.clone();

    // CPU-bound, run on the blocking pool
    let info = tokio::task::spawn_blocking(move || match seed {
        Some(seed) => analyzer.analyze_with_rng(&segmentation, &mut StdRng::seed_from_u64(seed)),
        None => analyzer.analyze(&segmentation),
    })
    .await??;

    let response = AnalyzeResponse {
        cache_key: cache_key.clone(),
        explanation: explain_in(&info, locale).to_string(),
        accessibility_info: info,
        from_cache: false,
    };

    if let Some(key) = cache_key {
        if let Err(e) = state.cache.set(&key, &response).await {
            tracing::error!(error = %e, "Failed to cache result");
        }
    }

    Ok(Json(response))
}
