// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Accessibility record storage endpoints.

use crate::error::ApiError;
use crate::types::{PingResponse, RecordList};
use crate::AppState;
use ablemap_core::{AccessibilityRecord, StoreResponse, StoreStatus};
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

/// POST /accessibility - Store a record.
///
/// Records without both coordinates are answered with `status: error`.
pub async fn store(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<StoreResponse>, ApiError> {
    let record: AccessibilityRecord = serde_json::from_value(body)
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

    if !record.location.has_coordinates() {
        tracing::warn!("Record without coordinates rejected");
        return Ok(Json(StoreResponse {
            status: StoreStatus::Error,
            message: "Location information (latitude, longitude) is required".into(),
            data_id: None,
        }));
    }

    let data_id = state.store.insert(&record).await?;
    Ok(Json(StoreResponse {
        status: StoreStatus::Success,
        message: "Data stored successfully".into(),
        data_id: Some(data_id),
    }))
}

/// GET /accessibility - List stored record ids.
pub async fn list(State(state): State<AppState>) -> Result<Json<RecordList>, ApiError> {
    let data_ids = state.store.list().await?;
    Ok(Json(RecordList {
        count: data_ids.len(),
        data_ids,
    }))
}

/// GET /accessibility/:id - Retrieve a stored record.
pub async fn fetch(
    State(state): State<AppState>,
    Path(data_id): Path<String>,
) -> Result<Json<AccessibilityRecord>, ApiError> {
    match state.store.get(&data_id).await? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::NotFound(format!("Record not found: {}", data_id))),
    }
}

/// POST /ping - Echo the body once the key has been accepted.
pub async fn ping(Json(body): Json<Value>) -> Json<PingResponse> {
    tracing::debug!("Ping received");
    Json(PingResponse {
        status: "success".into(),
        message: "pong".into(),
        received: body,
    })
}
