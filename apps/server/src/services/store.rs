// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Accessibility records stored as one JSON document per data id.

use crate::error::ApiError;
use ablemap_core::AccessibilityRecord;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    pub async fn new(dir: &Path) -> Result<Self, ApiError> {
        tokio::fs::create_dir_all(dir).await?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn path_for(&self, data_id: &str) -> Result<PathBuf, ApiError> {
        let valid = !data_id.is_empty()
            && data_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !data_id.contains("..");
        if !valid {
            return Err(ApiError::InvalidRequest(format!("invalid data id '{}'", data_id)));
        }
        Ok(self.dir.join(format!("{}.json", data_id)))
    }

    /// Store a record under `{unix_ts}_{lat}_{lon}` and return the id
    pub async fn insert(&self, record: &AccessibilityRecord) -> Result<String, ApiError> {
        let data_id = record.data_id(chrono::Utc::now().timestamp());
        let path = self.path_for(&data_id)?;
        let data = serde_json::to_vec_pretty(record)?;
        tokio::fs::write(&path, &data).await?;
        tracing::info!(data_id = %data_id, size = data.len(), "Stored accessibility record");
        Ok(data_id)
    }

    pub async fn get(&self, data_id: &str) -> Result<Option<AccessibilityRecord>, ApiError> {
        let path = self.path_for(data_id)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(serde_json::from_slice(&data)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Stored data ids in ascending order
    pub async fn list(&self) -> Result<Vec<String>, ApiError> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}
