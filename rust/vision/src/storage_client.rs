// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Client for the accessibility storage API.

use crate::error::{Error, Result};
use ablemap_core::{AccessibilityRecord, StoreResponse};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::AUTHORIZATION;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_API_KEY: &str = "test_api_key";

const PING_TIMEOUT: Duration = Duration::from_secs(5);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking storage API client authenticated with a bearer key.
pub struct StorageClient {
    base_url: String,
    api_key: String,
    http: Client,
}

impl StorageClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http: Client::builder().timeout(UPLOAD_TIMEOUT).build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(AUTHORIZATION, format!("Bearer {}", self.api_key))
    }

    /// Store one record; the server answers `status: error` for records
    /// without coordinates
    pub fn send_report(&self, record: &AccessibilityRecord) -> Result<StoreResponse> {
        let resp = self
            .authorized(self.http.post(format!("{}/accessibility", self.base_url)))
            .json(record)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Storage {
                status: status.as_u16(),
                body: resp.text().unwrap_or_default(),
            });
        }
        Ok(resp.json()?)
    }

    /// Check that the server is reachable and accepts the key
    pub fn ping(&self) -> Result<()> {
        let resp = self
            .authorized(self.http.post(format!("{}/ping", self.base_url)))
            .timeout(PING_TIMEOUT)
            .json(&serde_json::json!({
                "test": true,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }))
            .send()?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Error::Storage {
                status: status.as_u16(),
                body: resp.text().unwrap_or_default(),
            })
        }
    }
}
