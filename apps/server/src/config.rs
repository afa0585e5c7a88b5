// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Server configuration loaded from environment variables.

use std::path::PathBuf;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on.
    pub port: u16,
    /// Directory holding stored records and the analysis cache.
    pub data_dir: PathBuf,
    /// Bearer key required on the storage routes.
    pub api_key: String,
    /// Maximum request body size in MB.
    pub max_body_size_mb: usize,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Analyzer configuration JSON; defaults are used when unset.
    pub analyzer_config: Option<PathBuf>,
    /// Allowed CORS origins (comma-separated, or "*" for all).
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".into())
                .parse()
                .unwrap_or(8000),
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./api_data")),
            api_key: std::env::var("API_SERVER_KEY").unwrap_or_else(|_| "test_api_key".into()),
            max_body_size_mb: std::env::var("MAX_BODY_SIZE_MB")
                .unwrap_or_else(|_| "50".into())
                .parse()
                .unwrap_or(50),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".into())
                .parse()
                .unwrap_or(120),
            analyzer_config: std::env::var("ANALYZER_CONFIG").ok().map(PathBuf::from),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Directory of stored accessibility records.
    pub fn records_dir(&self) -> PathBuf {
        self.data_dir.join("records")
    }

    /// Directory of the analysis result cache.
    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }
}
