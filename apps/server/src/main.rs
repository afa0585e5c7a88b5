// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! AbleMap Server - storage and analysis API for entrance accessibility.
//!
//! The pipeline uploads one record per analyzed photo; clients can also
//! send a segmentation map and get the accessibility bundle back.
//!
//! # Endpoints
//!
//! - `GET /api/v1/health` - Health check
//! - `POST /api/v1/analyze` - Analyze a segmentation map (seeded results cached)
//! - `POST /accessibility` - Store a record (bearer key)
//! - `GET /accessibility` - List stored record ids (bearer key)
//! - `GET /accessibility/:id` - Retrieve a stored record (bearer key)
//! - `POST /ping` - Connectivity and key check (bearer key)

use ablemap_core::{AccessibilityAnalyzer, AnalyzerConfig};
use std::net::SocketAddr;
use std::sync::Arc;

mod config;
mod error;
mod middleware;
mod routes;
mod services;
mod types;

use config::Config;
use error::ApiError;
use services::{DiskCache, RecordStore};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
    pub cache: Arc<DiskCache>,
    pub analyzer: Arc<AccessibilityAnalyzer>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config, analyzer: AccessibilityAnalyzer) -> Result<Self, ApiError> {
        Ok(Self {
            store: Arc::new(RecordStore::new(&config.records_dir()).await?),
            cache: Arc::new(DiskCache::new(&config.cache_dir()).await),
            analyzer: Arc::new(analyzer),
            config: Arc::new(config),
        })
    }
}

fn load_analyzer(config: &Config) -> Result<AccessibilityAnalyzer, ApiError> {
    let analyzer_config = match &config.analyzer_config {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            AnalyzerConfig::from_json_str(&json)?
        }
        None => AnalyzerConfig::default(),
    };
    Ok(AccessibilityAnalyzer::new(analyzer_config)?)
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,tower_http=debug,ablemap_server=debug".into()),
        )
        .pretty()
        .init();

    let config = Config::from_env();

    tracing::info!(
        port = config.port,
        data_dir = %config.data_dir.display(),
        max_body_size_mb = config.max_body_size_mb,
        "Starting AbleMap Server"
    );

    let state = match load_analyzer(&config) {
        Ok(analyzer) => AppState::new(config.clone(), analyzer).await,
        Err(e) => Err(e),
    };
    let state = match state {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize server");
            std::process::exit(1);
        }
    };

    let app = routes::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "Failed to bind");
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
