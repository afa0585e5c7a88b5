// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP routes.

pub mod accessibility;
pub mod analyze;
pub mod health;

use crate::middleware::require_api_key;
use crate::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let config = state.config.clone();

    // Storage routes require the bearer key
    let protected = Router::new()
        .route(
            "/accessibility",
            post(accessibility::store).get(accessibility::list),
        )
        .route("/accessibility/:id", get(accessibility::fetch))
        .route("/ping", post(accessibility::ping))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/", get(health::info))
        .route("/api/v1/health", get(health::check))
        .route("/api/v1/analyze", post(analyze::analyze))
        .merge(protected)
        .layer(DefaultBodyLimit::max(config.max_body_size_mb * 1024 * 1024))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use ablemap_core::{AccessibilityAnalyzer, AnalyzerConfig};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    const KEY: &str = "secret";

    async fn app(dir: &std::path::Path) -> Router {
        let config = Config {
            port: 0,
            data_dir: dir.to_path_buf(),
            api_key: KEY.into(),
            max_body_size_mb: 1,
            request_timeout_secs: 10,
            analyzer_config: None,
            cors_origins: vec!["*".into()],
        };
        let analyzer = AccessibilityAnalyzer::new(AnalyzerConfig::default()).unwrap();
        router(AppState::new(config, analyzer).await.unwrap())
    }

    fn post_json(uri: &str, body: Value, key: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(key) = key {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", key));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_with_key(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", KEY))
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(dir.path())
            .await
            .oneshot(Request::builder().uri("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_root_lists_endpoints() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(dir.path())
            .await
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["service"], "ablemap-server");
        let paths: Vec<&str> = body["endpoints"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["path"].as_str().unwrap())
            .collect();
        for path in ["/api/v1/health", "/api/v1/analyze", "/accessibility", "/ping"] {
            assert!(paths.contains(&path), "missing {}", path);
        }
    }

    #[tokio::test]
    async fn test_storage_requires_key() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path()).await;

        let response = app
            .clone()
            .oneshot(post_json("/ping", json!({"test": true}), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["code"], "UNAUTHORIZED");

        let response = app
            .oneshot(post_json("/ping", json!({"test": true}), Some("wrong")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_store_list_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path()).await;

        let record = json!({
            "location": {"latitude": 37.5, "longitude": 127.0, "faclNm": "entrance"},
            "accessibility": {"has_stairs": true, "accessibility_score": 5}
        });
        let response = app
            .clone()
            .oneshot(post_json("/accessibility", record, Some(KEY)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "success");
        let data_id = body["data_id"].as_str().unwrap().to_string();
        assert!(data_id.ends_with("_37.5_127"));

        let response = app.clone().oneshot(get_with_key("/accessibility")).await.unwrap();
        let body = json_body(response).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["data_ids"][0], data_id.as_str());

        let response = app
            .clone()
            .oneshot(get_with_key(&format!("/accessibility/{}", data_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["accessibility"]["accessibility_score"], 5);
        assert_eq!(body["location"]["faclNm"], "entrance");

        let response = app.oneshot(get_with_key("/accessibility/1_2_3")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_store_without_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        let record = json!({
            "location": {"latitude": 37.5},
            "accessibility": {}
        });
        let response = app(dir.path())
            .await
            .oneshot(post_json("/accessibility", record, Some(KEY)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "error");
        assert!(body.get("data_id").is_none());
    }

    #[tokio::test]
    async fn test_analyze_caches_seeded_requests() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path()).await;

        // 4x4 map with stairs in the lower half
        let mut data = vec![0u32; 16];
        for cell in data.iter_mut().skip(8) {
            *cell = 53;
        }
        let request = json!({
            "segmentation": {"width": 4, "height": 4, "data": data},
            "seed": 3,
            "locale": "korean"
        });

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/analyze", request.clone(), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let first = json_body(response).await;
        assert_eq!(first["from_cache"], false);
        assert_eq!(first["accessibility_info"]["has_stairs"], true);
        assert!(first["cache_key"].is_string());

        let response = app
            .oneshot(post_json("/api/v1/analyze", request, None))
            .await
            .unwrap();
        let second = json_body(response).await;
        assert_eq!(second["from_cache"], true);
        assert_eq!(second["cache_key"], first["cache_key"]);
        assert_eq!(second["accessibility_info"], first["accessibility_info"]);
    }

    #[tokio::test]
    async fn test_analyze_empty_map_scores_ten() {
        let dir = tempfile::tempdir().unwrap();
        let request = json!({"segmentation": {"width": 2, "height": 2, "data": [0, 0, 0, 0]}});
        let response = app(dir.path())
            .await
            .oneshot(post_json("/api/v1/analyze", request, None))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["accessibility_info"]["accessibility_score"], 10);
        assert!(body["cache_key"].is_null());
    }
}
