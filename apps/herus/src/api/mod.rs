//! # Herus HTTP API Module
//!
//! This module implements the JSON HTTP API using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Topic and media counts
//! - `POST /upload` - Upload media (base64 content) under a topic or media
//! - `POST /connect` - Link one topic to another
//! - `GET /t/{topic}` - Topic view: relations and attached media
//! - `GET /e/{hash}` - Media view: title and elaborations
//! - `GET /m/{hash}` - Raw media bytes
//!
//! ## Security Configuration
//!
//! Taken from `HerusConfig` (file or environment):
//! - `cors_origins`: comma-separated origins, or "*" for all (default: localhost only)
//! - `rate_limit`: requests per second (default: 100, 0 to disable)
//! - `api_key`: if set, POST routes require a Bearer token

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::keys_match;
pub use middleware::{GlobalRateLimiter, create_rate_limiter};
pub use types::{
    ConnectRequest, ConnectResponse, HealthResponse, MediaLinkJson, MediaResponse, RelationJson,
    StatusResponse, TopicResponse, UploadRequestJson, UploadResponse,
};

use crate::config::{DEFAULT_RATE_LIMIT, HerusConfig};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use herus_core::{HerusError, KnowledgeStore, primitives::DEFAULT_MAX_UPLOAD_BYTES};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Room for the JSON envelope around the base64 payload.
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// HTTP-facing settings, split out of `HerusConfig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    pub api_key: Option<String>,
    pub rate_limit: u32,
    pub cors_origins: Option<String>,
    pub max_upload_bytes: usize,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            rate_limit: DEFAULT_RATE_LIMIT,
            cors_origins: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ApiSettings {
    pub fn from_config(config: &HerusConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            rate_limit: config.rate_limit,
            cors_origins: config.cors_origins.clone(),
            max_upload_bytes: config.graph.max_upload_bytes,
        }
    }

    /// Largest request body accepted: base64 grows content by 4/3.
    fn body_limit(&self) -> usize {
        (self.max_upload_bytes / 3 + 1) * 4 + BODY_OVERHEAD_BYTES
    }
}

/// Shared server state: the store plus the HTTP settings.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<KnowledgeStore>,
    pub settings: Arc<ApiSettings>,
}

impl AppState {
    #[must_use]
    pub fn new(store: KnowledgeStore, settings: ApiSettings) -> Self {
        Self {
            store: Arc::new(store),
            settings: Arc::new(settings),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer from the configured origins.
///
/// - `"*"`: allows all origins (development only)
/// - unset: localhost only
/// - otherwise: the comma-separated list; invalid entries are skipped
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!("CORS: No origins configured, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let localhost_origins = vec![
        "http://localhost:3841".parse::<HeaderValue>().ok(),
        "http://localhost:3000".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:3841".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:3000".parse::<HeaderValue>().ok(),
    ];
    let origins: Vec<HeaderValue> = localhost_origins.into_iter().flatten().collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit - sized from the upload cap
/// 4. Rate Limiting - global, if enabled
/// 5. Authentication - POST routes, if a key is configured
pub fn create_router(state: AppState) -> Router {
    let settings = Arc::clone(&state.settings);

    let rate_limiter = if settings.rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", settings.rate_limit);
        Some(create_rate_limiter(settings.rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    if settings.api_key.is_some() {
        tracing::info!("API key authentication enabled for POST routes");
    } else {
        tracing::warn!(
            "API key authentication DISABLED - anyone can upload and connect. \
             Set HERUS_API_KEY to enable authentication."
        );
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/upload", post(handlers::upload_handler))
        .route("/connect", post(handlers::connect_handler))
        .route("/t/{topic}", get(handlers::topic_handler))
        .route("/e/{hash}", get(handlers::media_handler))
        .route("/m/{hash}", get(handlers::blob_handler));

    if settings.api_key.is_some() {
        router = router.layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::api_key_auth_middleware,
        ));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(settings.body_limit()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer(settings.cors_origins.as_deref())),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and serve until Ctrl+C.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), HerusError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| HerusError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("Herus HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| HerusError::Io(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_limit_covers_base64_of_max_upload() {
        let settings = ApiSettings {
            max_upload_bytes: 3,
            ..ApiSettings::default()
        };
        assert_eq!(settings.body_limit(), 8 + BODY_OVERHEAD_BYTES);

        let defaults = ApiSettings::default();
        assert!(defaults.body_limit() > DEFAULT_MAX_UPLOAD_BYTES / 3 * 4);
    }

    #[test]
    fn settings_from_config() {
        let mut config = HerusConfig::default();
        config.api_key = Some("k".to_string());
        config.rate_limit = 0;
        let settings = ApiSettings::from_config(&config);
        assert_eq!(settings.api_key.as_deref(), Some("k"));
        assert_eq!(settings.rate_limit, 0);
        assert_eq!(settings.max_upload_bytes, config.graph.max_upload_bytes);
    }
}
