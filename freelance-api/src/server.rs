use crate::config::Config;
use crate::state::AppState;
use crate::{headers, metrics, resources};
use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::{middleware, Router};
use freelance_core::storage::FsObjectStore;
use freelance_core::{Database, Market};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "freelance-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    let app = headers::app_name();
    let exposed = [
        format!("x-{app}-alert"),
        format!("x-{app}-error"),
        format!("x-{app}-params"),
        headers::TOTAL_COUNT.to_string(),
        "link".to_string(),
        "location".to_string(),
    ]
    .into_iter()
    .filter_map(|h| h.parse().ok())
    .collect::<Vec<axum::http::HeaderName>>();

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .expose_headers(exposed)
}

/// Create the HTTP router with every resource, health and metrics endpoints.
pub fn create_server(state: AppState) -> Router {
    headers::set_app_name(&state.config.app.name);
    metrics::init_metrics();
    let cors = cors_layer(&state.config);
    let body_limit = state.config.server.max_upload_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/management/prometheus", get(metrics::prometheus))
        .merge(resources::router())
        .layer(middleware::from_fn(metrics::track_requests))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Opens the database and object store described by `config`.
pub fn build_state(config: Config) -> anyhow::Result<AppState> {
    let db = Database::open(&config.database.path)
        .with_context(|| format!("opening database {}", config.database.path.display()))?;
    db.run_migrations().context("running migrations")?;
    let store = Arc::new(FsObjectStore::new(config.storage.root.clone()));
    let market = Market::new(db, store, config.storage.bucket.clone());
    Ok(AppState::new(market, config))
}

/// Start the HTTP server and serve until Ctrl-C.
pub async fn start_server(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = build_state(config)?;
    let app = create_server(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("HTTP server running on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;
    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
