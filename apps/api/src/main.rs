mod config;
mod db;
mod errors;
mod generation;
mod llm_client;
mod models;
mod profile;
mod routes;
mod sample_source;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::profile::cache::ProfileCache;
use crate::routes::build_router;
use crate::sample_source::HttpSampleSource;
use crate::state::AppState;
use crate::store::PgProfileStore;

/// Expired cache entries are also dropped lazily on read; the sweep only
/// bounds how long dead entries hold memory.
const CACHE_SWEEP_INTERVAL_SECS: u64 = 600;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Plume API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL-backed profile store
    let pool = create_pool(&config.database_url).await?;
    let store = Arc::new(PgProfileStore::new(pool));

    // Initialize the sample source against the social post API
    let samples = Arc::new(HttpSampleSource::new(config.sample_api_url.clone()));
    info!("Sample source initialized ({})", config.sample_api_url);

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Initialize the profile cache and its periodic expiry sweep
    let cache = Arc::new(ProfileCache::new());
    let sweep_cache = cache.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(CACHE_SWEEP_INTERVAL_SECS));
        loop {
            tick.tick().await;
            let removed = sweep_cache.clear_expired();
            if removed > 0 {
                debug!("Cache sweep removed {removed} expired profiles");
            }
        }
    });

    // Build app state
    let state = AppState {
        store,
        samples,
        llm,
        cache,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
