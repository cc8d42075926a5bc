pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation::handlers as generation;
use crate::profile::handlers as profiles;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Profile API
        .route(
            "/api/v1/profiles",
            post(profiles::handle_ensure_profile).get(profiles::handle_list_profiles),
        )
        .route(
            "/api/v1/profiles/:id",
            get(profiles::handle_get_profile).delete(profiles::handle_delete_profile),
        )
        .route(
            "/api/v1/profiles/:id/refresh",
            post(profiles::handle_refresh_profile),
        )
        // Generation API
        .route(
            "/api/v1/profiles/:id/variants",
            post(generation::handle_generate_variants).get(generation::handle_list_variants),
        )
        .route(
            "/api/v1/profiles/:id/variants/regenerate",
            post(generation::handle_regenerate_variant),
        )
        // Ops
        .route("/api/v1/cache/stats", get(profiles::handle_cache_stats))
        .with_state(state)
}
