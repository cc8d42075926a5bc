//! Axum route handlers for the Profile API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::ProfileRecord;
use crate::profile::cache::CacheStats;
use crate::profile::pipeline::{
    delete_profile, ensure_profile, load_profile, refresh_profile, EnsureOutcome, RefreshOutcome,
};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct EnsureProfileRequest {
    pub user_id: Uuid,
    pub subject_handle: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub user_id: Uuid,
}

/// POST /api/v1/profiles
///
/// Ensures a voice profile exists for (user, subject): a fresh one is reused,
/// a missing or stale one is rebuilt from the subject's posts.
pub async fn handle_ensure_profile(
    State(state): State<AppState>,
    Json(req): Json<EnsureProfileRequest>,
) -> Result<Json<EnsureOutcome>, AppError> {
    let handle = req.subject_handle.trim();
    if handle.is_empty() {
        return Err(AppError::Validation(
            "subject_handle cannot be empty".to_string(),
        ));
    }

    let outcome = ensure_profile(
        state.store.as_ref(),
        state.samples.as_ref(),
        &state.llm,
        &state.cache,
        req.user_id,
        handle,
    )
    .await?;

    Ok(Json(outcome))
}

/// GET /api/v1/profiles
pub async fn handle_list_profiles(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<ProfileRecord>>, AppError> {
    let profiles = state.store.list_profiles(params.user_id).await?;
    Ok(Json(profiles))
}

/// GET /api/v1/profiles/:id
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Path(profile_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ProfileRecord>, AppError> {
    let record = load_profile(
        state.store.as_ref(),
        &state.cache,
        params.user_id,
        profile_id,
    )
    .await?;
    Ok(Json(record))
}

/// DELETE /api/v1/profiles/:id
pub async fn handle_delete_profile(
    State(state): State<AppState>,
    Path(profile_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    delete_profile(
        state.store.as_ref(),
        &state.cache,
        params.user_id,
        profile_id,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/profiles/:id/refresh
///
/// Forces a rebuild even if the stored profile is still fresh. The profile id
/// is stable across refreshes.
pub async fn handle_refresh_profile(
    State(state): State<AppState>,
    Path(profile_id): Path<Uuid>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<RefreshOutcome>, AppError> {
    let outcome = refresh_profile(
        state.store.as_ref(),
        state.samples.as_ref(),
        &state.llm,
        &state.cache,
        req.user_id,
        profile_id,
    )
    .await?;
    Ok(Json(outcome))
}

/// GET /api/v1/cache/stats
pub async fn handle_cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats())
}
