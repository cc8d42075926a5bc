//! Axum route handlers for the Generation API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::orchestrator::{generate_all, regenerate};
use crate::models::variant::{Variant, VariantType};
use crate::profile::handlers::UserIdQuery;
use crate::profile::pipeline::load_profile;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct GenerateVariantsRequest {
    pub user_id: Uuid,
    pub idea: String,
}

#[derive(Deserialize)]
pub struct RegenerateVariantRequest {
    pub user_id: Uuid,
    pub idea: String,
    pub variant_type: VariantType,
}

/// POST /api/v1/profiles/:id/variants
///
/// Fans one idea out into all six variant types in the profile's voice.
/// All-or-nothing: on any single failure nothing is returned or persisted.
pub async fn handle_generate_variants(
    State(state): State<AppState>,
    Path(profile_id): Path<Uuid>,
    Json(req): Json<GenerateVariantsRequest>,
) -> Result<Json<Vec<Variant>>, AppError> {
    let idea = req.idea.trim();
    if idea.is_empty() {
        return Err(AppError::Validation("idea cannot be empty".to_string()));
    }

    let record = load_profile(state.store.as_ref(), &state.cache, req.user_id, profile_id).await?;
    let variants = generate_all(state.store.as_ref(), &state.llm, &record, idea).await?;
    Ok(Json(variants))
}

/// POST /api/v1/profiles/:id/variants/regenerate
///
/// Produces one more take of a single variant type. Earlier takes stay in
/// history.
pub async fn handle_regenerate_variant(
    State(state): State<AppState>,
    Path(profile_id): Path<Uuid>,
    Json(req): Json<RegenerateVariantRequest>,
) -> Result<Json<Variant>, AppError> {
    let idea = req.idea.trim();
    if idea.is_empty() {
        return Err(AppError::Validation("idea cannot be empty".to_string()));
    }

    let record = load_profile(state.store.as_ref(), &state.cache, req.user_id, profile_id).await?;
    let variant = regenerate(
        state.store.as_ref(),
        &state.llm,
        &record,
        req.variant_type,
        idea,
    )
    .await?;
    Ok(Json(variant))
}

/// GET /api/v1/profiles/:id/variants
///
/// Lists persisted variants for a profile, newest first.
pub async fn handle_list_variants(
    State(state): State<AppState>,
    Path(profile_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<Variant>>, AppError> {
    // surface a 404 rather than an empty list for a profile that is not
    // the caller's
    load_profile(state.store.as_ref(), &state.cache, params.user_id, profile_id).await?;
    let variants = state.store.list_variants(params.user_id, profile_id).await?;
    Ok(Json(variants))
}
