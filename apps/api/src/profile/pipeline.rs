/// Profile lifecycle pipeline: ensure, refresh, load, delete.
///
/// Wires the sample source, builder, scorer, store and cache together. The
/// store is written synchronously before any outcome is returned; the cache
/// is only ever updated after the store, so a crash between the two can lose
/// a cache entry but never serve a profile the store does not hold.
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::models::profile::{ProfileRecord, ProfileSource};
use crate::profile::builder::build_profile;
use crate::profile::cache::{self, ProfileCache};
use crate::profile::confidence;
use crate::sample_source::SampleSource;
use crate::store::{ProfileStore, UpsertProfile};

/// Upper bound on posts pulled per analysis; the builder narrows further.
pub const MAX_SAMPLE_FETCH: usize = 200;

#[derive(Debug, Serialize)]
pub struct EnsureOutcome {
    pub profile_id: Uuid,
    pub subject_handle: String,
    pub confidence: u8,
    pub warnings: Vec<String>,
    pub degraded: bool,
    /// False when a fresh stored profile was reused as-is.
    pub rebuilt: bool,
}

#[derive(Debug, Serialize)]
pub struct RefreshOutcome {
    pub profile_id: Uuid,
    pub confidence: u8,
    pub warnings: Vec<String>,
    pub degraded: bool,
}

/// Returns a ready-to-use profile for (owner, subject), building one only if
/// none exists or the stored one is due for re-analysis.
pub async fn ensure_profile(
    store: &dyn ProfileStore,
    samples: &dyn SampleSource,
    llm: &LlmClient,
    cache: &ProfileCache,
    owner_id: Uuid,
    subject_handle: &str,
) -> Result<EnsureOutcome, AppError> {
    if let Some(record) = store.get_by_subject(owner_id, subject_handle).await? {
        if !cache::needs_refresh(&record) {
            let outcome = EnsureOutcome {
                profile_id: record.id,
                subject_handle: record.subject_handle.clone(),
                confidence: record.confidence_score.clamp(0, 100) as u8,
                warnings: Vec::new(),
                degraded: record.profile.source == ProfileSource::Heuristic,
                rebuilt: false,
            };
            cache.set(record.id, record);
            return Ok(outcome);
        }
    }

    rebuild(store, samples, llm, cache, owner_id, subject_handle).await
}

/// Forces re-analysis of an existing profile. 404s when the profile is not
/// this owner's to refresh.
pub async fn refresh_profile(
    store: &dyn ProfileStore,
    samples: &dyn SampleSource,
    llm: &LlmClient,
    cache: &ProfileCache,
    owner_id: Uuid,
    profile_id: Uuid,
) -> Result<RefreshOutcome, AppError> {
    let record = store
        .get_profile(owner_id, profile_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No voice profile {profile_id}")))?;

    let ensured = rebuild(store, samples, llm, cache, owner_id, &record.subject_handle).await?;
    Ok(RefreshOutcome {
        profile_id: ensured.profile_id,
        confidence: ensured.confidence,
        warnings: ensured.warnings,
        degraded: ensured.degraded,
    })
}

/// Cache read-through load. Both generation entry points come through here.
pub async fn load_profile(
    store: &dyn ProfileStore,
    cache: &ProfileCache,
    owner_id: Uuid,
    profile_id: Uuid,
) -> Result<ProfileRecord, AppError> {
    if let Some(record) = cache.get(profile_id) {
        // entries are keyed by id alone; an owner mismatch falls through to
        // the store rather than leak another owner's profile
        if record.owner_id == owner_id {
            return Ok(record);
        }
    }

    match store.get_profile(owner_id, profile_id).await? {
        Some(record) => {
            cache.set(profile_id, record.clone());
            Ok(record)
        }
        None => Err(AppError::NotFound(format!("No voice profile {profile_id}"))),
    }
}

/// Store first, cache second. Variants cascade with the row.
pub async fn delete_profile(
    store: &dyn ProfileStore,
    cache: &ProfileCache,
    owner_id: Uuid,
    profile_id: Uuid,
) -> Result<(), AppError> {
    let deleted = store.delete_profile(owner_id, profile_id).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("No voice profile {profile_id}")));
    }
    cache.delete(profile_id);
    info!("Deleted voice profile {profile_id} for owner {owner_id}");
    Ok(())
}

async fn rebuild(
    store: &dyn ProfileStore,
    samples: &dyn SampleSource,
    llm: &LlmClient,
    cache: &ProfileCache,
    owner_id: Uuid,
    subject_handle: &str,
) -> Result<EnsureOutcome, AppError> {
    let fetched = samples.fetch_samples(subject_handle, MAX_SAMPLE_FETCH).await?;
    let outcome = build_profile(llm, &fetched).await?;
    let (profile, warnings, degraded) = outcome.into_parts();

    let confidence = confidence::score(&profile, fetched.len());

    let record = store
        .upsert_profile(UpsertProfile {
            owner_id,
            subject_handle,
            profile: &profile,
            confidence_score: i32::from(confidence.score),
            sample_count: fetched.len() as i32,
        })
        .await?;

    info!(
        "Voice profile {} for '{}' rebuilt: confidence {}, degraded {}",
        record.id, subject_handle, confidence.score, degraded
    );

    let profile_id = record.id;
    cache.set(profile_id, record);

    Ok(EnsureOutcome {
        profile_id,
        subject_handle: subject_handle.to_string(),
        confidence: confidence.score,
        warnings,
        degraded,
        rebuilt: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::test_fixtures::{make_profile, make_record};
    use crate::models::sample::Sample;
    use crate::sample_source::SampleSourceError;
    use crate::store::MemoryProfileStore;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct StaticSource {
        samples: Vec<Sample>,
        calls: AtomicUsize,
    }

    impl StaticSource {
        fn with_posts(count: usize) -> Self {
            let samples = (0..count)
                .map(|i| Sample {
                    text: format!("sampled post {i}"),
                    like_count: i as u32,
                    share_count: 0,
                    reply_count: 0,
                    created_at: Utc::now(),
                })
                .collect();
            Self {
                samples,
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SampleSource for StaticSource {
        async fn fetch_samples(
            &self,
            _handle: &str,
            max_count: usize,
        ) -> Result<Vec<Sample>, SampleSourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.samples.iter().take(max_count).cloned().collect())
        }
    }

    struct MissingSource;

    #[async_trait]
    impl SampleSource for MissingSource {
        async fn fetch_samples(
            &self,
            handle: &str,
            _max_count: usize,
        ) -> Result<Vec<Sample>, SampleSourceError> {
            Err(SampleSourceError::NotFound(handle.to_string()))
        }
    }

    async fn mock_llm(server: &MockServer) -> LlmClient {
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{
                    "type": "text",
                    "text": serde_json::to_string(&make_profile()).unwrap()
                }],
                "usage": {"input_tokens": 100, "output_tokens": 50}
            })))
            .mount(server)
            .await;
        LlmClient::with_base_url("test-key".into(), &server.uri(), 0)
    }

    #[tokio::test]
    async fn test_ensure_builds_scores_and_persists() {
        let server = MockServer::start().await;
        let llm = mock_llm(&server).await;
        let store = MemoryProfileStore::new();
        let source = StaticSource::with_posts(60);
        let cache = ProfileCache::new();
        let owner = Uuid::new_v4();

        let outcome = ensure_profile(&store, &source, &llm, &cache, owner, "wes")
            .await
            .unwrap();

        assert!(outcome.rebuilt);
        assert!(!outcome.degraded);
        // tier 30 (60 samples) + richness 20 + consistency 10 + depth 30
        assert_eq!(outcome.confidence, 90);

        let stored = store
            .get_profile(owner, outcome.profile_id)
            .await
            .unwrap()
            .expect("profile persisted");
        assert_eq!(stored.sample_count, 60);
        assert_eq!(stored.confidence_score, 90);
        assert_eq!(cache.stats().size, 1);
    }

    #[tokio::test]
    async fn test_ensure_reuses_fresh_profile_without_rebuilding() {
        let server = MockServer::start().await;
        let llm = mock_llm(&server).await;
        let store = MemoryProfileStore::new();
        let source = StaticSource::with_posts(60);
        let cache = ProfileCache::new();
        let owner = Uuid::new_v4();

        let first = ensure_profile(&store, &source, &llm, &cache, owner, "wes")
            .await
            .unwrap();
        let second = ensure_profile(&store, &source, &llm, &cache, owner, "wes")
            .await
            .unwrap();

        assert!(first.rebuilt);
        assert!(!second.rebuilt);
        assert_eq!(first.profile_id, second.profile_id);
        assert_eq!(second.confidence, first.confidence);
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_ensure_rebuilds_a_stale_profile() {
        let server = MockServer::start().await;
        let llm = mock_llm(&server).await;
        let store = MemoryProfileStore::new();
        let source = StaticSource::with_posts(60);
        let cache = ProfileCache::new();
        let owner = Uuid::new_v4();

        let mut stale = make_record(owner);
        stale.subject_handle = "wes".into();
        stale.last_analyzed_at = Some(Utc::now() - Duration::days(8));
        let stale_id = stale.id;
        store.insert_record(stale);

        let outcome = ensure_profile(&store, &source, &llm, &cache, owner, "wes")
            .await
            .unwrap();

        assert!(outcome.rebuilt);
        // upsert found the existing (owner, subject) row, so the id held
        assert_eq!(outcome.profile_id, stale_id);
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_refresh_forces_rebuild_and_keeps_id() {
        let server = MockServer::start().await;
        let llm = mock_llm(&server).await;
        let store = MemoryProfileStore::new();
        let source = StaticSource::with_posts(60);
        let cache = ProfileCache::new();
        let owner = Uuid::new_v4();

        let ensured = ensure_profile(&store, &source, &llm, &cache, owner, "wes")
            .await
            .unwrap();
        let refreshed = refresh_profile(&store, &source, &llm, &cache, owner, ensured.profile_id)
            .await
            .unwrap();

        assert_eq!(refreshed.profile_id, ensured.profile_id);
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn test_refresh_unknown_profile_is_not_found() {
        let server = MockServer::start().await;
        let llm = mock_llm(&server).await;
        let store = MemoryProfileStore::new();
        let source = StaticSource::with_posts(60);
        let cache = ProfileCache::new();

        let err = refresh_profile(&store, &source, &llm, &cache, Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_load_reads_through_store_and_caches() {
        let store = MemoryProfileStore::new();
        let cache = ProfileCache::new();
        let owner = Uuid::new_v4();
        let record = make_record(owner);
        let id = record.id;
        store.insert_record(record);

        assert_eq!(cache.stats().size, 0);
        let loaded = load_profile(&store, &cache, owner, id).await.unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(cache.stats().size, 1);

        // second load is served from cache
        load_profile(&store, &cache, owner, id).await.unwrap();
        let stats = cache.stats();
        assert_eq!(stats.most_accessed[0].access_count, 1);
    }

    #[tokio::test]
    async fn test_load_is_owner_scoped_even_when_cached() {
        let store = MemoryProfileStore::new();
        let cache = ProfileCache::new();
        let owner = Uuid::new_v4();
        let record = make_record(owner);
        let id = record.id;
        store.insert_record(record.clone());
        cache.set(id, record);

        let err = load_profile(&store, &cache, Uuid::new_v4(), id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_clears_store_then_cache() {
        let store = MemoryProfileStore::new();
        let cache = ProfileCache::new();
        let owner = Uuid::new_v4();
        let record = make_record(owner);
        let id = record.id;
        store.insert_record(record.clone());
        cache.set(id, record);

        delete_profile(&store, &cache, owner, id).await.unwrap();
        assert!(store.get_profile(owner, id).await.unwrap().is_none());
        assert!(cache.get(id).is_none());

        let err = delete_profile(&store, &cache, owner, id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unknown_handle_surfaces_not_found() {
        let server = MockServer::start().await;
        let llm = mock_llm(&server).await;
        let store = MemoryProfileStore::new();
        let cache = ProfileCache::new();

        let err = ensure_profile(&store, &MissingSource, &llm, &cache, Uuid::new_v4(), "ghost")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_too_few_posts_surfaces_insufficient_samples() {
        let server = MockServer::start().await;
        let llm = mock_llm(&server).await;
        let store = MemoryProfileStore::new();
        let source = StaticSource::with_posts(4);
        let cache = ProfileCache::new();

        let err = ensure_profile(&store, &source, &llm, &cache, Uuid::new_v4(), "quiet")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::InsufficientSamples { got: 4, min: 10 }
        ));
    }
}
