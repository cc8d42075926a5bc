/// Profile storage — the system of record for profiles and generated variants.
///
/// Postgres is authoritative; the in-process cache in `profile::cache` is a
/// read accelerator only. Every write lands here before any response is sent.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::{ProfileRecord, VoiceProfile};
use crate::models::variant::{Variant, VariantMetadata, VariantType};

/// Parameters for writing a freshly built profile.
pub struct UpsertProfile<'a> {
    pub owner_id: Uuid,
    pub subject_handle: &'a str,
    pub profile: &'a VoiceProfile,
    pub confidence_score: i32,
    pub sample_count: i32,
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(
        &self,
        owner_id: Uuid,
        profile_id: Uuid,
    ) -> Result<Option<ProfileRecord>, AppError>;

    async fn get_by_subject(
        &self,
        owner_id: Uuid,
        subject_handle: &str,
    ) -> Result<Option<ProfileRecord>, AppError>;

    async fn list_profiles(&self, owner_id: Uuid) -> Result<Vec<ProfileRecord>, AppError>;

    /// Inserts or replaces the profile for (owner, subject) and returns the
    /// stored row. Re-analysis keeps the row id stable.
    async fn upsert_profile(&self, params: UpsertProfile<'_>) -> Result<ProfileRecord, AppError>;

    /// Returns whether a row was actually deleted.
    async fn delete_profile(&self, owner_id: Uuid, profile_id: Uuid) -> Result<bool, AppError>;

    async fn save_variant(
        &self,
        owner_id: Uuid,
        profile_id: Uuid,
        variant: &Variant,
    ) -> Result<(), AppError>;

    /// Newest first.
    async fn list_variants(
        &self,
        owner_id: Uuid,
        profile_id: Uuid,
    ) -> Result<Vec<Variant>, AppError>;
}

// ─── Postgres implementation ────────────────────────────────────────────────

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: Uuid,
    owner_id: Uuid,
    subject_handle: String,
    profile: serde_json::Value,
    confidence_score: i32,
    sample_count: i32,
    last_analyzed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProfileRow {
    fn into_record(self) -> Result<ProfileRecord, AppError> {
        let profile: VoiceProfile = serde_json::from_value(self.profile)
            .map_err(|e| anyhow::anyhow!("corrupt profile JSON for row {}: {e}", self.id))?;
        Ok(ProfileRecord {
            id: self.id,
            owner_id: self.owner_id,
            subject_handle: self.subject_handle,
            profile,
            confidence_score: self.confidence_score,
            sample_count: self.sample_count,
            last_analyzed_at: self.last_analyzed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct VariantRow {
    id: Uuid,
    variant_type: String,
    content: String,
    character_count: i32,
    duration_ms: i64,
    prompt_digest: String,
    model: String,
    created_at: DateTime<Utc>,
}

impl VariantRow {
    fn into_variant(self) -> Result<Variant, AppError> {
        let variant_type = VariantType::from_str_tag(&self.variant_type).ok_or_else(|| {
            anyhow::anyhow!("unknown variant type '{}' in row {}", self.variant_type, self.id)
        })?;
        Ok(Variant {
            id: self.id,
            variant_type,
            content: self.content,
            character_count: self.character_count as usize,
            metadata: VariantMetadata {
                duration_ms: self.duration_ms as u64,
                prompt_digest: self.prompt_digest,
                model: self.model,
            },
            created_at: self.created_at,
        })
    }
}

pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn get_profile(
        &self,
        owner_id: Uuid,
        profile_id: Uuid,
    ) -> Result<Option<ProfileRecord>, AppError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT * FROM voice_profiles WHERE id = $1 AND owner_id = $2",
        )
        .bind(profile_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(ProfileRow::into_record).transpose()
    }

    async fn get_by_subject(
        &self,
        owner_id: Uuid,
        subject_handle: &str,
    ) -> Result<Option<ProfileRecord>, AppError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT * FROM voice_profiles WHERE owner_id = $1 AND subject_handle = $2",
        )
        .bind(owner_id)
        .bind(subject_handle)
        .fetch_optional(&self.pool)
        .await?;
        row.map(ProfileRow::into_record).transpose()
    }

    async fn list_profiles(&self, owner_id: Uuid) -> Result<Vec<ProfileRecord>, AppError> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            "SELECT * FROM voice_profiles WHERE owner_id = $1 ORDER BY updated_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ProfileRow::into_record).collect()
    }

    async fn upsert_profile(&self, params: UpsertProfile<'_>) -> Result<ProfileRecord, AppError> {
        let profile_json = serde_json::to_value(params.profile)
            .map_err(|e| anyhow::anyhow!("profile serialization failed: {e}"))?;

        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            INSERT INTO voice_profiles
                (id, owner_id, subject_handle, profile, confidence_score, sample_count,
                 last_analyzed_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (owner_id, subject_handle) DO UPDATE SET
                profile = EXCLUDED.profile,
                confidence_score = EXCLUDED.confidence_score,
                sample_count = EXCLUDED.sample_count,
                last_analyzed_at = NOW(),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(params.owner_id)
        .bind(params.subject_handle)
        .bind(&profile_json)
        .bind(params.confidence_score)
        .bind(params.sample_count)
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Upserted voice profile {} for owner {} subject '{}'",
            row.id, params.owner_id, params.subject_handle
        );

        row.into_record()
    }

    async fn delete_profile(&self, owner_id: Uuid, profile_id: Uuid) -> Result<bool, AppError> {
        // generated_variants rows go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM voice_profiles WHERE id = $1 AND owner_id = $2")
            .bind(profile_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn save_variant(
        &self,
        owner_id: Uuid,
        profile_id: Uuid,
        variant: &Variant,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO generated_variants
                (id, profile_id, owner_id, variant_type, content, character_count,
                 duration_ms, prompt_digest, model, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(variant.id)
        .bind(profile_id)
        .bind(owner_id)
        .bind(variant.variant_type.as_str())
        .bind(&variant.content)
        .bind(variant.character_count as i32)
        .bind(variant.metadata.duration_ms as i64)
        .bind(&variant.metadata.prompt_digest)
        .bind(&variant.metadata.model)
        .bind(variant.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_variants(
        &self,
        owner_id: Uuid,
        profile_id: Uuid,
    ) -> Result<Vec<Variant>, AppError> {
        let rows = sqlx::query_as::<_, VariantRow>(
            r#"
            SELECT id, variant_type, content, character_count, duration_ms,
                   prompt_digest, model, created_at
            FROM generated_variants
            WHERE profile_id = $1 AND owner_id = $2
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(profile_id)
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(VariantRow::into_variant).collect()
    }
}

// ─── In-memory implementation ───────────────────────────────────────────────

/// Backing store for tests and credential-free local runs. Same visible
/// behavior as the Postgres implementation, minus persistence.
#[derive(Default)]
pub struct MemoryProfileStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    profiles: Vec<ProfileRecord>,
    variants: Vec<StoredVariant>,
}

struct StoredVariant {
    owner_id: Uuid,
    profile_id: Uuid,
    variant: Variant,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().expect("memory store mutex poisoned")
    }

    /// Plants a row verbatim, bypassing upsert timestamps. Lets tests stage
    /// stale or never-analyzed profiles.
    #[cfg(test)]
    pub(crate) fn insert_record(&self, record: ProfileRecord) {
        self.lock().profiles.push(record);
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get_profile(
        &self,
        owner_id: Uuid,
        profile_id: Uuid,
    ) -> Result<Option<ProfileRecord>, AppError> {
        Ok(self
            .lock()
            .profiles
            .iter()
            .find(|p| p.id == profile_id && p.owner_id == owner_id)
            .cloned())
    }

    async fn get_by_subject(
        &self,
        owner_id: Uuid,
        subject_handle: &str,
    ) -> Result<Option<ProfileRecord>, AppError> {
        Ok(self
            .lock()
            .profiles
            .iter()
            .find(|p| p.owner_id == owner_id && p.subject_handle == subject_handle)
            .cloned())
    }

    async fn list_profiles(&self, owner_id: Uuid) -> Result<Vec<ProfileRecord>, AppError> {
        let mut profiles: Vec<ProfileRecord> = self
            .lock()
            .profiles
            .iter()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        profiles.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(profiles)
    }

    async fn upsert_profile(&self, params: UpsertProfile<'_>) -> Result<ProfileRecord, AppError> {
        let now = Utc::now();
        let mut inner = self.lock();

        if let Some(existing) = inner
            .profiles
            .iter_mut()
            .find(|p| p.owner_id == params.owner_id && p.subject_handle == params.subject_handle)
        {
            existing.profile = params.profile.clone();
            existing.confidence_score = params.confidence_score;
            existing.sample_count = params.sample_count;
            existing.last_analyzed_at = Some(now);
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let record = ProfileRecord {
            id: Uuid::new_v4(),
            owner_id: params.owner_id,
            subject_handle: params.subject_handle.to_string(),
            profile: params.profile.clone(),
            confidence_score: params.confidence_score,
            sample_count: params.sample_count,
            last_analyzed_at: Some(now),
            created_at: now,
            updated_at: now,
        };
        inner.profiles.push(record.clone());
        Ok(record)
    }

    async fn delete_profile(&self, owner_id: Uuid, profile_id: Uuid) -> Result<bool, AppError> {
        let mut inner = self.lock();
        let before = inner.profiles.len();
        inner
            .profiles
            .retain(|p| !(p.id == profile_id && p.owner_id == owner_id));
        let deleted = inner.profiles.len() < before;
        if deleted {
            inner
                .variants
                .retain(|v| !(v.profile_id == profile_id && v.owner_id == owner_id));
        }
        Ok(deleted)
    }

    async fn save_variant(
        &self,
        owner_id: Uuid,
        profile_id: Uuid,
        variant: &Variant,
    ) -> Result<(), AppError> {
        self.lock().variants.push(StoredVariant {
            owner_id,
            profile_id,
            variant: variant.clone(),
        });
        Ok(())
    }

    async fn list_variants(
        &self,
        owner_id: Uuid,
        profile_id: Uuid,
    ) -> Result<Vec<Variant>, AppError> {
        Ok(self
            .lock()
            .variants
            .iter()
            .rev()
            .filter(|v| v.profile_id == profile_id && v.owner_id == owner_id)
            .map(|v| v.variant.clone())
            .collect())
    }
}
