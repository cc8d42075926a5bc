//! Variant generation — runs one idea through every variant type at once.
//!
//! Flow: per-type prompt → concurrent LLM calls → sanitize → persist → return
//!       in canonical order.
//!
//! The batch is all-or-nothing: one failed variant fails the whole request so
//! the caller never renders a partial set. Regeneration of a single type is
//! the one exception and touches nothing but that type.

use std::time::Instant;

use chrono::Utc;
use futures::future::try_join_all;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::prompts::{build_variant_prompt, variant_system};
use crate::generation::sanitize::sanitize_output;
use crate::generation::variant_types::{max_tokens_for, plan_for, target_length};
use crate::llm_client::{CompletionParams, LlmClient, MODEL};
use crate::models::profile::{ProfileRecord, VoiceProfile};
use crate::models::variant::{Variant, VariantMetadata, VariantType};
use crate::store::ProfileStore;

// ────────────────────────────────────────────────────────────────────────────
// Batch generation
// ────────────────────────────────────────────────────────────────────────────

/// Generates all six variants of `idea` in the loaded profile's voice.
///
/// Calls run concurrently; `try_join_all` keeps the result in canonical
/// `VariantType::ALL` order no matter which call finishes first, and aborts
/// the batch on the first failure. Variants are persisted only after every
/// call has succeeded, so a failed batch leaves no rows behind.
pub async fn generate_all(
    store: &dyn ProfileStore,
    llm: &LlmClient,
    record: &ProfileRecord,
    idea: &str,
) -> Result<Vec<Variant>, AppError> {
    let started = Instant::now();

    let calls = VariantType::ALL
        .iter()
        .map(|&variant_type| generate_one(llm, &record.profile, variant_type, idea));
    let variants = try_join_all(calls).await?;

    for variant in &variants {
        store
            .save_variant(record.owner_id, record.id, variant)
            .await?;
    }

    info!(
        "Generated {} variants for profile {} in {} ms",
        variants.len(),
        record.id,
        started.elapsed().as_millis()
    );

    Ok(variants)
}

/// Regenerates a single variant type for an idea the user wants another take
/// on. Earlier variants of the same type stay in history; the newest one
/// lists first.
pub async fn regenerate(
    store: &dyn ProfileStore,
    llm: &LlmClient,
    record: &ProfileRecord,
    variant_type: VariantType,
    idea: &str,
) -> Result<Variant, AppError> {
    let variant = generate_one(llm, &record.profile, variant_type, idea).await?;
    store
        .save_variant(record.owner_id, record.id, &variant)
        .await?;

    info!(
        "Regenerated {} variant for profile {}",
        variant_type.as_str(),
        record.id
    );

    Ok(variant)
}

// ────────────────────────────────────────────────────────────────────────────
// Single-variant call
// ────────────────────────────────────────────────────────────────────────────

/// Runs one LLM call for one variant type and wraps the cleaned output.
///
/// Output that sanitizes down to nothing is a failed generation, not an empty
/// variant; the transport layer already retried anything retryable.
async fn generate_one(
    llm: &LlmClient,
    profile: &VoiceProfile,
    variant_type: VariantType,
    idea: &str,
) -> Result<Variant, AppError> {
    let plan = plan_for(variant_type);
    let target = target_length(profile.structure.avg_length, variant_type);
    let prompt = build_variant_prompt(profile, variant_type, idea);
    let params = CompletionParams {
        temperature: plan.temperature,
        max_tokens: max_tokens_for(target),
    };

    let started = Instant::now();
    let raw = llm
        .complete(&variant_system(), &prompt, params)
        .await
        .map_err(|e| AppError::Generation(format!("{} variant: {e}", variant_type.as_str())))?;
    let duration_ms = started.elapsed().as_millis() as u64;

    let content = sanitize_output(&raw);
    if content.is_empty() {
        warn!(
            "{} variant sanitized to empty output (raw was {} chars)",
            variant_type.as_str(),
            raw.chars().count()
        );
        return Err(AppError::Generation(format!(
            "{} variant produced no usable text",
            variant_type.as_str()
        )));
    }

    let character_count = content.chars().count();
    Ok(Variant {
        id: Uuid::new_v4(),
        variant_type,
        content,
        character_count,
        metadata: VariantMetadata {
            duration_ms,
            prompt_digest: format!("{:x}", Sha256::digest(prompt.as_bytes())),
            model: MODEL.to_string(),
        },
        created_at: Utc::now(),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::models::profile::test_fixtures::make_record;
    use crate::store::MemoryProfileStore;

    fn completion_response(text: &str) -> serde_json::Value {
        json!({
            "content": [{"type": "text", "text": text}],
            "usage": {"input_tokens": 900, "output_tokens": 120}
        })
    }

    /// Mounts one mock per variant type, keyed on the framing text that only
    /// that type's prompt contains.
    async fn mount_variant_mocks(server: &MockServer) {
        let responses = [
            ("sharp, punchy", "Short take.", 40u64),
            ("compact story", "A story with a turn.", 0),
            ("comprehensive, substantive", "The long detailed take.", 20),
            ("multi-part thread", "Thread opener. 1/", 0),
            ("relaxed, personal register", "Honestly, this one is personal.", 0),
            ("authoritative, insight-driven", "The professional angle.", 0),
        ];
        for (needle, text, delay_ms) in responses {
            Mock::given(method("POST"))
                .and(path("/v1/messages"))
                .and(body_string_contains(needle))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(completion_response(text))
                        .set_delay(Duration::from_millis(delay_ms)),
                )
                .mount(server)
                .await;
        }
    }

    #[tokio::test]
    async fn test_generate_all_returns_canonical_order_despite_completion_order() {
        let server = MockServer::start().await;
        mount_variant_mocks(&server).await;
        let llm = LlmClient::with_base_url("test-key".into(), &server.uri(), 0);
        let store = MemoryProfileStore::new();
        let record = make_record(Uuid::new_v4());

        let variants = generate_all(&store, &llm, &record, "ship early and iterate")
            .await
            .unwrap();

        assert_eq!(variants.len(), 6);
        for (variant, expected_type) in variants.iter().zip(VariantType::ALL) {
            assert_eq!(variant.variant_type, expected_type);
        }
        // the delayed short-punchy call still lands first in the output
        assert_eq!(variants[0].content, "Short take.");
        assert_eq!(variants[3].content, "Thread opener. 1/");
    }

    #[tokio::test]
    async fn test_generate_all_persists_every_variant() {
        let server = MockServer::start().await;
        mount_variant_mocks(&server).await;
        let llm = LlmClient::with_base_url("test-key".into(), &server.uri(), 0);
        let store = MemoryProfileStore::new();
        let record = make_record(Uuid::new_v4());

        generate_all(&store, &llm, &record, "an idea").await.unwrap();

        let stored = store
            .list_variants(record.owner_id, record.id)
            .await
            .unwrap();
        assert_eq!(stored.len(), 6);
    }

    #[tokio::test]
    async fn test_generate_all_is_all_or_nothing() {
        let server = MockServer::start().await;
        // thread-style prompts fail hard; 400 is not retried by the client
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(body_string_contains("multi-part thread"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"error": {"message": "bad request"}})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_response("fine")))
            .mount(&server)
            .await;
        let llm = LlmClient::with_base_url("test-key".into(), &server.uri(), 0);
        let store = MemoryProfileStore::new();
        let record = make_record(Uuid::new_v4());

        let err = generate_all(&store, &llm, &record, "an idea")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Generation(_)));
        assert!(err.to_string().contains("thread-style"));
        let stored = store
            .list_variants(record.owner_id, record.id)
            .await
            .unwrap();
        assert!(stored.is_empty(), "failed batch must persist nothing");
    }

    #[tokio::test]
    async fn test_generate_one_sanitizes_and_fills_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion_response("Here's your post: Ship it.\n")),
            )
            .expect(1)
            .mount(&server)
            .await;
        let llm = LlmClient::with_base_url("test-key".into(), &server.uri(), 0);
        let record = make_record(Uuid::new_v4());

        let variant = generate_one(&llm, &record.profile, VariantType::ShortPunchy, "an idea")
            .await
            .unwrap();

        assert_eq!(variant.content, "Ship it.");
        assert_eq!(variant.character_count, 8);
        assert_eq!(variant.metadata.model, MODEL);
        assert_eq!(variant.metadata.prompt_digest.len(), 64);
        assert!(variant
            .metadata
            .prompt_digest
            .chars()
            .all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_generate_one_rejects_output_that_sanitizes_to_empty() {
        let server = MockServer::start().await;
        // a bare acknowledgment is all preamble; not a transport failure, so
        // no retry happens
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_response("Sure!")))
            .expect(1)
            .mount(&server)
            .await;
        let llm = LlmClient::with_base_url("test-key".into(), &server.uri(), 0);
        let record = make_record(Uuid::new_v4());

        let err = generate_one(&llm, &record.profile, VariantType::MediumStory, "an idea")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("no usable text"));
    }

    #[tokio::test]
    async fn test_regenerate_appends_to_history_newest_first() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion_response("another take")),
            )
            .mount(&server)
            .await;
        let llm = LlmClient::with_base_url("test-key".into(), &server.uri(), 0);
        let store = MemoryProfileStore::new();
        let record = make_record(Uuid::new_v4());

        let first = regenerate(&store, &llm, &record, VariantType::CasualPersonal, "an idea")
            .await
            .unwrap();
        let second = regenerate(&store, &llm, &record, VariantType::CasualPersonal, "an idea")
            .await
            .unwrap();

        let stored = store
            .list_variants(record.owner_id, record.id)
            .await
            .unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].id, second.id);
        assert_eq!(stored[1].id, first.id);
        assert!(stored
            .iter()
            .all(|v| v.variant_type == VariantType::CasualPersonal));
    }
}
