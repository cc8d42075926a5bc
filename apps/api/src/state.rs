use std::sync::Arc;

use crate::llm_client::LlmClient;
use crate::profile::cache::ProfileCache;
use crate::sample_source::SampleSource;
use crate::store::ProfileStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// System of record for profiles and variants. Behind a trait so tests
    /// and local runs can use the in-memory impl.
    pub store: Arc<dyn ProfileStore>,
    /// Upstream post history for a subject handle.
    pub samples: Arc<dyn SampleSource>,
    pub llm: LlmClient,
    /// In-process TTL/LRU accelerator over `store`; never authoritative.
    pub cache: Arc<ProfileCache>,
}
