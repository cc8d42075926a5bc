// Voice Profile Engine
// Implements: sample selection, AI analysis with heuristic fallback,
// confidence scoring, TTL/LRU caching, store-backed lifecycle.
// All LLM calls go through llm_client — no direct Anthropic SDK calls here.

pub mod builder;
pub mod cache;
pub mod confidence;
pub mod fallback;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
