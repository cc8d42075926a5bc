// Variant Generation Engine
// Implements: per-type length/temperature planning, prompt build, concurrent
// six-way fan-out, output sanitization, regeneration.
// All LLM calls go through llm_client — no direct Anthropic SDK calls here.

pub mod handlers;
pub mod orchestrator;
pub mod prompts;
pub mod sanitize;
pub mod variant_types;
