// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Common instruction spliced into every voice-matched generation prompt.
pub const VOICE_FIDELITY_INSTRUCTION: &str = "\
    CRITICAL: Style comes from the voice profile, substance comes from the idea. \
    Do NOT invent facts, anecdotes, credentials, or experiences the idea does not contain. \
    Do NOT quote the profile's example phrases verbatim more than once. \
    The result must read like the author on a normal day, not a parody of them.";

/// Instruction that keeps raw completions paste-ready.
pub const PLAIN_OUTPUT_INSTRUCTION: &str = "\
    Respond with the post text and NOTHING else: \
    no preamble like 'Here's your post', no surrounding quotation marks, \
    no markdown fences, no trailing commentary.";
