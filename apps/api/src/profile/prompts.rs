// All LLM prompt constants for voice profile analysis.
// Reuses cross-cutting fragments from llm_client::prompts.

use serde_json::json;

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::models::sample::Sample;

/// Role framing for the analysis call; the JSON-only contract is appended at
/// build time from the shared fragment.
const VOICE_ANALYSIS_ROLE: &str = "You are an expert writing-voice analyst. \
    You study a set of social posts by one author and produce a structured \
    fingerprint of how that author writes: tone, structure, language, themes, \
    engagement habits, and signature phrases. Describe the author's real \
    patterns; never aspirational ones.";

pub fn analysis_system() -> String {
    format!("{VOICE_ANALYSIS_ROLE} {JSON_ONLY_SYSTEM}")
}

/// Analysis prompt template. Replace `{sample_count}` and `{samples_json}`
/// before sending.
pub const VOICE_ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze the writing voice in the following {sample_count} posts by a single author.

Return a JSON object with this EXACT schema (no extra fields, every field present):
{
  "personality": {
    "dominant_tones": ["witty", "direct"],
    "emotional_range": "expressive | moderate | reserved",
    "humor_style": "dry | playful | self-deprecating | balanced | none",
    "confidence_level": 0.8,
    "traits": ["curious", "opinionated"]
  },
  "structure": {
    "avg_length": 180.0,
    "thread_frequency": 0.2,
    "preferred_structure": "how posts are typically organized"
  },
  "language": {
    "vocabulary_level": "accessible | technical | academic",
    "sentence_complexity": "short declaratives | flowing | mixed",
    "punctuation_style": "notable punctuation habits",
    "emoji_usage": "high | low",
    "emoji_rate": 0.1,
    "casualness": "formal | relaxed | irreverent"
  },
  "themes": {
    "main_topics": ["engineering", "startups"],
    "expertise_areas": ["distributed systems"],
    "personal_disclosure": "high | occasional | rare"
  },
  "engagement": {
    "uses_questions": true,
    "question_frequency": 0.3,
    "cta_style": "how the author asks readers to act",
    "storytelling": "anecdote first | data first | direct"
  },
  "signature": {
    "opening_patterns": ["hot take:", "story time:"],
    "closing_patterns": ["fight me"],
    "transition_phrases": ["but here's the thing"],
    "unique_expressions": ["chef's kiss"]
  }
}

Rules for analysis:

- `confidence_level` is 0.0-1.0: how assertively the author states positions.
- `avg_length`, `thread_frequency`, `emoji_rate`, `question_frequency` are
  measured from the samples, not guessed.
- Signature lists hold VERBATIM fragments lifted from the samples — short
  phrases the author actually repeats, not paraphrases.
- Prefer fewer, genuinely recurring patterns over padded lists.

POSTS (ordered by engagement, each with like/share counts):
{samples_json}"#;

/// Builds the analysis prompt for an already-selected sample set.
pub fn build_analysis_prompt(samples: &[&Sample]) -> String {
    let sample_views: Vec<serde_json::Value> = samples
        .iter()
        .map(|s| {
            json!({
                "text": s.text,
                "like_count": s.like_count,
                "share_count": s.share_count,
            })
        })
        .collect();
    let samples_json = serde_json::to_string_pretty(&sample_views)
        .unwrap_or_else(|_| "[]".to_string());

    VOICE_ANALYSIS_PROMPT_TEMPLATE
        .replace("{sample_count}", &samples.len().to_string())
        .replace("{samples_json}", &samples_json)
}
