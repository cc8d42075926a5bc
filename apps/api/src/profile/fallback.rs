/// Heuristic fallback profile builder.
///
/// Runs when AI analysis is unavailable or returns garbage. Everything here is
/// a pure function of the samples: surface statistics plus neutral prose
/// defaults. The result must always pass structural completeness so the rest
/// of the system never special-cases a missing profile.
use regex::Regex;
use std::sync::LazyLock;

use crate::models::profile::{
    ContentThemes, EngagementStyle, LanguageStyle, Personality, ProfileSource,
    SignatureFragments, StructuralStats, VoiceProfile,
};
use crate::models::sample::Sample;

/// Above this share of emoji-bearing posts, usage reads as "high".
pub const EMOJI_HIGH_THRESHOLD: f32 = 0.30;
/// Above this share of question-bearing posts, the author "uses questions".
pub const QUESTION_THRESHOLD: f32 = 0.20;
const THREAD_HEAVY_THRESHOLD: f32 = 0.10;

/// Posts ending in "3/" or "(2/7)" style numbering are thread parts.
static THREAD_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\(\d+/\d+\)|\d+/\d*)\s*$").expect("valid regex"));

/// Common emoji blocks. Intentionally a codepoint-range class rather than
/// `\p{Emoji}`, which also matches ASCII digits and '#'.
static EMOJI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        "[\u{1F300}-\u{1F5FF}",  // symbols & pictographs
        "\u{1F600}-\u{1F64F}",   // emoticons
        "\u{1F680}-\u{1F6FF}",   // transport & map
        "\u{1F900}-\u{1F9FF}",   // supplemental symbols
        "\u{1FA70}-\u{1FAFF}",   // extended-A
        "\u{2600}-\u{26FF}",     // misc symbols
        "\u{2700}-\u{27BF}]",    // dingbats
    ))
    .expect("valid regex")
});

/// Builds a structurally complete profile from surface statistics alone.
/// Deterministic for a given sample set.
pub fn build_fallback_profile(samples: &[Sample]) -> VoiceProfile {
    let avg_length = mean_char_length(samples);
    let thread_frequency = share_of(samples, |s| THREAD_MARKER_RE.is_match(&s.text));
    let emoji_rate = share_of(samples, |s| EMOJI_RE.is_match(&s.text));
    let question_frequency = share_of(samples, |s| s.text.contains('?'));

    let preferred_structure = if thread_frequency > THREAD_HEAVY_THRESHOLD {
        "mixes single posts with numbered threads"
    } else {
        "single self-contained posts"
    };

    VoiceProfile {
        personality: Personality {
            dominant_tones: vec!["conversational".into()],
            emotional_range: "moderate".into(),
            humor_style: "balanced".into(),
            confidence_level: 0.5,
            traits: vec!["authentic".into()],
        },
        structure: StructuralStats {
            avg_length,
            thread_frequency,
            preferred_structure: preferred_structure.into(),
        },
        language: LanguageStyle {
            vocabulary_level: "accessible".into(),
            sentence_complexity: "moderate".into(),
            punctuation_style: "standard".into(),
            emoji_usage: if emoji_rate > EMOJI_HIGH_THRESHOLD {
                "high".into()
            } else {
                "low".into()
            },
            emoji_rate,
            casualness: "moderate".into(),
        },
        themes: ContentThemes {
            main_topics: vec!["general".into()],
            expertise_areas: vec!["general".into()],
            personal_disclosure: "moderate".into(),
        },
        engagement: EngagementStyle {
            uses_questions: question_frequency > QUESTION_THRESHOLD,
            question_frequency,
            cta_style: "subtle".into(),
            storytelling: "direct".into(),
        },
        signature: SignatureFragments {
            opening_patterns: vec!["direct statement".into()],
            closing_patterns: vec!["open ended".into()],
            transition_phrases: vec!["and".into(), "but".into()],
            unique_expressions: vec![],
        },
        source: ProfileSource::Heuristic,
    }
}

fn mean_char_length(samples: &[Sample]) -> f32 {
    if samples.is_empty() {
        return 1.0;
    }
    let total: usize = samples.iter().map(Sample::char_len).sum();
    let mean = total as f32 / samples.len() as f32;
    // floor keeps degenerate all-empty sample sets structurally complete
    mean.max(1.0)
}

fn share_of(samples: &[Sample], pred: impl Fn(&Sample) -> bool) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let hits = samples.iter().filter(|s| pred(s)).count();
    hits as f32 / samples.len() as f32
}
