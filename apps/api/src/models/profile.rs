use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a profile came to exist. Heuristic profiles are built from surface
/// statistics when AI analysis fails and score lower on confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSource {
    #[default]
    Analyzed,
    Heuristic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Personality {
    pub dominant_tones: Vec<String>,
    pub emotional_range: String,
    pub humor_style: String,
    /// 0.0..=1.0, how assertive the writing reads.
    pub confidence_level: f32,
    pub traits: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuralStats {
    /// Mean post length in characters.
    pub avg_length: f32,
    /// Fraction of samples that look like thread parts (0.0..=1.0).
    pub thread_frequency: f32,
    pub preferred_structure: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageStyle {
    pub vocabulary_level: String,
    pub sentence_complexity: String,
    pub punctuation_style: String,
    /// Coarse flag: "high" when fallback measures >30% emoji-bearing posts.
    pub emoji_usage: String,
    /// Fraction of samples containing at least one emoji.
    pub emoji_rate: f32,
    pub casualness: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentThemes {
    pub main_topics: Vec<String>,
    pub expertise_areas: Vec<String>,
    pub personal_disclosure: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementStyle {
    pub uses_questions: bool,
    /// Fraction of samples containing a question mark.
    pub question_frequency: f32,
    pub cta_style: String,
    pub storytelling: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureFragments {
    pub opening_patterns: Vec<String>,
    pub closing_patterns: Vec<String>,
    pub transition_phrases: Vec<String>,
    pub unique_expressions: Vec<String>,
}

/// The structured voice fingerprint produced by analysis. All six groups are
/// required; a payload missing any group fails deserialization outright, which
/// is what routes malformed model output into the heuristic fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceProfile {
    pub personality: Personality,
    pub structure: StructuralStats,
    pub language: LanguageStyle,
    pub themes: ContentThemes,
    pub engagement: EngagementStyle,
    pub signature: SignatureFragments,
    /// Absent from model output; defaults to `Analyzed` and is overwritten by
    /// the builder when the fallback path runs.
    #[serde(default)]
    pub source: ProfileSource,
}

impl VoiceProfile {
    /// Checks the load-bearing field of each group. Deserialization already
    /// guarantees the groups exist; this catches payloads that parse but
    /// carry empty shells.
    pub fn is_structurally_complete(&self) -> bool {
        !self.personality.dominant_tones.is_empty()
            && self.structure.avg_length > 0.0
            && !self.language.vocabulary_level.is_empty()
            && !self.themes.main_topics.is_empty()
            && !self.engagement.cta_style.is_empty()
            && !self.signature.opening_patterns.is_empty()
    }
}

/// A stored profile row. `profile` round-trips through a JSONB column.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub subject_handle: String,
    pub profile: VoiceProfile,
    pub confidence_score: i32,
    pub sample_count: i32,
    pub last_analyzed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
