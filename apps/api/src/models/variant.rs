use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The fixed menu of output shapes. Enum order is the canonical order in
/// which a batch is returned and displayed, regardless of which generation
/// finishes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariantType {
    ShortPunchy,
    MediumStory,
    LongDetailed,
    ThreadStyle,
    CasualPersonal,
    ProfessionalInsight,
}

impl VariantType {
    pub const ALL: [VariantType; 6] = [
        VariantType::ShortPunchy,
        VariantType::MediumStory,
        VariantType::LongDetailed,
        VariantType::ThreadStyle,
        VariantType::CasualPersonal,
        VariantType::ProfessionalInsight,
    ];

    /// Wire/database tag, matching the serde rename.
    pub fn as_str(&self) -> &'static str {
        match self {
            VariantType::ShortPunchy => "short-punchy",
            VariantType::MediumStory => "medium-story",
            VariantType::LongDetailed => "long-detailed",
            VariantType::ThreadStyle => "thread-style",
            VariantType::CasualPersonal => "casual-personal",
            VariantType::ProfessionalInsight => "professional-insight",
        }
    }

    pub fn from_str_tag(tag: &str) -> Option<VariantType> {
        Self::ALL.iter().copied().find(|v| v.as_str() == tag)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantMetadata {
    /// Wall-clock generation time for this single variant.
    pub duration_ms: u64,
    /// Hex SHA-256 of the exact prompt sent, for reproducibility checks.
    pub prompt_digest: String,
    pub model: String,
}

/// One generated rendition of an idea in a specific shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub id: Uuid,
    pub variant_type: VariantType,
    pub content: String,
    /// Character count of `content` after sanitization, never zero.
    pub character_count: usize,
    pub metadata: VariantMetadata,
    pub created_at: DateTime<Utc>,
}
