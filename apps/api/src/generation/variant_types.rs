//! Variant shaping — per-type length targets, sampling temperature and framing.
//!
//! One table drives all six shapes. Length is relative to the author's own
//! average post length so a terse writer gets terse variants; temperature
//! tracks how much creative drift each shape tolerates.

use crate::models::profile::VoiceProfile;
use crate::models::variant::VariantType;

/// Targets never drop below this many characters, whatever the profile says.
pub const MIN_TARGET_CHARS: usize = 40;

const MIN_OUTPUT_TOKENS: u32 = 256;
const MAX_OUTPUT_TOKENS: u32 = 2048;

/// Generation knobs for one variant shape.
#[derive(Debug, Clone)]
pub struct VariantPlan {
    /// Multiplier on the profile's average post length.
    pub length_fraction: f32,
    pub temperature: f32,
    /// Shape instruction spliced into the prompt. May carry placeholders
    /// resolved by `framing_for`.
    pub framing: &'static str,
}

/// Returns the generation plan for a variant shape.
pub fn plan_for(variant_type: VariantType) -> VariantPlan {
    match variant_type {
        VariantType::ShortPunchy => VariantPlan {
            length_fraction: 0.35,
            temperature: 0.9,
            framing: "Write ONE sharp, punchy standalone post. A single idea that lands \
                immediately; no build-up, no hashtag pile.",
        },
        VariantType::MediumStory => VariantPlan {
            length_fraction: 0.85,
            temperature: 0.8,
            framing: "Tell the idea as a compact story with a beginning, a turn, and a \
                takeaway the reader can feel.",
        },
        VariantType::LongDetailed => VariantPlan {
            length_fraction: 1.45,
            temperature: 0.7,
            framing: "Write a comprehensive, substantive post that unpacks the idea fully, \
                with concrete specifics rather than generalities.",
        },
        VariantType::ThreadStyle => VariantPlan {
            length_fraction: 1.70,
            temperature: 0.8,
            framing: "Write the opening post of a multi-part thread: a hook that earns the \
                next post and makes clear the thread continues.",
        },
        VariantType::CasualPersonal => VariantPlan {
            length_fraction: 0.90,
            temperature: 0.95,
            framing: "Write in a relaxed, personal register, like talking to a friend. The \
                author's usual level of personal disclosure is: {personal_disclosure}.",
        },
        VariantType::ProfessionalInsight => VariantPlan {
            length_fraction: 1.15,
            temperature: 0.6,
            framing: "Write an authoritative, insight-driven post that draws on the author's \
                expertise in: {expertise_areas}.",
        },
    }
}

/// Target character count for a shape given the author's average length.
pub fn target_length(avg_length: f32, variant_type: VariantType) -> usize {
    let plan = plan_for(variant_type);
    let target = (avg_length * plan.length_fraction).round() as usize;
    target.max(MIN_TARGET_CHARS)
}

/// Output-token budget from a character target. Roughly 3.5 chars per token
/// for post-style English, doubled for headroom, clamped to sane bounds.
pub fn max_tokens_for(target_chars: usize) -> u32 {
    let estimate = (target_chars as f32 / 3.5 * 2.0).ceil() as u32;
    estimate.clamp(MIN_OUTPUT_TOKENS, MAX_OUTPUT_TOKENS)
}

/// Resolves the plan's framing against the profile. Only the two
/// profile-aware shapes carry placeholders.
pub fn framing_for(variant_type: VariantType, profile: &VoiceProfile) -> String {
    let plan = plan_for(variant_type);
    match variant_type {
        VariantType::CasualPersonal => plan
            .framing
            .replace("{personal_disclosure}", &profile.themes.personal_disclosure),
        VariantType::ProfessionalInsight => plan
            .framing
            .replace("{expertise_areas}", &profile.themes.expertise_areas.join(", ")),
        _ => plan.framing.to_string(),
    }
}
