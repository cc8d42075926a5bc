// All LLM prompt constants for variant generation.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::llm_client::prompts::{PLAIN_OUTPUT_INSTRUCTION, VOICE_FIDELITY_INSTRUCTION};
use crate::models::profile::VoiceProfile;
use crate::models::variant::VariantType;

use crate::generation::variant_types::{framing_for, target_length};

/// Role framing for generation calls; the plain-output contract is appended
/// at build time from the shared fragment.
const GHOSTWRITER_ROLE: &str = "You are an expert social media ghostwriter. \
    You write posts that are indistinguishable from the author's own writing \
    by following a measured voice profile, never a generic 'good post' ideal.";

pub fn variant_system() -> String {
    format!("{GHOSTWRITER_ROLE} {PLAIN_OUTPUT_INSTRUCTION}")
}

/// Variant prompt template.
/// Replace: {framing}, {fidelity_instruction}, {voice_profile_json}, {idea},
///          {target_length}
pub const VARIANT_PROMPT_TEMPLATE: &str = r#"{framing}

{fidelity_instruction}

VOICE PROFILE (the author's measured writing patterns — your ONLY style source):
{voice_profile_json}

IDEA (the substance to express — your ONLY content source):
{idea}

TARGET LENGTH: about {target_length} characters. Land within roughly 20% of it.

HARD RULES:
1. Match the profile's `dominant_tones`, `vocabulary_level`, `punctuation_style`, and `casualness` — the post must sound like the author wrote it on a normal day
2. Emoji use follows `emoji_usage` and `emoji_rate`; when in doubt, use fewer
3. Draw on `opening_patterns`, `closing_patterns`, and `transition_phrases` naturally — at most one signature fragment verbatim
4. `uses_questions` and `cta_style` decide whether and how the post asks anything of the reader
5. Express the idea completely — never drop its core point to hit the length"#;

/// Builds the generation prompt for one variant type.
pub fn build_variant_prompt(
    profile: &VoiceProfile,
    variant_type: VariantType,
    idea: &str,
) -> String {
    let profile_json =
        serde_json::to_string_pretty(profile).unwrap_or_else(|_| "{}".to_string());
    let target = target_length(profile.structure.avg_length, variant_type);

    VARIANT_PROMPT_TEMPLATE
        .replace("{framing}", &framing_for(variant_type, profile))
        .replace("{fidelity_instruction}", VOICE_FIDELITY_INSTRUCTION)
        .replace("{voice_profile_json}", &profile_json)
        .replace("{idea}", idea)
        .replace("{target_length}", &target.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::test_fixtures::make_profile;

    #[test]
    fn test_variant_prompt_fills_placeholders() {
        let profile = make_profile();
        let prompt =
            build_variant_prompt(&profile, VariantType::ShortPunchy, "ship early and iterate");

        assert!(prompt.contains("sharp, punchy standalone post"));
        assert!(prompt.contains("Style comes from the voice profile"));
        assert!(prompt.contains("\"dominant_tones\""));
        assert!(prompt.contains("ship early and iterate"));
        // fixture avg_length 180.0 at the short fraction 0.35
        assert!(prompt.contains("about 63 characters"));

        assert!(!prompt.contains("{framing}"));
        assert!(!prompt.contains("{fidelity_instruction}"));
        assert!(!prompt.contains("{voice_profile_json}"));
        assert!(!prompt.contains("{idea}"));
        assert!(!prompt.contains("{target_length}"));
    }

    #[test]
    fn test_variant_prompt_resolves_profile_specific_framings() {
        let profile = make_profile();

        let insight =
            build_variant_prompt(&profile, VariantType::ProfessionalInsight, "an idea");
        assert!(insight.contains("expertise in: distributed systems."));

        let casual = build_variant_prompt(&profile, VariantType::CasualPersonal, "an idea");
        assert!(casual.contains("personal disclosure is: occasional."));
    }

    #[test]
    fn test_variant_system_carries_plain_output_contract() {
        let system = variant_system();
        assert!(system.contains("ghostwriter"));
        assert!(system.contains("NOTHING else"));
    }
}
