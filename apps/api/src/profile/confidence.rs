/// Confidence scoring for voice profiles.
///
/// A 0-100 score answering "how much should generation trust this profile".
/// Advisory only: a low score never blocks profile creation or generation,
/// it surfaces in API responses so callers can prompt for a refresh.
use serde::Serialize;

use crate::models::profile::{ProfileSource, VoiceProfile};

/// Score slice ceilings. Together they sum to 100.
const SAMPLE_TIER_MAX: f32 = 40.0;
const RICHNESS_MAX: f32 = 20.0;
const CONSISTENCY_MAX: f32 = 10.0;
const DEPTH_MAX: f32 = 30.0;

const VALID_THRESHOLD: u8 = 60;

#[derive(Debug, Clone, Serialize)]
pub struct ConfidenceRecord {
    pub score: u8,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub score: u8,
    pub issues: Vec<String>,
}

/// Structural validation with fixed penalties.
///
/// Start at 100 and deduct:
/// - empty dominant tone list: -20
/// - no opening hooks: -15
/// - missing vocabulary level: -10
/// - zero average length: -20
/// - confidence_level outside 0.0..=1.0: -15
///
/// `is_valid` means score >= 60. Deliberately advisory; the builder turns a
/// failing report into warnings, never an error.
pub fn validate(profile: &VoiceProfile) -> ValidationReport {
    let mut score: i32 = 100;
    let mut issues = Vec::new();

    if profile.personality.dominant_tones.is_empty() {
        score -= 20;
        issues.push("no dominant tones identified".to_string());
    }
    if profile.signature.opening_patterns.is_empty() {
        score -= 15;
        issues.push("no opening hooks captured".to_string());
    }
    if profile.language.vocabulary_level.is_empty() {
        score -= 10;
        issues.push("vocabulary level missing".to_string());
    }
    if profile.structure.avg_length <= 0.0 {
        score -= 20;
        issues.push("average post length is zero".to_string());
    }
    let confidence = profile.personality.confidence_level;
    if !(0.0..=1.0).contains(&confidence) {
        score -= 15;
        issues.push(format!(
            "confidence_level {confidence} outside the 0.0-1.0 range"
        ));
    }

    let score = score.clamp(0, 100) as u8;
    ValidationReport {
        is_valid: score >= VALID_THRESHOLD,
        score,
        issues,
    }
}

/// Full scoring path: validates, then feeds the validation score into the
/// analysis-depth slice.
pub fn score(profile: &VoiceProfile, sample_count: usize) -> ConfidenceRecord {
    let validation = validate(profile);
    let mut record = compute_confidence(profile, sample_count, Some(validation.score));
    record.issues.extend(validation.issues);
    record
}

/// Combines the four slices. When no analysis-depth input is available the
/// remaining 70 points are rescaled to the full range so both paths share one
/// 0-100 interpretation.
pub fn compute_confidence(
    profile: &VoiceProfile,
    sample_count: usize,
    analysis_depth: Option<u8>,
) -> ConfidenceRecord {
    let mut issues = Vec::new();

    let tier = sample_tier(profile, sample_count);
    if profile.source == ProfileSource::Heuristic {
        issues.push("heuristic fallback profile; sample tier capped".to_string());
    }

    let richness = pattern_richness(profile);
    let consistency = internal_consistency(profile);

    let total = match analysis_depth {
        Some(depth) => {
            let depth_points = (f32::from(depth) / 100.0 * DEPTH_MAX).min(DEPTH_MAX);
            tier + richness + consistency + depth_points
        }
        // rescale 70 attainable points to the full range
        None => (tier + richness + consistency) * 100.0 / (100.0 - DEPTH_MAX),
    };

    ConfidenceRecord {
        score: total.round().clamp(0.0, 100.0) as u8,
        issues,
    }
}

/// More samples, more trust: >=200 -> 40, >=100 -> 35, >=50 -> 30,
/// >=20 -> 25, else 20. Heuristic profiles are pinned to the floor no matter
/// how many samples went in; the samples were never actually analyzed.
fn sample_tier(profile: &VoiceProfile, sample_count: usize) -> f32 {
    if profile.source == ProfileSource::Heuristic {
        return 20.0;
    }
    let tier: f32 = match sample_count {
        n if n >= 200 => 40.0,
        n if n >= 100 => 35.0,
        n if n >= 50 => 30.0,
        n if n >= 20 => 25.0,
        _ => 20.0,
    };
    tier.min(SAMPLE_TIER_MAX)
}

/// +5 for each signature list that is genuinely populated rather than a
/// token single entry.
fn pattern_richness(profile: &VoiceProfile) -> f32 {
    let mut points: f32 = 0.0;
    if profile.signature.opening_patterns.len() > 3 {
        points += 5.0;
    }
    if profile.signature.transition_phrases.len() > 5 {
        points += 5.0;
    }
    if profile.signature.unique_expressions.len() > 2 {
        points += 5.0;
    }
    if profile.personality.dominant_tones.len() > 1 {
        points += 5.0;
    }
    points.min(RICHNESS_MAX)
}

/// +5 when the question flag is backed by an actual question rate, +5 when
/// the emoji flag agrees with the measured rate.
fn internal_consistency(profile: &VoiceProfile) -> f32 {
    let mut points: f32 = 0.0;
    if profile.engagement.uses_questions && profile.engagement.question_frequency > 0.20 {
        points += 5.0;
    }
    let says_high = profile.language.emoji_usage == "high";
    let measures_high = profile.language.emoji_rate > 0.30;
    if says_high == measures_high {
        points += 5.0;
    }
    points.min(CONSISTENCY_MAX)
}
