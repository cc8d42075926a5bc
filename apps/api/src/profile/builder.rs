/// Profile builder — turns raw samples into a `VoiceProfile`.
///
/// The build can degrade but not half-succeed: the result is either an
/// AI-analyzed profile or a deterministic heuristic fallback, and the outcome
/// type keeps the two distinguishable so callers never mistake a degraded
/// profile for a full analysis.
use thiserror::Error;
use tracing::{info, warn};

use crate::llm_client::{CompletionParams, LlmClient};
use crate::models::profile::{ProfileSource, VoiceProfile};
use crate::models::sample::Sample;
use crate::profile::confidence::validate;
use crate::profile::fallback::build_fallback_profile;
use crate::profile::prompts::{analysis_system, build_analysis_prompt};

/// Below this many samples analysis is refused outright.
pub const MIN_SAMPLES: usize = 10;
/// Below this many samples the build proceeds with a quality warning.
pub const LIMITED_SAMPLES: usize = 50;
/// At most this many top-engagement samples are sent for analysis.
pub const TOP_SAMPLE_COUNT: usize = 60;

const ANALYSIS_TEMPERATURE: f32 = 0.2;
const ANALYSIS_MAX_TOKENS: u32 = 2048;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("voice analysis needs at least {min} samples, got {got}")]
    InsufficientSamples { got: usize, min: usize },
}

#[derive(Debug, Clone)]
pub enum BuildOutcome {
    /// AI analysis succeeded.
    Analyzed {
        profile: VoiceProfile,
        warnings: Vec<String>,
    },
    /// AI analysis failed; the profile is the heuristic fallback.
    Degraded {
        profile: VoiceProfile,
        warnings: Vec<String>,
    },
}

impl BuildOutcome {
    pub fn profile(&self) -> &VoiceProfile {
        match self {
            BuildOutcome::Analyzed { profile, .. } | BuildOutcome::Degraded { profile, .. } => {
                profile
            }
        }
    }

    pub fn warnings(&self) -> &[String] {
        match self {
            BuildOutcome::Analyzed { warnings, .. } | BuildOutcome::Degraded { warnings, .. } => {
                warnings
            }
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, BuildOutcome::Degraded { .. })
    }

    pub fn into_parts(self) -> (VoiceProfile, Vec<String>, bool) {
        match self {
            BuildOutcome::Analyzed { profile, warnings } => (profile, warnings, false),
            BuildOutcome::Degraded { profile, warnings } => (profile, warnings, true),
        }
    }
}

/// Builds a voice profile from the given samples.
///
/// Only insufficient input is a hard error. Upstream analysis failures
/// (exhausted retries, malformed JSON, structurally empty payloads) degrade
/// to the heuristic fallback instead of surfacing.
pub async fn build_profile(
    llm: &LlmClient,
    samples: &[Sample],
) -> Result<BuildOutcome, BuildError> {
    if samples.len() < MIN_SAMPLES {
        return Err(BuildError::InsufficientSamples {
            got: samples.len(),
            min: MIN_SAMPLES,
        });
    }

    let mut warnings = Vec::new();
    if samples.len() < LIMITED_SAMPLES {
        warnings.push(format!(
            "limited sample size ({} posts); profile quality may be reduced",
            samples.len()
        ));
    }

    let top = select_top_samples(samples);
    let prompt = build_analysis_prompt(&top);
    let params = CompletionParams {
        temperature: ANALYSIS_TEMPERATURE,
        max_tokens: ANALYSIS_MAX_TOKENS,
    };

    let analyzed = match llm
        .call_json::<VoiceProfile>(&analysis_system(), &prompt, params)
        .await
    {
        Ok(mut profile) => {
            profile.source = ProfileSource::Analyzed;
            if profile.is_structurally_complete() {
                Some(profile)
            } else {
                warn!("Analysis returned a structurally incomplete profile, using fallback");
                None
            }
        }
        Err(e) => {
            warn!("Voice analysis failed: {e}");
            None
        }
    };

    let (profile, degraded) = match analyzed {
        Some(profile) => (profile, false),
        None => {
            warnings.push("AI analysis unavailable; built heuristic fallback profile".to_string());
            (build_fallback_profile(samples), true)
        }
    };

    // Advisory only: a weak profile still gets created, with its issues
    // attached as warnings.
    let report = validate(&profile);
    if !report.is_valid {
        warnings.push(format!(
            "profile validation scored {}: {}",
            report.score,
            report.issues.join("; ")
        ));
    }

    info!(
        "Built voice profile from {} of {} samples (degraded: {})",
        top.len(),
        samples.len(),
        degraded
    );

    if degraded {
        Ok(BuildOutcome::Degraded { profile, warnings })
    } else {
        Ok(BuildOutcome::Analyzed { profile, warnings })
    }
}

/// Top samples by likes + shares, descending. The sort is stable so equal
/// engagement keeps the source's original (newest-first) order.
fn select_top_samples(samples: &[Sample]) -> Vec<&Sample> {
    let mut ranked: Vec<&Sample> = samples.iter().collect();
    ranked.sort_by(|a, b| b.engagement().cmp(&a.engagement()));
    ranked.truncate(TOP_SAMPLE_COUNT);
    ranked
}
