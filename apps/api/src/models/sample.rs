use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One published post pulled from the subject's account, as returned by the
/// sample source. Engagement counters default to zero so partial upstream
/// payloads still deserialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub text: String,
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub share_count: u32,
    #[serde(default)]
    pub reply_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Sample {
    /// Ranking signal for top-N selection: likes plus shares. Reply counts
    /// do not participate.
    pub fn engagement(&self) -> u64 {
        self.like_count as u64 + self.share_count as u64
    }

    /// Length in characters, not bytes.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}
