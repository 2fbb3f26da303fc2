use serde::{Deserialize, Serialize};

/// `GET /usage/limits`. When usage tracking is disabled server-side the
/// remaining counters are `-1`, `unlimited` is true and the `can_use_*`
/// flags are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageLimits {
    pub gpt_remaining: i64,
    pub enhancement_remaining: i64,
    #[serde(default)]
    pub unlimited: bool,
    #[serde(default)]
    pub can_use_gpt: Option<bool>,
    #[serde(default)]
    pub can_use_enhancement: Option<bool>,
    #[serde(default)]
    pub reset_time_formatted: Option<String>,
}

impl UsageLimits {
    pub fn allows_gpt(&self) -> bool {
        self.unlimited || self.can_use_gpt.unwrap_or(self.gpt_remaining > 0)
    }

    pub fn allows_enhancement(&self) -> bool {
        self.unlimited
            || self
                .can_use_enhancement
                .unwrap_or(self.enhancement_remaining > 0)
    }
}

/// `POST /usage/reset`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageReset {
    #[serde(default)]
    pub message: Option<String>,
}
