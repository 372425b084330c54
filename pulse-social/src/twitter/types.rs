use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tweet {
    pub id: u64,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub retweet_count: Option<u64>,
    #[serde(default)]
    pub favorite_count: Option<u64>,
    #[serde(default)]
    pub user: Option<TweetUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetUser {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub screen_name: Option<String>,
}

/// Envelope returned by the rate-limit status endpoint. Every level is
/// optional so an unexpected shape maps to missing telemetry instead of a
/// parse failure.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitStatusResponse {
    #[serde(default)]
    pub resources: Option<Resources>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Resources {
    #[serde(default)]
    pub statuses: Option<HashMap<String, ResourceQuota>>,
}

/// Remaining/reset pair for one named resource.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ResourceQuota {
    pub remaining: u64,
    /// Unix epoch seconds at which the window refills.
    pub reset: u64,
}
