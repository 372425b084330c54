use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    /// Total number of posts the account has published; the pagination
    /// loop snapshots this once per iteration.
    pub item_count: u64,
    #[serde(default)]
    pub follower_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ItemList {
    #[serde(default)]
    pub items: Vec<Post>,
    #[serde(default)]
    pub has_more: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub create_time: Option<u64>,
    #[serde(default)]
    pub stats: Option<PostStats>,
}

/// Engagement counters attached to a post.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PostStats {
    #[serde(default)]
    pub play_count: Option<u64>,
    #[serde(default)]
    pub share_count: Option<u64>,
    #[serde(default)]
    pub digg_count: Option<u64>,
    #[serde(default)]
    pub comment_count: Option<u64>,
}
