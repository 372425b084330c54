//! TikTok-style API integration.
//!
//! The platform reports quota in `rateLimit-*` response headers, but the
//! client does not stash them on any shared connection state: each fetch
//! hands the snapshot back to the caller, who threads it into the next
//! call. [`client::TikTokApi::iterate_posts`] shows the intended loop.
pub mod client;
pub mod types;

pub use client::TikTokApi;
