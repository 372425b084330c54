//! Twitter v1.1-style API integration.
//!
//! Quota telemetry lives behind a dedicated status endpoint rather than
//! response headers, so the timeline backfill queries it before every
//! page. Identical requests are memoised in a bounded LRU so repeated
//! lookups cost no quota at all.
pub mod client;
pub mod types;

pub use client::{TwitterApi, TwitterCredentials};
