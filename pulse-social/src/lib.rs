//! Social platform clients with rate-limit-aware fetching.
//!
//! Three thin API wrappers share one behavioural contract: issue a GET,
//! decode the JSON body, observe the platform's quota telemetry, and
//! suspend (cancellably) when the quota is exhausted. Each platform
//! reports telemetry differently:
//!
//! - [`instagram`] reads remaining/reset from response headers.
//! - [`tiktok`] returns the snapshot to the caller, who threads it into
//!   the next call.
//! - [`twitter`] queries a dedicated status endpoint before each
//!   timeline page, and memoises identical requests in a bounded LRU.
//!
//! Nothing here retries: transport and parse failures propagate to the
//! caller on the first occurrence.
pub mod error;
pub mod instagram;
pub mod rate;
pub mod tiktok;
pub mod twitter;

pub use error::{FetchError, Result};
pub use instagram::InstagramApi;
pub use tiktok::TikTokApi;
pub use twitter::TwitterApi;
