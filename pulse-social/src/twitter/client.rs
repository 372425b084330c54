//! Client wrapper for the Twitter v1.1-style endpoints.
//!
//! Two behaviours distinguish this platform from the others:
//!
//! - [`TwitterApi::request`] memoises payloads in a bounded LRU keyed by
//!   `(path, params)`, so identical fetches cost one network call for the
//!   life of the entry.
//! - [`TwitterApi::all_tweets`] checks the dedicated rate-limit status
//!   endpoint before every page and suspends until the advertised reset
//!   when the timeline resource is spent. The status call bypasses the
//!   cache: a memoised quota snapshot would never change again.
use crate::error::FetchError;
use crate::rate;
use crate::twitter::types::{RateLimitStatusResponse, Tweet};
use lru::LruCache;
use pulse_http::{Auth, HttpClient, RateLimit, RequestOpts};
use serde_json::Value;
use std::borrow::Cow;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

const DEFAULT_BASE: &str = "https://api.twitter.com";

/// Entries kept when no capacity is configured.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Tweets requested per timeline page.
const PAGE_COUNT: u32 = 100;

const TIMELINE_PATH: &str = "1.1/statuses/user_timeline.json";
const STATUS_PATH: &str = "1.1/application/rate_limit_status.json";
const TIMELINE_RESOURCE: &str = "/statuses/user_timeline";

/// Opaque credential 4-tuple. The client attaches the access token as a
/// bearer header; producing signed OAuth1 credentials is the
/// collaborator's concern, not this wrapper's.
#[derive(Clone)]
pub struct TwitterCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

type CacheKey = (String, Vec<(String, String)>);

#[derive(Clone)]
pub struct TwitterApi {
    http: HttpClient,
    creds: TwitterCredentials,
    cache: Arc<Mutex<LruCache<CacheKey, Arc<Value>>>>,
    cancel: CancellationToken,
}

impl TwitterApi {
    pub fn new(creds: TwitterCredentials) -> Self {
        Self::with_base_url(DEFAULT_BASE, creds, DEFAULT_CACHE_CAPACITY)
            .expect("twitter base url")
    }

    /// Full-control constructor: host override plus cache capacity.
    pub fn with_base_url(
        base: &str,
        creds: TwitterCredentials,
        cache_capacity: usize,
    ) -> Result<Self, FetchError> {
        let http = HttpClient::new(base)?;
        let capacity = NonZeroUsize::new(cache_capacity)
            .or(NonZeroUsize::new(DEFAULT_CACHE_CAPACITY))
            .expect("default capacity is non-zero");
        Ok(Self {
            http,
            creds,
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
            cancel: CancellationToken::new(),
        })
    }

    /// Bound the memoisation cache (entries, not bytes).
    pub fn with_cache_capacity(creds: TwitterCredentials, cache_capacity: usize) -> Self {
        Self::with_base_url(DEFAULT_BASE, creds, cache_capacity).expect("twitter base url")
    }

    /// Share a cancellation token; cancelling it aborts any rate wait.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    async fn fetch_uncached(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<Value, FetchError> {
        let query: Vec<(&str, Cow<'_, str>)> = params
            .iter()
            .map(|(k, v)| (k.as_str(), Cow::Borrowed(v.as_str())))
            .collect();
        let value = self
            .http
            .get_json::<Value>(
                path,
                RequestOpts {
                    auth: Some(Auth::Bearer(&self.creds.access_token)),
                    query: Some(query),
                    ..Default::default()
                },
            )
            .await?;
        Ok(value)
    }

    /// Memoising fetch: an identical `(path, params)` pair is served from
    /// the cache without a network call; a miss fetches and stores. Safe
    /// to call from concurrent tasks; the lock is never held across I/O.
    pub async fn request(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<Arc<Value>, FetchError> {
        let key: CacheKey = (path.to_string(), params.to_vec());

        let hit = {
            let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            cache.get(&key).cloned()
        };
        if let Some(payload) = hit {
            tracing::debug!(target: "social.twitter", path, "request served from cache");
            return Ok(payload);
        }

        let payload = Arc::new(self.fetch_uncached(path, params).await?);
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.put(key, payload.clone());
        Ok(payload)
    }

    /// Fresh quota snapshot for the user-timeline resource.
    ///
    /// Always hits the network; see the module docs for why this bypasses
    /// [`TwitterApi::request`]. Absent fields map to
    /// [`FetchError::RateLimitTelemetryMissing`].
    pub async fn rate_limit_status(&self) -> Result<RateLimit, FetchError> {
        let params = [("resources".to_string(), "statuses".to_string())];
        let value = self.fetch_uncached(STATUS_PATH, &params).await?;
        let status: RateLimitStatusResponse =
            serde_json::from_value(value).map_err(|e| FetchError::Parse(e.to_string()))?;

        let quota = status
            .resources
            .and_then(|r| r.statuses)
            .and_then(|mut statuses| statuses.remove(TIMELINE_RESOURCE))
            .ok_or(FetchError::RateLimitTelemetryMissing)?;

        Ok(RateLimit {
            remaining: quota.remaining,
            reset_epoch_secs: quota.reset,
        })
    }

    /// One timeline page (up to 100 tweets, retweets excluded), fetched
    /// through the memoising cache.
    pub async fn user_timeline(
        &self,
        screen_name: &str,
        max_id: Option<u64>,
    ) -> Result<Vec<Tweet>, FetchError> {
        let mut params = vec![
            ("screen_name".to_string(), screen_name.to_string()),
            ("count".to_string(), PAGE_COUNT.to_string()),
            ("include_rts".to_string(), "false".to_string()),
        ];
        if let Some(id) = max_id {
            params.push(("max_id".to_string(), id.to_string()));
        }
        let value = self.request(TIMELINE_PATH, &params).await?;
        serde_json::from_value((*value).clone()).map_err(|e| FetchError::Parse(e.to_string()))
    }

    /// Backfill the full timeline for `screen_name`, oldest-last.
    ///
    /// Before each page the quota is re-checked via the status endpoint;
    /// a spent window suspends until its reset, with no upper bound on
    /// the wait (cancellation token excepted). The cursor walks strictly
    /// backwards (`max_id = min(id) - 1`) and the loop ends on the first
    /// empty page, or earlier if the cursor can no longer decrease.
    pub async fn all_tweets(&self, screen_name: &str) -> Result<Vec<Tweet>, FetchError> {
        let mut all = Vec::new();
        let mut max_id: Option<u64> = None;

        loop {
            let quota = self.rate_limit_status().await?;
            rate::wait_for_reset("twitter", &quota, &self.cancel).await?;

            let page = self.user_timeline(screen_name, max_id).await?;
            let Some(oldest) = page.iter().map(|t| t.id).min() else {
                break;
            };
            tracing::debug!(
                target: "social.twitter",
                screen_name,
                page_len = page.len(),
                oldest,
                "timeline page fetched"
            );
            all.extend(page);
            if oldest == 0 {
                break;
            }
            let next = oldest - 1;
            // A cursor that stops decreasing would replay the same cached
            // page forever.
            if max_id.is_some_and(|prev| next >= prev) {
                break;
            }
            max_id = Some(next);
        }

        tracing::info!(
            target: "social.twitter",
            screen_name,
            total = all.len(),
            "timeline backfill complete"
        );
        Ok(all)
    }
}
