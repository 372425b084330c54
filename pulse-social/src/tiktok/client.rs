//! Client wrapper for the TikTok-style item-list endpoints.
//!
//! Quota telemetry is threaded explicitly: [`TikTokApi::fetch`] takes the
//! snapshot from the previous call and waits on it *before* issuing the
//! next request, then returns the fresh snapshot with the payload. No
//! rate state lives on the client or the connection.
use crate::error::FetchError;
use crate::rate;
use crate::tiktok::types::{ItemList, Post, Profile};
use async_stream::try_stream;
use futures::Stream;
use pulse_http::{Auth, HttpClient, RateLimit, RateLimitHeaderNames, RequestOpts, WithRate};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

const DEFAULT_BASE: &str = "https://api.tiktok.com";

/// Fixed page size used by the post iterator.
pub const PAGE_SIZE: u32 = 20;

// Lowercase on our side; header lookup is case-insensitive so this matches
// the platform's `rateLimit-remaining` / `rateLimit-reset` spelling.
const RATE_HEADERS: RateLimitHeaderNames = RateLimitHeaderNames {
    remaining: "ratelimit-remaining",
    reset: "ratelimit-reset",
};

pub type PostStream<'a> = Pin<Box<dyn Stream<Item = Result<Post, FetchError>> + Send + 'a>>;

#[derive(Clone)]
pub struct TikTokApi {
    http: HttpClient,
    api_key: String,
    user_id: String,
    cancel: CancellationToken,
}

impl TikTokApi {
    pub fn new(api_key: String, user_id: String) -> Self {
        Self::with_base_url(DEFAULT_BASE, api_key, user_id).expect("tiktok base url")
    }

    /// Point the client at a different host (tests, proxies).
    pub fn with_base_url(base: &str, api_key: String, user_id: String) -> Result<Self, FetchError> {
        let http = HttpClient::new(base)?;
        Ok(Self {
            http,
            api_key,
            user_id,
            cancel: CancellationToken::new(),
        })
    }

    /// Share a cancellation token; cancelling it aborts any rate wait.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// One GET against `path`. If `prior` says the quota window is spent,
    /// the call suspends until that window resets before touching the
    /// network. The returned [`WithRate`] carries the next snapshot; the
    /// first call of a flow passes `None`.
    pub async fn fetch<'a, T>(
        &'a self,
        path: &str,
        mut params: Vec<(&'a str, Cow<'a, str>)>,
        prior: Option<&RateLimit>,
    ) -> Result<WithRate<T>, FetchError>
    where
        T: DeserializeOwned,
    {
        if let Some(limit) = prior {
            rate::wait_for_reset("tiktok", limit, &self.cancel).await?;
        }

        params.push(("user_id", Cow::Borrowed(self.user_id.as_str())));
        let got = self
            .http
            .get_json_with_rate::<T>(
                path,
                RequestOpts {
                    auth: Some(Auth::Query {
                        name: "api_key",
                        value: Cow::Borrowed(&self.api_key),
                    }),
                    query: Some(params),
                    ..Default::default()
                },
                &RATE_HEADERS,
            )
            .await?;

        if let Some(limit) = &got.rate {
            tracing::trace!(
                target: "social.tiktok",
                path,
                remaining = limit.remaining,
                "quota observed"
            );
        }
        Ok(got)
    }

    pub async fn profile(
        &self,
        prior: Option<&RateLimit>,
    ) -> Result<WithRate<Profile>, FetchError> {
        self.fetch("v1/profile", Vec::new(), prior).await
    }

    /// One fixed-size page of posts at `offset`.
    pub async fn posts(
        &self,
        count: u32,
        offset: u64,
        prior: Option<&RateLimit>,
    ) -> Result<WithRate<ItemList>, FetchError> {
        let params: Vec<(&str, Cow<'_, str>)> = vec![
            ("count", count.to_string().into()),
            ("offset", offset.to_string().into()),
        ];
        self.fetch("v1/item/list", params, prior).await
    }

    pub async fn views(&self, prior: Option<&RateLimit>) -> Result<WithRate<ItemList>, FetchError> {
        self.fetch("v1/item/list", Vec::new(), prior).await
    }

    pub async fn shares(
        &self,
        prior: Option<&RateLimit>,
    ) -> Result<WithRate<ItemList>, FetchError> {
        self.fetch("v1/item/list", Vec::new(), prior).await
    }

    pub async fn likes(&self, prior: Option<&RateLimit>) -> Result<WithRate<ItemList>, FetchError> {
        self.fetch("v1/item/list", Vec::new(), prior).await
    }

    pub async fn comments(
        &self,
        prior: Option<&RateLimit>,
    ) -> Result<WithRate<ItemList>, FetchError> {
        self.fetch("v1/item/list", Vec::new(), prior).await
    }

    /// Total posts for the account, read from the profile.
    pub async fn post_count(&self) -> Result<u64, FetchError> {
        Ok(self.profile(None).await?.payload.item_count)
    }

    /// Lazy walk over every post the account has published.
    ///
    /// Snapshots the total once, then fetches pages of [`PAGE_SIZE`] at
    /// offsets 0, 20, 40, … until the offset reaches the snapshot,
    /// flattening each page's items in order. The sequence is finite and
    /// unaware of posts published while it runs; restart from scratch to
    /// pick those up. Page requests are strictly sequential because each
    /// one threads the quota snapshot of its predecessor.
    pub fn iterate_posts(&self) -> PostStream<'_> {
        let client = self.clone();
        Box::pin(try_stream! {
            let first = client.profile(None).await?;
            let total = first.payload.item_count;
            let mut limit = first.rate;
            tracing::debug!(
                target: "social.tiktok",
                total,
                page_size = PAGE_SIZE,
                "starting post iteration"
            );

            let mut offset = 0u64;
            while offset < total {
                let page = client.posts(PAGE_SIZE, offset, limit.as_ref()).await?;
                limit = page.rate;
                tracing::trace!(
                    target: "social.tiktok",
                    offset,
                    page_len = page.payload.items.len(),
                    "post page fetched"
                );
                for post in page.payload.items {
                    yield post;
                }
                offset += u64::from(PAGE_SIZE);
            }
        })
    }
}
