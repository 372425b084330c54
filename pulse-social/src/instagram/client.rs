//! Client wrapper for the Instagram Graph-style endpoints.
//!
//! Every call goes through [`InstagramApi::fetch`], which reads the
//! platform's quota headers off the response it just received. When the
//! window is spent, the fetch suspends until the advertised reset before
//! returning the payload, so the next call from the same flow can never
//! exceed the quota.
use crate::error::FetchError;
use crate::instagram::types::{CommentList, InsightList, LikeList, MediaList, Profile};
use crate::rate;
use pulse_common::TelemetryPolicy;
use pulse_http::{Auth, HttpClient, RateLimitHeaderNames, RequestOpts};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use tokio_util::sync::CancellationToken;

const DEFAULT_BASE: &str = "https://graph.instagram.com";

const RATE_HEADERS: RateLimitHeaderNames = RateLimitHeaderNames {
    remaining: "x-ratelimit-remaining",
    reset: "x-ratelimit-reset",
};

#[derive(Clone)]
pub struct InstagramApi {
    http: HttpClient,
    access_token: String,
    policy: TelemetryPolicy,
    cancel: CancellationToken,
}

impl InstagramApi {
    pub fn new(access_token: String) -> Self {
        Self::with_base_url(DEFAULT_BASE, access_token).expect("instagram base url")
    }

    /// Point the client at a different host (tests, proxies).
    pub fn with_base_url(base: &str, access_token: String) -> Result<Self, FetchError> {
        let http = HttpClient::new(base)?;
        Ok(Self {
            http,
            access_token,
            policy: TelemetryPolicy::default(),
            cancel: CancellationToken::new(),
        })
    }

    /// Choose how missing quota headers are handled (default: fail).
    pub fn with_telemetry_policy(mut self, policy: TelemetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Share a cancellation token; cancelling it aborts any rate wait.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// One GET against `path`, decoding the JSON body into `T`.
    ///
    /// Telemetry comes from the response headers of this very call, so the
    /// quota check happens after the request: an exhausted window delays
    /// the *return*, which paces whatever the caller does next.
    pub async fn fetch<T>(
        &self,
        path: &str,
        params: Vec<(&str, Cow<'_, str>)>,
    ) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
    {
        let got = self
            .http
            .get_json_with_rate::<T>(
                path,
                RequestOpts {
                    auth: Some(Auth::Query {
                        name: "access_token",
                        value: Cow::Borrowed(&self.access_token),
                    }),
                    query: Some(params),
                    ..Default::default()
                },
                &RATE_HEADERS,
            )
            .await?;

        match got.rate {
            Some(limit) => {
                tracing::trace!(
                    target: "social.instagram",
                    path,
                    remaining = limit.remaining,
                    "quota observed"
                );
                rate::wait_for_reset("instagram", &limit, &self.cancel).await?;
            }
            None => match self.policy {
                TelemetryPolicy::Fail => return Err(FetchError::RateLimitTelemetryMissing),
                TelemetryPolicy::SkipWait => {
                    tracing::debug!(
                        target: "social.instagram",
                        path,
                        "no quota headers on response, proceeding without wait"
                    );
                }
            },
        }

        Ok(got.payload)
    }

    pub async fn profile(&self) -> Result<Profile, FetchError> {
        self.fetch("me", Vec::new()).await
    }

    pub async fn posts(&self) -> Result<MediaList, FetchError> {
        self.fetch("me/media", Vec::new()).await
    }

    pub async fn likes(&self, media_id: &str) -> Result<LikeList, FetchError> {
        self.fetch(&format!("{media_id}/likes"), Vec::new()).await
    }

    pub async fn comments(&self, media_id: &str) -> Result<CommentList, FetchError> {
        self.fetch(&format!("{media_id}/comments"), Vec::new())
            .await
    }

    pub async fn insights(&self, media_id: &str) -> Result<InsightList, FetchError> {
        self.fetch(&format!("{media_id}/insights"), Vec::new())
            .await
    }
}
