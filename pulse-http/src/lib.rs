//! Minimal HTTP GET client shared by the Pulse platform fetchers.
//!
//! - Request options: headers, `Auth`, query params, timeout
//! - Redacts sensitive query params and never logs secret values
//! - Surfaces rate-limit telemetry headers as a typed [`RateLimit`]
//!
//! The client performs exactly one attempt per call. Quota handling,
//! pagination, and any retry decision belong to the caller, not the
//! transport: a network failure or non-2xx status propagates immediately.
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), pulse_http::HttpError> {
//! let client = pulse_http::HttpClient::new("https://api.example.com")?;
//! let got: serde_json::Value = client
//!     .get_json("v1/items", pulse_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! Security: `Auth::Bearer` values are sanitized before use, and logs only
//! ever include the auth kind (bearer/header/query/none), not the secret.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::borrow::Cow;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

// ==============================
// Auth & Request Options
// ==============================

/// Authentication strategies supported by the HTTP client helpers.
///
/// ```
/// use pulse_http::Auth;
///
/// let bearer = Auth::Bearer("token");
/// match bearer {
///     Auth::Bearer(value) => assert_eq!(value, "token"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// Authorization: Bearer <token>
    Bearer(&'a str),
    /// Custom header auth
    Header {
        name: HeaderName,
        value: HeaderValue,
    },
    /// Auth via query param (e.g. Graph-style `access_token`)
    Query {
        name: &'a str,
        value: Cow<'a, str>,
    },
    None,
}

/// Per-request tuning knobs for the HTTP client.
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub auth: Option<Auth<'a>>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>, // e.g. [("offset", "20".into())]
}

// ==============================
// Rate-limit telemetry
// ==============================

/// Header names a platform uses to report quota. Lookups are
/// case-insensitive, so lowercase names match `rateLimit-remaining` on the
/// wire as well.
#[derive(Clone, Copy, Debug)]
pub struct RateLimitHeaderNames {
    pub remaining: &'static str,
    pub reset: &'static str,
}

/// A quota snapshot reported by a platform alongside one response.
///
/// Only meaningful immediately after the call that produced it; the
/// transport never caches it.
///
/// ```
/// use pulse_http::RateLimit;
/// use std::time::{Duration, SystemTime};
///
/// let rate = RateLimit { remaining: 0, reset_epoch_secs: 120 };
/// assert!(rate.exhausted());
/// let now = SystemTime::UNIX_EPOCH + Duration::from_secs(100);
/// assert_eq!(rate.wait_duration(now), Duration::from_secs(20));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimit {
    pub remaining: u64,
    /// Instant the quota window refills, as unix epoch seconds.
    pub reset_epoch_secs: u64,
}

impl RateLimit {
    pub fn exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Time left until the window resets; zero when the reset is already past.
    pub fn wait_duration(&self, now: SystemTime) -> Duration {
        let now_secs = now
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Duration::from_secs(self.reset_epoch_secs.saturating_sub(now_secs))
    }

    /// Parse a snapshot from response headers. Returns `None` when either
    /// header is absent or unparseable; the caller decides what missing
    /// telemetry means.
    pub fn from_headers(headers: &HeaderMap, names: &RateLimitHeaderNames) -> Option<Self> {
        let remaining = header_u64(headers, names.remaining)?;
        let reset_epoch_secs = header_u64(headers, names.reset)?;
        Some(Self {
            remaining,
            reset_epoch_secs,
        })
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// A decoded payload together with the quota snapshot that came with it.
#[derive(Debug)]
pub struct WithRate<T> {
    pub payload: T,
    pub rate: Option<RateLimit>,
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```no_run
    /// use pulse_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(15),
        })
    }

    /// Override the default timeout returned by [`HttpClient::new`].
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// GET JSON with per-request options (headers/query/auth/timeout).
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let (body, _headers) = self.get_checked(path, opts).await?;
        decode_json(&body)
    }

    /// GET JSON and also surface the platform's rate-limit headers.
    pub async fn get_json_with_rate<T>(
        &self,
        path: &str,
        opts: RequestOpts<'_>,
        names: &RateLimitHeaderNames,
    ) -> Result<WithRate<T>, HttpError>
    where
        T: DeserializeOwned,
    {
        let (body, headers) = self.get_checked(path, opts).await?;
        let rate = RateLimit::from_headers(&headers, names);
        Ok(WithRate {
            payload: decode_json(&body)?,
            rate,
        })
    }

    // ==============================
    // Core request implementation
    // ==============================

    /// One GET, one attempt: build, send, read the body, and map non-2xx
    /// statuses to `HttpError::Api`. Returns the raw body plus response
    /// headers so callers can read telemetry.
    async fn get_checked(
        &self,
        path: &str,
        mut opts: RequestOpts<'_>,
    ) -> Result<(Vec<u8>, HeaderMap), HttpError> {
        let url = self
            .base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))?;

        let mut rb = self.inner.get(url.clone());

        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        rb = rb.timeout(timeout);

        // Query-param auth folds into the regular query list so it is sent
        // (and redacted for logging) exactly once.
        let auth_kind = match &opts.auth {
            Some(Auth::Bearer(_)) => "bearer",
            Some(Auth::Header { .. }) => "header",
            Some(Auth::Query { .. }) => "query",
            Some(Auth::None) | None => "none",
        };
        if let Some(auth) = opts.auth.take() {
            match auth {
                Auth::Bearer(tok) => {
                    let tok = sanitize_api_key(tok)?;
                    rb = rb.bearer_auth(tok);
                }
                Auth::Header { name, value } => {
                    rb = rb.header(name, value);
                }
                Auth::Query { name, value } => {
                    opts.query.get_or_insert_with(Vec::new).push((name, value));
                }
                Auth::None => {}
            }
        }

        if let Some(q) = &opts.query {
            let pairs: Vec<(&str, &str)> = q.iter().map(|(k, v)| (*k, v.as_ref())).collect();
            rb = rb.query(&pairs);
        }

        if let Some(hdrs) = &opts.headers {
            rb = rb.headers(hdrs.clone());
        }

        tracing::debug!(
            method = "GET",
            host_path = %format!("{}{}", url.domain().unwrap_or("-"), url.path()),
            query = ?redact_query_pairs(opts.query.as_deref()),
            timeout_ms = timeout.as_millis() as u64,
            auth_kind,
            "http.request.start"
        );

        let t0 = std::time::Instant::now();
        let resp = rb
            .send()
            .await
            .map_err(|e| HttpError::Network(e.to_string()))?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp
            .bytes()
            .await
            .map_err(|e| HttpError::Network(e.to_string()))?
            .to_vec();
        let dur_ms = t0.elapsed().as_millis() as u64;

        let request_id = headers
            .get("x-request-id")
            .or_else(|| headers.get("x-correlation-id"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::debug!(
            %status,
            duration_ms = dur_ms,
            body_len = body.len(),
            x_request_id = %request_id,
            "http.response.headers"
        );

        if status.is_success() {
            return Ok((body, headers));
        }

        let message = extract_error_message(&body);
        tracing::warn!(
            %status,
            message = %message,
            x_request_id = %request_id,
            body_snippet = %snip_body(&body),
            "http.error"
        );
        Err(HttpError::Api {
            status,
            message,
            request_id: request_id.to_string(),
        })
    }
}

// ==============================
// Helpers
// ==============================

fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, HttpError> {
    serde_json::from_slice::<T>(body).map_err(|e| {
        let snippet = snip_body(body);
        tracing::warn!(
            serde_err = %e,
            body_snippet = %snippet,
            "http.response.decode_error"
        );
        HttpError::Decode(e.to_string(), snippet)
    })
}

/// Best-effort error message from a failed response body.
fn extract_error_message(body: &[u8]) -> String {
    // Graph style: {"error":{"message":"..."}}
    #[derive(Deserialize)]
    struct GraphEnv {
        error: GraphDetail,
    }
    #[derive(Deserialize)]
    struct GraphDetail {
        message: String,
    }

    // Twitter v1.1: {"errors":[{"message":"..."}]}
    #[derive(Deserialize)]
    struct ErrorsEnv {
        errors: Vec<ErrorItem>,
    }
    #[derive(Deserialize)]
    struct ErrorItem {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
    }

    // Generic: {"message":"..."} or {"error":"..."}
    #[derive(Deserialize)]
    struct Msg {
        #[serde(default)]
        message: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(env) = serde_json::from_slice::<GraphEnv>(body) {
        return env.error.message;
    }
    if let Ok(env) = serde_json::from_slice::<ErrorsEnv>(body) {
        if let Some(first) = env.errors.into_iter().next() {
            if !first.message.is_empty() {
                return first.message;
            }
            if !first.detail.is_empty() {
                return first.detail;
            }
        }
    }
    if let Ok(m) = serde_json::from_slice::<Msg>(body) {
        if !m.message.is_empty() {
            return m.message;
        }
        if !m.error.is_empty() {
            return m.error;
        }
    }
    snip_body(body)
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > 500 {
        snip.truncate(500);
        snip.push_str("...");
    }
    snip
}

fn redact_query_pairs(query: Option<&[(&str, Cow<'_, str>)]>) -> Vec<(String, String)> {
    query
        .map(|q| {
            q.iter()
                .map(|(k, v)| {
                    let key = (*k).to_string();
                    if is_secret_param(&key) {
                        (key, "<redacted>".to_string())
                    } else {
                        (key, v.as_ref().to_string())
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

fn is_secret_param(key: &str) -> bool {
    matches!(
        key.to_ascii_lowercase().as_str(),
        "access_token"
            | "authorization"
            | "auth"
            | "key"
            | "api_key"
            | "token"
            | "secret"
            | "client_secret"
            | "bearer"
    )
}

fn sanitize_api_key(raw: &str) -> Result<String, HttpError> {
    // Trim outer spaces/quotes, then drop all ASCII whitespace
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    s.retain(|ch| !ch.is_ascii_whitespace());

    if !s.is_ascii() {
        return Err(HttpError::Build("API key contains non-ASCII bytes".into()));
    }
    if s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build(
            "API key contains control characters".into(),
        ));
    }

    // Validate header value upfront for clear errors
    HeaderValue::from_str(&format!("Bearer {}", s))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(s)
}
