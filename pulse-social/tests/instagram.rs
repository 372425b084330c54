use pulse_common::TelemetryPolicy;
use pulse_social::instagram::types::Profile;
use pulse_social::{FetchError, InstagramApi};
use serde_json::json;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn epoch_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn profile_body() -> serde_json::Value {
    json!({"id": "17841400000000000", "username": "gallery", "media_count": 12})
}

#[tokio::test(flavor = "multi_thread")]
async fn quota_left_means_one_call_and_no_wait() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(query_param("access_token", "tok"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(profile_body())
                .insert_header("x-ratelimit-remaining", "42")
                .insert_header("x-ratelimit-reset", epoch_now().to_string().as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = InstagramApi::with_base_url(&server.uri(), "tok".into()).unwrap();
    let started = Instant::now();
    let profile: Profile = api.profile().await.unwrap();
    assert_eq!(profile.username.as_deref(), Some("gallery"));
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test(flavor = "multi_thread")]
async fn exhausted_quota_suspends_until_reset() {
    let server = MockServer::start().await;
    let reset = epoch_now() + 2;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(profile_body())
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("x-ratelimit-reset", reset.to_string().as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = InstagramApi::with_base_url(&server.uri(), "tok".into()).unwrap();
    let started = Instant::now();
    let profile: Profile = api.profile().await.unwrap();
    // reset is 2s out; with whole-second truncation the wait is >= 1s.
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(profile.id, "17841400000000000");
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_body_is_parse_error_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/media"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let api = InstagramApi::with_base_url(&server.uri(), "tok".into()).unwrap();
    let err = api.posts().await.unwrap_err();
    assert!(matches!(err, FetchError::Parse(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_telemetry_fails_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body()))
        .mount(&server)
        .await;

    let api = InstagramApi::with_base_url(&server.uri(), "tok".into()).unwrap();
    let err = api.profile().await.unwrap_err();
    assert!(matches!(err, FetchError::RateLimitTelemetryMissing));
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_telemetry_can_be_skipped_by_policy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body()))
        .expect(1)
        .mount(&server)
        .await;

    let api = InstagramApi::with_base_url(&server.uri(), "tok".into())
        .unwrap()
        .with_telemetry_policy(TelemetryPolicy::SkipWait);
    let profile: Profile = api.profile().await.unwrap();
    assert_eq!(profile.id, "17841400000000000");
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelling_a_rate_wait_surfaces_cancelled() {
    let server = MockServer::start().await;
    let reset = epoch_now() + 120;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(profile_body())
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("x-ratelimit-reset", reset.to_string().as_str()),
        )
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let api = InstagramApi::with_base_url(&server.uri(), "tok".into())
        .unwrap()
        .with_cancellation(cancel.clone());

    let task = tokio::spawn(async move { api.profile().await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    let started = Instant::now();
    cancel.cancel();

    let result = task.await.unwrap();
    assert!(matches!(result, Err(FetchError::Cancelled)));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test(flavor = "multi_thread")]
async fn engagement_endpoints_hit_media_scoped_paths() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/17900001/comments"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": [{"id": "c1", "text": "nice"}]}))
                .insert_header("x-ratelimit-remaining", "10")
                .insert_header("x-ratelimit-reset", epoch_now().to_string().as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = InstagramApi::with_base_url(&server.uri(), "tok".into()).unwrap();
    let comments = api.comments("17900001").await.unwrap();
    assert_eq!(comments.data.len(), 1);
    assert_eq!(comments.data[0].text.as_deref(), Some("nice"));
}
