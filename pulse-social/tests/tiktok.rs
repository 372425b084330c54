use futures::TryStreamExt;
use pulse_http::RateLimit;
use pulse_social::tiktok::client::PAGE_SIZE;
use pulse_social::TikTokApi;
use serde_json::json;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn epoch_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn page_body(start: usize, len: usize) -> serde_json::Value {
    let items: Vec<_> = (start..start + len)
        .map(|i| json!({"id": format!("post-{i}"), "description": format!("clip {i}")}))
        .collect();
    json!({"items": items, "has_more": start + len < 45})
}

async fn mount_page(server: &MockServer, offset: u64, len: usize) {
    Mock::given(method("GET"))
        .and(path("/v1/item/list"))
        .and(query_param("api_key", "key"))
        .and(query_param("user_id", "2222"))
        .and(query_param("count", PAGE_SIZE.to_string().as_str()))
        .and(query_param("offset", offset.to_string().as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_body(offset as usize, len))
                .insert_header("rateLimit-remaining", "30")
                .insert_header("rateLimit-reset", epoch_now().to_string().as_str()),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn iterate_posts_pages_through_the_full_count() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/profile"))
        .and(query_param("api_key", "key"))
        .and(query_param("user_id", "2222"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"user_id": "2222", "item_count": 45}))
                .insert_header("rateLimit-remaining", "30")
                .insert_header("rateLimit-reset", epoch_now().to_string().as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, 0, 20).await;
    mount_page(&server, 20, 20).await;
    mount_page(&server, 40, 5).await;

    let api = TikTokApi::with_base_url(&server.uri(), "key".into(), "2222".into()).unwrap();
    let posts: Vec<_> = api.iterate_posts().try_collect().await.unwrap();

    // 45 posts over pages of 20 means exactly 3 page requests (offsets
    // 0/20/40, enforced by the mock expectations) in page order.
    assert_eq!(posts.len(), 45);
    assert_eq!(posts[0].id, "post-0");
    assert_eq!(posts[19].id, "post-19");
    assert_eq!(posts[20].id, "post-20");
    assert_eq!(posts[44].id, "post-44");
}

#[tokio::test(flavor = "multi_thread")]
async fn exhausted_prior_snapshot_delays_the_next_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/item/list"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_body(0, 1))
                .insert_header("rateLimit-remaining", "30")
                .insert_header("rateLimit-reset", epoch_now().to_string().as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = TikTokApi::with_base_url(&server.uri(), "key".into(), "2222".into()).unwrap();
    let spent = RateLimit {
        remaining: 0,
        reset_epoch_secs: epoch_now() + 2,
    };

    let started = Instant::now();
    let page = api.posts(PAGE_SIZE, 0, Some(&spent)).await.unwrap();
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(page.payload.items.len(), 1);
    // the response telemetry replaces the spent snapshot
    assert_eq!(page.rate.unwrap().remaining, 30);
}

#[tokio::test(flavor = "multi_thread")]
async fn fresh_snapshot_passes_straight_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/profile"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"item_count": 7}))
                .insert_header("rateLimit-remaining", "99")
                .insert_header("rateLimit-reset", epoch_now().to_string().as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = TikTokApi::with_base_url(&server.uri(), "key".into(), "2222".into()).unwrap();
    let started = Instant::now();
    assert_eq!(api.post_count().await.unwrap(), 7);
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test(flavor = "multi_thread")]
async fn absent_headers_thread_as_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"item_count": 3})))
        .mount(&server)
        .await;

    let api = TikTokApi::with_base_url(&server.uri(), "key".into(), "2222".into()).unwrap();
    let got = api.profile(None).await.unwrap();
    assert!(got.rate.is_none());
    assert_eq!(got.payload.item_count, 3);
}
