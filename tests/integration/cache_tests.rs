//! Cache behavior integration tests.
//!
//! Covered here:
//! - Rendered entries are reused instead of re-fetched
//! - Distinct operations and targets are cached independently
//! - Concurrent identical requests collapse into one computation
//! - Failures are never cached
//! - Entries persist on disk across service instances

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use std::time::Duration;

use super::test_utils::{
    create_test_jpeg, decoded_dimensions, test_app, test_app_with_store, MockImageSource,
};

// =============================================================================
// Cache Reuse
// =============================================================================

#[tokio::test]
async fn test_repeated_request_fetches_upstream_once() {
    let url = "http://img.example/photo.jpg";
    let source = MockImageSource::new().with_image(url, create_test_jpeg(64, 48));
    let handle = source.clone();
    let (router, _dir) = test_app(source);

    for expected_hit in ["false", "true", "true"] {
        let request = Request::builder()
            .uri(format!("/fit_width/32?url={}", url))
            .body(Body::empty())
            .unwrap();

        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("x-render-cache-hit").unwrap(),
            expected_hit
        );
    }

    assert_eq!(handle.get_request_count(url).await, 1);
}

#[tokio::test]
async fn test_different_targets_cached_independently() {
    let url = "http://img.example/photo.jpg";
    let source = MockImageSource::new().with_image(url, create_test_jpeg(64, 48));
    let handle = source.clone();
    let (router, _dir) = test_app(source);

    // Width 32 - miss
    let request1 = Request::builder()
        .uri(format!("/fit_width/32?url={}", url))
        .body(Body::empty())
        .unwrap();
    let response1 = router.clone().oneshot(request1).await.unwrap();
    assert_eq!(
        response1.headers().get("x-render-cache-hit").unwrap(),
        "false"
    );

    // Width 16 - separate entry, miss
    let request2 = Request::builder()
        .uri(format!("/fit_width/16?url={}", url))
        .body(Body::empty())
        .unwrap();
    let response2 = router.clone().oneshot(request2).await.unwrap();
    assert_eq!(
        response2.headers().get("x-render-cache-hit").unwrap(),
        "false"
    );

    // Width 32 again - hit
    let request3 = Request::builder()
        .uri(format!("/fit_width/32?url={}", url))
        .body(Body::empty())
        .unwrap();
    let response3 = router.oneshot(request3).await.unwrap();
    assert_eq!(
        response3.headers().get("x-render-cache-hit").unwrap(),
        "true"
    );

    assert_eq!(handle.get_request_count(url).await, 2);
}

#[tokio::test]
async fn test_fit_width_and_fit_height_cached_independently() {
    // A 64x64 source makes fit_width/32 and fit_height/32 produce identical
    // rasters, but the operations must still address distinct entries.
    let url = "http://img.example/square.jpg";
    let source = MockImageSource::new().with_image(url, create_test_jpeg(64, 64));
    let handle = source.clone();
    let (router, _dir) = test_app(source);

    let request1 = Request::builder()
        .uri(format!("/fit_width/32?url={}", url))
        .body(Body::empty())
        .unwrap();
    let response1 = router.clone().oneshot(request1).await.unwrap();
    assert_eq!(
        response1.headers().get("x-render-cache-hit").unwrap(),
        "false"
    );

    let request2 = Request::builder()
        .uri(format!("/fit_height/32?url={}", url))
        .body(Body::empty())
        .unwrap();
    let response2 = router.oneshot(request2).await.unwrap();
    assert_eq!(
        response2.headers().get("x-render-cache-hit").unwrap(),
        "false"
    );

    assert_eq!(handle.get_request_count(url).await, 2);
}

// =============================================================================
// Single-Flight
// =============================================================================

#[tokio::test]
async fn test_concurrent_identical_requests_fetch_once() {
    let url = "http://img.example/photo.jpg";
    let source = MockImageSource::new()
        .with_image(url, create_test_jpeg(64, 48))
        .with_delay(Duration::from_millis(50));
    let handle = source.clone();
    let (router, _dir) = test_app(source);

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let router = router.clone();
        let uri = format!("/fit_width/32?url={}", url);
        tasks.push(tokio::spawn(async move {
            let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
            router.oneshot(request).await.unwrap()
        }));
    }

    for task in tasks {
        let response = task.await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(decoded_dimensions(&body), (32, 24));
    }

    assert_eq!(
        handle.get_request_count(url).await,
        1,
        "concurrent identical requests must share one upstream fetch"
    );
}

#[tokio::test]
async fn test_concurrent_distinct_requests_run_in_parallel() {
    let url_a = "http://img.example/a.jpg";
    let url_b = "http://img.example/b.jpg";
    let source = MockImageSource::new()
        .with_image(url_a, create_test_jpeg(64, 48))
        .with_image(url_b, create_test_jpeg(48, 64))
        .with_delay(Duration::from_millis(50));
    let handle = source.clone();
    let (router, _dir) = test_app(source);

    let task_a = {
        let router = router.clone();
        let uri = format!("/fit_width/32?url={}", url_a);
        tokio::spawn(async move {
            let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
            router.oneshot(request).await.unwrap()
        })
    };
    let task_b = {
        let router = router.clone();
        let uri = format!("/fit_width/32?url={}", url_b);
        tokio::spawn(async move {
            let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
            router.oneshot(request).await.unwrap()
        })
    };

    assert_eq!(task_a.await.unwrap().status(), StatusCode::OK);
    assert_eq!(task_b.await.unwrap().status(), StatusCode::OK);

    assert_eq!(handle.get_request_count(url_a).await, 1);
    assert_eq!(handle.get_request_count(url_b).await, 1);
}

// =============================================================================
// Failure Handling
// =============================================================================

#[tokio::test]
async fn test_failures_are_not_cached() {
    let url = "http://img.example/down.jpg";
    let source = MockImageSource::new().with_failure(url, 503);
    let handle = source.clone();
    let (router, _dir) = test_app(source);

    // Two sequential requests both reach the upstream: the first failure
    // must not leave a cache entry or poison the key.
    for _ in 0..2 {
        let request = Request::builder()
            .uri(format!("/fit_width/32?url={}", url))
            .body(Body::empty())
            .unwrap();

        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    assert_eq!(handle.get_request_count(url).await, 2);
}

// =============================================================================
// Persistence
// =============================================================================

#[tokio::test]
async fn test_entries_persist_across_service_instances() {
    let url = "http://img.example/photo.jpg";
    let dir = tempfile::tempdir().unwrap();

    // First instance renders and stores the entry.
    let source = MockImageSource::new().with_image(url, create_test_jpeg(64, 48));
    let router = test_app_with_store(source, &dir);

    let request = Request::builder()
        .uri(format!("/fit_width/32?url={}", url))
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Second instance over the same directory has no upstream image at all,
    // yet serves the entry from disk.
    let empty_source = MockImageSource::new();
    let handle = empty_source.clone();
    let router = test_app_with_store(empty_source, &dir);

    let request = Request::builder()
        .uri(format!("/fit_width/32?url={}", url))
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-render-cache-hit").unwrap(),
        "true"
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(decoded_dimensions(&body), (32, 24));

    assert_eq!(handle.get_request_count(url).await, 0);
}
