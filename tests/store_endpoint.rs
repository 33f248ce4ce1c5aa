//! Read-by-id endpoint: cache-aside behavior, error bodies, degradation.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;

use store_service::config::UpdateMode;

mod common;
use common::{app, get, CountingStore, FailingCache, FailingStore, RecordingCache, WarnCounter};

const MAIN_STREET_BODY: &str = r#"{"store_id": "1", "name": "Main Street", "revenue": 50000.00, "total_orders": 12, "active": true}"#;

#[tokio::test]
async fn test_miss_then_hit_returns_identical_body() {
    let store = Arc::new(CountingStore::new([common::main_street()]));
    let cache = Arc::new(RecordingCache::default());
    let router = app(store.clone(), Some(cache.clone()), UpdateMode::default());

    let first = get(&router, "/store?id=1").await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.header("x-cache"), Some("MISS"));
    assert_eq!(first.header("content-type"), Some("application/json"));
    assert_eq!(first.body, MAIN_STREET_BODY);
    assert_eq!(store.calls(), 1);
    assert_eq!(cache.sets.load(Ordering::SeqCst), 1);

    let second = get(&router, "/store?id=1").await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.header("x-cache"), Some("HIT"));
    assert_eq!(second.body, first.body);
    // Served from cache: the entity store was not touched again.
    assert_eq!(store.calls(), 1);
}

#[tokio::test]
async fn test_id_defaults_to_one() {
    let store = Arc::new(CountingStore::new([common::main_street()]));
    let router = app(store, None, UpdateMode::default());

    let response = get(&router, "/store").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, MAIN_STREET_BODY);
}

#[tokio::test]
async fn test_unknown_id_is_404() {
    let store = Arc::new(CountingStore::new([common::main_street()]));
    let cache = Arc::new(RecordingCache::default());
    let router = app(store, Some(cache.clone()), UpdateMode::default());

    let response = get(&router, "/store?id=999").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body, r#"{"error": "Store not found"}"#);
    assert_eq!(response.header("x-cache"), None);
    assert_eq!(cache.sets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_non_integer_id_is_400_without_storage() {
    let store = Arc::new(CountingStore::new([common::main_street()]));
    let cache = Arc::new(RecordingCache::default());
    let router = app(store.clone(), Some(cache.clone()), UpdateMode::default());

    let response = get(&router, "/store?id=abc").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, r#"{"error": "Invalid store id"}"#);
    assert_eq!(store.calls(), 0);
    assert_eq!(cache.gets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_storage_failure_is_500() {
    let router = app(Arc::new(FailingStore), None, UpdateMode::default());

    let response = get(&router, "/store?id=1").await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body, r#"{"error": "Database error"}"#);
}

#[tokio::test]
async fn test_unavailable_cache_degrades_to_store_reads() {
    let warnings = WarnCounter::default();
    let subscriber = tracing_subscriber::registry().with(warnings.clone());
    let _guard = tracing::subscriber::set_default(subscriber);

    let store = Arc::new(CountingStore::new([common::main_street()]));
    let cache = Arc::new(FailingCache::default());
    let router = app(store.clone(), Some(cache.clone()), UpdateMode::default());

    for expected_calls in 1..=3 {
        let response = get(&router, "/store?id=1").await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.header("x-cache"), Some("MISS"));
        assert_eq!(response.body, MAIN_STREET_BODY);
        assert_eq!(store.calls(), expected_calls);
    }

    // One lookup and one populate per request, each failing with a warning.
    assert_eq!(cache.calls.load(Ordering::SeqCst), 6);
    assert_eq!(warnings.get(), 6);
}

#[tokio::test]
async fn test_without_cache_every_read_is_a_silent_miss() {
    let warnings = WarnCounter::default();
    let subscriber = tracing_subscriber::registry().with(warnings.clone());
    let _guard = tracing::subscriber::set_default(subscriber);

    let store = Arc::new(CountingStore::new([common::main_street()]));
    let router = app(store.clone(), None, UpdateMode::default());

    for _ in 0..2 {
        let response = get(&router, "/store?id=1").await;
        assert_eq!(response.header("x-cache"), Some("MISS"));
    }
    assert_eq!(store.calls(), 2);
    assert_eq!(warnings.get(), 0);
}

#[tokio::test]
async fn test_health_and_banner() {
    let router = app(Arc::new(FailingStore), None, UpdateMode::default());

    let health = get(&router, "/health").await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body, "OK");

    let banner = get(&router, "/").await;
    assert_eq!(banner.status, StatusCode::OK);
    assert!(banner.body.contains("/store"));
    assert!(banner.body.contains("/graphql"));
}

#[tokio::test]
async fn test_graphql_preflight_allows_any_origin() {
    let router = app(Arc::new(FailingStore), None, UpdateMode::default());

    let response = common::send(
        &router,
        Request::builder()
            .method("OPTIONS")
            .uri("/graphql")
            .header("origin", "http://dashboard.local")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("access-control-allow-origin"), Some("*"));
}
