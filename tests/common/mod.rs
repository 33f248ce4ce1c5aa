//! Shared test doubles and helpers for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

use store_service::cache::{CacheBackend, CacheError, MemoryCache, StoreCache};
use store_service::config::{ServiceConfig, UpdateMode};
use store_service::http::{build_router, AppState};
use store_service::resolver::StoreResolver;
use store_service::store::{
    MemoryStoreRepository, NewStore, Store, StoreError, StorePatch, StoreRepository, StoreResult,
};

pub fn main_street() -> Store {
    Store {
        id: 1,
        name: "Main Street".into(),
        revenue: 50_000.0,
        total_orders: 12,
        active: true,
    }
}

/// Cache whose every call fails.
#[derive(Default)]
pub struct FailingCache {
    pub calls: AtomicUsize,
}

#[async_trait]
impl CacheBackend for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Unavailable("connection refused".into()))
    }
    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Unavailable("connection refused".into()))
    }
    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Unavailable("connection refused".into()))
    }
    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

/// In-memory cache that records every call.
#[derive(Default)]
pub struct RecordingCache {
    inner: MemoryCache,
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
    pub deleted: Mutex<Vec<String>>,
}

impl RecordingCache {
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl CacheBackend for RecordingCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value, ttl).await
    }
    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.deleted.lock().unwrap().push(key.to_string());
        self.inner.delete(key).await
    }
    fn backend_name(&self) -> &'static str {
        "recording"
    }
}

/// Entity store that counts every call before delegating.
pub struct CountingStore {
    inner: MemoryStoreRepository,
    pub calls: AtomicUsize,
}

impl CountingStore {
    pub fn new(stores: impl IntoIterator<Item = Store>) -> Self {
        Self {
            inner: MemoryStoreRepository::with_stores(stores),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StoreRepository for CountingStore {
    async fn get(&self, id: i64) -> StoreResult<Store> {
        self.tick();
        self.inner.get(id).await
    }
    async fn list(&self) -> StoreResult<Vec<Store>> {
        self.tick();
        self.inner.list().await
    }
    async fn create(&self, store: NewStore) -> StoreResult<Store> {
        self.tick();
        self.inner.create(store).await
    }
    async fn update(&self, id: i64, patch: StorePatch) -> StoreResult<Store> {
        self.tick();
        self.inner.update(id, patch).await
    }
    async fn delete(&self, id: i64) -> StoreResult<()> {
        self.tick();
        self.inner.delete(id).await
    }
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
    fn backend_name(&self) -> &'static str {
        "counting"
    }
}

/// Entity store whose every call fails with a storage error.
pub struct FailingStore;

#[async_trait]
impl StoreRepository for FailingStore {
    async fn get(&self, _id: i64) -> StoreResult<Store> {
        Err(StoreError::Unavailable("connection reset".into()))
    }
    async fn list(&self) -> StoreResult<Vec<Store>> {
        Err(StoreError::Unavailable("connection reset".into()))
    }
    async fn create(&self, _store: NewStore) -> StoreResult<Store> {
        Err(StoreError::Unavailable("connection reset".into()))
    }
    async fn update(&self, _id: i64, _patch: StorePatch) -> StoreResult<Store> {
        Err(StoreError::Unavailable("connection reset".into()))
    }
    async fn delete(&self, _id: i64) -> StoreResult<()> {
        Err(StoreError::Unavailable("connection reset".into()))
    }
    async fn health_check(&self) -> StoreResult<()> {
        Err(StoreError::Unavailable("connection reset".into()))
    }
    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

/// Router over the given store and cache backend, with default config.
pub fn app(
    store: Arc<dyn StoreRepository>,
    cache: Option<Arc<dyn CacheBackend>>,
    mode: UpdateMode,
) -> Router {
    let config = ServiceConfig::default();
    let cache = match cache {
        Some(backend) => StoreCache::new(backend, &config.cache),
        None => StoreCache::disabled(&config.cache),
    };
    let state = AppState {
        resolver: StoreResolver::new(store, cache, mode),
        metrics: None,
    };
    build_router(&config, state)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("response body is JSON")
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    TestResponse {
        status,
        headers,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}

pub async fn get(router: &Router, uri: &str) -> TestResponse {
    send(router, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn operation(
    router: &Router,
    name: &str,
    arguments: serde_json::Value,
) -> TestResponse {
    let body = serde_json::json!({ "operation": name, "arguments": arguments });
    send(
        router,
        Request::post("/graphql")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

/// Counts WARN events seen by the subscriber.
#[derive(Clone, Default)]
pub struct WarnCounter {
    pub count: Arc<AtomicUsize>,
}

impl WarnCounter {
    pub fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarnCounter {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if *event.metadata().level() == tracing::Level::WARN {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }
}
