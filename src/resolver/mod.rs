//! CRUD operations over the store entity, wired to the cache.
//!
//! # Data Flow
//! ```text
//! GET /store          → read_store_info (cache-aside, X-Cache marker)
//! POST /graphql       → args.rs (parse & validate) → execute
//!     store / stores  → entity store
//!     create / update / delete → entity store commit → cache invalidate
//! ```
//!
//! # Design Decisions
//! - Validation happens before any storage or cache call
//! - Invalidation runs only after a successful commit; failed and zero-row
//!   writes leave the cache untouched
//! - Cache failures never fail an operation

pub mod args;

use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;

pub use args::Operation;

use crate::cache::{CacheLookup, CacheStatus, StoreCache};
use crate::config::UpdateMode;
use crate::store::{NewStore, Store, StoreError, StorePatch, StoreRepository};

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("{0}")]
    Validation(String),
    #[error("store with id {0} not found")]
    NotFound(i64),
    #[error("storage error: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for ResolverError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ResolverError::NotFound(id),
            other => ResolverError::Storage(other),
        }
    }
}

/// Body of `GET /store` and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedRead {
    pub body: String,
    pub status: CacheStatus,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Deleted {
    pub success: bool,
    pub id: i64,
}

/// Result of a structured operation.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum OperationOutput {
    Store(Store),
    Stores(Vec<Store>),
    Deleted(Deleted),
}

/// Exact response body of the read-by-id endpoint. This is also the cached
/// value, so a hit returns it byte for byte.
pub fn store_info_body(store: &Store) -> String {
    let name = serde_json::to_string(&store.name).unwrap_or_else(|_| String::from("\"\""));
    format!(
        "{{\"store_id\": \"{}\", \"name\": {}, \"revenue\": {:.2}, \"total_orders\": {}, \"active\": {}}}",
        store.id, name, store.revenue, store.total_orders, store.active
    )
}

#[derive(Clone)]
pub struct StoreResolver {
    store: Arc<dyn StoreRepository>,
    cache: StoreCache,
    update_mode: UpdateMode,
}

impl StoreResolver {
    pub fn new(store: Arc<dyn StoreRepository>, cache: StoreCache, update_mode: UpdateMode) -> Self {
        Self {
            store,
            cache,
            update_mode,
        }
    }

    pub fn cache(&self) -> &StoreCache {
        &self.cache
    }

    /// Cache-aside read of one store, rendered as the endpoint body.
    pub async fn read_store_info(&self, id: i64) -> Result<CachedRead, ResolverError> {
        if let CacheLookup::Hit(body) = self.cache.lookup(id).await {
            return Ok(CachedRead {
                body,
                status: CacheStatus::Hit,
            });
        }

        let store = self.query("read", id, self.store.get(id)).await?;
        let body = store_info_body(&store);
        self.cache.populate(id, &body).await;

        tracing::info!(
            store_id = id,
            name = %store.name,
            revenue = store.revenue,
            "store query successful"
        );
        Ok(CachedRead {
            body,
            status: CacheStatus::Miss,
        })
    }

    /// Validate and run a named operation.
    pub async fn execute(&self, operation: Operation) -> Result<OperationOutput, ResolverError> {
        match operation {
            Operation::Store { id } => self.store(id).await.map(OperationOutput::Store),
            Operation::Stores => self.stores().await.map(OperationOutput::Stores),
            Operation::CreateStore(input) => {
                self.create_store(input).await.map(OperationOutput::Store)
            }
            Operation::UpdateStore { id, patch } => {
                self.update_store(id, patch).await.map(OperationOutput::Store)
            }
            Operation::DeleteStore { id } => self.delete_store(id).await.map(OperationOutput::Deleted),
        }
    }

    pub async fn store(&self, id: i64) -> Result<Store, ResolverError> {
        tracing::info!(store_id = id, "graphql store query");
        let store = self.query("read", id, self.store.get(id)).await?;
        tracing::info!(store_id = id, name = %store.name, "graphql store query successful");
        Ok(store)
    }

    pub async fn stores(&self) -> Result<Vec<Store>, ResolverError> {
        tracing::info!("graphql stores query - fetching all stores");
        let span = tracing::info_span!(
            "db.query",
            operation = "list",
            db.backend = self.store.backend_name()
        );
        let stores = self.store.list().instrument(span).await.map_err(|e| {
            tracing::error!(error = %e, "database error during stores query");
            ResolverError::from(e)
        })?;
        tracing::info!(count = stores.len(), "graphql stores query successful");
        Ok(stores)
    }

    pub async fn create_store(&self, input: NewStore) -> Result<Store, ResolverError> {
        tracing::info!(
            name = %input.name,
            revenue = input.revenue,
            active = input.active,
            "creating new store"
        );
        let span = tracing::info_span!(
            "db.query",
            operation = "create",
            db.backend = self.store.backend_name()
        );
        let store = self.store.create(input).instrument(span).await.map_err(|e| {
            tracing::error!(error = %e, "database error during insert");
            ResolverError::from(e)
        })?;
        tracing::info!(store_id = store.id, name = %store.name, "store created successfully");

        self.cache.invalidate(store.id, "create").await;
        Ok(store)
    }

    pub async fn update_store(&self, id: i64, patch: StorePatch) -> Result<Store, ResolverError> {
        tracing::info!(store_id = id, mode = ?self.update_mode, "updating store");
        let patch = match self.update_mode {
            UpdateMode::PreserveUnspecified => patch,
            UpdateMode::ResetUnspecified => patch.into_overwrite(),
        };

        let store = self.query("update", id, self.store.update(id, patch)).await?;
        tracing::info!(store_id = id, "store updated successfully");

        self.cache.invalidate(id, "update").await;
        Ok(store)
    }

    pub async fn delete_store(&self, id: i64) -> Result<Deleted, ResolverError> {
        tracing::info!(store_id = id, "deleting store");
        self.query("delete", id, self.store.delete(id)).await?;
        tracing::info!(store_id = id, "store deleted successfully");

        self.cache.invalidate(id, "delete").await;
        Ok(Deleted { success: true, id })
    }

    /// Run a point query inside a `db.query` span and log its failure.
    async fn query<T, F>(&self, operation: &'static str, id: i64, call: F) -> Result<T, ResolverError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let span = tracing::info_span!(
            "db.query",
            operation,
            store.id = id,
            db.backend = self.store.backend_name()
        );
        call.instrument(span).await.map_err(|e| {
            match &e {
                StoreError::NotFound(_) => {
                    tracing::warn!(store_id = id, operation, "store not found")
                }
                _ => tracing::error!(store_id = id, operation, error = %e, "database error"),
            }
            ResolverError::from(e)
        })
    }
}

impl std::fmt::Debug for StoreResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreResolver")
            .field("store", &self.store.backend_name())
            .field("cache", &self.cache)
            .field("update_mode", &self.update_mode)
            .finish()
    }
}
