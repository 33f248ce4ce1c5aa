//! Entity store subsystem.
//!
//! # Data Flow
//! ```text
//! resolver (CRUD operation)
//!     → StoreRepository (trait object, shared via Arc)
//!         → memory.rs   (in-process map, default)
//!         → postgres.rs (sqlx pool over the `stores` table)
//! ```
//!
//! # Design Decisions
//! - The entity store is the only source of truth; the cache mirrors it
//! - `NotFound` is a distinct error variant, never folded into storage failures
//! - `update` applies a patch; zero-value overwrite semantics live in the
//!   resolver, not here
//! - Zero rows affected on update/delete is reported as `NotFound`

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemoryStoreRepository;
pub use postgres::PostgresStoreRepository;

/// The store entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: i64,
    pub name: String,
    pub revenue: f64,
    pub total_orders: i64,
    pub active: bool,
}

/// Fields accepted on create. There is no `total_orders`: new stores always
/// start with zero orders.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStore {
    pub name: String,
    pub revenue: f64,
    pub active: bool,
}

/// Fields to overwrite on update. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorePatch {
    pub name: Option<String>,
    pub revenue: Option<f64>,
    pub total_orders: Option<i64>,
    pub active: Option<bool>,
}

impl StorePatch {
    /// Turn the patch into a full-row overwrite: every omitted field becomes
    /// the zero value of its type.
    pub fn into_overwrite(self) -> Self {
        Self {
            name: Some(self.name.unwrap_or_default()),
            revenue: Some(self.revenue.unwrap_or_default()),
            total_orders: Some(self.total_orders.unwrap_or_default()),
            active: Some(self.active.unwrap_or_default()),
        }
    }

    pub(crate) fn apply_to(self, store: &mut Store) {
        if let Some(name) = self.name {
            store.name = name;
        }
        if let Some(revenue) = self.revenue {
            store.revenue = revenue;
        }
        if let Some(total_orders) = self.total_orders {
            store.total_orders = total_orders;
        }
        if let Some(active) = self.active {
            store.active = active;
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store {0} not found")]
    NotFound(i64),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Point access to the `stores` relation.
#[async_trait]
pub trait StoreRepository: Send + Sync {
    async fn get(&self, id: i64) -> StoreResult<Store>;
    async fn list(&self) -> StoreResult<Vec<Store>>;
    async fn create(&self, store: NewStore) -> StoreResult<Store>;
    async fn update(&self, id: i64, patch: StorePatch) -> StoreResult<Store>;
    async fn delete(&self, id: i64) -> StoreResult<()>;

    async fn health_check(&self) -> StoreResult<()>;
    fn backend_name(&self) -> &'static str;
}
