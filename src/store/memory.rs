//! In-memory entity store.
//!
//! Backs the service when no database URL is configured, and the test
//! suite. State is lost on restart. Reads take a shared lock, writes an
//! exclusive one; ids come from a process-local counter starting at 1.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{NewStore, Store, StoreError, StorePatch, StoreRepository, StoreResult};

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    rows: BTreeMap<i64, Store>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStoreRepository {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStoreRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository pre-populated with `stores`, keeping their ids.
    pub fn with_stores(stores: impl IntoIterator<Item = Store>) -> Self {
        let mut inner = Inner::default();
        for store in stores {
            inner.next_id = inner.next_id.max(store.id);
            inner.rows.insert(store.id, store);
        }
        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }
}

#[async_trait]
impl StoreRepository for MemoryStoreRepository {
    async fn get(&self, id: i64) -> StoreResult<Store> {
        let inner = self.inner.read().await;
        inner.rows.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    async fn list(&self) -> StoreResult<Vec<Store>> {
        let inner = self.inner.read().await;
        Ok(inner.rows.values().cloned().collect())
    }

    async fn create(&self, store: NewStore) -> StoreResult<Store> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let created = Store {
            id: inner.next_id,
            name: store.name,
            revenue: store.revenue,
            total_orders: 0,
            active: store.active,
        };
        inner.rows.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: i64, patch: StorePatch) -> StoreResult<Store> {
        let mut inner = self.inner.write().await;
        let row = inner.rows.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        patch.apply_to(row);
        Ok(row.clone())
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_store(name: &str) -> NewStore {
        NewStore {
            name: name.into(),
            revenue: 1_000.0,
            active: true,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let repo = MemoryStoreRepository::new();
        let a = repo.create(new_store("a")).await.unwrap();
        let b = repo.create(new_store("b")).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(a.total_orders, 0);
    }

    #[tokio::test]
    async fn test_seeded_ids_are_not_reused() {
        let repo = MemoryStoreRepository::with_stores([Store {
            id: 7,
            name: "seed".into(),
            revenue: 1.0,
            total_orders: 3,
            active: false,
        }]);
        let created = repo.create(new_store("next")).await.unwrap();
        assert_eq!(created.id, 8);
    }

    #[tokio::test]
    async fn test_missing_rows_are_not_found() {
        let repo = MemoryStoreRepository::new();
        assert!(matches!(repo.get(5).await, Err(StoreError::NotFound(5))));
        assert!(matches!(
            repo.update(5, StorePatch::default()).await,
            Err(StoreError::NotFound(5))
        ));
        assert!(matches!(repo.delete(5).await, Err(StoreError::NotFound(5))));
    }

    #[tokio::test]
    async fn test_delete_is_physical() {
        let repo = MemoryStoreRepository::new();
        let created = repo.create(new_store("gone")).await.unwrap();
        repo.delete(created.id).await.unwrap();
        assert!(repo.list().await.unwrap().is_empty());
        assert!(matches!(
            repo.delete(created.id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_id() {
        let repo = MemoryStoreRepository::new();
        for name in ["c", "a", "b"] {
            repo.create(new_store(name)).await.unwrap();
        }
        let ids: Vec<i64> = repo.list().await.unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
