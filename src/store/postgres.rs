//! Postgres-backed entity store.
//!
//! Rows live in a single `stores` table addressed by primary key. The pool is
//! created once at startup and shared by every request task; `sqlx::PgPool`
//! handles concurrency. Database URLs may carry credentials and are never
//! logged.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;

use super::{NewStore, Store, StoreError, StorePatch, StoreRepository, StoreResult};
use crate::config::DatabaseConfig;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS stores (
    id           BIGSERIAL PRIMARY KEY,
    name         TEXT NOT NULL,
    revenue      DOUBLE PRECISION NOT NULL,
    total_orders BIGINT NOT NULL DEFAULT 0,
    active       BOOLEAN NOT NULL DEFAULT TRUE
)
"#;

#[derive(sqlx::FromRow)]
struct StoreRow {
    id: i64,
    name: String,
    revenue: f64,
    total_orders: i64,
    active: bool,
}

impl From<StoreRow> for Store {
    fn from(row: StoreRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            revenue: row.revenue,
            total_orders: row.total_orders,
            active: row.active,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostgresStoreRepository {
    pool: PgPool,
}

impl PostgresStoreRepository {
    /// Connect a pool using the database section of the config.
    pub async fn connect(url: &str, config: &DatabaseConfig) -> StoreResult<Self> {
        let options = PgConnectOptions::from_str(url)?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_millis(config.acquire_timeout_ms))
            .connect_with(options)
            .await?;

        let repo = Self { pool };
        if config.ensure_schema {
            repo.ensure_schema().await?;
        }
        Ok(repo)
    }

    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl StoreRepository for PostgresStoreRepository {
    async fn get(&self, id: i64) -> StoreResult<Store> {
        sqlx::query_as::<_, StoreRow>(
            "SELECT id, name, revenue, total_orders, active FROM stores WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Store::from)
        .ok_or(StoreError::NotFound(id))
    }

    async fn list(&self) -> StoreResult<Vec<Store>> {
        let rows = sqlx::query_as::<_, StoreRow>(
            "SELECT id, name, revenue, total_orders, active FROM stores ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Store::from).collect())
    }

    async fn create(&self, store: NewStore) -> StoreResult<Store> {
        let row = sqlx::query_as::<_, StoreRow>(
            "INSERT INTO stores (name, revenue, total_orders, active) VALUES ($1, $2, 0, $3) \
             RETURNING id, name, revenue, total_orders, active",
        )
        .bind(&store.name)
        .bind(store.revenue)
        .bind(store.active)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn update(&self, id: i64, patch: StorePatch) -> StoreResult<Store> {
        // NULL parameters keep the column; RETURNING yields no row when the id
        // does not exist.
        sqlx::query_as::<_, StoreRow>(
            "UPDATE stores SET \
                name = COALESCE($1, name), \
                revenue = COALESCE($2, revenue), \
                total_orders = COALESCE($3, total_orders), \
                active = COALESCE($4, active) \
             WHERE id = $5 \
             RETURNING id, name, revenue, total_orders, active",
        )
        .bind(patch.name)
        .bind(patch.revenue)
        .bind(patch.total_orders)
        .bind(patch.active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Store::from)
        .ok_or(StoreError::NotFound(id))
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM stores WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
