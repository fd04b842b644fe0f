//! PostgreSQL table store.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::PgPool;
use sqlx::types::Json;

use deskwatch_core::error::{AppError, ErrorKind};
use deskwatch_core::result::AppResult;
use deskwatch_core::traits::table::{TableEntity, TableStore};

#[derive(Debug, sqlx::FromRow)]
struct EntityRow {
    partition_key: String,
    row_key: String,
    properties: Json<Map<String, Value>>,
}

impl From<EntityRow> for TableEntity {
    fn from(row: EntityRow) -> Self {
        Self {
            partition_key: row.partition_key,
            row_key: row.row_key,
            properties: row.properties.0,
        }
    }
}

/// Table store over the `table_entities` table.
#[derive(Debug, Clone)]
pub struct PgTableStore {
    pool: PgPool,
}

impl PgTableStore {
    /// Create a store on an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_err(context: &str, e: sqlx::Error) -> AppError {
        AppError::with_source(ErrorKind::Store, format!("{context}: {e}"), e)
    }
}

#[async_trait]
impl TableStore for PgTableStore {
    fn provider_type(&self) -> &str {
        "postgres"
    }

    async fn insert(&self, entity: &TableEntity) -> AppResult<()> {
        let result = sqlx::query(
            "INSERT INTO table_entities (partition_key, row_key, properties) \
             VALUES ($1, $2, $3) ON CONFLICT (partition_key, row_key) DO NOTHING",
        )
        .bind(&entity.partition_key)
        .bind(&entity.row_key)
        .bind(Json(&entity.properties))
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_err("Failed to insert entity", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::conflict(format!(
                "Entity {}/{} already exists",
                entity.partition_key, entity.row_key
            )));
        }
        Ok(())
    }

    async fn upsert(&self, entity: &TableEntity) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO table_entities (partition_key, row_key, properties) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (partition_key, row_key) \
             DO UPDATE SET properties = EXCLUDED.properties, updated_at = NOW()",
        )
        .bind(&entity.partition_key)
        .bind(&entity.row_key)
        .bind(Json(&entity.properties))
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_err("Failed to upsert entity", e))?;
        Ok(())
    }

    async fn get(&self, partition_key: &str, row_key: &str) -> AppResult<Option<TableEntity>> {
        let row = sqlx::query_as::<_, EntityRow>(
            "SELECT partition_key, row_key, properties FROM table_entities \
             WHERE partition_key = $1 AND row_key = $2",
        )
        .bind(partition_key)
        .bind(row_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Self::map_err("Failed to get entity", e))?;
        Ok(row.map(TableEntity::from))
    }

    async fn delete(&self, partition_key: &str, row_key: &str) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM table_entities WHERE partition_key = $1 AND row_key = $2")
                .bind(partition_key)
                .bind(row_key)
                .execute(&self.pool)
                .await
                .map_err(|e| Self::map_err("Failed to delete entity", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn query(&self, partition_key: &str) -> AppResult<Vec<TableEntity>> {
        let rows = sqlx::query_as::<_, EntityRow>(
            "SELECT partition_key, row_key, properties FROM table_entities \
             WHERE partition_key = $1 ORDER BY row_key",
        )
        .bind(partition_key)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Self::map_err("Failed to query partition", e))?;
        Ok(rows.into_iter().map(TableEntity::from).collect())
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| Self::map_err("Health check failed", e))
    }
}
