use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::Row;
use uuid::Uuid;

use cloudsearch_sync_shared::{DocumentAction, QueueKey, QueuedUpdate};

use crate::errors::StoreError;
use crate::interfaces::QueueStore;

const SELECT_COLUMNS: &str =
    "SELECT document_type, document_id, action, fields, created_at, revision FROM cloudsearch_queue";

/// Queue ledger persisted in the `cloudsearch_queue` table, one row per document.
pub struct PostgresQueueStore {
    pool: sqlx::PgPool,
}

impl PostgresQueueStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

fn update_from_row(row: &PgRow) -> Result<QueuedUpdate, StoreError> {
    let action: String = row.try_get("action")?;
    let action = action
        .parse::<DocumentAction>()
        .map_err(|_| StoreError::invalid_record(format!("unknown queue action '{}'", action)))?;
    let Json(fields): Json<BTreeSet<String>> = row.try_get("fields")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let revision: Uuid = row.try_get("revision")?;

    Ok(QueuedUpdate::from_parts(
        row.try_get::<String, _>("document_type")?,
        row.try_get::<String, _>("document_id")?,
        action,
        fields,
        created_at,
        revision,
    ))
}

#[async_trait]
impl QueueStore for PostgresQueueStore {
    async fn find(
        &self,
        document_type: &str,
        document_id: &str,
    ) -> Result<Option<QueuedUpdate>, StoreError> {
        let row = sqlx::query(&format!(
            "{} WHERE document_type = $1 AND document_id = $2",
            SELECT_COLUMNS
        ))
        .bind(document_type)
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(update_from_row).transpose()
    }

    async fn save(&self, update: &QueuedUpdate) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO cloudsearch_queue (document_type, document_id, action, fields, created_at, revision) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (document_type, document_id) DO UPDATE SET \
             action = EXCLUDED.action, fields = EXCLUDED.fields, revision = EXCLUDED.revision",
        )
        .bind(&update.document_type)
        .bind(&update.document_id)
        .bind(update.action.as_str())
        .bind(Json(&update.fields))
        .bind(update.created_at)
        .bind(update.revision)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn oldest(&self, limit: usize) -> Result<Vec<QueuedUpdate>, StoreError> {
        let rows = sqlx::query(&format!(
            "{} ORDER BY created_at ASC, document_type ASC, document_id ASC LIMIT $1",
            SELECT_COLUMNS
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(update_from_row).collect()
    }

    async fn delete(&self, keys: &[QueueKey]) -> Result<usize, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut deleted = 0;
        for key in keys {
            let result = sqlx::query(
                "DELETE FROM cloudsearch_queue \
                 WHERE document_type = $1 AND document_id = $2 AND revision = $3",
            )
            .bind(&key.document_type)
            .bind(&key.document_id)
            .bind(key.revision)
            .execute(&mut *tx)
            .await?;
            deleted += result.rows_affected() as usize;
        }
        tx.commit().await?;
        Ok(deleted)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM cloudsearch_queue")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.try_get("count")?;
        Ok(count as u64)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM cloudsearch_queue")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
