use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::Row;

use crate::errors::StoreError;
use crate::interfaces::ContentStore;
use crate::types::ContentItem;

/// Read-only access to the `content_documents` relation.
pub struct PostgresContentStore {
    pool: sqlx::PgPool,
}

impl PostgresContentStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentStore for PostgresContentStore {
    async fn fetch_fields(
        &self,
        document_type: &str,
        document_id: &str,
        fields: &[String],
    ) -> Result<Option<BTreeMap<String, Value>>, StoreError> {
        let row = sqlx::query(
            "SELECT fields FROM content_documents WHERE document_type = $1 AND document_id = $2",
        )
        .bind(document_type)
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let Json(stored): Json<BTreeMap<String, Value>> = row.try_get("fields")?;

        Ok(Some(
            fields
                .iter()
                .map(|field| {
                    let value = stored.get(field).cloned().unwrap_or(Value::Null);
                    (field.clone(), value)
                })
                .collect(),
        ))
    }

    async fn page_before(
        &self,
        document_types: &[String],
        before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ContentItem>, StoreError> {
        let rows = sqlx::query(
            "SELECT document_type, document_id, created_at FROM content_documents \
             WHERE document_type = ANY($1) AND created_at < $2 \
             ORDER BY created_at DESC, document_id ASC LIMIT $3",
        )
        .bind(document_types)
        .bind(before)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<ContentItem, StoreError> {
                Ok(ContentItem {
                    document_type: row.try_get("document_type")?,
                    document_id: row.try_get("document_id")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }
}
