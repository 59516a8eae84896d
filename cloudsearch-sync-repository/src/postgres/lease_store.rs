use std::time::Duration;

use async_trait::async_trait;
use sqlx::Row;

use crate::errors::StoreError;
use crate::interfaces::LeaseStore;

/// Leases persisted in the `cloudsearch_leases` table.
///
/// Expiry is evaluated against the database clock so that every process
/// agrees on it.
pub struct PostgresLeaseStore {
    pool: sqlx::PgPool,
}

impl PostgresLeaseStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaseStore for PostgresLeaseStore {
    async fn insert_if_absent(
        &self,
        key: &str,
        token: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        // Takes over an expired lease; a live one leaves the row untouched.
        let result = sqlx::query(
            "INSERT INTO cloudsearch_leases (key, token, expires_at) \
             VALUES ($1, $2, now() + $3::double precision * interval '1 second') \
             ON CONFLICT (key) DO UPDATE SET token = EXCLUDED.token, expires_at = EXCLUDED.expires_at \
             WHERE cloudsearch_leases.expires_at <= now()",
        )
        .bind(key)
        .bind(token)
        .bind(ttl.as_secs_f64())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn holder(&self, key: &str) -> Result<Option<String>, StoreError> {
        let row = sqlx::query(
            "SELECT token FROM cloudsearch_leases WHERE key = $1 AND expires_at > now()",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match row {
            Some(row) => Some(row.try_get("token")?),
            None => None,
        })
    }

    async fn release(&self, key: &str, token: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM cloudsearch_leases WHERE key = $1 AND token = $2")
            .bind(key)
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn clear(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM cloudsearch_leases WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
