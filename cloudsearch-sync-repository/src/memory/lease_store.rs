use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::errors::StoreError;
use crate::interfaces::LeaseStore;

#[derive(Debug, Clone)]
struct Lease {
    token: String,
    expires_at: Instant,
}

/// Leases held in a map; expiry follows the tokio clock.
#[derive(Debug, Default)]
pub struct MemoryLeaseStore {
    leases: Mutex<HashMap<String, Lease>>,
}

impl MemoryLeaseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeaseStore for MemoryLeaseStore {
    async fn insert_if_absent(
        &self,
        key: &str,
        token: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let mut leases = self.leases.lock().await;
        let now = Instant::now();

        if let Some(lease) = leases.get(key) {
            if lease.expires_at > now {
                return Ok(false);
            }
        }

        leases.insert(
            key.to_string(),
            Lease {
                token: token.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }

    async fn holder(&self, key: &str) -> Result<Option<String>, StoreError> {
        let leases = self.leases.lock().await;
        Ok(leases
            .get(key)
            .filter(|lease| lease.expires_at > Instant::now())
            .map(|lease| lease.token.clone()))
    }

    async fn release(&self, key: &str, token: &str) -> Result<bool, StoreError> {
        let mut leases = self.leases.lock().await;
        match leases.get(key) {
            Some(lease) if lease.token == token => {
                leases.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn clear(&self, key: &str) -> Result<(), StoreError> {
        self.leases.lock().await.remove(key);
        Ok(())
    }
}
