//! Lease store trait definition.

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::StoreError;

/// Time-bounded exclusive leases keyed by name.
///
/// A lease is held by whoever presented the token that created it. Expired
/// leases are treated as absent by every method.
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Take the lease if nobody holds it.
    ///
    /// # Arguments
    ///
    /// * `key` - The lease name
    /// * `token` - The owner token to record
    /// * `ttl` - How long the lease lasts if it is never released
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The lease was free and is now recorded for `token`
    /// * `Ok(false)` - Someone else holds an unexpired lease
    /// * `Err(StoreError)` - If the backend failed
    async fn insert_if_absent(
        &self,
        key: &str,
        token: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError>;

    /// The token of the current, unexpired holder.
    async fn holder(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Release the lease if `token` still holds it.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The lease was released
    /// * `Ok(false)` - The lease had expired or belongs to someone else
    async fn release(&self, key: &str, token: &str) -> Result<bool, StoreError>;

    /// Drop the lease regardless of owner.
    async fn clear(&self, key: &str) -> Result<(), StoreError>;
}
