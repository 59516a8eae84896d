//! Owner-token leases over a [`LeaseStore`].

use std::time::Duration;

use tracing::debug;
use uuid::Uuid;

use cloudsearch_sync_repository::{LeaseStore, StoreError};

/// Try to take the lease under `key`.
///
/// Ownership is read back after the insert, so a racing writer that slipped
/// in between is detected.
///
/// # Returns
///
/// * `Ok(Some(token))` - The lease is held; release it with this token
/// * `Ok(None)` - Another owner holds the lease
pub async fn acquire(
    leases: &dyn LeaseStore,
    key: &str,
    ttl: Duration,
) -> Result<Option<String>, StoreError> {
    let token = Uuid::new_v4().to_string();

    if !leases.insert_if_absent(key, &token, ttl).await? {
        debug!(lease = %key, "Lease held by another owner");
        return Ok(None);
    }

    match leases.holder(key).await? {
        Some(holder) if holder == token => Ok(Some(token)),
        holder => {
            debug!(lease = %key, holder = ?holder, "Lease lost right after acquiring it");
            Ok(None)
        }
    }
}
