//! Settings store trait definition.

use async_trait::async_trait;

use crate::errors::StoreError;

/// Opaque key/value persistence for named settings.
///
/// Keys are listed in [`crate::types::settings_keys`]. Values are stored as strings
/// and interpreted by the caller.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read a setting. Returns `None` if it was never set or was deleted.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a setting, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a setting. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
