//! PostgreSQL store implementations.
//!
//! Every store shares one connection pool. The schema is managed by the
//! embedded migrations, applied with [`run_migrations`].

mod content_store;
mod lease_store;
mod queue_store;
mod settings_store;

pub use content_store::PostgresContentStore;
pub use lease_store::PostgresLeaseStore;
pub use queue_store::PostgresQueueStore;
pub use settings_store::PostgresSettingsStore;

use tracing::info;

use crate::errors::StoreError;

/// Apply the embedded schema migrations.
pub async fn run_migrations(pool: &sqlx::PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("src/postgres/migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}
