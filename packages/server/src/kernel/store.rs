//! Storage backend selection from the configured database URL.

use anyhow::{bail, Context, Result};
use std::sync::Arc;

use catalog::{CatalogStore, MemoryStore, PostgresStore, SqliteStore};

/// Connect to the store named by `database_url` and ensure its schema.
///
/// - `sqlite:` → [`SqliteStore`]
/// - `postgres:` / `postgresql:` → [`PostgresStore`]
/// - `memory:` → [`MemoryStore`] (data lost on restart)
pub async fn connect_store(database_url: &str) -> Result<Arc<dyn CatalogStore>> {
    let scheme = database_url
        .split_once(':')
        .map(|(scheme, _)| scheme.to_ascii_lowercase())
        .unwrap_or_default();

    let store: Arc<dyn CatalogStore> = match scheme.as_str() {
        "sqlite" => Arc::new(
            SqliteStore::new(database_url)
                .await
                .context("Failed to open SQLite database")?,
        ),
        "postgres" | "postgresql" => Arc::new(
            PostgresStore::new(database_url)
                .await
                .context("Failed to connect to PostgreSQL")?,
        ),
        "memory" => Arc::new(MemoryStore::new()),
        _ => bail!("Unsupported DATABASE_URL scheme: {:?}", scheme),
    };

    tracing::info!(backend = %scheme, "Catalog store ready");
    Ok(store)
}
