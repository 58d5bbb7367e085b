//! SQLite storage implementation.
//!
//! A file-based storage backend using SQLite. Good for:
//! - Local development
//! - Single-server deployments
//! - Testing with persistent data

use async_trait::async_trait;
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Transaction};
use std::str::FromStr;
use tracing::debug;

use super::rows::{offering_select, CountsRow, ModelRow, OfferingRow, ProviderRow};
use crate::error::{CatalogError, Result};
use crate::traits::store::{CatalogStore, CatalogTransaction};
use crate::types::{
    filter::OfferingFilter,
    id::{ModelId, OfferingId, ProviderId},
    modality::ModalitySet,
    offering::{CatalogCounts, Model, NewProvider, OfferingFields, OfferingView, Provider},
};

const OFFERING_SELECT: &str = offering_select!("group_concat(om.modality, ',')");

/// SQLite-based catalog store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new SQLite store with the given connection URL.
    ///
    /// # Example URLs
    /// - `sqlite::memory:` - In-memory database (ephemeral)
    /// - `sqlite://./database.db` - File-based database, created if missing
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = if database_url.contains(":memory:") {
            // Every connection to `:memory:` is a separate database, so keep exactly one alive.
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing).
    pub async fn in_memory() -> Result<Self> {
        Self::new("sqlite::memory:").await
    }

    /// Create tables if they do not exist yet.
    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS providers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                website TEXT NOT NULL,
                api_key_name TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS models (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS offerings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                provider_id INTEGER NOT NULL REFERENCES providers(id) ON DELETE CASCADE,
                model_id INTEGER NOT NULL REFERENCES models(id) ON DELETE CASCADE,
                api_model_name TEXT NOT NULL UNIQUE,
                context_window INTEGER NOT NULL,
                max_output_tokens INTEGER,
                input_cost_per_mtok REAL NOT NULL,
                output_cost_per_mtok REAL NOT NULL,
                cached_input_cost_per_mtok REAL,
                tokens_per_second REAL,
                supports_tools BOOLEAN NOT NULL DEFAULT 0,
                discount_start_time_utc TEXT NOT NULL DEFAULT '00:00',
                discount_end_time_utc TEXT NOT NULL DEFAULT '00:00',
                input_discount_price REAL NOT NULL DEFAULT 0,
                output_discount_price REAL NOT NULL DEFAULT 0,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                UNIQUE (provider_id, model_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS offering_modalities (
                offering_id INTEGER NOT NULL REFERENCES offerings(id) ON DELETE CASCADE,
                modality TEXT NOT NULL,
                PRIMARY KEY (offering_id, modality)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_offerings_is_active ON offerings(is_active)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// A write transaction on a pooled SQLite connection.
pub struct SqliteTransaction {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl CatalogTransaction for SqliteTransaction {
    async fn ensure_provider(&mut self, input: &NewProvider) -> Result<Provider> {
        sqlx::query(
            "INSERT INTO providers (name, website, api_key_name) VALUES (?, ?, ?) ON CONFLICT(name) DO NOTHING",
        )
        .bind(&input.name)
        .bind(&input.website)
        .bind(&input.api_key_name)
        .execute(&mut *self.tx)
        .await?;

        let row = sqlx::query_as::<_, ProviderRow>(
            "SELECT id, name, website, api_key_name FROM providers WHERE name = ?",
        )
        .bind(&input.name)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row.into_provider())
    }

    async fn ensure_model(&mut self, name: &str) -> Result<Model> {
        sqlx::query("INSERT INTO models (name) VALUES (?) ON CONFLICT(name) DO NOTHING")
            .bind(name)
            .execute(&mut *self.tx)
            .await?;

        let row = sqlx::query_as::<_, ModelRow>("SELECT id, name FROM models WHERE name = ?")
            .bind(name)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row.into_model())
    }

    async fn find_offering_id(
        &mut self,
        provider_id: ProviderId,
        model_id: ModelId,
    ) -> Result<Option<OfferingId>> {
        let id: Option<i64> =
            sqlx::query_scalar("SELECT id FROM offerings WHERE provider_id = ? AND model_id = ?")
                .bind(provider_id.get())
                .bind(model_id.get())
                .fetch_optional(&mut *self.tx)
                .await?;
        Ok(id.map(OfferingId::new))
    }

    async fn insert_offering(
        &mut self,
        provider_id: ProviderId,
        model_id: ModelId,
        fields: &OfferingFields,
    ) -> Result<OfferingId> {
        let result = sqlx::query(
            r#"
            INSERT INTO offerings (
                provider_id, model_id, api_model_name, context_window, max_output_tokens,
                input_cost_per_mtok, output_cost_per_mtok, cached_input_cost_per_mtok,
                tokens_per_second, supports_tools, discount_start_time_utc, discount_end_time_utc,
                input_discount_price, output_discount_price, is_active
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(provider_id.get())
        .bind(model_id.get())
        .bind(&fields.api_model_name)
        .bind(i64::from(fields.context_window))
        .bind(fields.max_output_tokens.map(i64::from))
        .bind(fields.input_cost_per_mtok)
        .bind(fields.output_cost_per_mtok)
        .bind(fields.cached_input_cost_per_mtok)
        .bind(fields.tokens_per_second)
        .bind(fields.supports_tools)
        .bind(fields.discount.start_hhmm())
        .bind(fields.discount.end_hhmm())
        .bind(fields.discount.input_price)
        .bind(fields.discount.output_price)
        .bind(fields.is_active)
        .execute(&mut *self.tx)
        .await?;

        Ok(OfferingId::new(result.last_insert_rowid()))
    }

    async fn update_offering(&mut self, id: OfferingId, fields: &OfferingFields) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE offerings SET
                api_model_name = ?,
                context_window = ?,
                max_output_tokens = ?,
                input_cost_per_mtok = ?,
                output_cost_per_mtok = ?,
                cached_input_cost_per_mtok = ?,
                tokens_per_second = ?,
                supports_tools = ?,
                discount_start_time_utc = ?,
                discount_end_time_utc = ?,
                input_discount_price = ?,
                output_discount_price = ?,
                is_active = ?
            WHERE id = ?
            "#,
        )
        .bind(&fields.api_model_name)
        .bind(i64::from(fields.context_window))
        .bind(fields.max_output_tokens.map(i64::from))
        .bind(fields.input_cost_per_mtok)
        .bind(fields.output_cost_per_mtok)
        .bind(fields.cached_input_cost_per_mtok)
        .bind(fields.tokens_per_second)
        .bind(fields.supports_tools)
        .bind(fields.discount.start_hhmm())
        .bind(fields.discount.end_hhmm())
        .bind(fields.discount.input_price)
        .bind(fields.discount.output_price)
        .bind(fields.is_active)
        .bind(id.get())
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound {
                entity: "offering",
                key: id.to_string(),
            });
        }
        Ok(())
    }

    async fn replace_modalities(&mut self, id: OfferingId, modalities: &ModalitySet) -> Result<()> {
        sqlx::query("DELETE FROM offering_modalities WHERE offering_id = ?")
            .bind(id.get())
            .execute(&mut *self.tx)
            .await?;

        for modality in modalities.iter() {
            sqlx::query("INSERT INTO offering_modalities (offering_id, modality) VALUES (?, ?)")
                .bind(id.get())
                .bind(modality.as_str())
                .execute(&mut *self.tx)
                .await?;
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn begin(&self) -> Result<Box<dyn CatalogTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(SqliteTransaction { tx }))
    }

    async fn get_provider(&self, id: ProviderId) -> Result<Option<Provider>> {
        let row = sqlx::query_as::<_, ProviderRow>(
            "SELECT id, name, website, api_key_name FROM providers WHERE id = ?",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ProviderRow::into_provider))
    }

    async fn find_provider_by_name(&self, name: &str) -> Result<Option<Provider>> {
        let row = sqlx::query_as::<_, ProviderRow>(
            "SELECT id, name, website, api_key_name FROM providers WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ProviderRow::into_provider))
    }

    async fn list_providers(&self, skip: usize, limit: usize) -> Result<Vec<Provider>> {
        let rows = sqlx::query_as::<_, ProviderRow>(
            "SELECT id, name, website, api_key_name FROM providers ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(limit as i64)
        .bind(skip as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ProviderRow::into_provider).collect())
    }

    async fn get_model(&self, id: ModelId) -> Result<Option<Model>> {
        let row = sqlx::query_as::<_, ModelRow>("SELECT id, name FROM models WHERE id = ?")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(ModelRow::into_model))
    }

    async fn find_model_by_name(&self, name: &str) -> Result<Option<Model>> {
        let row = sqlx::query_as::<_, ModelRow>("SELECT id, name FROM models WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(ModelRow::into_model))
    }

    async fn list_models(&self, skip: usize, limit: usize) -> Result<Vec<Model>> {
        let rows = sqlx::query_as::<_, ModelRow>(
            "SELECT id, name FROM models ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(limit as i64)
        .bind(skip as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ModelRow::into_model).collect())
    }

    async fn get_offering(&self, id: OfferingId) -> Result<Option<OfferingView>> {
        let mut query = QueryBuilder::<Sqlite>::new(OFFERING_SELECT);
        query.push(" WHERE o.id = ").push_bind(id.get());

        let row = query
            .build_query_as::<OfferingRow>()
            .fetch_optional(&self.pool)
            .await?;
        row.map(OfferingRow::into_view).transpose()
    }

    async fn find_offerings(&self, filter: &OfferingFilter) -> Result<Vec<OfferingView>> {
        let mut query = QueryBuilder::<Sqlite>::new(OFFERING_SELECT);
        query.push(" WHERE o.is_active = ").push_bind(filter.is_active);

        if let Some(min) = filter.min_context_window {
            query.push(" AND o.context_window >= ").push_bind(i64::from(min));
        }
        if let Some(tools) = filter.supports_tools {
            query.push(" AND o.supports_tools = ").push_bind(tools);
        }
        for modality in &filter.required_modalities {
            query
                .push(" AND EXISTS (SELECT 1 FROM offering_modalities fm WHERE fm.offering_id = o.id AND fm.modality = ")
                .push_bind(modality.as_str())
                .push(")");
        }
        query.push(" ORDER BY (o.input_cost_per_mtok + o.output_cost_per_mtok) / 2.0, o.id");

        let rows = query
            .build_query_as::<OfferingRow>()
            .fetch_all(&self.pool)
            .await?;
        debug!(count = rows.len(), "Found offerings");
        rows.into_iter().map(OfferingRow::into_view).collect()
    }

    async fn find_offerings_by_api_names(
        &self,
        api_model_names: &[String],
    ) -> Result<Vec<OfferingView>> {
        if api_model_names.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new(OFFERING_SELECT);
        query.push(" WHERE o.is_active = ").push_bind(true);
        query.push(" AND o.api_model_name IN (");
        let mut names = query.separated(", ");
        for name in api_model_names {
            names.push_bind(name.as_str());
        }
        names.push_unseparated(")");
        query.push(" ORDER BY o.input_cost_per_mtok + o.output_cost_per_mtok, o.id");

        let rows = query
            .build_query_as::<OfferingRow>()
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(OfferingRow::into_view).collect()
    }

    async fn list_active_api_names(&self) -> Result<Vec<String>> {
        let names = sqlx::query_scalar("SELECT api_model_name FROM offerings WHERE is_active = 1 ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(names)
    }

    async fn counts(&self) -> Result<CatalogCounts> {
        let row = sqlx::query_as::<_, CountsRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM providers) AS providers,
                (SELECT COUNT(*) FROM models) AS models,
                (SELECT COUNT(*) FROM offerings) AS offerings
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(CatalogCounts {
            providers: row.providers as u64,
            models: row.models as u64,
            offerings: row.offerings as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::modality::Modality;
    use crate::types::offering::DiscountWindow;

    fn fields(api: &str) -> OfferingFields {
        OfferingFields {
            api_model_name: api.to_string(),
            context_window: 8000,
            max_output_tokens: Some(4096),
            input_cost_per_mtok: 3.0,
            output_cost_per_mtok: 15.0,
            cached_input_cost_per_mtok: None,
            tokens_per_second: Some(80.0),
            supports_tools: true,
            discount: DiscountWindow::parse("16:30", "00:30", 0.135, 0.55).unwrap(),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_offering_roundtrips_through_rows() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut tx = store.begin().await.unwrap();
        let provider = tx
            .ensure_provider(&NewProvider {
                name: "P1".to_string(),
                website: "https://p1.example".to_string(),
                api_key_name: Some("P1_KEY".to_string()),
            })
            .await
            .unwrap();
        let model = tx.ensure_model("M1").await.unwrap();
        let id = tx.insert_offering(provider.id, model.id, &fields("p1/m1")).await.unwrap();
        let modalities: ModalitySet = [Modality::Text, Modality::Image].into_iter().collect();
        tx.replace_modalities(id, &modalities).await.unwrap();
        tx.commit().await.unwrap();

        let view = store.get_offering(id).await.unwrap().unwrap();
        assert_eq!(view.provider_name, "P1");
        assert_eq!(view.model_name, "M1");
        assert_eq!(view.offering.max_output_tokens, Some(4096));
        assert_eq!(view.offering.discount.start_hhmm(), "16:30");
        assert_eq!(view.offering.modalities, modalities);
        assert!(view.offering.supports_tools);
    }

    #[tokio::test]
    async fn test_unique_violation_maps_to_conflict() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut tx = store.begin().await.unwrap();
        let provider = tx
            .ensure_provider(&NewProvider {
                name: "P1".to_string(),
                website: "https://p1.example".to_string(),
                api_key_name: None,
            })
            .await
            .unwrap();
        let m1 = tx.ensure_model("M1").await.unwrap();
        let m2 = tx.ensure_model("M2").await.unwrap();
        tx.insert_offering(provider.id, m1.id, &fields("shared")).await.unwrap();
        let err = tx
            .insert_offering(provider.id, m2.id, &fields("shared"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_file_database_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("catalog.db").display());
        let store = SqliteStore::new(&url).await.unwrap();
        assert_eq!(store.counts().await.unwrap(), CatalogCounts::default());
        assert!(dir.path().join("catalog.db").exists());
    }
}
