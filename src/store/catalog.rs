use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::ReadError;
use crate::model::{KeyedItems, ObjectDefinition, ObjectType, Tag, TenantId};
use crate::store::read_batch::ReadBatch;
use crate::store::traits::MetadataReadStore;

/// PostgreSQL-backed catalog store.
///
/// Owns the connection pool and the batch read engine. Every batch read
/// runs inside its own transaction, rolled back once results are
/// materialized: the only writes a read performs are its transient staging
/// rows, and the rollback removes them from the shared table without an
/// explicit cleanup statement.
pub struct CatalogStore {
    pool: PgPool,
    reader: ReadBatch,
}

impl CatalogStore {
    /// Create a new catalog store with the given database URL
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self::with_pool(pool))
    }

    /// Create a catalog store from loaded application configuration
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let database_url = config.database_url()?;
        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections.unwrap_or(20))
            .connect(&database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self::with_pool(pool))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self {
            pool,
            reader: ReadBatch::default(),
        }
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;

        log::info!("Catalog schema is up to date");
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// The underlying batch read engine, for callers that manage their own
    /// connection or transaction.
    pub fn reader(&self) -> &ReadBatch {
        &self.reader
    }
}

#[async_trait::async_trait]
impl MetadataReadStore for CatalogStore {
    async fn object_types_by_id(
        &self,
        tenant_id: TenantId,
        object_ids: &[Uuid],
    ) -> Result<KeyedItems<ObjectType>, ReadError> {
        let mut tx = self.pool.begin().await?;
        let items = self
            .reader
            .read_object_type_by_id(&mut tx, tenant_id, object_ids)
            .await?;
        tx.rollback().await?;

        Ok(items)
    }

    async fn definitions_by_version(
        &self,
        tenant_id: TenantId,
        object_fks: &[i64],
        object_versions: &[i32],
    ) -> Result<KeyedItems<ObjectDefinition>, ReadError> {
        let mut tx = self.pool.begin().await?;
        let items = self
            .reader
            .read_definition_by_version(&mut tx, tenant_id, object_fks, object_versions)
            .await?;
        tx.rollback().await?;

        Ok(items)
    }

    async fn definitions_by_latest(
        &self,
        tenant_id: TenantId,
        object_fks: &[i64],
    ) -> Result<KeyedItems<ObjectDefinition>, ReadError> {
        let mut tx = self.pool.begin().await?;
        let items = self
            .reader
            .read_definition_by_latest(&mut tx, tenant_id, object_fks)
            .await?;
        tx.rollback().await?;

        Ok(items)
    }

    async fn tag_records_by_version(
        &self,
        tenant_id: TenantId,
        definition_fks: &[i64],
        tag_versions: &[i32],
    ) -> Result<KeyedItems<()>, ReadError> {
        let mut tx = self.pool.begin().await?;
        let items = self
            .reader
            .read_tag_record_by_version(&mut tx, tenant_id, definition_fks, tag_versions)
            .await?;
        tx.rollback().await?;

        Ok(items)
    }

    async fn tags_by_version(
        &self,
        tenant_id: TenantId,
        definition_fks: &[i64],
        tag_versions: &[i32],
    ) -> Result<KeyedItems<Tag>, ReadError> {
        let mut tx = self.pool.begin().await?;
        let items = self
            .reader
            .read_tag_by_version(&mut tx, tenant_id, definition_fks, tag_versions)
            .await?;
        tx.rollback().await?;

        Ok(items)
    }

    async fn tags_by_latest(
        &self,
        tenant_id: TenantId,
        definition_fks: &[i64],
    ) -> Result<KeyedItems<Tag>, ReadError> {
        let mut tx = self.pool.begin().await?;
        let items = self
            .reader
            .read_tag_by_latest(&mut tx, tenant_id, definition_fks)
            .await?;
        tx.rollback().await?;

        Ok(items)
    }

    async fn tags_with_header(
        &self,
        tenant_id: TenantId,
        tag_pks: &[i64],
    ) -> Result<KeyedItems<Tag>, ReadError> {
        let mut tx = self.pool.begin().await?;
        let items = self
            .reader
            .read_tag_with_header(&mut tx, tenant_id, tag_pks)
            .await?;
        tx.rollback().await?;

        Ok(items)
    }

    async fn object_pks_by_id(
        &self,
        tenant_id: TenantId,
        object_ids: &[Uuid],
    ) -> Result<Vec<i64>, ReadError> {
        let mut tx = self.pool.begin().await?;
        let keys = self
            .reader
            .lookup_object_pks(&mut tx, tenant_id, object_ids)
            .await?;
        tx.rollback().await?;

        Ok(keys)
    }

    async fn definition_pks_by_version(
        &self,
        tenant_id: TenantId,
        object_fks: &[i64],
        object_versions: &[i32],
    ) -> Result<Vec<i64>, ReadError> {
        let mut tx = self.pool.begin().await?;
        let keys = self
            .reader
            .lookup_definition_pks(&mut tx, tenant_id, object_fks, object_versions)
            .await?;
        tx.rollback().await?;

        Ok(keys)
    }

    async fn tag_pks_by_version(
        &self,
        tenant_id: TenantId,
        definition_fks: &[i64],
        tag_versions: &[i32],
    ) -> Result<Vec<i64>, ReadError> {
        let mut tx = self.pool.begin().await?;
        let keys = self
            .reader
            .lookup_tag_pks(&mut tx, tenant_id, definition_fks, tag_versions)
            .await?;
        tx.rollback().await?;

        Ok(keys)
    }
}
