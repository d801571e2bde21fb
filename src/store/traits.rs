use uuid::Uuid;

use crate::error::ReadError;
use crate::model::{KeyedItems, ObjectDefinition, ObjectType, Tag, TenantId};

/// Batch read contract of the catalog.
///
/// This is the boundary the service gateway calls: one method per lookup
/// kind, each taking a tenant and equal-length input sequences and
/// returning one result per input key, in input order. Connection and
/// transaction lifecycle stays behind the implementation.
#[async_trait::async_trait]
pub trait MetadataReadStore: Send + Sync {
    async fn object_types_by_id(
        &self,
        tenant_id: TenantId,
        object_ids: &[Uuid],
    ) -> Result<KeyedItems<ObjectType>, ReadError>;

    async fn definitions_by_version(
        &self,
        tenant_id: TenantId,
        object_fks: &[i64],
        object_versions: &[i32],
    ) -> Result<KeyedItems<ObjectDefinition>, ReadError>;

    async fn definitions_by_latest(
        &self,
        tenant_id: TenantId,
        object_fks: &[i64],
    ) -> Result<KeyedItems<ObjectDefinition>, ReadError>;

    /// Tag keys and versions only, no attribute content.
    async fn tag_records_by_version(
        &self,
        tenant_id: TenantId,
        definition_fks: &[i64],
        tag_versions: &[i32],
    ) -> Result<KeyedItems<()>, ReadError>;

    async fn tags_by_version(
        &self,
        tenant_id: TenantId,
        definition_fks: &[i64],
        tag_versions: &[i32],
    ) -> Result<KeyedItems<Tag>, ReadError>;

    async fn tags_by_latest(
        &self,
        tenant_id: TenantId,
        definition_fks: &[i64],
    ) -> Result<KeyedItems<Tag>, ReadError>;

    /// Tags by their own storage keys, with the identity header attached.
    async fn tags_with_header(
        &self,
        tenant_id: TenantId,
        tag_pks: &[i64],
    ) -> Result<KeyedItems<Tag>, ReadError>;

    async fn object_pks_by_id(
        &self,
        tenant_id: TenantId,
        object_ids: &[Uuid],
    ) -> Result<Vec<i64>, ReadError>;

    async fn definition_pks_by_version(
        &self,
        tenant_id: TenantId,
        object_fks: &[i64],
        object_versions: &[i32],
    ) -> Result<Vec<i64>, ReadError>;

    async fn tag_pks_by_version(
        &self,
        tenant_id: TenantId,
        definition_fks: &[i64],
        tag_versions: &[i32],
    ) -> Result<Vec<i64>, ReadError>;
}
