use sqlx::{PgConnection, Postgres, QueryBuilder, Row};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::codec::{DefinitionCodec, JsonDefinitionCodec};
use crate::error::{CodecError, ReadError};
use crate::model::{
    object_id_from_halves, object_id_halves, KeyedItems, ObjectDefinition, ObjectType, Tag,
    TagHeader, TenantId,
};
use crate::store::attrs::fetch_tag_attrs;
use crate::store::dialect::{Dialect, PostgresDialect};

/// Batch read engine for the metadata catalog.
///
/// Every operation follows the same shape: stage the input batch into the
/// key_mapping table (one bulk insert, input order recorded in the ordering
/// column), resolve storage keys with one set-based update per lookup, then
/// select the joined entity rows back in staging order. All statements for
/// one batch must run on the same connection or transaction so the staged
/// rows are visible to the steps that follow.
pub struct ReadBatch {
    dialect: Arc<dyn Dialect>,
    codec: Arc<dyn DefinitionCodec>,
    stage_token: i64,
    stage_counter: AtomicU32,
}

impl ReadBatch {
    pub fn new(dialect: Arc<dyn Dialect>, codec: Arc<dyn DefinitionCodec>) -> Self {
        // Upper half of every stage id is a per-process token, lower half a
        // local counter; concurrent processes sharing one staging table
        // allocate from disjoint ranges.
        let stage_token = (Uuid::new_v4().as_u128() as u32) as i64;

        Self {
            dialect,
            codec,
            stage_token,
            stage_counter: AtomicU32::new(0),
        }
    }

    fn next_mapping_stage(&self) -> i64 {
        let seq = self.stage_counter.fetch_add(1, Ordering::Relaxed);
        (self.stage_token << 32) | seq as i64
    }

    fn mapping_table(&self) -> &str {
        self.dialect.mapping_table_name()
    }

    // -------------------------------------------------------------------------
    // ENTITY READERS
    // -------------------------------------------------------------------------

    /// Resolve object identifiers to storage keys and object types.
    pub async fn read_object_type_by_id(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        object_ids: &[Uuid],
    ) -> Result<KeyedItems<ObjectType>, ReadError> {
        if object_ids.is_empty() {
            return Ok(KeyedItems::empty());
        }

        let stage = self.stage_object_ids(conn, object_ids).await?;
        self.map_object_by_id(conn, tenant_id, stage).await?;

        let query = format!(
            "select oid.object_pk, oid.object_type \
             from object_id oid \
             join {km} km on oid.object_pk = km.pk \
             where oid.tenant_id = $1 \
               and km.mapping_stage = $2 \
             order by km.ordering",
            km = self.mapping_table()
        );

        let rows = sqlx::query(&query)
            .bind(tenant_id)
            .bind(stage)
            .fetch_all(&mut *conn)
            .await?;

        expect_exact(rows.len(), object_ids.len())?;

        let mut keys = Vec::with_capacity(rows.len());
        let mut types = Vec::with_capacity(rows.len());

        for row in &rows {
            keys.push(row.try_get::<i64, _>("object_pk")?);

            let code: String = row.try_get("object_type")?;
            let object_type = code
                .parse::<ObjectType>()
                .map_err(|_| CodecError::UnknownObjectType(code))?;
            types.push(object_type);
        }

        Ok(KeyedItems::unversioned(keys, types))
    }

    /// Read definitions for explicit (object key, version) pairs.
    pub async fn read_definition_by_version(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        object_fks: &[i64],
        object_versions: &[i32],
    ) -> Result<KeyedItems<ObjectDefinition>, ReadError> {
        debug_assert_eq!(object_fks.len(), object_versions.len());

        if object_fks.is_empty() {
            return Ok(KeyedItems::empty());
        }

        let stage = self
            .stage_foreign_keys_with_version(conn, object_fks, object_versions)
            .await?;
        self.map_definition_by_version(conn, tenant_id, stage).await?;

        self.fetch_definition(conn, tenant_id, object_fks.len(), stage)
            .await
    }

    /// Read the current definition for each object key, via the
    /// externally maintained latest_version view.
    pub async fn read_definition_by_latest(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        object_fks: &[i64],
    ) -> Result<KeyedItems<ObjectDefinition>, ReadError> {
        if object_fks.is_empty() {
            return Ok(KeyedItems::empty());
        }

        let stage = self.stage_foreign_keys(conn, object_fks).await?;
        self.map_definition_by_latest(conn, tenant_id, stage).await?;

        self.fetch_definition(conn, tenant_id, object_fks.len(), stage)
            .await
    }

    async fn fetch_definition(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        expected: usize,
        stage: i64,
    ) -> Result<KeyedItems<ObjectDefinition>, ReadError> {
        let query = format!(
            "select def.definition_pk, def.object_version, def.definition \
             from object_definition def \
             join {km} km on def.definition_pk = km.pk \
             where def.tenant_id = $1 \
               and km.mapping_stage = $2 \
             order by km.ordering",
            km = self.mapping_table()
        );

        let rows = sqlx::query(&query)
            .bind(tenant_id)
            .bind(stage)
            .fetch_all(&mut *conn)
            .await?;

        expect_exact(rows.len(), expected)?;

        let mut keys = Vec::with_capacity(rows.len());
        let mut versions = Vec::with_capacity(rows.len());
        let mut definitions = Vec::with_capacity(rows.len());

        for row in &rows {
            keys.push(row.try_get::<i64, _>("definition_pk")?);
            versions.push(row.try_get::<i32, _>("object_version")?);

            let encoded: Vec<u8> = row.try_get("definition")?;
            definitions.push(self.codec.decode(&encoded)?);
        }

        Ok(KeyedItems::new(keys, versions, definitions))
    }

    /// Tag keys and versions for explicit (definition key, tag version)
    /// pairs, without attribute content.
    pub async fn read_tag_record_by_version(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        definition_fks: &[i64],
        tag_versions: &[i32],
    ) -> Result<KeyedItems<()>, ReadError> {
        debug_assert_eq!(definition_fks.len(), tag_versions.len());

        if definition_fks.is_empty() {
            return Ok(KeyedItems::empty());
        }

        let stage = self
            .stage_foreign_keys_with_version(conn, definition_fks, tag_versions)
            .await?;
        self.map_tag_by_version(conn, tenant_id, stage).await?;

        self.fetch_tag_record(conn, tenant_id, definition_fks.len(), stage)
            .await
    }

    /// Read tags with attributes for explicit (definition key, tag version)
    /// pairs.
    pub async fn read_tag_by_version(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        definition_fks: &[i64],
        tag_versions: &[i32],
    ) -> Result<KeyedItems<Tag>, ReadError> {
        debug_assert_eq!(definition_fks.len(), tag_versions.len());

        if definition_fks.is_empty() {
            return Ok(KeyedItems::empty());
        }

        let stage = self
            .stage_foreign_keys_with_version(conn, definition_fks, tag_versions)
            .await?;
        self.map_tag_by_version(conn, tenant_id, stage).await?;

        self.fetch_tag(conn, tenant_id, definition_fks.len(), stage)
            .await
    }

    /// Read the current tag, with attributes, for each definition key.
    pub async fn read_tag_by_latest(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        definition_fks: &[i64],
    ) -> Result<KeyedItems<Tag>, ReadError> {
        if definition_fks.is_empty() {
            return Ok(KeyedItems::empty());
        }

        let stage = self.stage_foreign_keys(conn, definition_fks).await?;
        self.map_tag_by_latest(conn, tenant_id, stage).await?;

        self.fetch_tag(conn, tenant_id, definition_fks.len(), stage)
            .await
    }

    async fn fetch_tag(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        expected: usize,
        stage: i64,
    ) -> Result<KeyedItems<Tag>, ReadError> {
        let records = self
            .fetch_tag_record(conn, tenant_id, expected, stage)
            .await?;
        let attrs =
            fetch_tag_attrs(conn, self.mapping_table(), tenant_id, expected, stage).await?;

        let (keys, versions, _) = records.into_parts();
        let tags = attrs.into_iter().map(Tag::new).collect();

        Ok(KeyedItems::new(keys, versions, tags))
    }

    /// Read tags by their own storage keys, attaching the identity header
    /// derived from the object and definition tables.
    pub async fn read_tag_with_header(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        tag_pks: &[i64],
    ) -> Result<KeyedItems<Tag>, ReadError> {
        if tag_pks.is_empty() {
            return Ok(KeyedItems::empty());
        }

        let stage = self.stage_primary_keys(conn, tag_pks).await?;
        self.map_definition_by_tag_pk(conn, tenant_id, stage).await?;

        let headers = self
            .fetch_tag_header(conn, tenant_id, tag_pks.len(), stage)
            .await?;
        let attrs =
            fetch_tag_attrs(conn, self.mapping_table(), tenant_id, tag_pks.len(), stage).await?;

        let (keys, versions, headers) = headers.into_parts();
        let tags = headers
            .into_iter()
            .zip(attrs)
            .map(|(header, attrs)| Tag::with_header(header, attrs))
            .collect();

        Ok(KeyedItems::new(keys, versions, tags))
    }

    async fn fetch_tag_record(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        expected: usize,
        stage: i64,
    ) -> Result<KeyedItems<()>, ReadError> {
        // Tag rows carry only keys and versions; attribute content lives in
        // tag_attr and is fetched separately against the same stage.
        let query = format!(
            "select tag.tag_pk, tag.tag_version \
             from tag \
             join {km} km on tag.tag_pk = km.pk \
             where tag.tenant_id = $1 \
               and km.mapping_stage = $2 \
             order by km.ordering",
            km = self.mapping_table()
        );

        let rows = sqlx::query(&query)
            .bind(tenant_id)
            .bind(stage)
            .fetch_all(&mut *conn)
            .await?;

        expect_exact(rows.len(), expected)?;

        let mut keys = Vec::with_capacity(rows.len());
        let mut versions = Vec::with_capacity(rows.len());

        for row in &rows {
            keys.push(row.try_get::<i64, _>("tag_pk")?);
            versions.push(row.try_get::<i32, _>("tag_version")?);
        }

        let items = vec![(); keys.len()];
        Ok(KeyedItems::new(keys, versions, items))
    }

    async fn fetch_tag_header(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        expected: usize,
        stage: i64,
    ) -> Result<KeyedItems<TagHeader>, ReadError> {
        // Assumes map_definition_by_tag_pk has run for this stage, so the
        // staged rows hold pk = tag key, fk = definition key, ver = tag
        // version; the header needs only the definition and object joins.
        let query = format!(
            "select km.pk as tag_pk, \
                    obj.object_type, obj.object_id_hi, obj.object_id_lo, \
                    def.object_version, km.ver as tag_version \
             from {km} km \
             join object_definition def on def.definition_pk = km.fk \
             join object_id obj \
               on obj.tenant_id = def.tenant_id \
              and obj.object_pk = def.object_fk \
             where def.tenant_id = $1 \
               and km.mapping_stage = $2 \
             order by km.ordering",
            km = self.mapping_table()
        );

        let rows = sqlx::query(&query)
            .bind(tenant_id)
            .bind(stage)
            .fetch_all(&mut *conn)
            .await?;

        expect_exact(rows.len(), expected)?;

        let mut keys = Vec::with_capacity(rows.len());
        let mut versions = Vec::with_capacity(rows.len());
        let mut headers = Vec::with_capacity(rows.len());

        for row in &rows {
            let tag_pk: i64 = row.try_get("tag_pk")?;
            let tag_version: i32 = row.try_get("tag_version")?;

            let code: String = row.try_get("object_type")?;
            let object_type = code
                .parse::<ObjectType>()
                .map_err(|_| CodecError::UnknownObjectType(code))?;

            let id_hi: i64 = row.try_get("object_id_hi")?;
            let id_lo: i64 = row.try_get("object_id_lo")?;

            keys.push(tag_pk);
            versions.push(tag_version);
            headers.push(TagHeader {
                object_type,
                object_id: object_id_from_halves(id_hi, id_lo),
                object_version: row.try_get("object_version")?,
                tag_version,
            });
        }

        Ok(KeyedItems::new(keys, versions, headers))
    }

    // -------------------------------------------------------------------------
    // KEY LOOKUPS
    // -------------------------------------------------------------------------

    /// Object storage keys for a batch of object identifiers.
    pub async fn lookup_object_pks(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        object_ids: &[Uuid],
    ) -> Result<Vec<i64>, ReadError> {
        if object_ids.is_empty() {
            return Ok(Vec::new());
        }

        let stage = self.stage_object_ids(conn, object_ids).await?;
        self.map_object_by_id(conn, tenant_id, stage).await?;

        self.fetch_mapped_pks(conn, stage, object_ids.len()).await
    }

    /// Definition storage keys for (object key, version) pairs.
    pub async fn lookup_definition_pks(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        object_fks: &[i64],
        object_versions: &[i32],
    ) -> Result<Vec<i64>, ReadError> {
        debug_assert_eq!(object_fks.len(), object_versions.len());

        if object_fks.is_empty() {
            return Ok(Vec::new());
        }

        let stage = self
            .stage_foreign_keys_with_version(conn, object_fks, object_versions)
            .await?;
        self.map_definition_by_version(conn, tenant_id, stage).await?;

        self.fetch_mapped_pks(conn, stage, object_fks.len()).await
    }

    /// Tag storage keys for (definition key, tag version) pairs.
    pub async fn lookup_tag_pks(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        definition_fks: &[i64],
        tag_versions: &[i32],
    ) -> Result<Vec<i64>, ReadError> {
        debug_assert_eq!(definition_fks.len(), tag_versions.len());

        if definition_fks.is_empty() {
            return Ok(Vec::new());
        }

        let stage = self
            .stage_foreign_keys_with_version(conn, definition_fks, tag_versions)
            .await?;
        self.map_tag_by_version(conn, tenant_id, stage).await?;

        self.fetch_mapped_pks(conn, stage, definition_fks.len()).await
    }

    async fn fetch_mapped_pks(
        &self,
        conn: &mut PgConnection,
        stage: i64,
        expected: usize,
    ) -> Result<Vec<i64>, ReadError> {
        let query = format!(
            "select pk from {km} \
             where mapping_stage = $1 \
             order by ordering",
            km = self.mapping_table()
        );

        let rows = sqlx::query(&query)
            .bind(stage)
            .fetch_all(&mut *conn)
            .await?;

        expect_exact(rows.len(), expected)?;

        let mut keys = Vec::with_capacity(rows.len());
        for row in &rows {
            // A staged key the resolver left unmatched reads back as null
            let pk: Option<i64> = row.try_get("pk")?;
            keys.push(pk.ok_or(ReadError::MissingData)?);
        }

        Ok(keys)
    }

    // -------------------------------------------------------------------------
    // KEY STAGING
    // -------------------------------------------------------------------------

    async fn stage_object_ids(
        &self,
        conn: &mut PgConnection,
        object_ids: &[Uuid],
    ) -> Result<i64, ReadError> {
        let stage = self.next_mapping_stage();
        if object_ids.is_empty() {
            return Ok(stage);
        }

        let mut insert: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "insert into {km} (id_hi, id_lo, mapping_stage, ordering) ",
            km = self.mapping_table()
        ));

        insert.push_values(object_ids.iter().enumerate(), |mut row, (ordering, id)| {
            let (id_hi, id_lo) = object_id_halves(id);
            row.push_bind(id_hi)
                .push_bind(id_lo)
                .push_bind(stage)
                .push_bind(ordering as i32);
        });

        insert.build().execute(&mut *conn).await?;

        log::trace!("staged {} object ids at stage {}", object_ids.len(), stage);
        Ok(stage)
    }

    async fn stage_foreign_keys(
        &self,
        conn: &mut PgConnection,
        fks: &[i64],
    ) -> Result<i64, ReadError> {
        self.stage_keys(conn, "fk", fks).await
    }

    async fn stage_primary_keys(
        &self,
        conn: &mut PgConnection,
        pks: &[i64],
    ) -> Result<i64, ReadError> {
        self.stage_keys(conn, "pk", pks).await
    }

    async fn stage_keys(
        &self,
        conn: &mut PgConnection,
        key_column: &str,
        keys: &[i64],
    ) -> Result<i64, ReadError> {
        let stage = self.next_mapping_stage();
        if keys.is_empty() {
            return Ok(stage);
        }

        let mut insert: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "insert into {km} ({key}, mapping_stage, ordering) ",
            km = self.mapping_table(),
            key = key_column
        ));

        insert.push_values(keys.iter().enumerate(), |mut row, (ordering, key)| {
            row.push_bind(*key)
                .push_bind(stage)
                .push_bind(ordering as i32);
        });

        insert.build().execute(&mut *conn).await?;

        log::trace!("staged {} {} keys at stage {}", keys.len(), key_column, stage);
        Ok(stage)
    }

    async fn stage_foreign_keys_with_version(
        &self,
        conn: &mut PgConnection,
        fks: &[i64],
        versions: &[i32],
    ) -> Result<i64, ReadError> {
        debug_assert_eq!(fks.len(), versions.len());

        let stage = self.next_mapping_stage();
        if fks.is_empty() {
            return Ok(stage);
        }

        let mut insert: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "insert into {km} (fk, ver, mapping_stage, ordering) ",
            km = self.mapping_table()
        ));

        insert.push_values(
            fks.iter().zip(versions).enumerate(),
            |mut row, (ordering, (fk, version))| {
                row.push_bind(*fk)
                    .push_bind(*version)
                    .push_bind(stage)
                    .push_bind(ordering as i32);
            },
        );

        insert.build().execute(&mut *conn).await?;

        log::trace!("staged {} keyed versions at stage {}", fks.len(), stage);
        Ok(stage)
    }

    // -------------------------------------------------------------------------
    // KEY RESOLUTION
    // -------------------------------------------------------------------------
    //
    // One set-based update per lookup shape, scoped by stage and tenant.
    // Staged rows with no match keep a null pk; the mismatch surfaces as a
    // cardinality failure at read time, never here.

    async fn map_object_by_id(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        stage: i64,
    ) -> Result<(), ReadError> {
        let query = format!(
            "update {km} \
             set pk = ( \
               select object_pk from object_id oid \
               where oid.tenant_id = $1 \
                 and oid.object_id_hi = {km}.id_hi \
                 and oid.object_id_lo = {km}.id_lo) \
             where mapping_stage = $2",
            km = self.mapping_table()
        );

        sqlx::query(&query)
            .bind(tenant_id)
            .bind(stage)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    async fn map_definition_by_version(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        stage: i64,
    ) -> Result<(), ReadError> {
        let query = format!(
            "update {km} \
             set pk = ( \
               select definition_pk from object_definition def \
               where def.tenant_id = $1 \
                 and def.object_fk = {km}.fk \
                 and def.object_version = {km}.ver) \
             where mapping_stage = $2",
            km = self.mapping_table()
        );

        sqlx::query(&query)
            .bind(tenant_id)
            .bind(stage)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    async fn map_definition_by_latest(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        stage: i64,
    ) -> Result<(), ReadError> {
        let query = format!(
            "update {km} \
             set pk = ( \
               select lv.latest_definition_pk \
               from latest_version lv \
               where lv.tenant_id = $1 \
                 and lv.object_fk = {km}.fk) \
             where mapping_stage = $2",
            km = self.mapping_table()
        );

        sqlx::query(&query)
            .bind(tenant_id)
            .bind(stage)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    async fn map_tag_by_version(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        stage: i64,
    ) -> Result<(), ReadError> {
        let query = format!(
            "update {km} \
             set pk = ( \
               select tag_pk from tag \
               where tag.tenant_id = $1 \
                 and tag.definition_fk = {km}.fk \
                 and tag.tag_version = {km}.ver) \
             where mapping_stage = $2",
            km = self.mapping_table()
        );

        sqlx::query(&query)
            .bind(tenant_id)
            .bind(stage)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    async fn map_tag_by_latest(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        stage: i64,
    ) -> Result<(), ReadError> {
        let query = format!(
            "update {km} \
             set pk = ( \
               select lt.latest_tag_pk \
               from latest_tag lt \
               where lt.tenant_id = $1 \
                 and lt.definition_fk = {km}.fk) \
             where mapping_stage = $2",
            km = self.mapping_table()
        );

        sqlx::query(&query)
            .bind(tenant_id)
            .bind(stage)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Backfill fk and ver from the tag table for staged tag keys, setting
    /// up the joins fetch_tag_header needs.
    async fn map_definition_by_tag_pk(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        stage: i64,
    ) -> Result<(), ReadError> {
        let query = format!(
            "update {km} \
             set fk = ( \
               select definition_fk from tag t1 \
               where t1.tenant_id = $1 \
                 and t1.tag_pk = {km}.pk), \
             ver = ( \
               select tag_version from tag t2 \
               where t2.tenant_id = $2 \
                 and t2.tag_pk = {km}.pk) \
             where mapping_stage = $3",
            km = self.mapping_table()
        );

        sqlx::query(&query)
            .bind(tenant_id)
            .bind(tenant_id)
            .bind(stage)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}

impl Default for ReadBatch {
    fn default() -> Self {
        Self::new(Arc::new(PostgresDialect), Arc::new(JsonDefinitionCodec))
    }
}

/// Strict one-to-one correspondence between staged keys and fetched rows.
fn expect_exact(actual: usize, expected: usize) -> Result<(), ReadError> {
    use std::cmp::Ordering::*;

    match actual.cmp(&expected) {
        Less => Err(ReadError::MissingData),
        Greater => Err(ReadError::TooManyRows),
        Equal => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_expect_exact_cardinality() {
        assert!(expect_exact(3, 3).is_ok());
        assert!(matches!(expect_exact(2, 3), Err(ReadError::MissingData)));
        assert!(matches!(expect_exact(4, 3), Err(ReadError::TooManyRows)));
        assert!(expect_exact(0, 0).is_ok());
    }

    #[test]
    fn test_stage_ids_are_unique_under_concurrent_allocation() {
        let reader = Arc::new(ReadBatch::default());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let reader = Arc::clone(&reader);
                std::thread::spawn(move || {
                    (0..1000)
                        .map(|_| reader.next_mapping_stage())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for stage in handle.join().unwrap() {
                assert!(seen.insert(stage), "stage id {} allocated twice", stage);
            }
        }

        assert_eq!(seen.len(), 8000);
    }

    #[test]
    fn test_stage_ids_from_distinct_engines_do_not_collide() {
        // Two engine instances model two service processes sharing the
        // staging table; their per-process tokens keep the ranges disjoint
        let a = ReadBatch::default();
        let b = ReadBatch::default();

        let ids_a: HashSet<_> = (0..100).map(|_| a.next_mapping_stage()).collect();
        let ids_b: HashSet<_> = (0..100).map(|_| b.next_mapping_stage()).collect();

        assert!(ids_a.is_disjoint(&ids_b));
    }
}
