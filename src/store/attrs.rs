use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};
use std::collections::HashMap;

use crate::error::{CodecError, ReadError};
use crate::model::{AttrValue, TenantId};

/// Scalar attributes use a negative array index; `>= 0` marks an array
/// element at that position.
pub(crate) const SCALAR_ATTR_INDEX: i32 = -1;

/// One row of the flattened attribute stream, keyed by the staged entity
/// position. `cell` is None for entities with no attributes at all (the
/// left join yields a single marker row for them).
pub(crate) struct AttrRow {
    pub tag_index: usize,
    pub cell: Option<AttrCell>,
}

pub(crate) struct AttrCell {
    pub name: String,
    pub index: i32,
    pub value: AttrValue,
}

/// Fetch the flattened attribute stream for one stage and rebuild one
/// attribute map per staged entity.
///
/// The tenant filter lives in the join condition, not the where clause, so
/// staged entities without attributes still produce a marker row instead of
/// disappearing from the stream.
pub(crate) async fn fetch_tag_attrs(
    conn: &mut PgConnection,
    mapping_table: &str,
    tenant_id: TenantId,
    n_tags: usize,
    mapping_stage: i64,
) -> Result<Vec<HashMap<String, AttrValue>>, ReadError> {
    let query = format!(
        "select km.ordering as tag_index, \
                ta.attr_name, ta.attr_index, ta.attr_type, \
                ta.attr_value_boolean, ta.attr_value_integer, ta.attr_value_float, \
                ta.attr_value_string, ta.attr_value_date, ta.attr_value_datetime \
         from {km} km \
         left join tag_attr ta \
           on ta.tenant_id = $1 \
          and ta.tag_fk = km.pk \
         where km.mapping_stage = $2 \
         order by km.ordering, ta.attr_name, ta.attr_index",
        km = mapping_table
    );

    let rows = sqlx::query(&query)
        .bind(tenant_id)
        .bind(mapping_stage)
        .fetch_all(conn)
        .await?;

    let mut stream = Vec::with_capacity(rows.len());
    for row in &rows {
        stream.push(decode_attr_row(row)?);
    }

    collect_attrs(stream, n_tags)
}

fn decode_attr_row(row: &PgRow) -> Result<AttrRow, ReadError> {
    let tag_index: i32 = row.try_get("tag_index")?;
    let attr_name: Option<String> = row.try_get("attr_name")?;

    let cell = match attr_name {
        None => None,
        Some(name) => {
            let index: i32 = row.try_get("attr_index")?;
            let value = decode_attr_value(row)?;
            Some(AttrCell { name, index, value })
        }
    };

    Ok(AttrRow {
        tag_index: tag_index as usize,
        cell,
    })
}

/// Pick the value out of the typed column named by attr_type.
fn decode_attr_value(row: &PgRow) -> Result<AttrValue, ReadError> {
    let attr_type: String = row.try_get("attr_type")?;

    let missing = || CodecError::MissingAttrValue(attr_type.clone());

    let value = match attr_type.as_str() {
        "BOOLEAN" => {
            let v: Option<bool> = row.try_get("attr_value_boolean")?;
            AttrValue::Boolean(v.ok_or_else(missing)?)
        }
        "INTEGER" => {
            let v: Option<i64> = row.try_get("attr_value_integer")?;
            AttrValue::Integer(v.ok_or_else(missing)?)
        }
        "FLOAT" => {
            let v: Option<f64> = row.try_get("attr_value_float")?;
            AttrValue::Float(v.ok_or_else(missing)?)
        }
        "STRING" => {
            let v: Option<String> = row.try_get("attr_value_string")?;
            AttrValue::String(v.ok_or_else(missing)?)
        }
        "DATE" => {
            let v: Option<chrono::NaiveDate> = row.try_get("attr_value_date")?;
            AttrValue::Date(v.ok_or_else(missing)?)
        }
        "DATETIME" => {
            let v: Option<chrono::DateTime<chrono::Utc>> = row.try_get("attr_value_datetime")?;
            AttrValue::Datetime(v.ok_or_else(missing)?)
        }
        other => return Err(CodecError::UnknownAttrType(other.to_string()).into()),
    };

    Ok(value)
}

/// Single ordered pass over the flattened stream, grouping rows into one
/// attribute map per entity position.
///
/// Requires the stream sorted by (tag_index, attr_name, attr_index).
/// Contiguous rows sharing a name with non-negative indexes merge into one
/// array value. Positions skipped by the stream, and positions after the
/// last row, come out as empty maps.
pub(crate) fn collect_attrs(
    rows: impl IntoIterator<Item = AttrRow>,
    n_tags: usize,
) -> Result<Vec<HashMap<String, AttrValue>>, ReadError> {
    let mut result: Vec<HashMap<String, AttrValue>> = (0..n_tags).map(|_| HashMap::new()).collect();

    let mut current_index = 0usize;
    let mut current_attrs: HashMap<String, AttrValue> = HashMap::new();

    // In-progress multi-valued attribute
    let mut array_name = String::new();
    let mut array_values: Vec<AttrValue> = Vec::new();

    for row in rows {
        if row.tag_index >= n_tags {
            return Err(ReadError::TooManyRows);
        }

        // A multi-valued attr ends when the entity or the name moves on
        if !array_values.is_empty() {
            let ended = row.tag_index != current_index
                || row.cell.as_ref().map(|c| c.name != array_name).unwrap_or(true);

            if ended {
                current_attrs.insert(
                    std::mem::take(&mut array_name),
                    AttrValue::Array(std::mem::take(&mut array_values)),
                );
            }
        }

        // Flush completed entities up to the row's position; entities the
        // stream skipped keep their empty maps
        while current_index != row.tag_index {
            result[current_index] = std::mem::take(&mut current_attrs);
            current_index += 1;
        }

        let Some(cell) = row.cell else {
            // Marker row for an entity with no attributes
            continue;
        };

        if cell.index <= SCALAR_ATTR_INDEX {
            current_attrs.insert(cell.name, cell.value);
        } else {
            array_name = cell.name;
            array_values.push(cell.value);
        }
    }

    if !array_values.is_empty() {
        current_attrs.insert(array_name, AttrValue::Array(array_values));
    }

    if n_tags > 0 {
        result[current_index] = current_attrs;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(tag_index: usize, name: &str, value: AttrValue) -> AttrRow {
        AttrRow {
            tag_index,
            cell: Some(AttrCell {
                name: name.to_string(),
                index: SCALAR_ATTR_INDEX,
                value,
            }),
        }
    }

    fn element(tag_index: usize, name: &str, index: i32, value: AttrValue) -> AttrRow {
        AttrRow {
            tag_index,
            cell: Some(AttrCell {
                name: name.to_string(),
                index,
                value,
            }),
        }
    }

    fn marker(tag_index: usize) -> AttrRow {
        AttrRow {
            tag_index,
            cell: None,
        }
    }

    fn s(v: &str) -> AttrValue {
        AttrValue::String(v.to_string())
    }

    #[test]
    fn test_multi_valued_attr_with_trailing_empty_entity() {
        let rows = vec![
            element(0, "tags", 0, s("v0")),
            element(0, "tags", 1, s("v1")),
            element(0, "tags", 2, s("v2")),
            marker(1),
        ];

        let maps = collect_attrs(rows, 2).unwrap();
        assert_eq!(maps.len(), 2);
        assert_eq!(
            maps[0].get("tags"),
            Some(&AttrValue::Array(vec![s("v0"), s("v1"), s("v2")]))
        );
        assert!(maps[1].is_empty());
    }

    #[test]
    fn test_scalars_and_arrays_mixed() {
        let rows = vec![
            element(0, "aliases", 0, s("a")),
            element(0, "aliases", 1, s("b")),
            scalar(0, "owner", s("finance")),
            scalar(1, "owner", s("risk")),
            element(1, "aliases", 0, s("c")),
        ];

        let maps = collect_attrs(rows, 2).unwrap();

        assert_eq!(
            maps[0].get("aliases"),
            Some(&AttrValue::Array(vec![s("a"), s("b")]))
        );
        assert_eq!(maps[0].get("owner"), Some(&s("finance")));
        assert_eq!(maps[0].len(), 2);

        assert_eq!(
            maps[1].get("aliases"),
            Some(&AttrValue::Array(vec![s("c")]))
        );
        assert_eq!(maps[1].get("owner"), Some(&s("risk")));
    }

    #[test]
    fn test_array_flushes_when_only_the_name_changes() {
        let rows = vec![
            element(0, "first", 0, AttrValue::Integer(1)),
            element(0, "second", 0, AttrValue::Integer(2)),
        ];

        let maps = collect_attrs(rows, 1).unwrap();
        assert_eq!(
            maps[0].get("first"),
            Some(&AttrValue::Array(vec![AttrValue::Integer(1)]))
        );
        assert_eq!(
            maps[0].get("second"),
            Some(&AttrValue::Array(vec![AttrValue::Integer(2)]))
        );
    }

    #[test]
    fn test_gap_entities_get_empty_maps() {
        let rows = vec![scalar(0, "k", s("v")), scalar(3, "k", s("w"))];

        let maps = collect_attrs(rows, 5).unwrap();
        assert_eq!(maps[0].get("k"), Some(&s("v")));
        assert!(maps[1].is_empty());
        assert!(maps[2].is_empty());
        assert_eq!(maps[3].get("k"), Some(&s("w")));
        assert!(maps[4].is_empty());
    }

    #[test]
    fn test_position_past_batch_bounds_is_too_many_rows() {
        let rows = vec![scalar(0, "k", s("v")), scalar(2, "k", s("w"))];

        match collect_attrs(rows, 2) {
            Err(ReadError::TooManyRows) => {}
            other => panic!("expected TooManyRows, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_empty_stream() {
        assert!(collect_attrs(Vec::new(), 0).unwrap().is_empty());

        let maps = collect_attrs(Vec::new(), 3).unwrap();
        assert_eq!(maps.len(), 3);
        assert!(maps.iter().all(|m| m.is_empty()));
    }

    #[test]
    fn test_rows_against_an_empty_batch_fail() {
        let rows = vec![scalar(0, "k", s("v"))];
        assert!(matches!(
            collect_attrs(rows, 0),
            Err(ReadError::TooManyRows)
        ));
    }
}
