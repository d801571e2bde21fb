use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::model::ObjectType;

/// A single attribute value.
///
/// Scalars map 1:1 to rows of the tag_attr table; arrays are assembled by
/// the read path from multiple rows sharing a name, ordered by attr_index.
/// Arrays of arrays are not representable in storage and never produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "type", content = "value")]
pub enum AttrValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    Datetime(DateTime<Utc>),
    Array(Vec<AttrValue>),
}

/// Identity summary for a tag, derived from the object / definition / tag
/// join. Used when callers need to know what a tag points at without the
/// attribute content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagHeader {
    pub object_type: ObjectType,
    pub object_id: Uuid,
    pub object_version: i32,
    pub tag_version: i32,
}

/// A tag with its attributes, optionally carrying the identity header.
///
/// Version-keyed reads return tags without headers (the caller already
/// knows the identity); storage-key reads attach one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<TagHeader>,
    pub attrs: HashMap<String, AttrValue>,
}

impl Tag {
    pub fn new(attrs: HashMap<String, AttrValue>) -> Self {
        Self {
            header: None,
            attrs,
        }
    }

    pub fn with_header(header: TagHeader, attrs: HashMap<String, AttrValue>) -> Self {
        Self {
            header: Some(header),
            attrs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_value_serde_round_trip() {
        let values = vec![
            AttrValue::Boolean(true),
            AttrValue::Integer(42),
            AttrValue::Float(2.5),
            AttrValue::String("pipeline".to_string()),
            AttrValue::Array(vec![
                AttrValue::String("a".to_string()),
                AttrValue::String("b".to_string()),
            ]),
        ];

        for value in values {
            let json = serde_json::to_string(&value).unwrap();
            let back: AttrValue = serde_json::from_str(&json).unwrap();
            assert_eq!(back, value);
        }
    }

    #[test]
    fn test_tag_header_is_optional_in_json() {
        let tag = Tag::new(HashMap::new());
        let json = serde_json::to_value(&tag).unwrap();
        assert!(json.get("header").is_none());
    }
}
