use serde::{Deserialize, Serialize};

use crate::model::ObjectType;

/// The structured definition of one object version.
///
/// Stored encoded in the object_definition table and decoded through the
/// codec boundary; the body is self-describing and varies by object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDefinition {
    pub object_type: ObjectType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub body: serde_json::Value,
}

impl ObjectDefinition {
    pub fn new(object_type: ObjectType, body: serde_json::Value) -> Self {
        Self {
            object_type,
            description: None,
            body,
        }
    }
}
