use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tenant isolation key, present on every row and every staged operation.
pub type TenantId = i16;

/// Closed set of object kinds held by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectType {
    Data,
    Model,
    Flow,
    Job,
    File,
    Schema,
    Custom,
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ObjectType::Data => write!(f, "DATA"),
            ObjectType::Model => write!(f, "MODEL"),
            ObjectType::Flow => write!(f, "FLOW"),
            ObjectType::Job => write!(f, "JOB"),
            ObjectType::File => write!(f, "FILE"),
            ObjectType::Schema => write!(f, "SCHEMA"),
            ObjectType::Custom => write!(f, "CUSTOM"),
        }
    }
}

impl std::str::FromStr for ObjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DATA" => Ok(ObjectType::Data),
            "MODEL" => Ok(ObjectType::Model),
            "FLOW" => Ok(ObjectType::Flow),
            "JOB" => Ok(ObjectType::Job),
            "FILE" => Ok(ObjectType::File),
            "SCHEMA" => Ok(ObjectType::Schema),
            "CUSTOM" => Ok(ObjectType::Custom),
            _ => Err(format!("Unknown object type: {}", s)),
        }
    }
}

/// Object identifiers are stored as two signed 64-bit halves.
pub fn object_id_halves(id: &Uuid) -> (i64, i64) {
    let bits = id.as_u128();
    ((bits >> 64) as i64, bits as u64 as i64)
}

pub fn object_id_from_halves(hi: i64, lo: i64) -> Uuid {
    Uuid::from_u64_pair(hi as u64, lo as u64)
}
