use crate::error::CodecError;
use crate::model::ObjectDefinition;

/// Encoding boundary for stored definition payloads.
///
/// The read engine treats payloads as bytes-in, typed-record-out; swapping
/// the wire format means swapping this collaborator, not the engine.
pub trait DefinitionCodec: Send + Sync {
    fn encode(&self, definition: &ObjectDefinition) -> Result<Vec<u8>, CodecError>;
    fn decode(&self, bytes: &[u8]) -> Result<ObjectDefinition, CodecError>;
}

/// Default codec: self-describing JSON.
#[derive(Debug, Clone, Default)]
pub struct JsonDefinitionCodec;

impl DefinitionCodec for JsonDefinitionCodec {
    fn encode(&self, definition: &ObjectDefinition) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(definition).map_err(CodecError::Json)
    }

    fn decode(&self, bytes: &[u8]) -> Result<ObjectDefinition, CodecError> {
        serde_json::from_slice(bytes).map_err(CodecError::Json)
    }
}
