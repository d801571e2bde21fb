use thiserror::Error;

/// Failure kinds surfaced by the batch read engine.
///
/// Every batch operation fails as a whole on the first error; there is no
/// per-item partial success. `MissingData` and `TooManyRows` are cardinality
/// failures, `InvalidPayload` is stored-data corruption, and `Backend` is the
/// underlying driver error passed through unreinterpreted.
#[derive(Debug, Error)]
pub enum ReadError {
    /// Fewer result rows than requested keys, or a staged key that resolved
    /// to no storage key.
    #[error("no result row for one or more requested keys")]
    MissingData,

    /// More result rows than requested keys, or an attribute scan advancing
    /// past the batch bounds.
    #[error("more result rows than requested keys")]
    TooManyRows,

    /// A stored payload or code column could not be decoded.
    #[error("stored payload could not be decoded")]
    InvalidPayload(#[from] CodecError),

    #[error(transparent)]
    Backend(#[from] sqlx::Error),
}

/// Decode failures for stored payloads and code columns.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("definition payload is not valid JSON")]
    Json(#[source] serde_json::Error),

    #[error("unknown object type code {0:?}")]
    UnknownObjectType(String),

    #[error("unknown attribute type code {0:?}")]
    UnknownAttrType(String),

    /// The attribute row's type code names a value column that was null.
    #[error("attribute value missing for declared type {0:?}")]
    MissingAttrValue(String),
}
