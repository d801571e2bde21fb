pub mod codec;
pub mod config;
pub mod error;
pub mod model;
pub mod store;

// Export codec types
pub use codec::{DefinitionCodec, JsonDefinitionCodec};

// Export error types
pub use error::{CodecError, ReadError};

// Export all model types
pub use model::*;

// Export store types
pub use store::{CatalogStore, Dialect, MetadataReadStore, PostgresDialect, ReadBatch};
