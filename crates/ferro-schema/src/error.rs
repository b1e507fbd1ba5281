//! Error types for the schema core.

/// Errors produced while building metadata or compiling DDL.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The declarative model is malformed or ambiguous. Raised before
    /// anything touches the database.
    #[error("metadata validation failed: {0}")]
    MetadataValidation(String),

    /// The active dialect cannot express the requested operation.
    #[error("dialect '{dialect}' cannot compile {operation}: {reason}")]
    DdlCompilation {
        /// Dialect name.
        dialect: &'static str,
        /// Description of the unsupported operation.
        operation: String,
        /// Why the dialect rejects it.
        reason: String,
    },
}

/// Result type for schema-core operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
