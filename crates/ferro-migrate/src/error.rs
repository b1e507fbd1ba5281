//! Error types for the execution and migration layer.

/// Errors surfaced while synchronizing a schema or running migrations.
///
/// Every variant is propagated to the caller unmodified; the only local
/// recovery anywhere in this crate is the automatic down-SQL replay inside
/// [`SchemaExecutor`](crate::runner::SchemaExecutor).
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// The declarative model failed validation or an operation could not
    /// be compiled for the active dialect. Nothing was mutated.
    #[error(transparent)]
    Schema(#[from] ferro_schema::SchemaError),

    /// Reading the live catalog failed. Nothing was mutated; the call is
    /// safe to retry later.
    #[error("introspection failed: {0}")]
    Introspection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A statement failed mid-apply. The executor has already replayed
    /// its recorded down-SQL when this surfaces from a synchronize call.
    #[error("statement failed: {sql}: {source}")]
    Execution {
        /// The statement that failed.
        sql: String,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },

    /// A statement failed and the automatic down-SQL replay failed too.
    /// The database state must be treated as unknown.
    #[error("rollback failed after '{original}'; manual intervention required: {rollback}")]
    RollbackFailed {
        /// The error that triggered the rollback.
        original: Box<MigrateError>,
        /// The error the rollback itself hit.
        rollback: Box<MigrateError>,
    },

    /// Duplicate migration ids, a revert on an empty ledger, or a ledger
    /// row with no registered migration. Nothing was mutated.
    #[error("migration ledger inconsistency: {0}")]
    LedgerInconsistency(String),

    /// Other database error (connection, transaction control).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, MigrateError>;
