//! Schema introspection trait.
//!
//! Driver crates (ferro-sqlite, etc.) implement [`Introspector`] to read
//! the live database schema into the dialect-neutral [`Table`] model. The
//! core crate defines only the trait so it stays driver-agnostic.

use crate::table::{SchemaFilter, Table};

/// Reads the current database schema into [`Table`] values.
///
/// Implementations must tolerate partially-privileged connections —
/// objects that cannot be read are skipped, never failing the whole call —
/// and must normalize driver type names into canonical [`SqlType`]s via
/// the matching dialect (so `int4` and `integer` compare equal).
/// Results are built fresh on every call and must not be cached: the live
/// schema may change out of band.
///
/// [`SqlType`]: crate::types::SqlType
pub trait Introspector {
    /// Error type for catalog read failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reads every table admitted by the filter.
    async fn introspect(&self, filter: &SchemaFilter) -> Result<Vec<Table>, Self::Error>;

    /// Reads a single table; a table that does not exist yields `Ok(None)`,
    /// never an error.
    async fn table(&self, name: &str) -> Result<Option<Table>, Self::Error>;
}
