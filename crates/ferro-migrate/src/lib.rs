//! Schema synchronization and versioned migrations for ferro-orm.
//!
//! Two parallel consumers share this crate's execution machinery:
//!
//! - the **synchronizer** ([`sync::Synchronizer`]) diffs entity metadata
//!   against the live schema and applies the resulting DDL reversibly,
//!   recording down-SQL for every statement on the
//!   [`runner::SchemaExecutor`]'s in-memory stack;
//! - the **migration executor** ([`executor::MigrationExecutor`]) replays
//!   user-authored [`migration::Migration`] units against the persisted
//!   [`ledger::MigrationLedger`] table, with `all`/`each`/`none`
//!   transaction modes and single-unit revert.
//!
//! Both are sequential per connection: statements apply in a fixed total
//! order over one exclusive session, with no internal parallelism and no
//! retry — a failed statement triggers the down-SQL replay (synchronizer)
//! or the transaction rollback (migration executor), never a second
//! attempt. External mutual exclusion between concurrently starting
//! application instances is the caller's responsibility.

pub mod error;
pub mod executor;
pub mod ledger;
pub mod migration;
pub mod runner;
pub mod sync;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{MigrateError, Result};
    pub use crate::executor::{MigrationExecutor, TransactionMode};
    pub use crate::ledger::{LedgerEntry, MigrationLedger};
    pub use crate::migration::{Migration, SqlMigration};
    pub use crate::runner::{ExecutorPhase, SchemaExecutor};
    pub use crate::sync::{SyncOptions, SyncStep, Synchronizer};
    pub use ferro_schema::dialect::{
        MssqlDialect, MysqlDialect, OracleDialect, PostgresDialect, SchemaDialect, SqliteDialect,
    };
    pub use ferro_schema::metadata::{MetadataBuilder, RawRecord};
    pub use ferro_sqlite::SqliteIntrospector;
}
