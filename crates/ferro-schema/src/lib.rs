//! # ferro-schema
//!
//! Core of the ferro-orm schema engine: the validated entity metadata
//! model, the dialect-neutral table representation, the schema diff
//! algorithm, and the dialect-aware DDL compiler.
//!
//! The pieces compose into one flow:
//!
//! 1. [`metadata::MetadataBuilder`] resolves raw declarative records into
//!    linked [`metadata::EntityMetadata`], validating the model before
//!    anything touches a database.
//! 2. An [`introspect::Introspector`] (implemented per driver, e.g. in
//!    ferro-sqlite) reads the live schema into [`table::Table`] values.
//! 3. [`diff::diff_schema`] compares desired against actual tables and
//!    produces an ordered [`operation::Operation`] list.
//! 4. A [`dialect::SchemaDialect`] compiles each operation into forward
//!    and reverse SQL for the active database family.
//!
//! Execution — applying statements, recording down-SQL, migration
//! ledgers — lives in the ferro-migrate crate.

pub mod dialect;
pub mod diff;
pub mod error;
pub mod introspect;
pub mod metadata;
pub mod operation;
pub mod table;
pub mod types;

pub use dialect::{
    CompiledOperation, MssqlDialect, MysqlDialect, OracleDialect, PostgresDialect, SchemaDialect,
    SqliteDialect,
};
pub use diff::{diff_schema, DiffOptions};
pub use error::SchemaError;
pub use introspect::Introspector;
pub use metadata::{EntityMetadata, MetadataBuilder, RawRecord};
pub use operation::Operation;
pub use table::{Column, ForeignKey, Index, SchemaFilter, Table, Unique};
pub use types::{DefaultValue, ReferentialAction, SqlType};
