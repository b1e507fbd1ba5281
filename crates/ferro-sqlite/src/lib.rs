//! # ferro-sqlite
//!
//! SQLite driver for ferro-orm: reads the live database schema through
//! `sqlite_master` and the `table_info` / `index_list` / `index_info` /
//! `foreign_key_list` pragmas into the dialect-neutral table model of
//! ferro-schema.
//!
//! Quirks handled here:
//!
//! - `INTEGER PRIMARY KEY` columns report `notnull = 0` even though they
//!   can never be NULL; introspection treats key columns as NOT NULL.
//! - `AUTOINCREMENT` is not visible in any pragma; it is detected from the
//!   stored CREATE TABLE text.
//! - Inline UNIQUE constraints surface as `sqlite_autoindex_…` indexes
//!   with origin `u`; unique indexes created for constraints carry a
//!   `UQ_` prefix. Both are mapped back to unique constraints so the
//!   differ compares them against declared ones.

mod introspector;

pub use introspector::{IntrospectError, SqliteIntrospector};
