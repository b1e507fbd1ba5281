//! Dialect-specific DDL compilation.
//!
//! Each supported database family implements [`SchemaDialect`]. The trait
//! supplies ANSI-flavored default renderings for everything a dialect does
//! not override, so a dialect only spells out where it actually differs:
//! identifier quoting, type names, auto-increment syntax, and capability
//! gaps (SQLite's limited ALTER TABLE being the big one).
//!
//! `compile` turns one [`Operation`] into one [`CompiledOperation`]: a
//! single logical forward/reverse pair. Either side may hold several
//! physical statements when the dialect must emulate an operation (e.g. a
//! table rebuild), but the pair is always recorded and unwound as a unit,
//! so the reverse side restores the pre-operation state exactly.

mod mssql;
mod mysql;
mod oracle;
mod postgres;
mod sqlite;

pub use mssql::MssqlDialect;
pub use mysql::MysqlDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use crate::error::{Result, SchemaError};
use crate::operation::{
    AddColumnOp, ChangeColumnOp, CreateForeignKeyOp, CreateIndexOp, CreatePrimaryKeyOp,
    CreateTableOp, CreateUniqueOp, DropColumnOp, DropForeignKeyOp, DropIndexOp, DropPrimaryKeyOp,
    DropTableOp, DropUniqueOp, Operation,
};
use crate::table::{Column, ForeignKey, Table};
use crate::types::{DefaultValue, ReferentialAction, SqlType};

/// One operation compiled for a dialect: forward statements and the
/// reverse statements that undo them. Both sides are executed in order;
/// the pair is pushed onto the execution engine's down-stack as a unit.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CompiledOperation {
    /// Forward (up) statements.
    pub up: Vec<String>,
    /// Reverse (down) statements.
    pub down: Vec<String>,
}

impl CompiledOperation {
    /// A pair of one forward and one reverse statement.
    #[must_use]
    pub fn single(up: String, down: String) -> Self {
        Self {
            up: vec![up],
            down: vec![down],
        }
    }
}

/// FNV-1a 64-bit hash, used to shorten generated identifiers
/// deterministically: the same input always yields the same name.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Splits a raw catalog type name into its lowercased base name and
/// parenthesized numeric arguments: `"VARCHAR(255)"` becomes
/// `("varchar", [255])`. Used by per-dialect type normalization.
#[must_use]
pub fn split_type_name(raw: &str) -> (String, Vec<u32>) {
    let raw = raw.trim();
    let Some(open) = raw.find('(') else {
        return (raw.to_lowercase(), Vec::new());
    };
    let base = raw[..open].trim().to_lowercase();
    let args = raw[open + 1..]
        .trim_end_matches(')')
        .split(',')
        .filter_map(|a| a.trim().parse().ok())
        .collect();
    (base, args)
}

/// Dialect-specific DDL compiler.
///
/// Implementations exist per supported database family; they are injected
/// into the differ's consumers rather than resolved by runtime type checks.
pub trait SchemaDialect {
    /// Dialect name.
    fn name(&self) -> &'static str;

    /// Maximum identifier length; generated names beyond it are shortened
    /// with a stable hash suffix.
    fn max_identifier_length(&self) -> usize {
        63
    }

    /// Renders a canonical type in this dialect's spelling.
    fn render_type(&self, ty: &SqlType) -> String;

    /// Normalizes a raw catalog type name into the canonical type, so that
    /// e.g. `int4` and `integer` compare equal on Postgres.
    fn normalize_type(&self, raw: &str) -> SqlType;

    /// Keyword appended to auto-incrementing columns; empty when the
    /// dialect expresses auto-increment through the type itself.
    fn autoincrement_keyword(&self) -> &'static str {
        ""
    }

    /// Whether foreign keys must be declared inline in CREATE TABLE
    /// because the dialect cannot add them afterwards.
    fn inline_foreign_keys(&self) -> bool {
        false
    }

    /// Quotes an identifier.
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{name}\"")
    }

    /// Quotes and comma-joins a column list.
    fn quote_columns(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Truncates an identifier to the dialect limit, appending an FNV-1a
    /// hash suffix so shortened names stay unique and stable across runs.
    fn ensure_identifier(&self, name: &str) -> String {
        let max = self.max_identifier_length();
        if name.len() <= max {
            return name.to_string();
        }
        let hash = fnv1a(name.as_bytes());
        let suffix = format!("{hash:016x}");
        let keep = max.saturating_sub(9);
        format!("{}_{}", &name[..keep], &suffix[..8])
    }

    /// Generated constraint name: `<prefix>_<table>_<columns>`, shortened
    /// to the dialect limit.
    fn constraint_name(&self, prefix: &str, table: &str, columns: &[String]) -> String {
        self.ensure_identifier(&format!("{prefix}_{table}_{}", columns.join("_")))
    }

    /// Renders a default value.
    fn render_default(&self, default: &DefaultValue) -> String {
        default.to_sql()
    }

    /// Renders one column definition.
    fn column_definition(&self, column: &Column, inline_primary: bool) -> String {
        let mut sql = format!(
            "{} {}",
            self.quote_identifier(&column.name),
            self.render_type(&column.sql_type)
        );
        if column.autoincrement {
            let keyword = self.autoincrement_keyword();
            if !keyword.is_empty() {
                sql.push(' ');
                sql.push_str(keyword);
            }
        }
        if inline_primary {
            sql.push_str(" PRIMARY KEY");
        }
        if !column.nullable && !inline_primary {
            sql.push_str(" NOT NULL");
        }
        if let Some(ref default) = column.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&self.render_default(default));
        }
        if let Some(ref collation) = column.collation {
            sql.push_str(&format!(" COLLATE {collation}"));
        }
        sql
    }

    /// Renders the body of a FOREIGN KEY clause (everything after the
    /// optional CONSTRAINT name).
    fn foreign_key_clause(&self, fk: &ForeignKey) -> String {
        let mut sql = format!(
            "FOREIGN KEY ({}) REFERENCES {} ({})",
            self.quote_columns(&fk.columns),
            self.quote_identifier(&fk.referenced_table),
            self.quote_columns(&fk.referenced_columns)
        );
        if fk.on_delete != ReferentialAction::NoAction {
            sql.push_str(" ON DELETE ");
            sql.push_str(fk.on_delete.as_sql());
        }
        if fk.on_update != ReferentialAction::NoAction {
            sql.push_str(" ON UPDATE ");
            sql.push_str(fk.on_update.as_sql());
        }
        sql
    }

    /// Resolves the name of a foreign key constraint, generating one when
    /// the definition carries none.
    fn foreign_key_name(&self, table: &str, fk: &ForeignKey) -> String {
        fk.name
            .clone()
            .unwrap_or_else(|| self.constraint_name("FK", table, &fk.columns))
    }

    /// Renders a complete CREATE TABLE statement: columns, primary key,
    /// unique constraints, and — only for [`Self::inline_foreign_keys`]
    /// dialects — foreign keys.
    fn create_table_sql(&self, table: &Table) -> String {
        let single_pk = table.primary_key.len() == 1;
        let mut parts: Vec<String> = table
            .columns
            .iter()
            .map(|column| {
                let inline = single_pk && table.primary_key[0] == column.name;
                format!("    {}", self.column_definition(column, inline))
            })
            .collect();

        if table.primary_key.len() > 1 {
            let name = self.constraint_name("PK", &table.name, &table.primary_key);
            parts.push(format!(
                "    CONSTRAINT {} PRIMARY KEY ({})",
                self.quote_identifier(&name),
                self.quote_columns(&table.primary_key)
            ));
        }
        for unique in &table.uniques {
            let name = unique
                .name
                .clone()
                .unwrap_or_else(|| self.constraint_name("UQ", &table.name, &unique.columns));
            parts.push(format!(
                "    CONSTRAINT {} UNIQUE ({})",
                self.quote_identifier(&self.ensure_identifier(&name)),
                self.quote_columns(&unique.columns)
            ));
        }
        if self.inline_foreign_keys() {
            for fk in &table.foreign_keys {
                let name = self.foreign_key_name(&table.name, fk);
                parts.push(format!(
                    "    CONSTRAINT {} {}",
                    self.quote_identifier(&name),
                    self.foreign_key_clause(fk)
                ));
            }
        }

        format!(
            "CREATE TABLE {} (\n{}\n)",
            self.quote_identifier(&table.name),
            parts.join(",\n")
        )
    }

    /// Renders a DROP TABLE statement.
    fn drop_table_sql(&self, table: &Table) -> String {
        format!("DROP TABLE {}", self.quote_identifier(&table.name))
    }

    /// Renders a CREATE INDEX statement.
    fn create_index_sql(&self, table: &str, index: &crate::table::Index) -> String {
        let unique = if index.unique { "UNIQUE " } else { "" };
        format!(
            "CREATE {unique}INDEX {} ON {} ({})",
            self.quote_identifier(&self.ensure_identifier(&index.name)),
            self.quote_identifier(table),
            self.quote_columns(&index.columns)
        )
    }

    /// Renders a DROP INDEX statement.
    fn drop_index_sql(&self, _table: &str, index: &crate::table::Index) -> String {
        format!(
            "DROP INDEX {}",
            self.quote_identifier(&self.ensure_identifier(&index.name))
        )
    }

    /// Compiles one operation into its forward/reverse pair.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DdlCompilation`] when this dialect cannot
    /// express the operation.
    fn compile(&self, operation: &Operation) -> Result<CompiledOperation> {
        match operation {
            Operation::CreateTable(op) => self.create_table(op),
            Operation::DropTable(op) => self.drop_table(op),
            Operation::AddColumn(op) => self.add_column(op),
            Operation::DropColumn(op) => self.drop_column(op),
            Operation::ChangeColumn(op) => self.change_column(op),
            Operation::CreatePrimaryKey(op) => self.create_primary_key(op),
            Operation::DropPrimaryKey(op) => self.drop_primary_key(op),
            Operation::CreateForeignKey(op) => self.create_foreign_key(op),
            Operation::DropForeignKey(op) => self.drop_foreign_key(op),
            Operation::CreateIndex(op) => self.create_index(op),
            Operation::DropIndex(op) => self.drop_index(op),
            Operation::CreateUnique(op) => self.create_unique(op),
            Operation::DropUnique(op) => self.drop_unique(op),
        }
    }

    /// Compiles CREATE TABLE (reverse: DROP TABLE).
    fn create_table(&self, op: &CreateTableOp) -> Result<CompiledOperation> {
        Ok(CompiledOperation::single(
            self.create_table_sql(&op.table),
            self.drop_table_sql(&op.table),
        ))
    }

    /// Compiles DROP TABLE (reverse: recreate the table and its indexes).
    fn drop_table(&self, op: &DropTableOp) -> Result<CompiledOperation> {
        let mut down = vec![self.create_table_sql(&op.table)];
        for index in &op.table.indexes {
            down.push(self.create_index_sql(&op.table.name, index));
        }
        Ok(CompiledOperation {
            up: vec![self.drop_table_sql(&op.table)],
            down,
        })
    }

    /// Compiles ADD COLUMN (reverse: DROP COLUMN).
    fn add_column(&self, op: &AddColumnOp) -> Result<CompiledOperation> {
        let table = self.quote_identifier(&op.table.name);
        Ok(CompiledOperation::single(
            format!(
                "ALTER TABLE {table} ADD COLUMN {}",
                self.column_definition(&op.column, false)
            ),
            format!(
                "ALTER TABLE {table} DROP COLUMN {}",
                self.quote_identifier(&op.column.name)
            ),
        ))
    }

    /// Compiles DROP COLUMN (reverse: ADD COLUMN with the old definition;
    /// the column's data is unavoidably lost).
    fn drop_column(&self, op: &DropColumnOp) -> Result<CompiledOperation> {
        let table = self.quote_identifier(&op.table.name);
        Ok(CompiledOperation::single(
            format!(
                "ALTER TABLE {table} DROP COLUMN {}",
                self.quote_identifier(&op.column.name)
            ),
            format!(
                "ALTER TABLE {table} ADD COLUMN {}",
                self.column_definition(&op.column, false)
            ),
        ))
    }

    /// Compiles a column change as ANSI ALTER COLUMN statements, one per
    /// changed property; the reverse statements restore every old value.
    fn change_column(&self, op: &ChangeColumnOp) -> Result<CompiledOperation> {
        let table = self.quote_identifier(&op.table.name);
        let column = self.quote_identifier(&op.new.name);
        let mut up = Vec::new();
        let mut down = Vec::new();

        if op.old.sql_type != op.new.sql_type {
            up.push(format!(
                "ALTER TABLE {table} ALTER COLUMN {column} SET DATA TYPE {}",
                self.render_type(&op.new.sql_type)
            ));
            down.push(format!(
                "ALTER TABLE {table} ALTER COLUMN {column} SET DATA TYPE {}",
                self.render_type(&op.old.sql_type)
            ));
        }
        if op.old.nullable != op.new.nullable {
            let (set, unset) = if op.new.nullable {
                ("DROP NOT NULL", "SET NOT NULL")
            } else {
                ("SET NOT NULL", "DROP NOT NULL")
            };
            up.push(format!("ALTER TABLE {table} ALTER COLUMN {column} {set}"));
            down.push(format!("ALTER TABLE {table} ALTER COLUMN {column} {unset}"));
        }
        if op.old.default != op.new.default {
            up.push(self.set_default_sql(&table, &column, op.new.default.as_ref()));
            down.push(self.set_default_sql(&table, &column, op.old.default.as_ref()));
        }

        Ok(CompiledOperation { up, down })
    }

    /// Renders SET DEFAULT / DROP DEFAULT for a pre-quoted table and
    /// column pair.
    fn set_default_sql(&self, table: &str, column: &str, default: Option<&DefaultValue>) -> String {
        match default {
            Some(value) => format!(
                "ALTER TABLE {table} ALTER COLUMN {column} SET DEFAULT {}",
                self.render_default(value)
            ),
            None => format!("ALTER TABLE {table} ALTER COLUMN {column} DROP DEFAULT"),
        }
    }

    /// Compiles ADD PRIMARY KEY (reverse: drop it again).
    fn create_primary_key(&self, op: &CreatePrimaryKeyOp) -> Result<CompiledOperation> {
        let name = self.constraint_name("PK", &op.table.name, &op.columns);
        let table = self.quote_identifier(&op.table.name);
        Ok(CompiledOperation::single(
            format!(
                "ALTER TABLE {table} ADD CONSTRAINT {} PRIMARY KEY ({})",
                self.quote_identifier(&name),
                self.quote_columns(&op.columns)
            ),
            format!(
                "ALTER TABLE {table} DROP CONSTRAINT {}",
                self.quote_identifier(&name)
            ),
        ))
    }

    /// Compiles DROP PRIMARY KEY (reverse: recreate it).
    fn drop_primary_key(&self, op: &DropPrimaryKeyOp) -> Result<CompiledOperation> {
        let name = self.constraint_name("PK", &op.table.name, &op.columns);
        let table = self.quote_identifier(&op.table.name);
        Ok(CompiledOperation::single(
            format!(
                "ALTER TABLE {table} DROP CONSTRAINT {}",
                self.quote_identifier(&name)
            ),
            format!(
                "ALTER TABLE {table} ADD CONSTRAINT {} PRIMARY KEY ({})",
                self.quote_identifier(&name),
                self.quote_columns(&op.columns)
            ),
        ))
    }

    /// Compiles ADD FOREIGN KEY (reverse: drop the constraint).
    fn create_foreign_key(&self, op: &CreateForeignKeyOp) -> Result<CompiledOperation> {
        let name = self.foreign_key_name(&op.table, &op.foreign_key);
        let table = self.quote_identifier(&op.table);
        Ok(CompiledOperation::single(
            format!(
                "ALTER TABLE {table} ADD CONSTRAINT {} {}",
                self.quote_identifier(&name),
                self.foreign_key_clause(&op.foreign_key)
            ),
            self.drop_foreign_key_sql(&op.table, &name),
        ))
    }

    /// Compiles DROP FOREIGN KEY (reverse: recreate the constraint).
    fn drop_foreign_key(&self, op: &DropForeignKeyOp) -> Result<CompiledOperation> {
        let name = self.foreign_key_name(&op.table, &op.foreign_key);
        let table = self.quote_identifier(&op.table);
        Ok(CompiledOperation::single(
            self.drop_foreign_key_sql(&op.table, &name),
            format!(
                "ALTER TABLE {table} ADD CONSTRAINT {} {}",
                self.quote_identifier(&name),
                self.foreign_key_clause(&op.foreign_key)
            ),
        ))
    }

    /// Renders the statement dropping a named foreign key.
    fn drop_foreign_key_sql(&self, table: &str, name: &str) -> String {
        format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.quote_identifier(table),
            self.quote_identifier(name)
        )
    }

    /// Compiles CREATE INDEX (reverse: DROP INDEX).
    fn create_index(&self, op: &CreateIndexOp) -> Result<CompiledOperation> {
        Ok(CompiledOperation::single(
            self.create_index_sql(&op.table, &op.index),
            self.drop_index_sql(&op.table, &op.index),
        ))
    }

    /// Compiles DROP INDEX (reverse: CREATE INDEX).
    fn drop_index(&self, op: &DropIndexOp) -> Result<CompiledOperation> {
        Ok(CompiledOperation::single(
            self.drop_index_sql(&op.table, &op.index),
            self.create_index_sql(&op.table, &op.index),
        ))
    }

    /// Compiles ADD UNIQUE (reverse: drop the constraint).
    fn create_unique(&self, op: &CreateUniqueOp) -> Result<CompiledOperation> {
        let name = op
            .unique
            .name
            .clone()
            .unwrap_or_else(|| self.constraint_name("UQ", &op.table, &op.unique.columns));
        let table = self.quote_identifier(&op.table);
        Ok(CompiledOperation::single(
            format!(
                "ALTER TABLE {table} ADD CONSTRAINT {} UNIQUE ({})",
                self.quote_identifier(&name),
                self.quote_columns(&op.unique.columns)
            ),
            format!(
                "ALTER TABLE {table} DROP CONSTRAINT {}",
                self.quote_identifier(&name)
            ),
        ))
    }

    /// Compiles DROP UNIQUE (reverse: recreate the constraint).
    fn drop_unique(&self, op: &DropUniqueOp) -> Result<CompiledOperation> {
        let name = op
            .unique
            .name
            .clone()
            .unwrap_or_else(|| self.constraint_name("UQ", &op.table, &op.unique.columns));
        let table = self.quote_identifier(&op.table);
        Ok(CompiledOperation::single(
            format!(
                "ALTER TABLE {table} DROP CONSTRAINT {}",
                self.quote_identifier(&name)
            ),
            format!(
                "ALTER TABLE {table} ADD CONSTRAINT {} UNIQUE ({})",
                self.quote_identifier(&name),
                self.quote_columns(&op.unique.columns)
            ),
        ))
    }

    /// Convenience: the unsupported-operation error for this dialect.
    fn unsupported(&self, operation: &Operation, reason: &str) -> SchemaError {
        SchemaError::DdlCompilation {
            dialect: self.name(),
            operation: operation.describe(),
            reason: reason.to_string(),
        }
    }
}
