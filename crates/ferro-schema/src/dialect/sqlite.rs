//! SQLite dialect.
//!
//! SQLite only supports `RENAME`, `ADD COLUMN`, and (since 3.35) `DROP
//! COLUMN` in ALTER TABLE. Everything else — column changes, primary key
//! changes — is emulated by rebuilding the table: create a temporary table
//! with the new definition, copy the shared columns, drop the old table,
//! rename. The reverse side is the mirror rebuild, so the whole emulation
//! still behaves as one logical, exactly reversible operation. Foreign
//! keys cannot be added or dropped after creation at all; they are declared
//! inline in CREATE TABLE, and foreign-key changes on existing tables are
//! reported as unsupported.

use crate::error::Result;
use crate::operation::{
    ChangeColumnOp, CreateForeignKeyOp, CreatePrimaryKeyOp, CreateUniqueOp, DropForeignKeyOp,
    DropPrimaryKeyOp, DropUniqueOp, Operation,
};
use crate::table::{Column, Table};
use crate::types::SqlType;

use super::{split_type_name, CompiledOperation, SchemaDialect};

/// SQLite DDL compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Emits the create-copy-drop-rename sequence transforming `before`
    /// into `after`, recreating `after`'s indexes afterwards (they do not
    /// survive the drop).
    fn rebuild(&self, before: &Table, after: &Table) -> Vec<String> {
        let mut tmp = after.clone();
        tmp.name = format!("tmp_{}", after.name);

        let shared: Vec<String> = after
            .columns
            .iter()
            .filter(|c| before.get_column(&c.name).is_some())
            .map(|c| c.name.clone())
            .collect();
        let columns = self.quote_columns(&shared);

        let mut statements = vec![
            self.create_table_sql(&tmp),
            format!(
                "INSERT INTO {} ({columns}) SELECT {columns} FROM {}",
                self.quote_identifier(&tmp.name),
                self.quote_identifier(&before.name)
            ),
            format!("DROP TABLE {}", self.quote_identifier(&before.name)),
            format!(
                "ALTER TABLE {} RENAME TO {}",
                self.quote_identifier(&tmp.name),
                self.quote_identifier(&after.name)
            ),
        ];
        for index in &after.indexes {
            statements.push(self.create_index_sql(&after.name, index));
        }
        statements
    }
}

impl SchemaDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn max_identifier_length(&self) -> usize {
        128
    }

    fn autoincrement_keyword(&self) -> &'static str {
        "AUTOINCREMENT"
    }

    fn inline_foreign_keys(&self) -> bool {
        true
    }

    fn render_type(&self, ty: &SqlType) -> String {
        // SQLite keeps the declared type name in its catalog, so distinct
        // canonical types stay distinguishable through a round trip even
        // though only the affinity matters at runtime.
        match ty {
            SqlType::SmallInt => "SMALLINT".to_string(),
            SqlType::Integer => "INTEGER".to_string(),
            SqlType::BigInt => "BIGINT".to_string(),
            SqlType::Real => "REAL".to_string(),
            SqlType::Double => "DOUBLE".to_string(),
            SqlType::Decimal { precision, scale } => match (precision, scale) {
                (Some(p), Some(s)) => format!("NUMERIC({p}, {s})"),
                (Some(p), None) => format!("NUMERIC({p})"),
                _ => "NUMERIC".to_string(),
            },
            SqlType::Char(len) => match len {
                Some(n) => format!("CHAR({n})"),
                None => "CHAR".to_string(),
            },
            SqlType::Varchar(len) => match len {
                Some(n) => format!("VARCHAR({n})"),
                None => "VARCHAR".to_string(),
            },
            SqlType::Text => "TEXT".to_string(),
            SqlType::Boolean => "BOOLEAN".to_string(),
            SqlType::Date => "DATE".to_string(),
            SqlType::Time => "TIME".to_string(),
            SqlType::Timestamp => "DATETIME".to_string(),
            SqlType::Blob => "BLOB".to_string(),
            SqlType::Json => "JSON".to_string(),
            SqlType::Uuid => "UUID".to_string(),
            SqlType::Enum(_) => "VARCHAR(255)".to_string(),
        }
    }

    fn normalize_type(&self, raw: &str) -> SqlType {
        let (base, args) = split_type_name(raw);
        match base.as_str() {
            "smallint" => SqlType::SmallInt,
            "integer" | "int" => SqlType::Integer,
            "bigint" => SqlType::BigInt,
            "real" | "float" => SqlType::Real,
            "double" | "double precision" => SqlType::Double,
            "numeric" | "decimal" => SqlType::Decimal {
                precision: args.first().map(|p| *p as u8),
                scale: args.get(1).map(|s| *s as u8),
            },
            "char" | "character" => SqlType::Char(args.first().copied()),
            "varchar" => SqlType::Varchar(args.first().copied()),
            "text" | "clob" => SqlType::Text,
            "boolean" | "bool" => SqlType::Boolean,
            "date" => SqlType::Date,
            "time" => SqlType::Time,
            "datetime" | "timestamp" => SqlType::Timestamp,
            "blob" => SqlType::Blob,
            "json" => SqlType::Json,
            "uuid" => SqlType::Uuid,
            _ => SqlType::Text,
        }
    }

    fn column_definition(&self, column: &Column, inline_primary: bool) -> String {
        // The rowid alias requires the exact spelling
        // INTEGER PRIMARY KEY AUTOINCREMENT.
        if column.autoincrement {
            return format!(
                "{} INTEGER PRIMARY KEY AUTOINCREMENT",
                self.quote_identifier(&column.name)
            );
        }

        let mut sql = format!(
            "{} {}",
            self.quote_identifier(&column.name),
            self.render_type(&column.sql_type)
        );
        if inline_primary {
            sql.push_str(" PRIMARY KEY");
        } else if !column.nullable {
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

    fn change_column(&self, op: &ChangeColumnOp) -> Result<CompiledOperation> {
        let mut before = op.table.clone();
        if let Some(column) = before.get_column_mut(&op.new.name) {
            *column = op.old.clone();
        }
        Ok(CompiledOperation {
            up: self.rebuild(&before, &op.table),
            down: self.rebuild(&op.table, &before),
        })
    }

    fn create_primary_key(&self, op: &CreatePrimaryKeyOp) -> Result<CompiledOperation> {
        let mut before = op.table.clone();
        before.primary_key = Vec::new();
        Ok(CompiledOperation {
            up: self.rebuild(&before, &op.table),
            down: self.rebuild(&op.table, &before),
        })
    }

    fn drop_primary_key(&self, op: &DropPrimaryKeyOp) -> Result<CompiledOperation> {
        let mut after = op.table.clone();
        after.primary_key = Vec::new();
        Ok(CompiledOperation {
            up: self.rebuild(&op.table, &after),
            down: self.rebuild(&after, &op.table),
        })
    }

    fn create_foreign_key(&self, op: &CreateForeignKeyOp) -> Result<CompiledOperation> {
        Err(self.unsupported(
            &Operation::CreateForeignKey(op.clone()),
            "foreign keys can only be declared when the table is created",
        ))
    }

    fn drop_foreign_key(&self, op: &DropForeignKeyOp) -> Result<CompiledOperation> {
        Err(self.unsupported(
            &Operation::DropForeignKey(op.clone()),
            "foreign keys cannot be dropped from an existing table",
        ))
    }

    /// Unique constraints lower to unique indexes; SQLite has no
    /// ADD CONSTRAINT.
    fn create_unique(&self, op: &CreateUniqueOp) -> Result<CompiledOperation> {
        let name = self.unique_index_name(op.unique.name.as_deref(), &op.table, &op.unique.columns);
        Ok(CompiledOperation::single(
            format!(
                "CREATE UNIQUE INDEX {} ON {} ({})",
                self.quote_identifier(&name),
                self.quote_identifier(&op.table),
                self.quote_columns(&op.unique.columns)
            ),
            format!("DROP INDEX {}", self.quote_identifier(&name)),
        ))
    }

    fn drop_unique(&self, op: &DropUniqueOp) -> Result<CompiledOperation> {
        let name = self.unique_index_name(op.unique.name.as_deref(), &op.table, &op.unique.columns);
        Ok(CompiledOperation::single(
            format!("DROP INDEX {}", self.quote_identifier(&name)),
            format!(
                "CREATE UNIQUE INDEX {} ON {} ({})",
                self.quote_identifier(&name),
                self.quote_identifier(&op.table),
                self.quote_columns(&op.unique.columns)
            ),
        ))
    }
}

impl SqliteDialect {
    fn unique_index_name(&self, declared: Option<&str>, table: &str, columns: &[String]) -> String {
        declared.map_or_else(
            || self.constraint_name("UQ", table, columns),
            ToString::to_string,
        )
    }
}
