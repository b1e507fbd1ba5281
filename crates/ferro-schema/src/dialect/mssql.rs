//! SQL Server dialect.

use crate::error::Result;
use crate::operation::ChangeColumnOp;
use crate::table::{Column, Index};
use crate::types::{DefaultValue, SqlType};

use super::{split_type_name, CompiledOperation, SchemaDialect};

/// SQL Server DDL compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlDialect;

impl MssqlDialect {
    /// Creates a new SQL Server dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn alter_column_sql(&self, table: &str, column: &Column) -> String {
        let nullability = if column.nullable { "NULL" } else { "NOT NULL" };
        format!(
            "ALTER TABLE {} ALTER COLUMN {} {} {nullability}",
            self.quote_identifier(table),
            self.quote_identifier(&column.name),
            self.render_type(&column.sql_type)
        )
    }
}

impl SchemaDialect for MssqlDialect {
    fn name(&self) -> &'static str {
        "mssql"
    }

    fn max_identifier_length(&self) -> usize {
        128
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("[{name}]")
    }

    fn autoincrement_keyword(&self) -> &'static str {
        "IDENTITY(1,1)"
    }

    fn render_type(&self, ty: &SqlType) -> String {
        match ty {
            SqlType::SmallInt => "SMALLINT".to_string(),
            SqlType::Integer => "INT".to_string(),
            SqlType::BigInt => "BIGINT".to_string(),
            SqlType::Real => "REAL".to_string(),
            SqlType::Double => "FLOAT".to_string(),
            SqlType::Decimal { precision, scale } => match (precision, scale) {
                (Some(p), Some(s)) => format!("DECIMAL({p}, {s})"),
                (Some(p), None) => format!("DECIMAL({p})"),
                _ => "DECIMAL".to_string(),
            },
            SqlType::Char(len) => format!("NCHAR({})", len.unwrap_or(1)),
            SqlType::Varchar(len) => format!("NVARCHAR({})", len.unwrap_or(255)),
            SqlType::Text | SqlType::Json | SqlType::Enum(_) => "NVARCHAR(MAX)".to_string(),
            SqlType::Boolean => "BIT".to_string(),
            SqlType::Date => "DATE".to_string(),
            SqlType::Time => "TIME".to_string(),
            SqlType::Timestamp => "DATETIME2".to_string(),
            SqlType::Blob => "VARBINARY(MAX)".to_string(),
            SqlType::Uuid => "UNIQUEIDENTIFIER".to_string(),
        }
    }

    fn normalize_type(&self, raw: &str) -> SqlType {
        let (base, args) = split_type_name(raw);
        match base.as_str() {
            "tinyint" | "smallint" => SqlType::SmallInt,
            "int" => SqlType::Integer,
            "bigint" => SqlType::BigInt,
            "real" => SqlType::Real,
            "float" => SqlType::Double,
            "decimal" | "numeric" => SqlType::Decimal {
                precision: args.first().map(|p| *p as u8),
                scale: args.get(1).map(|s| *s as u8),
            },
            "nchar" | "char" => SqlType::Char(args.first().copied()),
            // NVARCHAR(MAX) reports no parseable length and means text.
            "nvarchar" | "varchar" => match args.first() {
                Some(len) => SqlType::Varchar(Some(*len)),
                None => SqlType::Text,
            },
            "text" | "ntext" => SqlType::Text,
            "bit" => SqlType::Boolean,
            "date" => SqlType::Date,
            "time" => SqlType::Time,
            "datetime" | "datetime2" | "smalldatetime" => SqlType::Timestamp,
            "binary" | "varbinary" | "image" => SqlType::Blob,
            "uniqueidentifier" => SqlType::Uuid,
            _ => SqlType::Text,
        }
    }

    fn render_default(&self, default: &DefaultValue) -> String {
        // BIT columns reject TRUE/FALSE literals.
        match default {
            DefaultValue::Boolean(b) => String::from(if *b { "1" } else { "0" }),
            other => other.to_sql(),
        }
    }

    /// Type and nullability change in one ALTER COLUMN; default changes go
    /// through named default constraints.
    fn change_column(&self, op: &ChangeColumnOp) -> Result<CompiledOperation> {
        let mut up = Vec::new();
        let mut down = Vec::new();

        if op.old.sql_type != op.new.sql_type || op.old.nullable != op.new.nullable {
            up.push(self.alter_column_sql(&op.table.name, &op.new));
            down.push(self.alter_column_sql(&op.table.name, &op.old));
        }
        if op.old.default != op.new.default {
            let constraint = self.constraint_name(
                "DF",
                &op.table.name,
                std::slice::from_ref(&op.new.name),
            );
            let table = self.quote_identifier(&op.table.name);
            let drop = format!(
                "ALTER TABLE {table} DROP CONSTRAINT {}",
                self.quote_identifier(&constraint)
            );
            let add = |value: &DefaultValue| {
                format!(
                    "ALTER TABLE {table} ADD CONSTRAINT {} DEFAULT {} FOR {}",
                    self.quote_identifier(&constraint),
                    self.render_default(value),
                    self.quote_identifier(&op.new.name)
                )
            };
            match (&op.old.default, &op.new.default) {
                (None, Some(new)) => {
                    up.push(add(new));
                    down.push(drop);
                }
                (Some(_), None) => {
                    up.push(drop);
                    down.push(add(op.old.default.as_ref().unwrap_or(&DefaultValue::Null)));
                }
                (Some(old), Some(new)) => {
                    up.push(drop.clone());
                    up.push(add(new));
                    down.push(drop);
                    down.push(add(old));
                }
                (None, None) => {}
            }
        }

        Ok(CompiledOperation { up, down })
    }

    fn drop_index_sql(&self, table: &str, index: &Index) -> String {
        format!(
            "DROP INDEX {} ON {}",
            self.quote_identifier(&self.ensure_identifier(&index.name)),
            self.quote_identifier(table)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::Operation;
    use crate::table::Table;

    fn dialect() -> MssqlDialect {
        MssqlDialect::new()
    }

    #[test]
    fn bracket_quoting_and_identity() {
        let table = Table::new("post")
            .column(Column::new("id", SqlType::Integer).autoincrement())
            .column(Column::new("title", SqlType::Varchar(Some(255))).not_null())
            .primary_key(vec!["id".into()]);
        let sql = dialect().create_table_sql(&table);
        assert!(sql.contains("CREATE TABLE [post]"));
        assert!(sql.contains("[id] INT IDENTITY(1,1) PRIMARY KEY"));
        assert!(sql.contains("[title] NVARCHAR(255) NOT NULL"));
    }

    #[test]
    fn alter_column_carries_type_and_nullability() {
        let op = Operation::ChangeColumn(ChangeColumnOp {
            table: Table::new("post"),
            old: Column::new("title", SqlType::Varchar(Some(255))),
            new: Column::new("title", SqlType::Varchar(Some(500))).not_null(),
        });
        let compiled = dialect().compile(&op).unwrap();
        assert_eq!(
            compiled.up,
            vec!["ALTER TABLE [post] ALTER COLUMN [title] NVARCHAR(500) NOT NULL"]
        );
        assert_eq!(
            compiled.down,
            vec!["ALTER TABLE [post] ALTER COLUMN [title] NVARCHAR(255) NULL"]
        );
    }

    #[test]
    fn default_changes_use_named_constraints() {
        let op = Operation::ChangeColumn(ChangeColumnOp {
            table: Table::new("post"),
            old: Column::new("active", SqlType::Boolean),
            new: Column::new("active", SqlType::Boolean).default(DefaultValue::Boolean(true)),
        });
        let compiled = dialect().compile(&op).unwrap();
        assert_eq!(
            compiled.up,
            vec!["ALTER TABLE [post] ADD CONSTRAINT [DF_post_active] DEFAULT 1 FOR [active]"]
        );
        assert_eq!(
            compiled.down,
            vec!["ALTER TABLE [post] DROP CONSTRAINT [DF_post_active]"]
        );
    }

    #[test]
    fn normalizes_catalog_names() {
        assert_eq!(dialect().normalize_type("bit"), SqlType::Boolean);
        assert_eq!(
            dialect().normalize_type("nvarchar(255)"),
            SqlType::Varchar(Some(255))
        );
        assert_eq!(dialect().normalize_type("nvarchar(max)"), SqlType::Text);
        assert_eq!(dialect().normalize_type("datetime2"), SqlType::Timestamp);
        assert_eq!(
            dialect().normalize_type("uniqueidentifier"),
            SqlType::Uuid
        );
    }
}
