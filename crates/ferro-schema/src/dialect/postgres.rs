//! PostgreSQL dialect.

use crate::table::Column;
use crate::types::SqlType;

use super::{split_type_name, SchemaDialect};

/// PostgreSQL DDL compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SchemaDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn max_identifier_length(&self) -> usize {
        63
    }

    fn render_type(&self, ty: &SqlType) -> String {
        match ty {
            SqlType::SmallInt => "SMALLINT".to_string(),
            SqlType::Integer => "INTEGER".to_string(),
            SqlType::BigInt => "BIGINT".to_string(),
            SqlType::Real => "REAL".to_string(),
            SqlType::Double => "DOUBLE PRECISION".to_string(),
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
            // Enum value sets fall back to VARCHAR; native enum types need
            // a CREATE TYPE, which the sync path does not manage.
            SqlType::Text => "TEXT".to_string(),
            SqlType::Boolean => "BOOLEAN".to_string(),
            SqlType::Date => "DATE".to_string(),
            SqlType::Time => "TIME".to_string(),
            SqlType::Timestamp => "TIMESTAMP".to_string(),
            SqlType::Blob => "BYTEA".to_string(),
            SqlType::Json => "JSONB".to_string(),
            SqlType::Uuid => "UUID".to_string(),
            SqlType::Enum(_) => "VARCHAR(255)".to_string(),
        }
    }

    fn normalize_type(&self, raw: &str) -> SqlType {
        let (base, args) = split_type_name(raw);
        match base.as_str() {
            "int2" | "smallint" | "smallserial" | "serial2" => SqlType::SmallInt,
            "int4" | "int" | "integer" | "serial" | "serial4" => SqlType::Integer,
            "int8" | "bigint" | "bigserial" | "serial8" => SqlType::BigInt,
            "float4" | "real" => SqlType::Real,
            "float8" | "double precision" => SqlType::Double,
            "numeric" | "decimal" => SqlType::Decimal {
                precision: args.first().map(|p| *p as u8),
                scale: args.get(1).map(|s| *s as u8),
            },
            "char" | "bpchar" | "character" => SqlType::Char(args.first().copied()),
            "varchar" | "character varying" => SqlType::Varchar(args.first().copied()),
            "text" => SqlType::Text,
            "bool" | "boolean" => SqlType::Boolean,
            "date" => SqlType::Date,
            "time" | "time without time zone" => SqlType::Time,
            "timestamp" | "timestamptz" | "timestamp without time zone"
            | "timestamp with time zone" => SqlType::Timestamp,
            "bytea" => SqlType::Blob,
            "json" | "jsonb" => SqlType::Json,
            "uuid" => SqlType::Uuid,
            _ => SqlType::Text,
        }
    }

    fn column_definition(&self, column: &Column, inline_primary: bool) -> String {
        // Auto-increment uses SERIAL pseudo-types instead of a keyword.
        let rendered_type = if column.autoincrement {
            match column.sql_type {
                SqlType::SmallInt => "SMALLSERIAL".to_string(),
                SqlType::BigInt => "BIGSERIAL".to_string(),
                _ => "SERIAL".to_string(),
            }
        } else {
            self.render_type(&column.sql_type)
        };

        let mut sql = format!("{} {rendered_type}", self.quote_identifier(&column.name));
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
            sql.push_str(&format!(" COLLATE \"{collation}\""));
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{ChangeColumnOp, Operation};
    use crate::table::Table;
    use crate::types::DefaultValue;

    fn dialect() -> PostgresDialect {
        PostgresDialect::new()
    }

    #[test]
    fn catalog_aliases_normalize_to_canonical_types() {
        // int4 and integer must compare equal.
        assert_eq!(dialect().normalize_type("int4"), SqlType::Integer);
        assert_eq!(dialect().normalize_type("integer"), SqlType::Integer);
        assert_eq!(dialect().normalize_type("int8"), SqlType::BigInt);
        assert_eq!(
            dialect().normalize_type("character varying(255)"),
            SqlType::Varchar(Some(255))
        );
        assert_eq!(
            dialect().normalize_type("varchar(255)"),
            SqlType::Varchar(Some(255))
        );
        assert_eq!(dialect().normalize_type("bool"), SqlType::Boolean);
        assert_eq!(
            dialect().normalize_type("timestamp without time zone"),
            SqlType::Timestamp
        );
        assert_eq!(
            dialect().normalize_type("numeric(10,2)"),
            SqlType::Decimal {
                precision: Some(10),
                scale: Some(2)
            }
        );
    }

    #[test]
    fn create_table_uses_serial_for_autoincrement() {
        let table = Table::new("post")
            .column(Column::new("id", SqlType::Integer).autoincrement())
            .column(Column::new("title", SqlType::Varchar(Some(255))).not_null())
            .primary_key(vec!["id".into()]);
        let sql = dialect().create_table_sql(&table);
        assert!(sql.contains("CREATE TABLE \"post\""));
        assert!(sql.contains("\"id\" SERIAL PRIMARY KEY"));
        assert!(sql.contains("\"title\" VARCHAR(255) NOT NULL"));
    }

    #[test]
    fn change_column_round_trips() {
        // Scenario B shape: widening varchar(255) to varchar(500); the
        // reverse statement restores 255.
        let table = Table::new("post")
            .column(Column::new("title", SqlType::Varchar(Some(500))));
        let op = Operation::ChangeColumn(ChangeColumnOp {
            table,
            old: Column::new("title", SqlType::Varchar(Some(255))),
            new: Column::new("title", SqlType::Varchar(Some(500))),
        });
        let compiled = dialect().compile(&op).unwrap();
        assert_eq!(
            compiled.up,
            vec![
                "ALTER TABLE \"post\" ALTER COLUMN \"title\" SET DATA TYPE VARCHAR(500)"
            ]
        );
        assert_eq!(
            compiled.down,
            vec![
                "ALTER TABLE \"post\" ALTER COLUMN \"title\" SET DATA TYPE VARCHAR(255)"
            ]
        );
    }

    #[test]
    fn change_column_default_and_nullability() {
        let table = Table::new("post")
            .column(Column::new("state", SqlType::Varchar(Some(16))));
        let op = Operation::ChangeColumn(ChangeColumnOp {
            table,
            old: Column::new("state", SqlType::Varchar(Some(16))),
            new: Column::new("state", SqlType::Varchar(Some(16)))
                .not_null()
                .default(DefaultValue::String("draft".into())),
        });
        let compiled = dialect().compile(&op).unwrap();
        assert_eq!(
            compiled.up,
            vec![
                "ALTER TABLE \"post\" ALTER COLUMN \"state\" SET NOT NULL",
                "ALTER TABLE \"post\" ALTER COLUMN \"state\" SET DEFAULT 'draft'",
            ]
        );
        assert_eq!(
            compiled.down,
            vec![
                "ALTER TABLE \"post\" ALTER COLUMN \"state\" DROP NOT NULL",
                "ALTER TABLE \"post\" ALTER COLUMN \"state\" DROP DEFAULT",
            ]
        );
    }
}
