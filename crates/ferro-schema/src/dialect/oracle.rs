//! Oracle dialect.

use crate::error::Result;
use crate::operation::ChangeColumnOp;
use crate::table::Column;
use crate::types::SqlType;

use super::{split_type_name, CompiledOperation, SchemaDialect};

/// Oracle DDL compiler (12c+, identity columns).
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleDialect;

impl OracleDialect {
    /// Creates a new Oracle dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn modify_sql(&self, table: &str, column: &Column) -> String {
        let mut body = format!(
            "{} {}",
            self.quote_identifier(&column.name),
            self.render_type(&column.sql_type)
        );
        if let Some(ref default) = column.default {
            body.push_str(" DEFAULT ");
            body.push_str(&self.render_default(default));
        }
        format!("ALTER TABLE {} MODIFY ({body})", self.quote_identifier(table))
    }
}

impl SchemaDialect for OracleDialect {
    fn name(&self) -> &'static str {
        "oracle"
    }

    /// Pre-12.2 limit; the shortening scheme makes generated names fit.
    fn max_identifier_length(&self) -> usize {
        30
    }

    fn autoincrement_keyword(&self) -> &'static str {
        "GENERATED BY DEFAULT AS IDENTITY"
    }

    fn render_type(&self, ty: &SqlType) -> String {
        match ty {
            SqlType::SmallInt => "NUMBER(5)".to_string(),
            SqlType::Integer => "NUMBER(10)".to_string(),
            SqlType::BigInt => "NUMBER(19)".to_string(),
            SqlType::Real => "BINARY_FLOAT".to_string(),
            SqlType::Double => "BINARY_DOUBLE".to_string(),
            SqlType::Decimal { precision, scale } => match (precision, scale) {
                (Some(p), Some(s)) => format!("NUMBER({p}, {s})"),
                (Some(p), None) => format!("NUMBER({p})"),
                _ => "NUMBER".to_string(),
            },
            SqlType::Char(len) => format!("CHAR({})", len.unwrap_or(1)),
            SqlType::Varchar(len) => format!("VARCHAR2({})", len.unwrap_or(255)),
            SqlType::Text | SqlType::Json => "CLOB".to_string(),
            SqlType::Boolean => "NUMBER(1)".to_string(),
            SqlType::Date => "DATE".to_string(),
            // Oracle has no TIME type.
            SqlType::Time | SqlType::Timestamp => "TIMESTAMP".to_string(),
            SqlType::Blob => "BLOB".to_string(),
            SqlType::Uuid => "RAW(16)".to_string(),
            SqlType::Enum(_) => "VARCHAR2(255)".to_string(),
        }
    }

    fn normalize_type(&self, raw: &str) -> SqlType {
        let (base, args) = split_type_name(raw);
        match base.as_str() {
            "number" => match (args.first().copied(), args.get(1).copied()) {
                (Some(1), None | Some(0)) => SqlType::Boolean,
                (Some(p), None | Some(0)) if p <= 5 => SqlType::SmallInt,
                (Some(p), None | Some(0)) if p <= 10 => SqlType::Integer,
                (Some(p), None | Some(0)) if p <= 19 => SqlType::BigInt,
                (precision, scale) => SqlType::Decimal {
                    precision: precision.map(|p| p as u8),
                    scale: scale.map(|s| s as u8),
                },
            },
            "binary_float" => SqlType::Real,
            "binary_double" | "float" => SqlType::Double,
            "char" | "nchar" => SqlType::Char(args.first().copied()),
            "varchar2" | "nvarchar2" | "varchar" => SqlType::Varchar(args.first().copied()),
            "clob" | "nclob" | "long" => SqlType::Text,
            "date" => SqlType::Date,
            "timestamp" => SqlType::Timestamp,
            "blob" => SqlType::Blob,
            "raw" if args.first() == Some(&16) => SqlType::Uuid,
            "raw" => SqlType::Blob,
            _ => SqlType::Text,
        }
    }

    /// Oracle alters columns through MODIFY; nullability may only be
    /// restated when it actually changes, so it is emitted separately.
    fn change_column(&self, op: &ChangeColumnOp) -> Result<CompiledOperation> {
        let mut up = Vec::new();
        let mut down = Vec::new();

        if op.old.sql_type != op.new.sql_type || op.old.default != op.new.default {
            up.push(self.modify_sql(&op.table.name, &op.new));
            down.push(self.modify_sql(&op.table.name, &op.old));
        }
        if op.old.nullable != op.new.nullable {
            let table = self.quote_identifier(&op.table.name);
            let column = self.quote_identifier(&op.new.name);
            let (set, unset) = if op.new.nullable {
                ("NULL", "NOT NULL")
            } else {
                ("NOT NULL", "NULL")
            };
            up.push(format!("ALTER TABLE {table} MODIFY ({column} {set})"));
            down.push(format!("ALTER TABLE {table} MODIFY ({column} {unset})"));
        }

        Ok(CompiledOperation { up, down })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::Operation;
    use crate::table::Table;

    fn dialect() -> OracleDialect {
        OracleDialect::new()
    }

    #[test]
    fn identity_clause_precedes_primary_key() {
        let table = Table::new("post")
            .column(Column::new("id", SqlType::Integer).autoincrement())
            .primary_key(vec!["id".into()]);
        let sql = dialect().create_table_sql(&table);
        assert!(sql.contains(
            "\"id\" NUMBER(10) GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY"
        ));
    }

    #[test]
    fn thirty_char_identifier_limit() {
        let d = dialect();
        let name = d.constraint_name(
            "FK",
            "a_rather_long_table_name",
            &["and_a_long_column_name".into()],
        );
        assert!(name.len() <= 30);
        assert_eq!(
            name,
            d.constraint_name(
                "FK",
                "a_rather_long_table_name",
                &["and_a_long_column_name".into()],
            )
        );
    }

    #[test]
    fn number_precision_buckets() {
        assert_eq!(dialect().normalize_type("NUMBER(1)"), SqlType::Boolean);
        assert_eq!(dialect().normalize_type("NUMBER(5)"), SqlType::SmallInt);
        assert_eq!(dialect().normalize_type("NUMBER(10)"), SqlType::Integer);
        assert_eq!(dialect().normalize_type("NUMBER(19)"), SqlType::BigInt);
        assert_eq!(
            dialect().normalize_type("NUMBER(12,2)"),
            SqlType::Decimal {
                precision: Some(12),
                scale: Some(2)
            }
        );
        assert_eq!(dialect().normalize_type("RAW(16)"), SqlType::Uuid);
    }

    #[test]
    fn modify_changes_type_and_nullability_separately() {
        let op = Operation::ChangeColumn(ChangeColumnOp {
            table: Table::new("post"),
            old: Column::new("title", SqlType::Varchar(Some(255))),
            new: Column::new("title", SqlType::Varchar(Some(500))).not_null(),
        });
        let compiled = dialect().compile(&op).unwrap();
        assert_eq!(
            compiled.up,
            vec![
                "ALTER TABLE \"post\" MODIFY (\"title\" VARCHAR2(500))",
                "ALTER TABLE \"post\" MODIFY (\"title\" NOT NULL)",
            ]
        );
        assert_eq!(
            compiled.down,
            vec![
                "ALTER TABLE \"post\" MODIFY (\"title\" VARCHAR2(255))",
                "ALTER TABLE \"post\" MODIFY (\"title\" NULL)",
            ]
        );
    }
}
