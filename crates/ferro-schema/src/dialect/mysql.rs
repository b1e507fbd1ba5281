//! MySQL / MariaDB dialect.

use crate::error::Result;
use crate::operation::{ChangeColumnOp, CreatePrimaryKeyOp, DropPrimaryKeyOp};
use crate::table::Index;
use crate::types::SqlType;

use super::{split_type_name, CompiledOperation, SchemaDialect};

/// MySQL / MariaDB DDL compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlDialect;

impl MysqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SchemaDialect for MysqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn max_identifier_length(&self) -> usize {
        64
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{name}`")
    }

    fn autoincrement_keyword(&self) -> &'static str {
        "AUTO_INCREMENT"
    }

    fn render_type(&self, ty: &SqlType) -> String {
        match ty {
            SqlType::SmallInt => "SMALLINT".to_string(),
            SqlType::Integer => "INT".to_string(),
            SqlType::BigInt => "BIGINT".to_string(),
            SqlType::Real => "FLOAT".to_string(),
            SqlType::Double => "DOUBLE".to_string(),
            SqlType::Decimal { precision, scale } => match (precision, scale) {
                (Some(p), Some(s)) => format!("DECIMAL({p}, {s})"),
                (Some(p), None) => format!("DECIMAL({p})"),
                _ => "DECIMAL".to_string(),
            },
            SqlType::Char(len) => format!("CHAR({})", len.unwrap_or(1)),
            SqlType::Varchar(len) => format!("VARCHAR({})", len.unwrap_or(255)),
            SqlType::Text => "TEXT".to_string(),
            SqlType::Boolean => "TINYINT(1)".to_string(),
            SqlType::Date => "DATE".to_string(),
            SqlType::Time => "TIME".to_string(),
            SqlType::Timestamp => "DATETIME".to_string(),
            SqlType::Blob => "BLOB".to_string(),
            SqlType::Json => "JSON".to_string(),
            SqlType::Uuid => "CHAR(36)".to_string(),
            SqlType::Enum(values) => {
                let quoted: Vec<String> = values
                    .iter()
                    .map(|v| format!("'{}'", v.replace('\'', "''")))
                    .collect();
                format!("ENUM({})", quoted.join(", "))
            }
        }
    }

    fn normalize_type(&self, raw: &str) -> SqlType {
        let lowered = raw.trim().to_lowercase();
        if let Some(body) = lowered
            .strip_prefix("enum(")
            .and_then(|b| b.strip_suffix(')'))
        {
            let values = body
                .split(',')
                .map(|v| v.trim().trim_matches('\'').replace("''", "'"))
                .collect();
            return SqlType::Enum(values);
        }

        let (base, args) = split_type_name(raw);
        match base.as_str() {
            "tinyint" if args.first() == Some(&1) => SqlType::Boolean,
            "tinyint" | "smallint" => SqlType::SmallInt,
            "int" | "integer" | "mediumint" => SqlType::Integer,
            "bigint" => SqlType::BigInt,
            "float" => SqlType::Real,
            "double" | "double precision" => SqlType::Double,
            "decimal" | "numeric" => SqlType::Decimal {
                precision: args.first().map(|p| *p as u8),
                scale: args.get(1).map(|s| *s as u8),
            },
            "char" => SqlType::Char(args.first().copied()),
            "varchar" => SqlType::Varchar(args.first().copied()),
            "text" | "tinytext" | "mediumtext" | "longtext" => SqlType::Text,
            "date" => SqlType::Date,
            "time" => SqlType::Time,
            "datetime" | "timestamp" => SqlType::Timestamp,
            "blob" | "tinyblob" | "mediumblob" | "longblob" | "binary" | "varbinary" => {
                SqlType::Blob
            }
            "json" => SqlType::Json,
            _ => SqlType::Text,
        }
    }

    /// MySQL alters a column in one MODIFY statement carrying the full new
    /// definition; the reverse MODIFY restores the full old definition.
    fn change_column(&self, op: &ChangeColumnOp) -> Result<CompiledOperation> {
        let table = self.quote_identifier(&op.table.name);
        Ok(CompiledOperation::single(
            format!(
                "ALTER TABLE {table} MODIFY {}",
                self.column_definition(&op.new, false)
            ),
            format!(
                "ALTER TABLE {table} MODIFY {}",
                self.column_definition(&op.old, false)
            ),
        ))
    }

    fn create_primary_key(&self, op: &CreatePrimaryKeyOp) -> Result<CompiledOperation> {
        let table = self.quote_identifier(&op.table.name);
        Ok(CompiledOperation::single(
            format!(
                "ALTER TABLE {table} ADD PRIMARY KEY ({})",
                self.quote_columns(&op.columns)
            ),
            format!("ALTER TABLE {table} DROP PRIMARY KEY"),
        ))
    }

    fn drop_primary_key(&self, op: &DropPrimaryKeyOp) -> Result<CompiledOperation> {
        let table = self.quote_identifier(&op.table.name);
        Ok(CompiledOperation::single(
            format!("ALTER TABLE {table} DROP PRIMARY KEY"),
            format!(
                "ALTER TABLE {table} ADD PRIMARY KEY ({})",
                self.quote_columns(&op.columns)
            ),
        ))
    }

    fn drop_foreign_key_sql(&self, table: &str, name: &str) -> String {
        format!(
            "ALTER TABLE {} DROP FOREIGN KEY {}",
            self.quote_identifier(table),
            self.quote_identifier(name)
        )
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
    use crate::table::{Column, Table};

    fn dialect() -> MysqlDialect {
        MysqlDialect::new()
    }

    #[test]
    fn backtick_quoting_and_auto_increment() {
        let table = Table::new("post")
            .column(Column::new("id", SqlType::Integer).autoincrement())
            .primary_key(vec!["id".into()]);
        let sql = dialect().create_table_sql(&table);
        assert!(sql.contains("CREATE TABLE `post`"));
        assert!(sql.contains("`id` INT AUTO_INCREMENT PRIMARY KEY"));
    }

    #[test]
    fn modify_carries_full_definition_both_ways() {
        let op = Operation::ChangeColumn(ChangeColumnOp {
            table: Table::new("post"),
            old: Column::new("title", SqlType::Varchar(Some(255))),
            new: Column::new("title", SqlType::Varchar(Some(500))).not_null(),
        });
        let compiled = dialect().compile(&op).unwrap();
        assert_eq!(
            compiled.up,
            vec!["ALTER TABLE `post` MODIFY `title` VARCHAR(500) NOT NULL"]
        );
        assert_eq!(
            compiled.down,
            vec!["ALTER TABLE `post` MODIFY `title` VARCHAR(255)"]
        );
    }

    #[test]
    fn primary_key_changes_are_nameless() {
        let table = Table::new("post").primary_key(vec!["id".into()]);
        let op = Operation::DropPrimaryKey(DropPrimaryKeyOp {
            table,
            columns: vec!["id".into()],
        });
        let compiled = dialect().compile(&op).unwrap();
        assert_eq!(compiled.up, vec!["ALTER TABLE `post` DROP PRIMARY KEY"]);
        assert_eq!(
            compiled.down,
            vec!["ALTER TABLE `post` ADD PRIMARY KEY (`id`)"]
        );
    }

    #[test]
    fn normalizes_catalog_names() {
        assert_eq!(dialect().normalize_type("int(11)"), SqlType::Integer);
        assert_eq!(dialect().normalize_type("tinyint(1)"), SqlType::Boolean);
        assert_eq!(dialect().normalize_type("tinyint(4)"), SqlType::SmallInt);
        assert_eq!(
            dialect().normalize_type("varchar(255)"),
            SqlType::Varchar(Some(255))
        );
        assert_eq!(dialect().normalize_type("datetime"), SqlType::Timestamp);
        assert_eq!(
            dialect().normalize_type("enum('draft','published')"),
            SqlType::Enum(vec!["draft".into(), "published".into()])
        );
    }

    #[test]
    fn enum_renders_value_set() {
        let ty = SqlType::Enum(vec!["draft".into(), "published".into()]);
        assert_eq!(dialect().render_type(&ty), "ENUM('draft', 'published')");
    }
}
