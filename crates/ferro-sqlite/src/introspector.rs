//! Live schema introspection for SQLite.

use std::collections::BTreeMap;

use sqlx::sqlite::SqlitePool;
use tracing::warn;

use ferro_schema::dialect::{SchemaDialect, SqliteDialect};
use ferro_schema::introspect::Introspector;
use ferro_schema::table::{Column, ForeignKey, Index, SchemaFilter, Table, Unique};
use ferro_schema::types::{DefaultValue, ReferentialAction};

/// Catalog read failure.
#[derive(Debug, thiserror::Error)]
pub enum IntrospectError {
    /// Underlying driver error.
    #[error("catalog read failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// Reads the current SQLite schema into dialect-neutral [`Table`]s.
///
/// Every call reads the catalog fresh; nothing is cached between
/// synchronization runs.
pub struct SqliteIntrospector {
    pool: SqlitePool,
    dialect: SqliteDialect,
}

impl SqliteIntrospector {
    /// Creates an introspector over the given pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            dialect: SqliteDialect::new(),
        }
    }

    async fn table_names(&self) -> Result<Vec<String>, IntrospectError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn read_table(&self, name: &str) -> Result<Option<Table>, IntrospectError> {
        let quoted = quote(name);

        let column_rows: Vec<(i64, String, String, i64, Option<String>, i64)> =
            sqlx::query_as(&format!("PRAGMA table_info({quoted})"))
                .fetch_all(&self.pool)
                .await?;
        if column_rows.is_empty() {
            return Ok(None);
        }

        let create_sql: Option<(Option<String>,)> = sqlx::query_as(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        let autoincrement = create_sql
            .and_then(|(sql,)| sql)
            .is_some_and(|sql| sql.to_uppercase().contains("AUTOINCREMENT"));

        let mut table = Table::new(name);

        let mut key_columns: Vec<(i64, String)> = Vec::new();
        for (_cid, column_name, declared_type, notnull, default, pk) in column_rows {
            if pk > 0 {
                key_columns.push((pk, column_name.clone()));
            }
            table.columns.push(Column {
                sql_type: self.dialect.normalize_type(&declared_type),
                // Key columns can never hold NULL even though the pragma
                // reports notnull = 0 for INTEGER PRIMARY KEY.
                nullable: notnull == 0 && pk == 0,
                default: default.as_deref().map(parse_default),
                autoincrement: autoincrement && pk == 1,
                collation: None,
                name: column_name,
            });
        }
        key_columns.sort_by_key(|(ordinal, _)| *ordinal);
        table.primary_key = key_columns.into_iter().map(|(_, c)| c).collect();

        self.read_indexes(name, &mut table).await?;
        self.read_foreign_keys(name, &mut table).await?;
        Ok(Some(table))
    }

    async fn read_indexes(&self, name: &str, table: &mut Table) -> Result<(), IntrospectError> {
        let index_rows: Vec<(i64, String, i64, String, i64)> =
            sqlx::query_as(&format!("PRAGMA index_list({})", quote(name)))
                .fetch_all(&self.pool)
                .await?;

        for (_seq, index_name, unique, origin, _partial) in index_rows {
            if origin == "pk" {
                continue;
            }
            let column_rows: Vec<(i64, i64, Option<String>)> =
                sqlx::query_as(&format!("PRAGMA index_info({})", quote(&index_name)))
                    .fetch_all(&self.pool)
                    .await?;
            let columns: Vec<String> = column_rows
                .into_iter()
                .filter_map(|(_, _, column)| column)
                .collect();
            if columns.is_empty() {
                continue;
            }

            // Inline UNIQUE constraints (origin 'u') and the unique
            // indexes this tool creates for them (UQ_ prefix) both map
            // back to unique constraints.
            if origin == "u" || (unique == 1 && index_name.starts_with("UQ_")) {
                table.uniques.push(Unique {
                    name: Some(index_name),
                    columns,
                });
            } else {
                table.indexes.push(Index {
                    name: index_name,
                    columns,
                    unique: unique == 1,
                });
            }
        }
        Ok(())
    }

    async fn read_foreign_keys(
        &self,
        name: &str,
        table: &mut Table,
    ) -> Result<(), IntrospectError> {
        type FkRow = (i64, i64, String, String, Option<String>, String, String, String);
        let fk_rows: Vec<FkRow> =
            sqlx::query_as(&format!("PRAGMA foreign_key_list({})", quote(name)))
                .fetch_all(&self.pool)
                .await?;

        // Rows of one composite key share an id; group them back together.
        let mut grouped: BTreeMap<i64, ForeignKey> = BTreeMap::new();
        for (id, _seq, referenced_table, from, to, on_update, on_delete, _match) in fk_rows {
            let to = to.unwrap_or_else(|| from.clone());
            if let Some(fk) = grouped.get_mut(&id) {
                fk.columns.push(from);
                fk.referenced_columns.push(to);
            } else {
                grouped.insert(
                    id,
                    ForeignKey {
                        name: None,
                        columns: vec![from],
                        referenced_table,
                        referenced_columns: vec![to],
                        on_delete: parse_action(&on_delete),
                        on_update: parse_action(&on_update),
                    },
                );
            }
        }
        table.foreign_keys.extend(grouped.into_values());
        Ok(())
    }
}

impl Introspector for SqliteIntrospector {
    type Error = IntrospectError;

    async fn introspect(&self, filter: &SchemaFilter) -> Result<Vec<Table>, Self::Error> {
        let mut tables = Vec::new();
        for name in self.table_names().await? {
            if !filter.matches(&name) {
                continue;
            }
            // An unreadable object is skipped, never failing the call.
            match self.read_table(&name).await {
                Ok(Some(table)) => tables.push(table),
                Ok(None) => {}
                Err(error) => {
                    warn!(table = %name, %error, "skipping unreadable table");
                }
            }
        }
        Ok(tables)
    }

    async fn table(&self, name: &str) -> Result<Option<Table>, Self::Error> {
        self.read_table(name).await
    }
}

/// Quotes an identifier for interpolation into a PRAGMA statement, which
/// cannot carry bind parameters.
fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Parses a pragma-reported default value text into a [`DefaultValue`],
/// mirroring how the dialect renders them.
fn parse_default(raw: &str) -> DefaultValue {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("null") {
        return DefaultValue::Null;
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return DefaultValue::Boolean(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return DefaultValue::Boolean(false);
    }
    if let Ok(value) = trimmed.parse::<i64>() {
        return DefaultValue::Integer(value);
    }
    if let Ok(value) = trimmed.parse::<f64>() {
        return DefaultValue::Float(value);
    }
    if trimmed.len() >= 2 && trimmed.starts_with('\'') && trimmed.ends_with('\'') {
        return DefaultValue::String(trimmed[1..trimmed.len() - 1].replace("''", "'"));
    }
    DefaultValue::Expression(trimmed.to_string())
}

fn parse_action(raw: &str) -> ReferentialAction {
    match raw {
        "CASCADE" => ReferentialAction::Cascade,
        "RESTRICT" => ReferentialAction::Restrict,
        "SET NULL" => ReferentialAction::SetNull,
        "SET DEFAULT" => ReferentialAction::SetDefault,
        _ => ReferentialAction::NoAction,
    }
}
