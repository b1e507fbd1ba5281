//! Dialect-neutral table representation.
//!
//! These types describe the structure of database tables in one canonical
//! vocabulary. They serve two roles: the *desired* side is derived from
//! [`EntityMetadata`](crate::metadata::EntityMetadata), the *actual* side is
//! populated by a live introspector. The differ only ever compares values of
//! these types, never driver-specific catalog rows. Introspected tables are
//! rebuilt fresh on every call and never cached, because the live schema may
//! have changed out of band.

use serde::{Deserialize, Serialize};

use crate::types::{DefaultValue, ReferentialAction, SqlType};

/// Schema definition for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Canonical SQL data type.
    pub sql_type: SqlType,
    /// Whether the column allows NULL values.
    pub nullable: bool,
    /// Default value, if any.
    pub default: Option<DefaultValue>,
    /// Whether this column auto-increments.
    pub autoincrement: bool,
    /// Collation for string columns.
    pub collation: Option<String>,
}

impl Column {
    /// Creates a new nullable column with no default.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            nullable: true,
            default: None,
            autoincrement: false,
            collation: None,
        }
    }

    /// Marks the column as NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Marks the column as auto-incrementing.
    #[must_use]
    pub fn autoincrement(mut self) -> Self {
        self.autoincrement = true;
        self.nullable = false;
        self
    }

    /// Sets the collation.
    #[must_use]
    pub fn collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    /// Returns `true` if the two definitions differ in type, length,
    /// nullability, or default — the properties a `ChangeColumn` can carry.
    #[must_use]
    pub fn differs_from(&self, other: &Self) -> bool {
        self.sql_type != other.sql_type
            || self.nullable != other.nullable
            || self.default != other.default
    }
}

/// Schema definition for an index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Index {
    /// Index name.
    pub name: String,
    /// Columns covered by the index.
    pub columns: Vec<String>,
    /// Whether this is a UNIQUE index.
    pub unique: bool,
}

impl Index {
    /// Two indexes are considered equivalent if they cover the same columns
    /// with the same uniqueness. Names are ignored because they may differ
    /// between environments.
    #[must_use]
    pub fn equivalent(&self, other: &Self) -> bool {
        self.columns == other.columns && self.unique == other.unique
    }
}

/// Schema definition for a foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Constraint name, if known. Generated names are assigned by the
    /// dialect at compile time.
    pub name: Option<String>,
    /// Columns in the referencing table.
    pub columns: Vec<String>,
    /// Referenced table name.
    pub referenced_table: String,
    /// Referenced columns.
    pub referenced_columns: Vec<String>,
    /// Action on delete.
    pub on_delete: ReferentialAction,
    /// Action on update.
    pub on_update: ReferentialAction,
}

impl ForeignKey {
    /// Two foreign keys are equivalent if they match on the full
    /// (columns, referenced table, referenced columns, actions) tuple.
    /// Names are ignored.
    #[must_use]
    pub fn equivalent(&self, other: &Self) -> bool {
        self.columns == other.columns
            && self.referenced_table == other.referenced_table
            && self.referenced_columns == other.referenced_columns
            && self.on_delete == other.on_delete
            && self.on_update == other.on_update
    }
}

/// Schema definition for a unique constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unique {
    /// Constraint name, if known.
    pub name: Option<String>,
    /// Columns forming the unique constraint.
    pub columns: Vec<String>,
}

impl Unique {
    /// Unique constraints are matched by column set alone.
    #[must_use]
    pub fn equivalent(&self, other: &Self) -> bool {
        self.columns == other.columns
    }
}

/// Complete schema definition for a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: String,
    /// Schema qualifier, if any.
    pub schema: Option<String>,
    /// Catalog qualifier, if any.
    pub catalog: Option<String>,
    /// Column definitions in declaration order.
    pub columns: Vec<Column>,
    /// Primary key column names, in key order. Empty means no primary key.
    pub primary_key: Vec<String>,
    /// Index definitions.
    pub indexes: Vec<Index>,
    /// Foreign key definitions.
    pub foreign_keys: Vec<ForeignKey>,
    /// Unique constraint definitions.
    pub uniques: Vec<Unique>,
}

impl Table {
    /// Creates a new empty table.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            catalog: None,
            columns: Vec::new(),
            primary_key: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
            uniques: Vec::new(),
        }
    }

    /// Sets the schema qualifier.
    #[must_use]
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Adds a column.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Sets the primary key columns.
    #[must_use]
    pub fn primary_key(mut self, columns: Vec<String>) -> Self {
        self.primary_key = columns;
        self
    }

    /// Adds an index.
    #[must_use]
    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    /// Adds a foreign key.
    #[must_use]
    pub fn foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// Adds a unique constraint.
    #[must_use]
    pub fn unique(mut self, unique: Unique) -> Self {
        self.uniques.push(unique);
        self
    }

    /// Returns the schema-qualified name used for matching desired against
    /// actual tables.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match (&self.catalog, &self.schema) {
            (Some(catalog), Some(schema)) => format!("{catalog}.{schema}.{}", self.name),
            (None, Some(schema)) => format!("{schema}.{}", self.name),
            _ => self.name.clone(),
        }
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Looks up a column by name, mutably.
    #[must_use]
    pub fn get_column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Returns `true` if the column is part of the primary key.
    #[must_use]
    pub fn is_primary(&self, column: &str) -> bool {
        self.primary_key.iter().any(|c| c == column)
    }
}

/// Filter handed to an introspector to scope which tables are read.
#[derive(Debug, Clone, Default)]
pub struct SchemaFilter {
    /// Restrict to this schema qualifier, if set.
    pub schema: Option<String>,
    /// Restrict to these table names; empty means all tables.
    pub tables: Vec<String>,
}

impl SchemaFilter {
    /// A filter matching every table in the default schema.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// A filter matching only the given tables.
    #[must_use]
    pub fn tables(tables: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            schema: None,
            tables: tables.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns `true` if the filter admits the given table name.
    #[must_use]
    pub fn matches(&self, table: &str) -> bool {
        self.tables.is_empty() || self.tables.iter().any(|t| t == table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_builder() {
        let table = Table::new("post")
            .column(Column::new("id", SqlType::Integer).autoincrement())
            .column(Column::new("title", SqlType::Varchar(Some(255))))
            .primary_key(vec!["id".into()]);

        assert_eq!(table.name, "post");
        assert_eq!(table.columns.len(), 2);
        assert!(table.is_primary("id"));
        assert!(!table.is_primary("title"));
        assert!(table.get_column("title").is_some());
        assert!(table.get_column("missing").is_none());
    }

    #[test]
    fn qualified_name_includes_qualifiers() {
        let bare = Table::new("post");
        assert_eq!(bare.qualified_name(), "post");

        let qualified = Table::new("post").schema("app");
        assert_eq!(qualified.qualified_name(), "app.post");
    }

    #[test]
    fn column_differs_on_type_length_nullable_default() {
        let base = Column::new("title", SqlType::Varchar(Some(255)));
        assert!(!base.differs_from(&base.clone()));

        let widened = Column::new("title", SqlType::Varchar(Some(500)));
        assert!(base.differs_from(&widened));

        let not_null = base.clone().not_null();
        assert!(base.differs_from(&not_null));

        let defaulted = base.clone().default(DefaultValue::String("x".into()));
        assert!(base.differs_from(&defaulted));
    }

    #[test]
    fn fk_equivalence_ignores_name() {
        let a = ForeignKey {
            name: Some("fk_one".into()),
            columns: vec!["author_id".into()],
            referenced_table: "user".into(),
            referenced_columns: vec!["id".into()],
            on_delete: ReferentialAction::Cascade,
            on_update: ReferentialAction::NoAction,
        };
        let mut b = a.clone();
        b.name = Some("fk_other".into());
        assert!(a.equivalent(&b));

        b.on_delete = ReferentialAction::SetNull;
        assert!(!a.equivalent(&b));
    }

    #[test]
    fn index_equivalence_uses_columns_and_uniqueness() {
        let a = Index {
            name: "idx_a".into(),
            columns: vec!["email".into()],
            unique: true,
        };
        let mut b = a.clone();
        b.name = "idx_b".into();
        assert!(a.equivalent(&b));

        b.unique = false;
        assert!(!a.equivalent(&b));
    }

    #[test]
    fn schema_filter_matching() {
        assert!(SchemaFilter::all().matches("anything"));
        let filter = SchemaFilter::tables(["post", "user"]);
        assert!(filter.matches("post"));
        assert!(!filter.matches("comment"));
    }
}
