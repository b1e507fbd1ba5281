//! Entity metadata model.
//!
//! The validated, fully linked description of every mapped class: tables,
//! columns, relations, indices, foreign keys, unique constraints,
//! inheritance, and embedded column groups. Built once per connection by
//! [`MetadataBuilder`] from raw argument records and immutable afterwards,
//! except for explicit consumer mutation used by tooling (which must be
//! followed by a re-synchronization).

mod builder;
mod raw;

pub use builder::MetadataBuilder;
pub use raw::{
    ColumnArgs, ColumnOptions, EmbeddedArgs, EntityArgs, IndexArgs, JoinColumnSpec, JoinTableSpec,
    RawRecord, RelationArgs, UniqueArgs,
};

use serde::{Deserialize, Serialize};

use crate::table::{Column, ForeignKey, Index, Table, Unique};
use crate::types::{DefaultValue, ReferentialAction, SqlType};

/// Table inheritance pattern of an entity hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InheritancePattern {
    /// All subclasses share one physical table with a discriminator column.
    SingleTable,
    /// One physical table per subclass plus a foreign key to the root.
    ClassTable,
    /// An auxiliary ancestor/descendant junction table with a composite
    /// primary key, for tree-shaped entities.
    ClosureTable,
}

/// Column value generation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GenerationStrategy {
    /// No generation.
    #[default]
    None,
    /// Database auto-increment.
    Increment,
    /// Application-generated UUID.
    Uuid,
    /// Implicit row identifier (SQLite rowid semantics).
    RowId,
}

/// Relation kind between two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationKind {
    /// One-to-one.
    OneToOne,
    /// One-to-many (inverse of many-to-one).
    OneToMany,
    /// Many-to-one.
    ManyToOne,
    /// Many-to-many, lowered to a junction table.
    ManyToMany,
}

impl RelationKind {
    /// Whether this kind carries the join column/table by default.
    /// One-to-many never owns; many-to-one always does.
    #[must_use]
    pub fn owning_by_default(self) -> bool {
        matches!(self, Self::ManyToOne | Self::OneToOne | Self::ManyToMany)
    }
}

/// Cascade behavior set of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CascadeSet {
    /// Cascade inserts.
    pub insert: bool,
    /// Cascade updates.
    pub update: bool,
    /// Cascade removes.
    pub remove: bool,
    /// Cascade soft-removes.
    pub soft_remove: bool,
}

impl CascadeSet {
    /// Cascade everything.
    #[must_use]
    pub fn all() -> Self {
        Self {
            insert: true,
            update: true,
            remove: true,
            soft_remove: true,
        }
    }
}

/// Metadata of one mapped column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Property path on the entity. Embedded columns keep their nested path
    /// (`counters.likes`) for runtime read/write.
    pub property_path: String,
    /// Physical column name.
    pub name: String,
    /// Canonical SQL type.
    pub sql_type: SqlType,
    /// Whether the column allows NULL.
    pub nullable: bool,
    /// Default value.
    pub default: Option<DefaultValue>,
    /// Generation strategy.
    pub generation: GenerationStrategy,
    /// Whether this column is part of the primary key.
    pub primary: bool,
    /// Collation.
    pub collation: Option<String>,
}

impl ColumnMetadata {
    /// Returns `true` for database-generated values (increment or rowid).
    #[must_use]
    pub fn is_db_generated(&self) -> bool {
        matches!(
            self.generation,
            GenerationStrategy::Increment | GenerationStrategy::RowId
        )
    }
}

/// Metadata of one relation property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationMetadata {
    /// Property name on the owning entity.
    pub property_name: String,
    /// Relation kind.
    pub kind: RelationKind,
    /// Referenced entity target.
    pub referenced_target: String,
    /// Resolved physical table of the referenced entity.
    pub referenced_table: String,
    /// Whether this side owns the relation.
    pub owning: bool,
    /// Cascade behavior.
    pub cascade: CascadeSet,
    /// Lowered join column names on the owning side (empty for inverse
    /// sides and many-to-many, whose columns live on the junction table).
    pub join_columns: Vec<String>,
    /// Junction table name for many-to-many owning sides.
    pub junction_table: Option<String>,
}

/// Metadata of one index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Index name.
    pub name: String,
    /// Indexed columns.
    pub columns: Vec<String>,
    /// Whether the index is unique.
    pub unique: bool,
}

/// Metadata of one foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyMetadata {
    /// Columns on the owning table.
    pub columns: Vec<String>,
    /// Referenced table.
    pub referenced_table: String,
    /// Referenced columns.
    pub referenced_columns: Vec<String>,
    /// ON DELETE action.
    pub on_delete: ReferentialAction,
    /// ON UPDATE action.
    pub on_update: ReferentialAction,
}

/// Metadata of one unique constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueMetadata {
    /// Constraint name, if declared.
    pub name: Option<String>,
    /// Constrained columns.
    pub columns: Vec<String>,
}

/// Fully linked metadata of one mapped entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMetadata {
    /// Class/target identifier. Synthetic entities (junction and closure
    /// tables) use a derived identifier.
    pub target: String,
    /// Physical table name. Unique within a (schema, catalog) pair.
    pub table_name: String,
    /// Schema qualifier.
    pub schema: Option<String>,
    /// Catalog qualifier.
    pub catalog: Option<String>,
    /// Mapped columns, in declaration order.
    pub columns: Vec<ColumnMetadata>,
    /// Relations declared on this entity.
    pub relations: Vec<RelationMetadata>,
    /// Indices.
    pub indices: Vec<IndexMetadata>,
    /// Foreign keys (including those lowered from relations).
    pub foreign_keys: Vec<ForeignKeyMetadata>,
    /// Unique constraints (including column-level ones, lowered).
    pub uniques: Vec<UniqueMetadata>,
    /// Inheritance pattern, present on hierarchy roots.
    pub inheritance: Option<InheritancePattern>,
    /// `true` for entities synthesized during build (junction tables,
    /// closure tables).
    pub synthetic: bool,
}

impl EntityMetadata {
    /// Looks up a column by its physical name.
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Looks up a column by its physical name, mutably. Tooling that
    /// mutates metadata this way must trigger a re-synchronization.
    #[must_use]
    pub fn get_column_mut(&mut self, name: &str) -> Option<&mut ColumnMetadata> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Looks up a column by property path.
    #[must_use]
    pub fn get_column_by_property(&self, path: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.property_path == path)
    }

    /// Primary key column names, in declaration order.
    #[must_use]
    pub fn primary_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.primary)
            .map(|c| c.name.clone())
            .collect()
    }

    /// Builds the dialect-neutral table this entity requires — the desired
    /// side of a schema diff.
    #[must_use]
    pub fn desired_table(&self) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                sql_type: c.sql_type.clone(),
                nullable: c.nullable && !c.primary,
                default: c.default.clone(),
                autoincrement: c.is_db_generated(),
                collation: c.collation.clone(),
            })
            .collect();

        let indexes = self
            .indices
            .iter()
            .map(|i| Index {
                name: i.name.clone(),
                columns: i.columns.clone(),
                unique: i.unique,
            })
            .collect();

        let foreign_keys = self
            .foreign_keys
            .iter()
            .map(|fk| ForeignKey {
                name: None,
                columns: fk.columns.clone(),
                referenced_table: fk.referenced_table.clone(),
                referenced_columns: fk.referenced_columns.clone(),
                on_delete: fk.on_delete,
                on_update: fk.on_update,
            })
            .collect();

        let uniques = self
            .uniques
            .iter()
            .map(|u| Unique {
                name: u.name.clone(),
                columns: u.columns.clone(),
            })
            .collect();

        Table {
            name: self.table_name.clone(),
            schema: self.schema.clone(),
            catalog: self.catalog.clone(),
            columns,
            primary_key: self.primary_columns(),
            indexes,
            foreign_keys,
            uniques,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entity() -> EntityMetadata {
        EntityMetadata {
            target: "Post".into(),
            table_name: "post".into(),
            schema: None,
            catalog: None,
            columns: vec![
                ColumnMetadata {
                    property_path: "id".into(),
                    name: "id".into(),
                    sql_type: SqlType::Integer,
                    nullable: false,
                    default: None,
                    generation: GenerationStrategy::Increment,
                    primary: true,
                    collation: None,
                },
                ColumnMetadata {
                    property_path: "title".into(),
                    name: "title".into(),
                    sql_type: SqlType::Varchar(Some(255)),
                    nullable: true,
                    default: None,
                    generation: GenerationStrategy::None,
                    primary: false,
                    collation: None,
                },
            ],
            relations: vec![],
            indices: vec![],
            foreign_keys: vec![],
            uniques: vec![],
            inheritance: None,
            synthetic: false,
        }
    }

    #[test]
    fn desired_table_maps_columns_and_key() {
        let table = sample_entity().desired_table();
        assert_eq!(table.name, "post");
        assert_eq!(table.primary_key, vec!["id"]);

        let id = table.get_column("id").unwrap();
        assert!(id.autoincrement);
        assert!(!id.nullable);

        let title = table.get_column("title").unwrap();
        assert_eq!(title.sql_type, SqlType::Varchar(Some(255)));
        assert!(title.nullable);
    }

    #[test]
    fn column_lookup_by_name_and_property() {
        let mut entity = sample_entity();
        assert!(entity.get_column("title").is_some());
        assert!(entity.get_column_by_property("title").is_some());
        assert!(entity.get_column("missing").is_none());

        // Tooling-style mutation: widen the title column.
        entity.get_column_mut("title").unwrap().sql_type = SqlType::Varchar(Some(500));
        assert_eq!(
            entity.get_column("title").unwrap().sql_type,
            SqlType::Varchar(Some(500))
        );
    }

    #[test]
    fn owning_defaults_per_relation_kind() {
        assert!(RelationKind::ManyToOne.owning_by_default());
        assert!(RelationKind::OneToOne.owning_by_default());
        assert!(RelationKind::ManyToMany.owning_by_default());
        assert!(!RelationKind::OneToMany.owning_by_default());
    }
}
