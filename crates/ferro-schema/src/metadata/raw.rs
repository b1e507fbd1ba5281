//! Raw metadata argument records.
//!
//! The annotation-parsing front-end (outside this crate) produces these
//! records; applications without such a front-end construct them directly
//! with the builder methods. A record is one declarative fact about one
//! target: "target X is an entity", "target X has a column on property Y",
//! and so on. [`MetadataBuilder`](super::builder::MetadataBuilder) resolves
//! a record set into the linked [`EntityMetadata`](super::EntityMetadata)
//! graph.

use crate::types::{DefaultValue, ReferentialAction, SqlType};

use super::{CascadeSet, GenerationStrategy, InheritancePattern, RelationKind};

/// One raw declarative record: a kind, the target it applies to, the
/// property it annotates (where applicable), and its options.
#[derive(Debug, Clone)]
pub enum RawRecord {
    /// Declares a mapped entity.
    Entity(EntityArgs),
    /// Declares a column on an entity property.
    Column(ColumnArgs),
    /// Declares a relation on an entity property.
    Relation(RelationArgs),
    /// Declares an index over entity columns.
    Index(IndexArgs),
    /// Declares a unique constraint over entity columns.
    Unique(UniqueArgs),
    /// Declares an embedded column group on an entity property.
    Embedded(EmbeddedArgs),
}

/// Arguments of an entity declaration.
#[derive(Debug, Clone)]
pub struct EntityArgs {
    /// Class/target identifier.
    pub target: String,
    /// Physical table name; defaults to the lowercased target.
    pub table_name: Option<String>,
    /// Schema qualifier.
    pub schema: Option<String>,
    /// Catalog qualifier.
    pub catalog: Option<String>,
    /// Inheritance pattern, declared on the hierarchy root.
    pub inheritance: Option<InheritancePattern>,
    /// Parent target, declared on subclass entities.
    pub extends: Option<String>,
    /// Discriminator value for single-table subclasses; defaults to the
    /// target identifier.
    pub discriminator_value: Option<String>,
}

impl EntityArgs {
    /// Creates an entity declaration for the given target.
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            table_name: None,
            schema: None,
            catalog: None,
            inheritance: None,
            extends: None,
            discriminator_value: None,
        }
    }

    /// Overrides the physical table name.
    #[must_use]
    pub fn table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = Some(name.into());
        self
    }

    /// Sets the schema qualifier.
    #[must_use]
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Declares this entity as a hierarchy root with the given pattern.
    #[must_use]
    pub fn inheritance(mut self, pattern: InheritancePattern) -> Self {
        self.inheritance = Some(pattern);
        self
    }

    /// Declares this entity as a subclass of the given target.
    #[must_use]
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }
}

/// Arguments of a column declaration.
#[derive(Debug, Clone)]
pub struct ColumnArgs {
    /// Owning target.
    pub target: String,
    /// Property name on the target.
    pub property_name: String,
    /// Column options.
    pub options: ColumnOptions,
}

impl ColumnArgs {
    /// Creates a column declaration.
    #[must_use]
    pub fn new(
        target: impl Into<String>,
        property_name: impl Into<String>,
        options: ColumnOptions,
    ) -> Self {
        Self {
            target: target.into(),
            property_name: property_name.into(),
            options,
        }
    }
}

/// Options of a column declaration.
#[derive(Debug, Clone)]
pub struct ColumnOptions {
    /// Column name override; defaults to the property name.
    pub name: Option<String>,
    /// Canonical SQL type.
    pub sql_type: SqlType,
    /// Whether the column allows NULL. Defaults to `true`.
    pub nullable: bool,
    /// Default value.
    pub default: Option<DefaultValue>,
    /// Value generation strategy.
    pub generation: GenerationStrategy,
    /// Whether this column is part of the primary key.
    pub primary: bool,
    /// Column-level unique constraint.
    pub unique: bool,
    /// Collation for string columns.
    pub collation: Option<String>,
}

impl ColumnOptions {
    /// Creates options for a nullable, non-key column of the given type.
    #[must_use]
    pub fn new(sql_type: SqlType) -> Self {
        Self {
            name: None,
            sql_type,
            nullable: true,
            default: None,
            generation: GenerationStrategy::None,
            primary: false,
            unique: false,
            collation: None,
        }
    }

    /// Overrides the column name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Marks the column NOT NULL.
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

    /// Marks the column as part of the primary key.
    #[must_use]
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self.nullable = false;
        self
    }

    /// Marks the column as auto-incrementing primary key material.
    #[must_use]
    pub fn increment(mut self) -> Self {
        self.generation = GenerationStrategy::Increment;
        self.nullable = false;
        self
    }

    /// Marks the column as UUID-generated.
    #[must_use]
    pub fn uuid(mut self) -> Self {
        self.generation = GenerationStrategy::Uuid;
        self
    }

    /// Adds a column-level unique constraint.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the collation.
    #[must_use]
    pub fn collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }
}

/// Arguments of a relation declaration.
#[derive(Debug, Clone)]
pub struct RelationArgs {
    /// Owning target.
    pub target: String,
    /// Property name on the target.
    pub property_name: String,
    /// Relation kind.
    pub kind: RelationKind,
    /// Referenced entity target.
    pub referenced_target: String,
    /// Whether this side owns the relation (carries the join column or
    /// join table).
    pub owning: bool,
    /// Cascade behavior.
    pub cascade: CascadeSet,
    /// Join column specs on the owning side; defaults are derived from the
    /// property name and the referenced primary key.
    pub join_columns: Vec<JoinColumnSpec>,
    /// Join table spec for many-to-many owning sides.
    pub join_table: Option<JoinTableSpec>,
    /// ON DELETE action for the lowered foreign key.
    pub on_delete: ReferentialAction,
    /// ON UPDATE action for the lowered foreign key.
    pub on_update: ReferentialAction,
}

impl RelationArgs {
    /// Creates a relation declaration.
    #[must_use]
    pub fn new(
        target: impl Into<String>,
        property_name: impl Into<String>,
        kind: RelationKind,
        referenced_target: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            property_name: property_name.into(),
            kind,
            referenced_target: referenced_target.into(),
            owning: kind.owning_by_default(),
            cascade: CascadeSet::default(),
            join_columns: Vec::new(),
            join_table: None,
            on_delete: ReferentialAction::NoAction,
            on_update: ReferentialAction::NoAction,
        }
    }

    /// Marks this side as owning.
    #[must_use]
    pub fn owning(mut self) -> Self {
        self.owning = true;
        self
    }

    /// Marks this side as inverse (non-owning).
    #[must_use]
    pub fn inverse(mut self) -> Self {
        self.owning = false;
        self
    }

    /// Sets the cascade behavior.
    #[must_use]
    pub fn cascade(mut self, cascade: CascadeSet) -> Self {
        self.cascade = cascade;
        self
    }

    /// Adds an explicit join column.
    #[must_use]
    pub fn join_column(mut self, spec: JoinColumnSpec) -> Self {
        self.join_columns.push(spec);
        self
    }

    /// Sets the join table for a many-to-many owning side.
    #[must_use]
    pub fn join_table(mut self, spec: JoinTableSpec) -> Self {
        self.join_table = Some(spec);
        self
    }

    /// Sets the ON DELETE action.
    #[must_use]
    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = action;
        self
    }
}

/// Explicit join column of a relation.
#[derive(Debug, Clone, Default)]
pub struct JoinColumnSpec {
    /// Column name; defaults to `<property>_<referenced column>`.
    pub name: Option<String>,
    /// Referenced column; defaults to the referenced primary key.
    pub referenced_column: Option<String>,
}

impl JoinColumnSpec {
    /// A join column with an explicit name, referencing the primary key.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            referenced_column: None,
        }
    }

    /// A fully explicit join column.
    #[must_use]
    pub fn mapped(name: impl Into<String>, referenced_column: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            referenced_column: Some(referenced_column.into()),
        }
    }
}

/// Join table spec for a many-to-many relation.
#[derive(Debug, Clone, Default)]
pub struct JoinTableSpec {
    /// Junction table name; defaults to
    /// `<owning table>_<property>_<referenced table>`.
    pub name: Option<String>,
}

impl JoinTableSpec {
    /// A join table with an explicit name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

/// Arguments of an index declaration.
#[derive(Debug, Clone)]
pub struct IndexArgs {
    /// Owning target.
    pub target: String,
    /// Index name; defaults to a generated `IDX_…` name.
    pub name: Option<String>,
    /// Indexed column names.
    pub columns: Vec<String>,
    /// Whether the index is unique.
    pub unique: bool,
}

impl IndexArgs {
    /// Creates an index declaration.
    #[must_use]
    pub fn new(
        target: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            target: target.into(),
            name: None,
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
        }
    }

    /// Makes the index unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Arguments of a unique constraint declaration.
#[derive(Debug, Clone)]
pub struct UniqueArgs {
    /// Owning target.
    pub target: String,
    /// Constraint name; defaults to a generated `UQ_…` name.
    pub name: Option<String>,
    /// Constrained column names.
    pub columns: Vec<String>,
}

impl UniqueArgs {
    /// Creates a unique constraint declaration.
    #[must_use]
    pub fn new(
        target: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            target: target.into(),
            name: None,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

/// Arguments of an embedded column group declaration.
#[derive(Debug, Clone)]
pub struct EmbeddedArgs {
    /// Owning target.
    pub target: String,
    /// Property holding the embedded group; becomes the column prefix.
    pub property_name: String,
    /// Sub-properties and their column options.
    pub columns: Vec<(String, ColumnOptions)>,
}

impl EmbeddedArgs {
    /// Creates an embedded group declaration.
    #[must_use]
    pub fn new(target: impl Into<String>, property_name: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            property_name: property_name.into(),
            columns: Vec::new(),
        }
    }

    /// Adds a sub-column to the group.
    #[must_use]
    pub fn column(mut self, property: impl Into<String>, options: ColumnOptions) -> Self {
        self.columns.push((property.into(), options));
        self
    }
}
