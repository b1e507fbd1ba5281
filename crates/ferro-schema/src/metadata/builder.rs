//! Resolution of raw records into the entity metadata graph.
//!
//! `MetadataBuilder::build` is the single entry point: it links columns and
//! relations to their entities, flattens embedded groups, lowers inheritance
//! and many-to-many relations into physical tables, and validates the result.
//! It fails before anything touches a database.

use std::collections::BTreeMap;

use crate::error::{Result, SchemaError};
use crate::types::{ReferentialAction, SqlType};

use super::raw::{
    ColumnArgs, ColumnOptions, EmbeddedArgs, EntityArgs, IndexArgs, RawRecord, RelationArgs,
    UniqueArgs,
};
use super::{
    ColumnMetadata, EntityMetadata, ForeignKeyMetadata, GenerationStrategy, IndexMetadata,
    InheritancePattern, RelationKind, RelationMetadata, UniqueMetadata,
};

/// Default discriminator column name for single-table inheritance.
const DISCRIMINATOR_COLUMN: &str = "type";

/// Resolves raw metadata records into a closed, validated graph of
/// [`EntityMetadata`].
#[derive(Debug, Default)]
pub struct MetadataBuilder;

impl MetadataBuilder {
    /// Builds the metadata graph from raw records.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MetadataValidation`] for an unknown relation
    /// target, two entities mapping to the same table without inheritance
    /// justification, a composite foreign key whose column count mismatches
    /// its referenced columns, a missing primary key, or an `increment`
    /// column not covered by exactly one primary/unique constraint.
    pub fn build(records: Vec<RawRecord>) -> Result<Vec<EntityMetadata>> {
        let mut entity_args = Vec::new();
        let mut column_args = Vec::new();
        let mut relation_args = Vec::new();
        let mut index_args = Vec::new();
        let mut unique_args = Vec::new();
        let mut embedded_args = Vec::new();

        for record in records {
            match record {
                RawRecord::Entity(args) => entity_args.push(args),
                RawRecord::Column(args) => column_args.push(args),
                RawRecord::Relation(args) => relation_args.push(args),
                RawRecord::Index(args) => index_args.push(args),
                RawRecord::Unique(args) => unique_args.push(args),
                RawRecord::Embedded(args) => embedded_args.push(args),
            }
        }

        let mut graph = Graph::from_entities(&entity_args)?;

        for args in &column_args {
            graph.attach_column(args)?;
        }
        for args in &embedded_args {
            graph.attach_embedded(args)?;
        }
        graph.lower_single_table_roots()?;
        graph.lower_class_table_children()?;
        graph.lower_closure_table_roots()?;
        for args in &relation_args {
            graph.attach_relation(args)?;
        }
        for args in &index_args {
            graph.attach_index(args)?;
        }
        for args in &unique_args {
            graph.attach_unique(args)?;
        }

        graph.validate()?;
        Ok(graph.entities)
    }
}

/// Working state of a build: entities in declaration order plus a
/// target-to-entity resolution map. Single-table subclasses resolve to
/// their root's entity.
struct Graph {
    entities: Vec<EntityMetadata>,
    resolution: BTreeMap<String, usize>,
    /// (child entity index, parent target) pairs for class-table lowering.
    class_table_children: Vec<(usize, String)>,
}

impl Graph {
    fn from_entities(entity_args: &[EntityArgs]) -> Result<Self> {
        let declared: BTreeMap<&str, &EntityArgs> = entity_args
            .iter()
            .map(|args| (args.target.as_str(), args))
            .collect();
        if declared.len() != entity_args.len() {
            return Err(SchemaError::MetadataValidation(
                "duplicate entity target declaration".into(),
            ));
        }

        let mut graph = Self {
            entities: Vec::new(),
            resolution: BTreeMap::new(),
            class_table_children: Vec::new(),
        };

        for args in entity_args {
            let parent_pattern = match &args.extends {
                Some(parent) => {
                    let parent_args = declared.get(parent.as_str()).ok_or_else(|| {
                        SchemaError::MetadataValidation(format!(
                            "entity '{}' extends unknown target '{parent}'",
                            args.target
                        ))
                    })?;
                    let pattern = parent_args.inheritance.ok_or_else(|| {
                        SchemaError::MetadataValidation(format!(
                            "entity '{}' extends '{parent}' which declares no inheritance pattern",
                            args.target
                        ))
                    })?;
                    Some(pattern)
                }
                None => None,
            };

            match parent_pattern {
                Some(InheritancePattern::SingleTable) => {
                    // Subclass columns merge into the root's table; the
                    // subclass produces no table of its own.
                    let parent = args.extends.as_ref().map(String::as_str).unwrap_or_default();
                    let root_idx = graph.resolution.get(parent).copied().ok_or_else(|| {
                        SchemaError::MetadataValidation(format!(
                            "entity '{}' declared before its root '{parent}'",
                            args.target
                        ))
                    })?;
                    graph.resolution.insert(args.target.clone(), root_idx);
                }
                other => {
                    let idx = graph.push_entity(args);
                    if other == Some(InheritancePattern::ClassTable) {
                        let parent = args.extends.clone().unwrap_or_default();
                        graph.class_table_children.push((idx, parent));
                    }
                }
            }
        }

        Ok(graph)
    }

    fn push_entity(&mut self, args: &EntityArgs) -> usize {
        let table_name = args
            .table_name
            .clone()
            .unwrap_or_else(|| args.target.to_lowercase());
        let idx = self.entities.len();
        self.entities.push(EntityMetadata {
            target: args.target.clone(),
            table_name,
            schema: args.schema.clone(),
            catalog: args.catalog.clone(),
            columns: Vec::new(),
            relations: Vec::new(),
            indices: Vec::new(),
            foreign_keys: Vec::new(),
            uniques: Vec::new(),
            inheritance: args.inheritance,
            synthetic: false,
        });
        self.resolution.insert(args.target.clone(), idx);
        idx
    }

    fn resolve(&self, target: &str) -> Option<usize> {
        self.resolution.get(target).copied()
    }

    fn entity_of(&mut self, target: &str, what: &str) -> Result<&mut EntityMetadata> {
        let idx = self.resolve(target).ok_or_else(|| {
            SchemaError::MetadataValidation(format!("{what} declared on unknown target '{target}'"))
        })?;
        Ok(&mut self.entities[idx])
    }

    fn attach_column(&mut self, args: &ColumnArgs) -> Result<()> {
        let column = column_from_options(&args.property_name, None, &args.options);
        let unique = args.options.unique;
        let entity = self.entity_of(&args.target, "column")?;
        push_column(entity, column)?;
        if unique {
            let name = args
                .options
                .name
                .clone()
                .unwrap_or_else(|| args.property_name.clone());
            entity.uniques.push(UniqueMetadata {
                name: None,
                columns: vec![name],
            });
        }
        Ok(())
    }

    fn attach_embedded(&mut self, args: &EmbeddedArgs) -> Result<()> {
        let prefix = args.property_name.clone();
        let columns: Vec<ColumnMetadata> = args
            .columns
            .iter()
            .map(|(sub, options)| column_from_options(sub, Some(&prefix), options))
            .collect();
        let entity = self.entity_of(&args.target, "embedded group")?;
        for column in columns {
            push_column(entity, column)?;
        }
        Ok(())
    }

    fn lower_single_table_roots(&mut self) -> Result<()> {
        for entity in &mut self.entities {
            if entity.inheritance != Some(InheritancePattern::SingleTable) {
                continue;
            }
            let discriminator = ColumnMetadata {
                property_path: DISCRIMINATOR_COLUMN.into(),
                name: DISCRIMINATOR_COLUMN.into(),
                sql_type: SqlType::Varchar(Some(255)),
                nullable: false,
                default: None,
                generation: GenerationStrategy::None,
                primary: false,
                collation: None,
            };
            push_column(entity, discriminator)?;
        }
        Ok(())
    }

    fn lower_class_table_children(&mut self) -> Result<()> {
        for (child_idx, parent_target) in self.class_table_children.clone() {
            let parent_idx = self.resolve(&parent_target).ok_or_else(|| {
                SchemaError::MetadataValidation(format!(
                    "class-table parent '{parent_target}' is not a mapped entity"
                ))
            })?;
            let parent_table = self.entities[parent_idx].table_name.clone();
            let parent_pks: Vec<ColumnMetadata> = self.entities[parent_idx]
                .columns
                .iter()
                .filter(|c| c.primary)
                .cloned()
                .collect();
            if parent_pks.is_empty() {
                return Err(SchemaError::MetadataValidation(format!(
                    "class-table root '{parent_target}' has no primary key to inherit"
                )));
            }

            let child = &mut self.entities[child_idx];
            let mut fk_columns = Vec::new();
            for pk in &parent_pks {
                // The child's key mirrors the root's key values; it is
                // never independently generated.
                let mut copied = pk.clone();
                copied.generation = GenerationStrategy::None;
                fk_columns.push(copied.name.clone());
                push_column(child, copied)?;
            }
            child.foreign_keys.push(ForeignKeyMetadata {
                columns: fk_columns,
                referenced_table: parent_table,
                referenced_columns: parent_pks.iter().map(|c| c.name.clone()).collect(),
                on_delete: ReferentialAction::Cascade,
                on_update: ReferentialAction::NoAction,
            });
        }
        Ok(())
    }

    fn lower_closure_table_roots(&mut self) -> Result<()> {
        let mut synthesized = Vec::new();
        for entity in &self.entities {
            if entity.inheritance != Some(InheritancePattern::ClosureTable) {
                continue;
            }
            let pks: Vec<&ColumnMetadata> =
                entity.columns.iter().filter(|c| c.primary).collect();
            if pks.is_empty() {
                return Err(SchemaError::MetadataValidation(format!(
                    "closure-table entity '{}' has no primary key",
                    entity.target
                )));
            }

            let table_name = format!("{}_closure", entity.table_name);
            let mut columns = Vec::new();
            let mut ancestor_cols = Vec::new();
            let mut descendant_cols = Vec::new();
            for side in ["ancestor", "descendant"] {
                for pk in &pks {
                    let name = format!("{side}_{}", pk.name);
                    if side == "ancestor" {
                        ancestor_cols.push(name.clone());
                    } else {
                        descendant_cols.push(name.clone());
                    }
                    columns.push(ColumnMetadata {
                        property_path: name.clone(),
                        name,
                        sql_type: pk.sql_type.clone(),
                        nullable: false,
                        default: None,
                        generation: GenerationStrategy::None,
                        primary: true,
                        collation: None,
                    });
                }
            }

            let referenced_columns: Vec<String> = pks.iter().map(|c| c.name.clone()).collect();
            let foreign_keys = vec![
                ForeignKeyMetadata {
                    columns: ancestor_cols,
                    referenced_table: entity.table_name.clone(),
                    referenced_columns: referenced_columns.clone(),
                    on_delete: ReferentialAction::Cascade,
                    on_update: ReferentialAction::NoAction,
                },
                ForeignKeyMetadata {
                    columns: descendant_cols,
                    referenced_table: entity.table_name.clone(),
                    referenced_columns,
                    on_delete: ReferentialAction::Cascade,
                    on_update: ReferentialAction::NoAction,
                },
            ];

            synthesized.push(EntityMetadata {
                target: format!("{}Closure", entity.target),
                table_name,
                schema: entity.schema.clone(),
                catalog: entity.catalog.clone(),
                columns,
                relations: Vec::new(),
                indices: Vec::new(),
                foreign_keys,
                uniques: Vec::new(),
                inheritance: None,
                synthetic: true,
            });
        }

        for entity in synthesized {
            self.resolution.insert(entity.target.clone(), self.entities.len());
            self.entities.push(entity);
        }
        Ok(())
    }

    fn attach_relation(&mut self, args: &RelationArgs) -> Result<()> {
        let owner_idx = self.resolve(&args.target).ok_or_else(|| {
            SchemaError::MetadataValidation(format!(
                "relation '{}.{}' declared on unknown target '{}'",
                args.target, args.property_name, args.target
            ))
        })?;
        let referenced_idx = self.resolve(&args.referenced_target).ok_or_else(|| {
            SchemaError::MetadataValidation(format!(
                "relation '{}.{}' references unknown target '{}'",
                args.target, args.property_name, args.referenced_target
            ))
        })?;

        let referenced_table = self.entities[referenced_idx].table_name.clone();
        let referenced_pks: Vec<ColumnMetadata> = self.entities[referenced_idx]
            .columns
            .iter()
            .filter(|c| c.primary)
            .cloned()
            .collect();

        let mut relation = RelationMetadata {
            property_name: args.property_name.clone(),
            kind: args.kind,
            referenced_target: args.referenced_target.clone(),
            referenced_table: referenced_table.clone(),
            owning: args.owning,
            cascade: args.cascade,
            join_columns: Vec::new(),
            junction_table: None,
        };

        let lowers_join_column = args.owning
            && matches!(args.kind, RelationKind::ManyToOne | RelationKind::OneToOne);

        if lowers_join_column {
            let (columns, referenced_columns) =
                resolve_join_columns(args, &referenced_pks, &referenced_table)?;

            relation.join_columns = columns.iter().map(|c| c.name.clone()).collect();
            let owner = &mut self.entities[owner_idx];
            for column in &columns {
                push_column(owner, column.clone())?;
            }
            owner.foreign_keys.push(ForeignKeyMetadata {
                columns: relation.join_columns.clone(),
                referenced_table,
                referenced_columns,
                on_delete: args.on_delete,
                on_update: args.on_update,
            });
            if args.kind == RelationKind::OneToOne {
                owner.uniques.push(UniqueMetadata {
                    name: None,
                    columns: relation.join_columns.clone(),
                });
            }
        } else if args.owning && args.kind == RelationKind::ManyToMany {
            let junction = self.synthesize_junction(args, owner_idx, referenced_idx)?;
            relation.junction_table = Some(junction);
        }

        self.entities[owner_idx].relations.push(relation);
        Ok(())
    }

    /// Lowers a many-to-many owning side into a synthetic junction entity
    /// with two foreign keys and a composite primary key.
    fn synthesize_junction(
        &mut self,
        args: &RelationArgs,
        owner_idx: usize,
        referenced_idx: usize,
    ) -> Result<String> {
        let owner_table = self.entities[owner_idx].table_name.clone();
        let referenced_table = self.entities[referenced_idx].table_name.clone();
        let owner_pks: Vec<ColumnMetadata> = self.entities[owner_idx]
            .columns
            .iter()
            .filter(|c| c.primary)
            .cloned()
            .collect();
        let referenced_pks: Vec<ColumnMetadata> = self.entities[referenced_idx]
            .columns
            .iter()
            .filter(|c| c.primary)
            .cloned()
            .collect();
        if owner_pks.is_empty() || referenced_pks.is_empty() {
            return Err(SchemaError::MetadataValidation(format!(
                "many-to-many relation '{}.{}' requires primary keys on both sides",
                args.target, args.property_name
            )));
        }

        let table_name = args
            .join_table
            .as_ref()
            .and_then(|jt| jt.name.clone())
            .unwrap_or_else(|| {
                format!("{owner_table}_{}_{referenced_table}", args.property_name)
            });

        let mut columns = Vec::new();
        let mut foreign_keys = Vec::new();
        for (side_table, pks) in [(&owner_table, &owner_pks), (&referenced_table, &referenced_pks)]
        {
            let mut side_columns = Vec::new();
            for pk in pks.iter() {
                let name = format!("{side_table}_{}", pk.name);
                side_columns.push(name.clone());
                columns.push(ColumnMetadata {
                    property_path: name.clone(),
                    name,
                    sql_type: pk.sql_type.clone(),
                    nullable: false,
                    default: None,
                    generation: GenerationStrategy::None,
                    primary: true,
                    collation: None,
                });
            }
            foreign_keys.push(ForeignKeyMetadata {
                columns: side_columns,
                referenced_table: side_table.clone(),
                referenced_columns: pks.iter().map(|c| c.name.clone()).collect(),
                on_delete: ReferentialAction::Cascade,
                on_update: ReferentialAction::NoAction,
            });
        }

        let entity = EntityMetadata {
            target: table_name.clone(),
            table_name: table_name.clone(),
            schema: self.entities[owner_idx].schema.clone(),
            catalog: self.entities[owner_idx].catalog.clone(),
            columns,
            relations: Vec::new(),
            indices: Vec::new(),
            foreign_keys,
            uniques: Vec::new(),
            inheritance: None,
            synthetic: true,
        };
        self.resolution.insert(entity.target.clone(), self.entities.len());
        self.entities.push(entity);
        Ok(table_name)
    }

    fn attach_index(&mut self, args: &IndexArgs) -> Result<()> {
        let entity = self.entity_of(&args.target, "index")?;
        for column in &args.columns {
            if entity.get_column(column).is_none() {
                return Err(SchemaError::MetadataValidation(format!(
                    "index on '{}' references unknown column '{column}'",
                    entity.target
                )));
            }
        }
        let name = args.name.clone().unwrap_or_else(|| {
            format!("IDX_{}_{}", entity.table_name, args.columns.join("_"))
        });
        entity.indices.push(IndexMetadata {
            name,
            columns: args.columns.clone(),
            unique: args.unique,
        });
        Ok(())
    }

    fn attach_unique(&mut self, args: &UniqueArgs) -> Result<()> {
        let entity = self.entity_of(&args.target, "unique constraint")?;
        for column in &args.columns {
            if entity.get_column(column).is_none() {
                return Err(SchemaError::MetadataValidation(format!(
                    "unique constraint on '{}' references unknown column '{column}'",
                    entity.target
                )));
            }
        }
        entity.uniques.push(UniqueMetadata {
            name: args.name.clone(),
            columns: args.columns.clone(),
        });
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let mut seen_tables: BTreeMap<(String, String, String), &str> = BTreeMap::new();
        for entity in &self.entities {
            if entity.primary_columns().is_empty() {
                return Err(SchemaError::MetadataValidation(format!(
                    "entity '{}' has no primary key",
                    entity.target
                )));
            }

            let key = (
                entity.catalog.clone().unwrap_or_default(),
                entity.schema.clone().unwrap_or_default(),
                entity.table_name.clone(),
            );
            if let Some(other) = seen_tables.insert(key, &entity.target) {
                return Err(SchemaError::MetadataValidation(format!(
                    "entities '{other}' and '{}' both map to table '{}'",
                    entity.target, entity.table_name
                )));
            }

            for fk in &entity.foreign_keys {
                if fk.columns.len() != fk.referenced_columns.len() {
                    return Err(SchemaError::MetadataValidation(format!(
                        "foreign key on '{}' has {} columns but references {}",
                        entity.target,
                        fk.columns.len(),
                        fk.referenced_columns.len()
                    )));
                }
            }

            for column in &entity.columns {
                if column.generation != GenerationStrategy::Increment {
                    continue;
                }
                let mut coverage = usize::from(column.primary);
                coverage += entity
                    .uniques
                    .iter()
                    .filter(|u| u.columns.contains(&column.name))
                    .count();
                coverage += entity
                    .indices
                    .iter()
                    .filter(|i| i.unique && i.columns.contains(&column.name))
                    .count();
                if coverage != 1 {
                    return Err(SchemaError::MetadataValidation(format!(
                        "increment column '{}.{}' must be covered by exactly one \
                         primary or unique constraint (found {coverage})",
                        entity.target, column.name
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Builds a [`ColumnMetadata`] from options, applying the embedded prefix
/// when present: the property path stays dotted (`counters.likes`) while the
/// physical name is prefix-joined (`counters_likes`).
fn column_from_options(
    property: &str,
    prefix: Option<&str>,
    options: &ColumnOptions,
) -> ColumnMetadata {
    let (property_path, default_name) = match prefix {
        Some(prefix) => (
            format!("{prefix}.{property}"),
            format!("{prefix}_{property}"),
        ),
        None => (property.to_string(), property.to_string()),
    };
    ColumnMetadata {
        property_path,
        name: options.name.clone().unwrap_or(default_name),
        sql_type: options.sql_type.clone(),
        nullable: options.nullable && !options.primary,
        default: options.default.clone(),
        generation: options.generation,
        primary: options.primary
            || matches!(
                options.generation,
                GenerationStrategy::Increment | GenerationStrategy::RowId
            ),
        collation: options.collation.clone(),
    }
}

/// Appends a column, tolerating exact duplicates (single-table subclasses
/// may redeclare a shared column) and rejecting conflicting ones.
fn push_column(entity: &mut EntityMetadata, column: ColumnMetadata) -> Result<()> {
    if let Some(existing) = entity.get_column(&column.name) {
        if *existing == column {
            return Ok(());
        }
        return Err(SchemaError::MetadataValidation(format!(
            "conflicting declarations for column '{}.{}'",
            entity.target, column.name
        )));
    }
    entity.columns.push(column);
    Ok(())
}

/// Resolves the physical join columns of an owning relation against the
/// referenced entity's primary key.
fn resolve_join_columns(
    args: &RelationArgs,
    referenced_pks: &[ColumnMetadata],
    referenced_table: &str,
) -> Result<(Vec<ColumnMetadata>, Vec<String>)> {
    if referenced_pks.is_empty() {
        return Err(SchemaError::MetadataValidation(format!(
            "relation '{}.{}' references table '{referenced_table}' which has no primary key",
            args.target, args.property_name
        )));
    }

    let specs: Vec<(Option<String>, String)> = if args.join_columns.is_empty() {
        referenced_pks
            .iter()
            .map(|pk| (None, pk.name.clone()))
            .collect()
    } else {
        if args.join_columns.len() != referenced_pks.len()
            && args.join_columns.iter().any(|s| s.referenced_column.is_none())
        {
            return Err(SchemaError::MetadataValidation(format!(
                "relation '{}.{}' declares {} join columns but '{referenced_table}' \
                 has a {}-column primary key",
                args.target,
                args.property_name,
                args.join_columns.len(),
                referenced_pks.len()
            )));
        }
        args.join_columns
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                let referenced = spec
                    .referenced_column
                    .clone()
                    .unwrap_or_else(|| referenced_pks[i].name.clone());
                (spec.name.clone(), referenced)
            })
            .collect()
    };

    let mut columns = Vec::new();
    let mut referenced_columns = Vec::new();
    for (name, referenced) in specs {
        let referenced_pk = referenced_pks
            .iter()
            .find(|pk| pk.name == referenced)
            .ok_or_else(|| {
                SchemaError::MetadataValidation(format!(
                    "relation '{}.{}' references unknown column \
                     '{referenced_table}.{referenced}'",
                    args.target, args.property_name
                ))
            })?;
        let column_name =
            name.unwrap_or_else(|| format!("{}_{referenced}", args.property_name));
        columns.push(ColumnMetadata {
            property_path: args.property_name.clone(),
            name: column_name,
            sql_type: referenced_pk.sql_type.clone(),
            nullable: true,
            default: None,
            generation: GenerationStrategy::None,
            primary: false,
            collation: None,
        });
        referenced_columns.push(referenced);
    }
    Ok((columns, referenced_columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::raw::{JoinColumnSpec, JoinTableSpec};
    use crate::types::DefaultValue;

    fn id_column(target: &str) -> RawRecord {
        RawRecord::Column(ColumnArgs::new(
            target,
            "id",
            ColumnOptions::new(SqlType::Integer).primary().increment(),
        ))
    }

    fn post_and_user() -> Vec<RawRecord> {
        vec![
            RawRecord::Entity(EntityArgs::new("User")),
            id_column("User"),
            RawRecord::Column(ColumnArgs::new(
                "User",
                "email",
                ColumnOptions::new(SqlType::Varchar(Some(255))).not_null().unique(),
            )),
            RawRecord::Entity(EntityArgs::new("Post")),
            id_column("Post"),
            RawRecord::Column(ColumnArgs::new(
                "Post",
                "title",
                ColumnOptions::new(SqlType::Varchar(Some(255))),
            )),
            RawRecord::Relation(
                RelationArgs::new("Post", "author", RelationKind::ManyToOne, "User")
                    .on_delete(ReferentialAction::Cascade),
            ),
        ]
    }

    #[test]
    fn builds_linked_graph() {
        let entities = MetadataBuilder::build(post_and_user()).unwrap();
        assert_eq!(entities.len(), 2);

        let post = entities.iter().find(|e| e.target == "Post").unwrap();
        assert_eq!(post.table_name, "post");
        assert_eq!(post.primary_columns(), vec!["id"]);

        // Relation lowered to a join column plus a foreign key.
        let author_col = post.get_column("author_id").unwrap();
        assert_eq!(author_col.sql_type, SqlType::Integer);
        assert_eq!(post.foreign_keys.len(), 1);
        let fk = &post.foreign_keys[0];
        assert_eq!(fk.referenced_table, "user");
        assert_eq!(fk.referenced_columns, vec!["id"]);
        assert_eq!(fk.on_delete, ReferentialAction::Cascade);

        // Column-level unique lowered to a constraint.
        let user = entities.iter().find(|e| e.target == "User").unwrap();
        assert_eq!(user.uniques.len(), 1);
        assert_eq!(user.uniques[0].columns, vec!["email"]);
    }

    #[test]
    fn unknown_relation_target_fails() {
        let records = vec![
            RawRecord::Entity(EntityArgs::new("Post")),
            id_column("Post"),
            RawRecord::Relation(RelationArgs::new(
                "Post",
                "author",
                RelationKind::ManyToOne,
                "Ghost",
            )),
        ];
        let err = MetadataBuilder::build(records).unwrap_err();
        assert!(err.to_string().contains("unknown target 'Ghost'"));
    }

    #[test]
    fn duplicate_table_fails() {
        let records = vec![
            RawRecord::Entity(EntityArgs::new("A").table_name("shared")),
            id_column("A"),
            RawRecord::Entity(EntityArgs::new("B").table_name("shared")),
            id_column("B"),
        ];
        let err = MetadataBuilder::build(records).unwrap_err();
        assert!(err.to_string().contains("both map to table 'shared'"));
    }

    #[test]
    fn missing_primary_key_fails() {
        let records = vec![
            RawRecord::Entity(EntityArgs::new("Note")),
            RawRecord::Column(ColumnArgs::new(
                "Note",
                "body",
                ColumnOptions::new(SqlType::Text),
            )),
        ];
        let err = MetadataBuilder::build(records).unwrap_err();
        assert!(err.to_string().contains("no primary key"));
    }

    #[test]
    fn increment_requires_exactly_one_key_constraint() {
        // Increment column that is both primary and separately unique:
        // covered by two constraints.
        let records = vec![
            RawRecord::Entity(EntityArgs::new("Counter")),
            RawRecord::Column(ColumnArgs::new(
                "Counter",
                "id",
                ColumnOptions::new(SqlType::Integer)
                    .primary()
                    .increment()
                    .unique(),
            )),
        ];
        let err = MetadataBuilder::build(records).unwrap_err();
        assert!(err.to_string().contains("exactly one"));
    }

    #[test]
    fn composite_join_column_count_mismatch_fails() {
        let records = vec![
            RawRecord::Entity(EntityArgs::new("Order")),
            RawRecord::Column(ColumnArgs::new(
                "Order",
                "region",
                ColumnOptions::new(SqlType::Varchar(Some(16))).primary(),
            )),
            RawRecord::Column(ColumnArgs::new(
                "Order",
                "seq",
                ColumnOptions::new(SqlType::Integer).primary(),
            )),
            RawRecord::Entity(EntityArgs::new("Line")),
            id_column("Line"),
            RawRecord::Relation(
                RelationArgs::new("Line", "order", RelationKind::ManyToOne, "Order")
                    .join_column(JoinColumnSpec::named("order_region")),
            ),
        ];
        let err = MetadataBuilder::build(records).unwrap_err();
        assert!(err.to_string().contains("join columns"));
    }

    #[test]
    fn embedded_columns_flatten_with_prefix() {
        let records = vec![
            RawRecord::Entity(EntityArgs::new("Post")),
            id_column("Post"),
            RawRecord::Embedded(
                EmbeddedArgs::new("Post", "counters")
                    .column("likes", ColumnOptions::new(SqlType::Integer).not_null())
                    .column("views", ColumnOptions::new(SqlType::Integer).not_null()),
            ),
        ];
        let entities = MetadataBuilder::build(records).unwrap();
        let post = &entities[0];

        let likes = post.get_column("counters_likes").unwrap();
        assert_eq!(likes.property_path, "counters.likes");
        assert!(post.get_column_by_property("counters.views").is_some());
    }

    #[test]
    fn single_table_inheritance_merges_into_root() {
        let records = vec![
            RawRecord::Entity(
                EntityArgs::new("Content").inheritance(InheritancePattern::SingleTable),
            ),
            id_column("Content"),
            RawRecord::Column(ColumnArgs::new(
                "Content",
                "title",
                ColumnOptions::new(SqlType::Varchar(Some(255))),
            )),
            RawRecord::Entity(EntityArgs::new("Video").extends("Content")),
            RawRecord::Column(ColumnArgs::new(
                "Video",
                "duration",
                ColumnOptions::new(SqlType::Integer),
            )),
        ];
        let entities = MetadataBuilder::build(records).unwrap();

        // Only the root produces a table, holding subclass columns plus
        // the discriminator.
        assert_eq!(entities.len(), 1);
        let content = &entities[0];
        assert!(content.get_column("duration").is_some());
        assert!(content.get_column("type").is_some());
        assert!(!content.get_column("type").unwrap().nullable);
    }

    #[test]
    fn class_table_inheritance_adds_child_fk() {
        let records = vec![
            RawRecord::Entity(
                EntityArgs::new("Content").inheritance(InheritancePattern::ClassTable),
            ),
            id_column("Content"),
            RawRecord::Entity(EntityArgs::new("Photo").extends("Content")),
            RawRecord::Column(ColumnArgs::new(
                "Photo",
                "size",
                ColumnOptions::new(SqlType::Integer),
            )),
        ];
        let entities = MetadataBuilder::build(records).unwrap();
        assert_eq!(entities.len(), 2);

        let photo = entities.iter().find(|e| e.target == "Photo").unwrap();
        assert_eq!(photo.primary_columns(), vec!["id"]);
        assert_eq!(photo.foreign_keys.len(), 1);
        assert_eq!(photo.foreign_keys[0].referenced_table, "content");
        // The inherited key is not independently generated.
        assert_eq!(
            photo.get_column("id").unwrap().generation,
            GenerationStrategy::None
        );
    }

    #[test]
    fn closure_table_synthesizes_junction() {
        let records = vec![
            RawRecord::Entity(
                EntityArgs::new("Category").inheritance(InheritancePattern::ClosureTable),
            ),
            id_column("Category"),
        ];
        let entities = MetadataBuilder::build(records).unwrap();
        assert_eq!(entities.len(), 2);

        let closure = entities
            .iter()
            .find(|e| e.table_name == "category_closure")
            .unwrap();
        assert!(closure.synthetic);
        assert_eq!(
            closure.primary_columns(),
            vec!["ancestor_id", "descendant_id"]
        );
        assert_eq!(closure.foreign_keys.len(), 2);
        assert!(closure
            .foreign_keys
            .iter()
            .all(|fk| fk.referenced_table == "category"
                && fk.on_delete == ReferentialAction::Cascade));
    }

    #[test]
    fn many_to_many_synthesizes_junction() {
        let records = vec![
            RawRecord::Entity(EntityArgs::new("Post")),
            id_column("Post"),
            RawRecord::Entity(EntityArgs::new("Tag")),
            id_column("Tag"),
            RawRecord::Relation(
                RelationArgs::new("Post", "tags", RelationKind::ManyToMany, "Tag")
                    .join_table(JoinTableSpec::named("post_tags")),
            ),
        ];
        let entities = MetadataBuilder::build(records).unwrap();
        assert_eq!(entities.len(), 3);

        let junction = entities.iter().find(|e| e.table_name == "post_tags").unwrap();
        assert!(junction.synthetic);
        assert_eq!(junction.primary_columns(), vec!["post_id", "tag_id"]);
        assert_eq!(junction.foreign_keys.len(), 2);

        let post = entities.iter().find(|e| e.target == "Post").unwrap();
        assert_eq!(
            post.relations[0].junction_table.as_deref(),
            Some("post_tags")
        );
        // No join column on the owning table itself.
        assert!(post.get_column("tags_id").is_none());
    }

    #[test]
    fn default_values_survive_into_desired_table() {
        let records = vec![
            RawRecord::Entity(EntityArgs::new("Post")),
            id_column("Post"),
            RawRecord::Column(ColumnArgs::new(
                "Post",
                "published",
                ColumnOptions::new(SqlType::Boolean)
                    .not_null()
                    .default(DefaultValue::Boolean(false)),
            )),
        ];
        let entities = MetadataBuilder::build(records).unwrap();
        let table = entities[0].desired_table();
        assert_eq!(
            table.get_column("published").unwrap().default,
            Some(DefaultValue::Boolean(false))
        );
    }
}
