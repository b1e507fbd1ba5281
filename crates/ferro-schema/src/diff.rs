//! Schema diff engine.
//!
//! Compares the desired schema (derived from entity metadata) against the
//! actual schema (read by an introspector) and produces the ordered
//! [`Operation`] list that transforms actual into desired. No data is lost
//! beyond what is unavoidable: dropping a column necessarily drops its data,
//! and tables not recognized as owned by this tool are never dropped at all.
//!
//! Output ordering is deterministic: constraint drops come before column and
//! table drops, every `CreateTable` precedes every `CreateForeignKey`, and
//! table creation follows a topological sort of the foreign-key reference
//! graph with ties (including cycles) broken lexicographically by table name.

use std::collections::{BTreeMap, BTreeSet};

use crate::operation::{
    AddColumnOp, ChangeColumnOp, CreateForeignKeyOp, CreateIndexOp, CreatePrimaryKeyOp,
    CreateTableOp, CreateUniqueOp, DropColumnOp, DropForeignKeyOp, DropIndexOp, DropPrimaryKeyOp,
    DropTableOp, DropUniqueOp, Operation,
};
use crate::table::Table;

/// Options controlling a diff run.
#[derive(Debug, Clone, Default)]
pub struct DiffOptions {
    /// Qualified names of tables this tool owns (previously created by a
    /// synchronization run or targeted by an entity). Actual tables outside
    /// this set are never dropped, no matter what the desired schema says.
    pub owned_tables: BTreeSet<String>,
    /// Set for dialects that declare foreign keys inline in CREATE TABLE
    /// (SQLite): new tables then get no separate `CreateForeignKey`
    /// operations. Foreign-key changes on existing tables are still
    /// emitted and fail at compile time on such dialects.
    pub inline_foreign_keys: bool,
}

impl DiffOptions {
    /// Options owning exactly the given tables.
    #[must_use]
    pub fn owning(tables: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            owned_tables: tables.into_iter().map(Into::into).collect(),
            inline_foreign_keys: false,
        }
    }

    /// Enables inline foreign keys for CREATE TABLE (SQLite-style).
    #[must_use]
    pub fn with_inline_foreign_keys(mut self) -> Self {
        self.inline_foreign_keys = true;
        self
    }
}

/// Compares desired against actual tables and returns the ordered
/// operation list.
#[must_use]
pub fn diff_schema(desired: &[Table], actual: &[Table], options: &DiffOptions) -> Vec<Operation> {
    let desired_map: BTreeMap<String, &Table> =
        desired.iter().map(|t| (t.qualified_name(), t)).collect();
    let actual_map: BTreeMap<String, &Table> =
        actual.iter().map(|t| (t.qualified_name(), t)).collect();

    let mut drop_constraints = Vec::new();
    let mut new_tables = Vec::new();
    let mut alters = Vec::new();
    let mut create_indexes = Vec::new();
    let mut create_uniques = Vec::new();
    let mut create_fks = Vec::new();
    let mut drop_columns = Vec::new();
    let mut drop_tables = Vec::new();

    // Unmatched desired tables: create, then indexes and (deferred)
    // foreign keys. Unique constraints render inline with CREATE TABLE.
    for (name, table) in &desired_map {
        if actual_map.contains_key(name) {
            continue;
        }
        new_tables.push((*table).clone());
        for index in &table.indexes {
            create_indexes.push(Operation::CreateIndex(CreateIndexOp {
                table: table.name.clone(),
                index: index.clone(),
            }));
        }
        if !options.inline_foreign_keys {
            for fk in &table.foreign_keys {
                create_fks.push(Operation::CreateForeignKey(CreateForeignKeyOp {
                    table: table.name.clone(),
                    foreign_key: fk.clone(),
                }));
            }
        }
    }

    // Unmatched actual tables: drop, but only when recognized as ours.
    for (name, table) in &actual_map {
        if desired_map.contains_key(name) || !options.owned_tables.contains(name) {
            continue;
        }
        for fk in &table.foreign_keys {
            drop_constraints.push(Operation::DropForeignKey(DropForeignKeyOp {
                table: table.name.clone(),
                foreign_key: fk.clone(),
            }));
        }
        drop_tables.push(Operation::DropTable(DropTableOp {
            table: (*table).clone(),
        }));
    }

    // Matched tables: diff columns, primary key, constraints, indexes.
    for (name, desired_table) in &desired_map {
        let Some(actual_table) = actual_map.get(name) else {
            continue;
        };
        diff_table(
            desired_table,
            actual_table,
            &mut drop_constraints,
            &mut alters,
            &mut create_indexes,
            &mut create_uniques,
            &mut create_fks,
            &mut drop_columns,
        );
    }

    let mut operations = drop_constraints;
    operations.extend(order_creates(new_tables));
    operations.extend(alters);
    operations.extend(create_indexes);
    operations.extend(create_uniques);
    operations.extend(create_fks);
    operations.extend(drop_columns);
    operations.extend(drop_tables);
    operations
}

#[allow(clippy::too_many_arguments)]
fn diff_table(
    desired: &Table,
    actual: &Table,
    drop_constraints: &mut Vec<Operation>,
    alters: &mut Vec<Operation>,
    create_indexes: &mut Vec<Operation>,
    create_uniques: &mut Vec<Operation>,
    create_fks: &mut Vec<Operation>,
    drop_columns: &mut Vec<Operation>,
) {
    let desired_cols: BTreeMap<&str, &crate::table::Column> =
        desired.columns.iter().map(|c| (c.name.as_str(), c)).collect();
    let actual_cols: BTreeMap<&str, &crate::table::Column> =
        actual.columns.iter().map(|c| (c.name.as_str(), c)).collect();

    for (name, column) in &desired_cols {
        match actual_cols.get(name) {
            None => alters.push(Operation::AddColumn(AddColumnOp {
                table: desired.clone(),
                column: (*column).clone(),
            })),
            Some(actual_column) if actual_column.differs_from(column) => {
                alters.push(Operation::ChangeColumn(ChangeColumnOp {
                    table: desired.clone(),
                    old: (*actual_column).clone(),
                    new: (*column).clone(),
                }));
            }
            Some(_) => {}
        }
    }
    for (name, column) in &actual_cols {
        if !desired_cols.contains_key(name) {
            drop_columns.push(Operation::DropColumn(DropColumnOp {
                table: actual.clone(),
                column: (*column).clone(),
            }));
        }
    }

    // Primary keys are replaced as a whole: composite keys cannot be
    // altered column by column.
    if primary_key_set(actual) != primary_key_set(desired) {
        if !actual.primary_key.is_empty() {
            alters.push(Operation::DropPrimaryKey(DropPrimaryKeyOp {
                table: actual.clone(),
                columns: actual.primary_key.clone(),
            }));
        }
        if !desired.primary_key.is_empty() {
            alters.push(Operation::CreatePrimaryKey(CreatePrimaryKeyOp {
                table: desired.clone(),
                columns: desired.primary_key.clone(),
            }));
        }
    }

    for fk in &actual.foreign_keys {
        if !desired.foreign_keys.iter().any(|d| d.equivalent(fk)) {
            drop_constraints.push(Operation::DropForeignKey(DropForeignKeyOp {
                table: actual.name.clone(),
                foreign_key: fk.clone(),
            }));
        }
    }
    for fk in &desired.foreign_keys {
        if !actual.foreign_keys.iter().any(|a| a.equivalent(fk)) {
            create_fks.push(Operation::CreateForeignKey(CreateForeignKeyOp {
                table: desired.name.clone(),
                foreign_key: fk.clone(),
            }));
        }
    }

    for index in &actual.indexes {
        if !desired.indexes.iter().any(|d| d.equivalent(index)) {
            drop_constraints.push(Operation::DropIndex(DropIndexOp {
                table: actual.name.clone(),
                index: index.clone(),
            }));
        }
    }
    for index in &desired.indexes {
        if !actual.indexes.iter().any(|a| a.equivalent(index)) {
            create_indexes.push(Operation::CreateIndex(CreateIndexOp {
                table: desired.name.clone(),
                index: index.clone(),
            }));
        }
    }

    for unique in &actual.uniques {
        if !desired.uniques.iter().any(|d| d.equivalent(unique)) {
            drop_constraints.push(Operation::DropUnique(DropUniqueOp {
                table: actual.name.clone(),
                unique: unique.clone(),
            }));
        }
    }
    for unique in &desired.uniques {
        if !actual.uniques.iter().any(|a| a.equivalent(unique)) {
            create_uniques.push(Operation::CreateUnique(CreateUniqueOp {
                table: desired.name.clone(),
                unique: unique.clone(),
            }));
        }
    }
}

fn primary_key_set(table: &Table) -> BTreeSet<&str> {
    table.primary_key.iter().map(String::as_str).collect()
}

/// Orders `CreateTable` operations so that referenced tables are created
/// before the tables referencing them (Kahn's algorithm over the
/// foreign-key graph). Ties — and cycles, which are harmless because
/// foreign keys are created only after every table exists — are broken
/// lexicographically by table name.
fn order_creates(tables: Vec<Table>) -> Vec<Operation> {
    let names: BTreeSet<String> = tables.iter().map(|t| t.name.clone()).collect();
    let by_name: BTreeMap<String, Table> =
        tables.into_iter().map(|t| (t.name.clone(), t)).collect();

    let mut in_degree: BTreeMap<String, usize> = BTreeMap::new();
    let mut dependents: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (name, table) in &by_name {
        in_degree.entry(name.clone()).or_insert(0);
        let referenced: BTreeSet<&str> = table
            .foreign_keys
            .iter()
            .map(|fk| fk.referenced_table.as_str())
            .filter(|r| *r != name.as_str() && names.contains(*r))
            .collect();
        for reference in referenced {
            *in_degree.entry(name.clone()).or_insert(0) += 1;
            dependents
                .entry(reference.to_string())
                .or_default()
                .insert(name.clone());
        }
    }

    let mut ready: BTreeSet<String> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(name, _)| name.clone())
        .collect();
    let mut ordered: Vec<String> = Vec::new();

    while let Some(name) = ready.iter().next().cloned() {
        ready.remove(&name);
        if let Some(deps) = dependents.get(&name) {
            for dep in deps {
                if let Some(degree) = in_degree.get_mut(dep) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(dep.clone());
                    }
                }
            }
        }
        ordered.push(name);
    }

    // Any remaining tables form reference cycles; emit them by name.
    for (name, degree) in &in_degree {
        if *degree > 0 && !ordered.contains(name) {
            ordered.push(name.clone());
        }
    }

    ordered
        .into_iter()
        .map(|name| {
            Operation::CreateTable(CreateTableOp {
                table: by_name[&name].clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Column, ForeignKey, Index, Unique};
    use crate::types::{ReferentialAction, SqlType};

    fn post_table() -> Table {
        Table::new("post")
            .column(Column::new("id", SqlType::Integer).autoincrement())
            .column(Column::new("title", SqlType::Varchar(Some(255))))
            .primary_key(vec!["id".into()])
    }

    fn fk_to(table: &str) -> ForeignKey {
        ForeignKey {
            name: None,
            columns: vec![format!("{table}_id")],
            referenced_table: table.into(),
            referenced_columns: vec!["id".into()],
            on_delete: ReferentialAction::NoAction,
            on_update: ReferentialAction::NoAction,
        }
    }

    #[test]
    fn empty_database_creates_table() {
        // Scenario A: one entity, empty database.
        let ops = diff_schema(&[post_table()], &[], &DiffOptions::default());
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            Operation::CreateTable(op) if op.table.name == "post"
        ));
    }

    #[test]
    fn widened_column_changes() {
        // Scenario B: widen title to varchar(500).
        let mut desired = post_table();
        desired.get_column_mut("title").unwrap().sql_type = SqlType::Varchar(Some(500));
        let ops = diff_schema(&[desired], &[post_table()], &DiffOptions::default());
        assert_eq!(ops.len(), 1);
        match &ops[0] {
            Operation::ChangeColumn(op) => {
                assert_eq!(op.old.sql_type, SqlType::Varchar(Some(255)));
                assert_eq!(op.new.sql_type, SqlType::Varchar(Some(500)));
            }
            other => panic!("expected ChangeColumn, got {other:?}"),
        }
    }

    #[test]
    fn no_changes_produces_empty_list() {
        let tables = vec![post_table()];
        assert!(diff_schema(&tables, &tables, &DiffOptions::default()).is_empty());
    }

    #[test]
    fn unknown_actual_table_is_never_dropped() {
        let ops = diff_schema(&[], &[post_table()], &DiffOptions::default());
        assert!(ops.is_empty());
    }

    #[test]
    fn owned_actual_table_is_dropped_with_fks_first() {
        let mut stray = post_table();
        stray.foreign_keys.push(fk_to("user"));
        let ops = diff_schema(&[], &[stray], &DiffOptions::owning(["post"]));
        assert_eq!(ops.len(), 2);
        assert!(matches!(&ops[0], Operation::DropForeignKey(_)));
        assert!(matches!(
            &ops[1],
            Operation::DropTable(op) if op.table.name == "post"
        ));
    }

    #[test]
    fn added_and_dropped_columns() {
        let desired = Table::new("post")
            .column(Column::new("id", SqlType::Integer).autoincrement())
            .column(Column::new("body", SqlType::Text))
            .primary_key(vec!["id".into()]);
        let ops = diff_schema(&[desired], &[post_table()], &DiffOptions::default());
        assert_eq!(ops.len(), 2);
        assert!(matches!(
            &ops[0],
            Operation::AddColumn(op) if op.column.name == "body"
        ));
        assert!(matches!(
            &ops[1],
            Operation::DropColumn(op) if op.column.name == "title"
        ));
    }

    #[test]
    fn primary_key_replaced_as_a_whole() {
        let mut desired = post_table();
        desired.primary_key = vec!["id".into(), "title".into()];
        let ops = diff_schema(&[desired], &[post_table()], &DiffOptions::default());
        assert_eq!(ops.len(), 2);
        assert!(matches!(
            &ops[0],
            Operation::DropPrimaryKey(op) if op.columns == vec!["id".to_string()]
        ));
        assert!(matches!(
            &ops[1],
            Operation::CreatePrimaryKey(op)
                if op.columns == vec!["id".to_string(), "title".to_string()]
        ));
    }

    #[test]
    fn foreign_keys_matched_by_tuple_not_name() {
        let mut desired = post_table();
        let mut named = fk_to("user");
        named.name = Some("FK_whatever".into());
        desired.foreign_keys.push(named);

        let mut actual = post_table();
        let mut other_name = fk_to("user");
        other_name.name = Some("fk_post_user_1a2b".into());
        actual.foreign_keys.push(other_name);

        assert!(diff_schema(&[desired], &[actual], &DiffOptions::default()).is_empty());
    }

    #[test]
    fn changed_fk_action_drops_and_recreates() {
        let mut desired = post_table();
        let mut changed = fk_to("user");
        changed.on_delete = ReferentialAction::Cascade;
        desired.foreign_keys.push(changed);

        let mut actual = post_table();
        actual.foreign_keys.push(fk_to("user"));

        let ops = diff_schema(&[desired], &[actual], &DiffOptions::default());
        assert_eq!(ops.len(), 2);
        assert!(matches!(&ops[0], Operation::DropForeignKey(_)));
        assert!(matches!(&ops[1], Operation::CreateForeignKey(_)));
    }

    #[test]
    fn index_and_unique_matched_by_columns() {
        let mut desired = post_table();
        desired.indexes.push(Index {
            name: "IDX_post_title".into(),
            columns: vec!["title".into()],
            unique: false,
        });
        desired.uniques.push(Unique {
            name: None,
            columns: vec!["title".into()],
        });

        let mut actual = post_table();
        actual.indexes.push(Index {
            name: "some_old_index_name".into(),
            columns: vec!["title".into()],
            unique: false,
        });

        let ops = diff_schema(&[desired], &[actual], &DiffOptions::default());
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], Operation::CreateUnique(_)));
    }

    #[test]
    fn creates_follow_fk_topology() {
        let user = Table::new("user")
            .column(Column::new("id", SqlType::Integer).autoincrement())
            .primary_key(vec!["id".into()]);
        let mut post = post_table();
        post.columns.push(Column::new("user_id", SqlType::Integer));
        post.foreign_keys.push(fk_to("user"));

        // "post" sorts before "user" lexicographically, so correct output
        // proves the topological ordering, not accidental name order.
        let ops = diff_schema(&[post, user], &[], &DiffOptions::default());
        let creates: Vec<&str> = ops
            .iter()
            .filter_map(|op| match op {
                Operation::CreateTable(c) => Some(c.table.name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(creates, vec!["user", "post"]);

        // The foreign key comes after every create.
        let fk_pos = ops
            .iter()
            .position(|op| matches!(op, Operation::CreateForeignKey(_)))
            .unwrap();
        let last_create = ops
            .iter()
            .rposition(|op| matches!(op, Operation::CreateTable(_)))
            .unwrap();
        assert!(fk_pos > last_create);
    }

    #[test]
    fn new_table_cycle_breaks_lexicographically() {
        let mut a = Table::new("alpha")
            .column(Column::new("id", SqlType::Integer).autoincrement())
            .primary_key(vec!["id".into()]);
        a.columns.push(Column::new("beta_id", SqlType::Integer));
        a.foreign_keys.push(fk_to("beta"));

        let mut b = Table::new("beta")
            .column(Column::new("id", SqlType::Integer).autoincrement())
            .primary_key(vec!["id".into()]);
        b.columns.push(Column::new("alpha_id", SqlType::Integer));
        b.foreign_keys.push(fk_to("alpha"));

        let ops = diff_schema(&[b, a], &[], &DiffOptions::default());
        let creates: Vec<&str> = ops
            .iter()
            .filter_map(|op| match op {
                Operation::CreateTable(c) => Some(c.table.name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(creates, vec!["alpha", "beta"]);

        // Both tables exist before either foreign key.
        let first_fk = ops
            .iter()
            .position(|op| matches!(op, Operation::CreateForeignKey(_)))
            .unwrap();
        let last_create = ops
            .iter()
            .rposition(|op| matches!(op, Operation::CreateTable(_)))
            .unwrap();
        assert!(first_fk > last_create);
    }

    #[test]
    fn ordering_invariant_holds_in_mixed_diff() {
        // Desired: keep post (without its index, plus a new column), add
        // comment; drop legacy (owned).
        let mut actual_post = post_table();
        actual_post.indexes.push(Index {
            name: "IDX_post_title".into(),
            columns: vec!["title".into()],
            unique: false,
        });
        let legacy = Table::new("legacy")
            .column(Column::new("id", SqlType::Integer).autoincrement())
            .primary_key(vec!["id".into()]);

        let mut desired_post = post_table();
        desired_post
            .columns
            .push(Column::new("score", SqlType::Integer));
        let mut comment = Table::new("comment")
            .column(Column::new("id", SqlType::Integer).autoincrement())
            .primary_key(vec!["id".into()]);
        comment.columns.push(Column::new("post_id", SqlType::Integer));
        comment.foreign_keys.push(fk_to("post"));

        let ops = diff_schema(
            &[desired_post, comment],
            &[actual_post, legacy],
            &DiffOptions::owning(["legacy", "post"]),
        );

        let position = |pred: fn(&Operation) -> bool| ops.iter().position(pred);
        let drop_index = position(|op| matches!(op, Operation::DropIndex(_))).unwrap();
        let create_table = position(|op| matches!(op, Operation::CreateTable(_))).unwrap();
        let create_fk = position(|op| matches!(op, Operation::CreateForeignKey(_))).unwrap();
        let drop_table = position(|op| matches!(op, Operation::DropTable(_))).unwrap();

        assert!(drop_index < drop_table);
        assert!(create_table < create_fk);
        assert!(drop_table > create_fk);
    }
}
