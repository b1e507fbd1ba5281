//! Schema change operations.
//!
//! The differ produces an ordered list of these operations; the dialect
//! compiler renders each one into forward and reverse SQL. Every variant
//! carries the full definitions it touches, so both directions can be
//! rendered without consulting any other state — a `DropColumn` remembers the
//! column it removes, a `ChangeColumn` remembers both the old and the new
//! definition.

use serde::{Deserialize, Serialize};

use crate::table::{Column, ForeignKey, Index, Table, Unique};

/// All schema change operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// Create a new table (columns, primary key, and unique constraints
    /// inline; indexes and foreign keys arrive as separate operations).
    CreateTable(CreateTableOp),
    /// Drop an existing table.
    DropTable(DropTableOp),
    /// Add a column to an existing table.
    AddColumn(AddColumnOp),
    /// Drop a column from a table.
    DropColumn(DropColumnOp),
    /// Change a column's type, length, nullability, or default.
    ChangeColumn(ChangeColumnOp),
    /// Add a primary key constraint.
    CreatePrimaryKey(CreatePrimaryKeyOp),
    /// Drop the primary key constraint.
    DropPrimaryKey(DropPrimaryKeyOp),
    /// Add a foreign key constraint.
    CreateForeignKey(CreateForeignKeyOp),
    /// Drop a foreign key constraint.
    DropForeignKey(DropForeignKeyOp),
    /// Create an index.
    CreateIndex(CreateIndexOp),
    /// Drop an index.
    DropIndex(DropIndexOp),
    /// Add a unique constraint.
    CreateUnique(CreateUniqueOp),
    /// Drop a unique constraint.
    DropUnique(DropUniqueOp),
}

impl Operation {
    /// Returns the name of the table this operation touches.
    #[must_use]
    pub fn table_name(&self) -> &str {
        match self {
            Self::CreateTable(op) => &op.table.name,
            Self::DropTable(op) => &op.table.name,
            Self::AddColumn(op) => &op.table.name,
            Self::DropColumn(op) => &op.table.name,
            Self::ChangeColumn(op) => &op.table.name,
            Self::CreatePrimaryKey(op) => &op.table.name,
            Self::DropPrimaryKey(op) => &op.table.name,
            Self::CreateForeignKey(op) => &op.table,
            Self::DropForeignKey(op) => &op.table,
            Self::CreateIndex(op) => &op.table,
            Self::DropIndex(op) => &op.table,
            Self::CreateUnique(op) => &op.table,
            Self::DropUnique(op) => &op.table,
        }
    }

    /// Short human-readable description, used in errors and logs.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::CreateTable(op) => format!("CreateTable({})", op.table.name),
            Self::DropTable(op) => format!("DropTable({})", op.table.name),
            Self::AddColumn(op) => {
                format!("AddColumn({}.{})", op.table.name, op.column.name)
            }
            Self::DropColumn(op) => {
                format!("DropColumn({}.{})", op.table.name, op.column.name)
            }
            Self::ChangeColumn(op) => {
                format!("ChangeColumn({}.{})", op.table.name, op.new.name)
            }
            Self::CreatePrimaryKey(op) => {
                format!("CreatePrimaryKey({})", op.table.name)
            }
            Self::DropPrimaryKey(op) => format!("DropPrimaryKey({})", op.table.name),
            Self::CreateForeignKey(op) => format!(
                "CreateForeignKey({} -> {})",
                op.table, op.foreign_key.referenced_table
            ),
            Self::DropForeignKey(op) => format!(
                "DropForeignKey({} -> {})",
                op.table, op.foreign_key.referenced_table
            ),
            Self::CreateIndex(op) => format!("CreateIndex({}.{})", op.table, op.index.name),
            Self::DropIndex(op) => format!("DropIndex({}.{})", op.table, op.index.name),
            Self::CreateUnique(op) => format!("CreateUnique({})", op.table),
            Self::DropUnique(op) => format!("DropUnique({})", op.table),
        }
    }
}

/// Create table operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTableOp {
    /// Full definition of the table to create. Foreign keys present on the
    /// definition are ignored here; they are created by dedicated
    /// [`CreateForeignKeyOp`]s after every table exists.
    pub table: Table,
}

/// Drop table operation. Carries the full table definition so the reverse
/// statement can recreate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropTableOp {
    /// Definition of the table being dropped.
    pub table: Table,
}

/// Add column operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddColumnOp {
    /// State of the table *after* the column is added. Dialects that
    /// emulate DDL by rebuilding the table need the complete definition.
    pub table: Table,
    /// The column being added.
    pub column: Column,
}

/// Drop column operation. Carries the dropped column's definition so the
/// reverse statement can restore it (its data is unavoidably lost).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropColumnOp {
    /// State of the table *before* the column is dropped.
    pub table: Table,
    /// The column being dropped.
    pub column: Column,
}

/// Change column operation. Carries both definitions so the reverse
/// statement restores the previous state exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeColumnOp {
    /// State of the table *after* the change.
    pub table: Table,
    /// The column definition being replaced.
    pub old: Column,
    /// The new column definition.
    pub new: Column,
}

/// Create primary key operation. Composite keys are always replaced as a
/// whole, never column by column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePrimaryKeyOp {
    /// State of the table *after* the key exists.
    pub table: Table,
    /// Primary key columns, in key order.
    pub columns: Vec<String>,
}

/// Drop primary key operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropPrimaryKeyOp {
    /// State of the table *before* the key is dropped.
    pub table: Table,
    /// The columns of the key being dropped, for the reverse statement.
    pub columns: Vec<String>,
}

/// Add foreign key operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateForeignKeyOp {
    /// Referencing table name.
    pub table: String,
    /// The constraint to add.
    pub foreign_key: ForeignKey,
}

/// Drop foreign key operation. Carries the full constraint so the reverse
/// statement can recreate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropForeignKeyOp {
    /// Referencing table name.
    pub table: String,
    /// The constraint being dropped.
    pub foreign_key: ForeignKey,
}

/// Create index operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateIndexOp {
    /// Table name.
    pub table: String,
    /// The index to create.
    pub index: Index,
}

/// Drop index operation. Carries the full index for the reverse statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropIndexOp {
    /// Table name.
    pub table: String,
    /// The index being dropped.
    pub index: Index,
}

/// Add unique constraint operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateUniqueOp {
    /// Table name.
    pub table: String,
    /// The constraint to add.
    pub unique: Unique,
}

/// Drop unique constraint operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropUniqueOp {
    /// Table name.
    pub table: String,
    /// The constraint being dropped.
    pub unique: Unique,
}

macro_rules! impl_from_op {
    ($($struct:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$struct> for Operation {
                fn from(op: $struct) -> Self {
                    Self::$variant(op)
                }
            }
        )*
    };
}

impl_from_op!(
    CreateTableOp => CreateTable,
    DropTableOp => DropTable,
    AddColumnOp => AddColumn,
    DropColumnOp => DropColumn,
    ChangeColumnOp => ChangeColumn,
    CreatePrimaryKeyOp => CreatePrimaryKey,
    DropPrimaryKeyOp => DropPrimaryKey,
    CreateForeignKeyOp => CreateForeignKey,
    DropForeignKeyOp => DropForeignKey,
    CreateIndexOp => CreateIndex,
    DropIndexOp => DropIndex,
    CreateUniqueOp => CreateUnique,
    DropUniqueOp => DropUnique,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SqlType;

    fn post_table() -> Table {
        Table::new("post")
            .column(Column::new("id", SqlType::Integer).autoincrement())
            .column(Column::new("title", SqlType::Varchar(Some(255))))
            .primary_key(vec!["id".into()])
    }

    #[test]
    fn table_name_accessor() {
        let op: Operation = CreateTableOp {
            table: post_table(),
        }
        .into();
        assert_eq!(op.table_name(), "post");

        let op: Operation = DropColumnOp {
            table: post_table(),
            column: Column::new("title", SqlType::Varchar(Some(255))),
        }
        .into();
        assert_eq!(op.table_name(), "post");

        let op: Operation = CreateIndexOp {
            table: "post".into(),
            index: Index {
                name: "idx_title".into(),
                columns: vec!["title".into()],
                unique: false,
            },
        }
        .into();
        assert_eq!(op.table_name(), "post");
    }

    #[test]
    fn change_column_keeps_both_definitions() {
        let old = Column::new("title", SqlType::Varchar(Some(255)));
        let new = Column::new("title", SqlType::Varchar(Some(500)));
        let op = ChangeColumnOp {
            table: post_table(),
            old: old.clone(),
            new: new.clone(),
        };
        assert_eq!(op.old.sql_type, SqlType::Varchar(Some(255)));
        assert_eq!(op.new.sql_type, SqlType::Varchar(Some(500)));
        assert_eq!(Operation::from(op).describe(), "ChangeColumn(post.title)");
    }

    #[test]
    fn describe_names_the_target() {
        let op: Operation = DropTableOp {
            table: post_table(),
        }
        .into();
        assert_eq!(op.describe(), "DropTable(post)");
    }

    #[test]
    fn operations_serialize_round_trip() {
        let op: Operation = ChangeColumnOp {
            table: post_table(),
            old: Column::new("title", SqlType::Varchar(Some(255))),
            new: Column::new("title", SqlType::Varchar(Some(500))),
        }
        .into();
        let json = serde_json::to_string(&op).unwrap();
        assert!(json.contains("ChangeColumn"));
        let back: Operation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, op);
    }
}
