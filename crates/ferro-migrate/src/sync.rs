//! Schema synchronization.
//!
//! Wires the core pieces into the synchronize flow: derive desired tables
//! from entity metadata, introspect the live schema, diff, compile for the
//! active dialect, then either report the plan (`log`, a pure dry-run) or
//! apply it reversibly through a [`SchemaExecutor`].

use std::collections::BTreeSet;

use tracing::info;

use ferro_schema::dialect::{CompiledOperation, SchemaDialect};
use ferro_schema::diff::{diff_schema, DiffOptions};
use ferro_schema::introspect::Introspector;
use ferro_schema::metadata::EntityMetadata;
use ferro_schema::operation::Operation;
use ferro_schema::table::{SchemaFilter, Table};

use crate::error::{MigrateError, Result};
use crate::runner::SchemaExecutor;

/// Bootstrap options, replacing the environment flags of decorator-based
/// configurations with explicit fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Compute the plan but never execute it; `synchronize` behaves like
    /// `log`.
    pub skip_schema_creation: bool,
    /// Honored by connection bootstrap code that attaches entity
    /// subscribers; the synchronizer itself loads none.
    pub skip_subscriber_loading: bool,
}

/// One planned schema change: the abstract operation and its compiled
/// forward/reverse SQL.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SyncStep {
    /// The abstract operation.
    pub operation: Operation,
    /// Dialect-compiled up/down statements.
    pub sql: CompiledOperation,
}

/// Synchronizes a metadata model against a live database.
pub struct Synchronizer<'a, I, D> {
    entities: &'a [EntityMetadata],
    introspector: &'a I,
    dialect: &'a D,
    options: SyncOptions,
    /// Tables from prior runs that the current model no longer targets;
    /// only tables known to be ours are ever dropped.
    previously_owned: BTreeSet<String>,
}

impl<'a, I, D> Synchronizer<'a, I, D>
where
    I: Introspector,
    D: SchemaDialect,
{
    /// Creates a synchronizer with default options.
    pub fn new(entities: &'a [EntityMetadata], introspector: &'a I, dialect: &'a D) -> Self {
        Self {
            entities,
            introspector,
            dialect,
            options: SyncOptions::default(),
            previously_owned: BTreeSet::new(),
        }
    }

    /// Sets the bootstrap options.
    #[must_use]
    pub fn options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    /// Registers table names created by earlier runs, making them eligible
    /// for dropping once no entity targets them anymore.
    #[must_use]
    pub fn previously_owned(
        mut self,
        tables: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.previously_owned
            .extend(tables.into_iter().map(Into::into));
        self
    }

    /// Computes the ordered operation plan without executing anything —
    /// the dry-run used to preview changes.
    pub async fn log(&self) -> Result<Vec<SyncStep>> {
        let desired: Vec<Table> = self
            .entities
            .iter()
            .map(EntityMetadata::desired_table)
            .collect();

        let actual = self
            .introspector
            .introspect(&SchemaFilter::all())
            .await
            .map_err(|e| MigrateError::Introspection(Box::new(e)))?;

        let mut owned: BTreeSet<String> =
            desired.iter().map(Table::qualified_name).collect();
        owned.extend(self.previously_owned.iter().cloned());

        let diff_options = DiffOptions {
            owned_tables: owned,
            inline_foreign_keys: self.dialect.inline_foreign_keys(),
        };
        let operations = diff_schema(&desired, &actual, &diff_options);

        operations
            .into_iter()
            .map(|operation| {
                let sql = self.dialect.compile(&operation)?;
                Ok(SyncStep { operation, sql })
            })
            .collect()
    }

    /// Computes the plan and applies it through the executor. Down-SQL
    /// for every applied operation stays recorded on the executor, so the
    /// caller can verify reversibility or unwind explicitly.
    pub async fn synchronize(&self, executor: &mut SchemaExecutor) -> Result<Vec<SyncStep>> {
        let steps = self.log().await?;
        if self.options.skip_schema_creation {
            info!(
                operations = steps.len(),
                "skip_schema_creation set; plan computed but not applied"
            );
            return Ok(steps);
        }

        let compiled: Vec<CompiledOperation> =
            steps.iter().map(|step| step.sql.clone()).collect();
        executor.apply_all(&compiled).await?;
        info!(operations = steps.len(), "schema synchronized");
        Ok(steps)
    }
}
