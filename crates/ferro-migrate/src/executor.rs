//! Migration executor.
//!
//! Applies and reverts registered migration units against the persisted
//! ledger. A run determines the unapplied units, executes their forward
//! statements in ascending id order under the configured transaction
//! mode, and appends one ledger row per unit. A revert executes the
//! reverse statements of exactly the most recently applied unit and
//! removes its row.

use std::collections::BTreeSet;

use sqlx::sqlite::{SqliteConnection, SqlitePool};
use sqlx::Connection;
use tracing::{debug, info};

use crate::error::{MigrateError, Result};
use crate::ledger::{LedgerEntry, MigrationLedger, DELETE_LEDGER_ROW_SQL, INSERT_LEDGER_ROW_SQL};
use crate::migration::Migration;

/// Transaction scope of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionMode {
    /// One transaction wraps every pending unit.
    #[default]
    All,
    /// One transaction per unit: units before a failure stay applied.
    Each,
    /// No transaction. A failure leaves already-committed units recorded
    /// and surfaces as-is; the caller owns the partial state. This mode
    /// is documented as non-recoverable.
    None,
}

/// Runs and reverts migration units against one database.
pub struct MigrationExecutor {
    pool: SqlitePool,
    ledger: MigrationLedger,
    migrations: Vec<Box<dyn Migration>>,
    mode: TransactionMode,
}

impl MigrationExecutor {
    /// Creates an executor with the default (`All`) transaction mode.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        let ledger = MigrationLedger::new(pool.clone());
        Self {
            pool,
            ledger,
            migrations: Vec::new(),
            mode: TransactionMode::default(),
        }
    }

    /// Sets the transaction mode.
    #[must_use]
    pub fn transaction_mode(mut self, mode: TransactionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Registers a migration unit.
    pub fn register(&mut self, migration: Box<dyn Migration>) -> &mut Self {
        self.migrations.push(migration);
        self
    }

    /// Returns the ledger.
    #[must_use]
    pub fn ledger(&self) -> &MigrationLedger {
        &self.ledger
    }

    /// Returns registered units that are not yet recorded in the ledger,
    /// ascending by id.
    pub async fn pending(&self) -> Result<Vec<&dyn Migration>> {
        self.validate_ids()?;
        self.ledger.ensure_table().await?;
        let applied: BTreeSet<i64> = self
            .ledger
            .applied()
            .await?
            .into_iter()
            .map(|entry| entry.timestamp)
            .collect();

        let mut pending: Vec<&dyn Migration> = self
            .migrations
            .iter()
            .map(|migration| migration.as_ref())
            .filter(|m| !applied.contains(&m.id()))
            .collect();
        pending.sort_by_key(|m| m.id());
        Ok(pending)
    }

    /// Applies every pending unit and returns the ledger rows appended by
    /// this run, in application order.
    ///
    /// # Errors
    ///
    /// [`MigrateError::LedgerInconsistency`] for duplicate ids (detected
    /// before anything runs); [`MigrateError::Execution`] when a
    /// statement fails — under `All`/`Each` the active transaction is
    /// rolled back and the ledger is left exactly as it was before the
    /// failing unit.
    pub async fn run(&self) -> Result<Vec<LedgerEntry>> {
        let pending = self.pending().await?;
        if pending.is_empty() {
            info!("no pending migrations");
            return Ok(Vec::new());
        }

        let before: BTreeSet<i64> = self
            .ledger
            .applied()
            .await?
            .into_iter()
            .map(|entry| entry.timestamp)
            .collect();

        let mut conn = self.pool.acquire().await?;
        match self.mode {
            TransactionMode::All => {
                let mut tx = conn.begin().await?;
                for unit in &pending {
                    Self::apply_unit(&mut *tx, *unit).await?;
                }
                tx.commit().await?;
            }
            TransactionMode::Each => {
                for unit in &pending {
                    let mut tx = conn.begin().await?;
                    Self::apply_unit(&mut *tx, *unit).await?;
                    tx.commit().await?;
                }
            }
            TransactionMode::None => {
                for unit in &pending {
                    Self::apply_unit(&mut *conn, *unit).await?;
                }
            }
        }
        drop(conn);

        let applied_now: Vec<LedgerEntry> = self
            .ledger
            .applied()
            .await?
            .into_iter()
            .filter(|entry| !before.contains(&entry.timestamp))
            .collect();
        info!(count = applied_now.len(), "migrations applied");
        Ok(applied_now)
    }

    /// Reverts the most recently applied unit.
    ///
    /// # Errors
    ///
    /// [`MigrateError::LedgerInconsistency`] when the ledger is empty or
    /// records an id with no registered unit; nothing is mutated in
    /// either case.
    pub async fn revert(&self) -> Result<()> {
        self.validate_ids()?;
        self.ledger.ensure_table().await?;
        let last = self.ledger.last_applied().await?.ok_or_else(|| {
            MigrateError::LedgerInconsistency("revert requested with an empty ledger".into())
        })?;
        let unit = self
            .migrations
            .iter()
            .find(|m| m.id() == last.timestamp)
            .ok_or_else(|| {
                MigrateError::LedgerInconsistency(format!(
                    "ledger records migration {} '{}' but no such unit is registered",
                    last.timestamp, last.name
                ))
            })?;

        info!(id = unit.id(), name = %unit.name(), "reverting migration");
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;
        for sql in unit.down() {
            debug!(sql = %sql, "executing");
            run_statement(&mut *tx, &sql).await?;
        }
        run_bound(&mut *tx, DELETE_LEDGER_ROW_SQL, unit.id(), None).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn apply_unit(conn: &mut SqliteConnection, unit: &dyn Migration) -> Result<()> {
        info!(id = unit.id(), name = %unit.name(), "applying migration");
        for sql in unit.up() {
            debug!(sql = %sql, "executing");
            run_statement(conn, &sql).await?;
        }
        run_bound(conn, INSERT_LEDGER_ROW_SQL, unit.id(), Some(unit.name())).await?;
        Ok(())
    }

    fn validate_ids(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for migration in &self.migrations {
            if !seen.insert(migration.id()) {
                return Err(MigrateError::LedgerInconsistency(format!(
                    "duplicate migration id {}",
                    migration.id()
                )));
            }
        }
        Ok(())
    }
}

async fn run_statement(conn: &mut SqliteConnection, sql: &str) -> Result<()> {
    sqlx::query(sql)
        .execute(conn)
        .await
        .map(|_| ())
        .map_err(|source| MigrateError::Execution {
            sql: sql.to_string(),
            source,
        })
}

async fn run_bound(
    conn: &mut SqliteConnection,
    sql: &str,
    timestamp: i64,
    name: Option<&str>,
) -> Result<()> {
    let mut query = sqlx::query(sql).bind(timestamp);
    if let Some(name) = name {
        query = query.bind(name);
    }
    query.execute(conn).await?;
    Ok(())
}
