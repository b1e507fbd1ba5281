//! Migration ledger.
//!
//! The persisted record of applied migration units, kept in an ordinary
//! table named `migrations` with an auto-increment row id, the unit's
//! numeric id (its creation timestamp), and its name. The table is
//! created lazily before the first read or write. Rows are append-only
//! during a run; a revert removes exactly the most recent row.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqlitePool;

use crate::error::{MigrateError, Result};

/// SQL creating the ledger table.
pub const CREATE_LEDGER_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS \"migrations\" (\
    \"id\" INTEGER PRIMARY KEY AUTOINCREMENT, \
    \"timestamp\" BIGINT NOT NULL, \
    \"name\" VARCHAR(255) NOT NULL, \
    \"applied_at\" TEXT NOT NULL DEFAULT (datetime('now')))";

/// SQL appending a ledger row.
pub const INSERT_LEDGER_ROW_SQL: &str =
    "INSERT INTO \"migrations\" (\"timestamp\", \"name\") VALUES (?, ?)";

/// SQL removing the row of one migration id.
pub const DELETE_LEDGER_ROW_SQL: &str = "DELETE FROM \"migrations\" WHERE \"timestamp\" = ?";

/// One applied-migration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    /// Auto-increment row id (application order).
    pub id: i64,
    /// The migration's numeric id.
    pub timestamp: i64,
    /// The migration's name.
    pub name: String,
    /// When the migration was recorded.
    pub applied_at: DateTime<Utc>,
}

/// Parses the stored `applied_at` text, accepting both RFC 3339 and the
/// SQLite `datetime('now')` format.
fn parse_applied_at(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.and_utc())
        })
        .unwrap_or_else(|_| Utc::now())
}

/// Reads and writes the ledger table.
pub struct MigrationLedger {
    pool: SqlitePool,
}

impl MigrationLedger {
    /// Creates a ledger over the given pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates the ledger table if it does not exist yet.
    pub async fn ensure_table(&self) -> Result<()> {
        sqlx::query(CREATE_LEDGER_TABLE_SQL)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Returns every applied migration in application order.
    pub async fn applied(&self) -> Result<Vec<LedgerEntry>> {
        let rows: Vec<(i64, i64, String, String)> = sqlx::query_as(
            "SELECT id, timestamp, name, applied_at FROM \"migrations\" ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, timestamp, name, applied_at)| LedgerEntry {
                id,
                timestamp,
                name,
                applied_at: parse_applied_at(&applied_at),
            })
            .collect())
    }

    /// Records a migration as applied.
    pub async fn record_applied(&self, timestamp: i64, name: &str) -> Result<()> {
        sqlx::query(INSERT_LEDGER_ROW_SQL)
            .bind(timestamp)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Removes the record of a reverted migration.
    pub async fn record_reverted(&self, timestamp: i64) -> Result<()> {
        let result = sqlx::query(DELETE_LEDGER_ROW_SQL)
            .bind(timestamp)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(MigrateError::LedgerInconsistency(format!(
                "no ledger row for migration id {timestamp}"
            )));
        }
        Ok(())
    }

    /// Returns the most recently applied migration, if any.
    pub async fn last_applied(&self) -> Result<Option<LedgerEntry>> {
        let row: Option<(i64, i64, String, String)> = sqlx::query_as(
            "SELECT id, timestamp, name, applied_at FROM \"migrations\" ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(id, timestamp, name, applied_at)| LedgerEntry {
            id,
            timestamp,
            name,
            applied_at: parse_applied_at(&applied_at),
        }))
    }
}
