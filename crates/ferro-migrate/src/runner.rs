//! Reversible statement execution.
//!
//! [`SchemaExecutor`] applies forward statements in order while recording
//! their reverse statements on an in-memory stack scoped to one
//! synchronize call. On failure the stack is replayed newest-first,
//! restoring the schema that existed before the call. Statements execute
//! immediately, without an implicit transaction: DDL is applied as it
//! arrives, and reversibility comes from the recorded down-SQL, not from
//! transaction rollback.

use sqlx::sqlite::SqlitePool;
use tracing::{debug, warn};

use ferro_schema::dialect::CompiledOperation;

use crate::error::{MigrateError, Result};

/// Phase of an executor's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorPhase {
    /// No statement executed yet.
    Idle,
    /// At least one statement executed; down-SQL is being recorded.
    Applying,
    /// A full operation list applied successfully.
    Committed,
    /// A failure occurred and recorded down-SQL is being replayed.
    RollingBack,
    /// The down-SQL replay completed.
    RolledBack,
}

/// Applies up-statements against one database session, recording
/// down-statements for reversal.
pub struct SchemaExecutor {
    pool: SqlitePool,
    phase: ExecutorPhase,
    /// One entry per executed logical operation; an entry's statements run
    /// in order, entries unwind newest-first.
    down_stack: Vec<Vec<String>>,
}

impl SchemaExecutor {
    /// Creates an executor over the given session pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            phase: ExecutorPhase::Idle,
            down_stack: Vec::new(),
        }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> ExecutorPhase {
        self.phase
    }

    /// Executes one forward statement immediately and records its reverse
    /// statements. The reverse is recorded whether or not the caller ever
    /// rolls back.
    pub async fn execute(&mut self, up: &str, down: Vec<String>) -> Result<()> {
        self.phase = ExecutorPhase::Applying;
        debug!(sql = %up, "executing");
        self.run(up).await?;
        self.down_stack.push(down);
        Ok(())
    }

    /// Executes a compiled operation: every up-statement in order, then
    /// one down-stack entry for the whole operation. A failure partway
    /// through records nothing for this operation.
    pub async fn execute_operation(&mut self, operation: &CompiledOperation) -> Result<()> {
        self.phase = ExecutorPhase::Applying;
        for sql in &operation.up {
            debug!(sql = %sql, "executing");
            self.run(sql).await?;
        }
        self.down_stack.push(operation.down.clone());
        Ok(())
    }

    /// Returns the recorded down-SQL without clearing it, newest entry
    /// last.
    #[must_use]
    pub fn memory_down_sql(&self) -> &[Vec<String>] {
        &self.down_stack
    }

    /// Intentionally discards the recorded down-SQL — used once a caller
    /// has confirmed the applied changes are the final desired outcome.
    pub fn clear_memory_sql(&mut self) {
        self.down_stack.clear();
    }

    /// Drains the stack, executing every recorded entry newest-first.
    /// Used both by the automatic failure path and by callers verifying
    /// reversibility.
    pub async fn execute_memory_down_sql(&mut self) -> Result<()> {
        self.phase = ExecutorPhase::RollingBack;
        while let Some(group) = self.down_stack.pop() {
            for sql in &group {
                debug!(sql = %sql, "reverting");
                self.run(sql).await?;
            }
        }
        self.phase = ExecutorPhase::RolledBack;
        Ok(())
    }

    /// Applies a list of compiled operations in order. On any failure the
    /// recorded down-SQL is replayed before the error propagates; if that
    /// replay itself fails, the compound [`MigrateError::RollbackFailed`]
    /// is returned and the session state must be treated as unknown.
    pub async fn apply_all(&mut self, operations: &[CompiledOperation]) -> Result<()> {
        for operation in operations {
            if let Err(original) = self.execute_operation(operation).await {
                warn!(%original, "statement failed, replaying recorded down-SQL");
                return match self.execute_memory_down_sql().await {
                    Ok(()) => Err(original),
                    Err(rollback) => Err(MigrateError::RollbackFailed {
                        original: Box::new(original),
                        rollback: Box::new(rollback),
                    }),
                };
            }
        }
        self.phase = ExecutorPhase::Committed;
        Ok(())
    }

    async fn run(&self, sql: &str) -> Result<()> {
        sqlx::query(sql)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|source| MigrateError::Execution {
                sql: sql.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .expect("in-memory pool")
    }

    async fn table_exists(pool: &SqlitePool, name: &str) -> bool {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name = ?")
                .bind(name)
                .fetch_optional(pool)
                .await
                .unwrap();
        row.is_some()
    }

    fn create_op(name: &str) -> CompiledOperation {
        CompiledOperation::single(
            format!("CREATE TABLE \"{name}\" (\"id\" INTEGER PRIMARY KEY)"),
            format!("DROP TABLE \"{name}\""),
        )
    }

    #[tokio::test]
    async fn records_down_sql_without_clearing() {
        let pool = test_pool().await;
        let mut executor = SchemaExecutor::new(pool);
        assert_eq!(executor.phase(), ExecutorPhase::Idle);

        executor
            .execute(
                "CREATE TABLE \"a\" (\"id\" INTEGER PRIMARY KEY)",
                vec!["DROP TABLE \"a\"".into()],
            )
            .await
            .unwrap();
        assert_eq!(executor.phase(), ExecutorPhase::Applying);
        assert_eq!(executor.memory_down_sql().len(), 1);
        // Reading does not clear.
        assert_eq!(executor.memory_down_sql().len(), 1);
    }

    #[tokio::test]
    async fn down_replay_restores_prior_state() {
        let pool = test_pool().await;
        let mut executor = SchemaExecutor::new(pool.clone());

        executor
            .apply_all(&[create_op("a"), create_op("b")])
            .await
            .unwrap();
        assert_eq!(executor.phase(), ExecutorPhase::Committed);
        assert!(table_exists(&pool, "a").await);
        assert!(table_exists(&pool, "b").await);

        executor.execute_memory_down_sql().await.unwrap();
        assert_eq!(executor.phase(), ExecutorPhase::RolledBack);
        assert!(!table_exists(&pool, "a").await);
        assert!(!table_exists(&pool, "b").await);
        assert!(executor.memory_down_sql().is_empty());
    }

    #[tokio::test]
    async fn failure_unwinds_automatically() {
        let pool = test_pool().await;
        let mut executor = SchemaExecutor::new(pool.clone());

        let result = executor
            .apply_all(&[
                create_op("a"),
                CompiledOperation::single("THIS IS NOT SQL".into(), String::new()),
            ])
            .await;

        assert!(matches!(result, Err(MigrateError::Execution { .. })));
        // The successful first operation was reverted.
        assert!(!table_exists(&pool, "a").await);
        assert_eq!(executor.phase(), ExecutorPhase::RolledBack);
    }

    #[tokio::test]
    async fn failed_rollback_is_compound() {
        let pool = test_pool().await;
        let mut executor = SchemaExecutor::new(pool.clone());

        // A poisoned down entry makes the replay itself fail.
        executor
            .execute(
                "CREATE TABLE \"a\" (\"id\" INTEGER PRIMARY KEY)",
                vec!["ALSO NOT SQL".into()],
            )
            .await
            .unwrap();
        let result = executor
            .apply_all(&[CompiledOperation::single(
                "BROKEN STATEMENT".into(),
                String::new(),
            )])
            .await;

        assert!(matches!(result, Err(MigrateError::RollbackFailed { .. })));
        assert_eq!(executor.phase(), ExecutorPhase::RollingBack);
    }

    #[tokio::test]
    async fn clear_discards_recorded_down_sql() {
        let pool = test_pool().await;
        let mut executor = SchemaExecutor::new(pool.clone());
        executor.apply_all(&[create_op("a")]).await.unwrap();

        executor.clear_memory_sql();
        assert!(executor.memory_down_sql().is_empty());

        // Nothing to replay: the table survives.
        executor.execute_memory_down_sql().await.unwrap();
        assert!(table_exists(&pool, "a").await);
    }
}
