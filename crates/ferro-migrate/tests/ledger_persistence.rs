//! The ledger must survive the process: a second connection to the same
//! database file sees exactly what the first one recorded.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use ferro_migrate::prelude::*;

async fn file_pool(path: &std::path::Path) -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&format!("sqlite:{}?mode=rwc", path.display()))
        .await
        .expect("file-backed pool")
}

fn migrations() -> Vec<Box<dyn Migration>> {
    vec![
        Box::new(
            SqlMigration::new(1000, "create_post")
                .up_sql("CREATE TABLE \"post\" (\"id\" INTEGER PRIMARY KEY)")
                .down_sql("DROP TABLE \"post\""),
        ),
        Box::new(
            SqlMigration::new(2000, "add_title")
                .up_sql("ALTER TABLE \"post\" ADD COLUMN \"title\" VARCHAR(255)")
                .down_sql("ALTER TABLE \"post\" DROP COLUMN \"title\""),
        ),
    ]
}

#[tokio::test]
async fn ledger_survives_reconnection() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("app.sqlite3");

    // First session applies everything.
    {
        let pool = file_pool(&db_path).await;
        let mut executor = MigrationExecutor::new(pool.clone());
        for migration in migrations() {
            executor.register(migration);
        }
        let applied = executor.run().await.unwrap();
        assert_eq!(applied.len(), 2);
        pool.close().await;
    }

    // A fresh session sees the recorded state and has nothing to apply.
    let pool = file_pool(&db_path).await;
    let mut executor = MigrationExecutor::new(pool.clone());
    for migration in migrations() {
        executor.register(migration);
    }
    let ledger = executor.ledger().applied().await.unwrap();
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger[0].timestamp, 1000);
    assert_eq!(ledger[1].timestamp, 2000);
    assert!(executor.run().await.unwrap().is_empty());

    // Revert still targets the newest unit only.
    executor.revert().await.unwrap();
    let ledger = executor.ledger().applied().await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].timestamp, 1000);
}
