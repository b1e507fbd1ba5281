//! User-authored migration units.

/// One versioned migration unit.
///
/// Units are constructed statically (structs implementing this trait, or
/// [`SqlMigration`] for plain statement lists) and registered with the
/// [`MigrationExecutor`](crate::executor::MigrationExecutor). Ids are the
/// unit's creation timestamp and must be unique across the whole set — a
/// collision is a configuration error detected at load time.
pub trait Migration: Send + Sync {
    /// Numeric id (creation timestamp). Units run in ascending id order.
    fn id(&self) -> i64;

    /// Human-readable name, recorded in the ledger.
    fn name(&self) -> &str;

    /// Forward statements, executed in order.
    fn up(&self) -> Vec<String>;

    /// Reverse statements, executed in order on revert. Return an empty
    /// list for an irreversible unit; reverting it then fails cleanly.
    fn down(&self) -> Vec<String>;
}

/// A migration unit built from plain SQL statement lists.
#[derive(Debug, Clone)]
pub struct SqlMigration {
    id: i64,
    name: String,
    up: Vec<String>,
    down: Vec<String>,
}

impl SqlMigration {
    /// Creates a unit with the given id and name.
    #[must_use]
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            up: Vec::new(),
            down: Vec::new(),
        }
    }

    /// Adds a forward statement.
    #[must_use]
    pub fn up_sql(mut self, sql: impl Into<String>) -> Self {
        self.up.push(sql.into());
        self
    }

    /// Adds a reverse statement.
    #[must_use]
    pub fn down_sql(mut self, sql: impl Into<String>) -> Self {
        self.down.push(sql.into());
        self
    }
}

impl Migration for SqlMigration {
    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn up(&self) -> Vec<String> {
        self.up.clone()
    }

    fn down(&self) -> Vec<String> {
        self.down.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sql_migration_builder() {
        let unit = SqlMigration::new(1000, "create_post")
            .up_sql("CREATE TABLE \"post\" (\"id\" INTEGER PRIMARY KEY)")
            .down_sql("DROP TABLE \"post\"");
        assert_eq!(unit.id(), 1000);
        assert_eq!(unit.name(), "create_post");
        assert_eq!(unit.up().len(), 1);
        assert_eq!(unit.down().len(), 1);
    }
}
