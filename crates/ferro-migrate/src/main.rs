//! ferro-migrate CLI.
//!
//! Command-line boundary over the library: applications register their
//! entities and migration units in code and hand them to this binary's
//! entry points; invoked bare it reports status against an empty
//! registration set. Exit codes: 0 on success, 1 on any error, 2 when
//! `show` finds unapplied units (used for CI gating).

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sqlx::sqlite::SqlitePoolOptions;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use ferro_migrate::prelude::*;

/// Schema synchronization and migrations for ferro-orm.
#[derive(Parser)]
#[command(name = "ferro-migrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL.
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:db.sqlite3")]
    database: String,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending migrations and print the newly recorded entries.
    Run,
    /// Revert the most recently applied migration.
    Revert,
    /// Show applied and pending migrations; exits 2 when units are
    /// pending.
    Show,
    /// Print the schema synchronization plan as up/down SQL pairs without
    /// executing it.
    Sync {
        /// Emit the plan as JSON instead of SQL text.
        #[arg(long)]
        json: bool,
    },
}

/// Migration units registered with this binary. Applications embed their
/// own list here; the bare binary ships none.
fn registered_migrations() -> Vec<Box<dyn Migration>> {
    Vec::new()
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return ExitCode::FAILURE;
    }

    match execute(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> anyhow::Result<ExitCode> {
    let pool = SqlitePoolOptions::new()
        .max_connections(2)
        .connect(&cli.database)
        .await?;

    let mut executor = MigrationExecutor::new(pool.clone());
    for migration in registered_migrations() {
        executor.register(migration);
    }

    match cli.command {
        Commands::Run => {
            let applied = executor.run().await?;
            if applied.is_empty() {
                info!("nothing to apply");
            }
            for entry in applied {
                println!(
                    "{} {} ({})",
                    entry.timestamp,
                    entry.name,
                    entry.applied_at.format("%Y-%m-%d %H:%M:%S")
                );
            }
        }

        Commands::Revert => {
            executor.revert().await?;
            info!("reverted the most recent migration");
        }

        Commands::Show => {
            // pending() also creates the ledger table on first use.
            let pending = executor.pending().await?;
            let applied = executor.ledger().applied().await?;
            for entry in &applied {
                println!(
                    " [X] {} {} ({})",
                    entry.timestamp,
                    entry.name,
                    entry.applied_at.format("%Y-%m-%d %H:%M:%S")
                );
            }
            for unit in &pending {
                println!(" [ ] {} {}", unit.id(), unit.name());
            }
            if !pending.is_empty() {
                // Reserved exit code for CI gating on unapplied units.
                return Ok(ExitCode::from(2));
            }
        }

        Commands::Sync { json } => {
            // Entities are registered in code the same way migrations
            // are; the bare binary has none, so this prints an empty
            // plan against whatever database it points at.
            let entities = MetadataBuilder::build(Vec::new())?;
            let introspector = SqliteIntrospector::new(pool.clone());
            let dialect = SqliteDialect::new();
            let synchronizer = Synchronizer::new(&entities, &introspector, &dialect);

            let steps = synchronizer.log().await?;
            if steps.is_empty() {
                info!("schema is in sync");
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&steps)?);
            } else {
                for step in steps {
                    println!("-- {}", step.operation.describe());
                    for sql in &step.sql.up {
                        println!("{sql};");
                    }
                    for sql in &step.sql.down {
                        println!("-- down: {sql};");
                    }
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
