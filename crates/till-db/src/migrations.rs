//! # Database Migrations
//!
//! Embedded SQL migrations for the Till schema.
//!
//! ## Schema
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  customers ◄──── orders ◄──── order_items ────► products               │
//! │                  (immutable)   (immutable)       stock CHECK (>= 0)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Orders and their items are append-only; triggers in
//! `0001_initial_schema.sql` abort any UPDATE or DELETE on them.
//!
//! New migrations go in `migrations/sqlite/` with the next sequence number.
//! Applied migrations are never edited.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Migrations embedded from `migrations/sqlite` at compile time.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations.
///
/// Idempotent. Each migration runs in its own transaction.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Snapshot of embedded vs applied migrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationStatus {
    pub embedded: usize,
    pub applied: usize,
}

impl MigrationStatus {
    /// True when every embedded migration has been applied.
    pub fn is_current(&self) -> bool {
        self.applied >= self.embedded
    }
}

/// Reports how many embedded migrations have been applied.
///
/// A database that was never migrated reports zero applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<MigrationStatus> {
    let embedded = MIGRATOR.migrations.len();

    let applied: i64 =
        match sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await
        {
            Ok(count) => count,
            // No bookkeeping table yet.
            Err(sqlx::Error::Database(_)) => 0,
            Err(e) => return Err(e.into()),
        };

    Ok(MigrationStatus {
        embedded,
        applied: usize::try_from(applied).unwrap_or(0),
    })
}
