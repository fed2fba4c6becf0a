//! Schema migrations for the applied-log table itself.
//!
//! The tracker's own `migrations` table is provisioned through
//! `sqlx_migrator`, so `configure` is a plan run instead of ad-hoc DDL
//! and later schema revisions slot in as dependency-ordered migrations.

mod m0001;

pub(crate) use m0001::InitMigration;

use sqlx_migrator::{Info, Migrator};

/// Builds the migrator holding every applied-log schema migration.
pub(crate) fn migrator() -> Result<Migrator<sqlx::Sqlite>, sqlx_migrator::Error> {
    let mut migrator = Migrator::default();
    migrator.add_migration(Box::new(InitMigration));

    Ok(migrator)
}
