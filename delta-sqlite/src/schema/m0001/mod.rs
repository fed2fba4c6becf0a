mod migrations;

use sqlx_migrator::vec_box;

/// Initial migration creating the `migrations` applied-log table.
pub(crate) struct InitMigration;

sqlx_migrator::sqlite_migration!(
    InitMigration,
    "delta",
    "init_migration",
    vec_box![],
    vec_box![migrations::create_table::Operation]
);
