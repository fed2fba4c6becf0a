//! Applied log persisted in a single SQLite table.
//!
//! Table shape: `migrations(id TEXT PRIMARY KEY, name TEXT, file TEXT,
//! path TEXT, extension TEXT, applied TEXT)`, provisioned by the
//! `schema` migrations on first use. The table carries no `created`
//! column; it is re-derived from the stored file name when rows are
//! hydrated.

use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use delta_core::{parse_file_name, scan::sort_by_created, Change, Request, Tracker};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use sqlx_migrator::{Migrate, Plan};
use ulid::Ulid;

use crate::{
    error::{Result, SqliteError},
    schema,
};

/// Tracker backed by a SQLite database.
pub struct SqliteTracker {
    pool: SqlitePool,
    configured: AtomicBool,
}

impl SqliteTracker {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            configured: AtomicBool::new(false),
        }
    }

    /// Runs the applied-log schema migrations against the pool.
    async fn provision(&self) -> Result<()> {
        let migrator = schema::migrator()?;
        let mut conn = self.pool.acquire().await?;
        migrator.run(&mut *conn, &Plan::apply_all()).await?;

        Ok(())
    }

    fn hydrate(row: &sqlx::sqlite::SqliteRow) -> Result<Change> {
        let file: String = row.try_get("file").map_err(SqliteError::Sqlx)?;
        let applied: String = row.try_get("applied").map_err(SqliteError::Sqlx)?;
        let applied = DateTime::parse_from_rfc3339(&applied)?.with_timezone(&Utc);

        let file = PathBuf::from(file);
        let created = file
            .file_name()
            .map(|name| parse_file_name(&name.to_string_lossy()).0)
            .unwrap_or_default();

        Ok(Change {
            id: Some(row.try_get("id").map_err(SqliteError::Sqlx)?),
            name: row.try_get("name").map_err(SqliteError::Sqlx)?,
            path: PathBuf::from(row.try_get::<String, _>("path").map_err(SqliteError::Sqlx)?),
            extension: row.try_get("extension").map_err(SqliteError::Sqlx)?,
            file,
            created,
            applied: Some(applied),
            ..Change::default()
        })
    }
}

#[async_trait]
impl Tracker for SqliteTracker {
    async fn configure(&self, req: &Request) -> anyhow::Result<()> {
        if self.configured.load(Ordering::Acquire) {
            return Ok(());
        }

        self.provision().await?;
        self.configured.store(true, Ordering::Release);

        tracing::debug!(flow = %req.flow, "migrations table ready");

        Ok(())
    }

    async fn add(&self, changes: &[Change], req: &Request) -> anyhow::Result<Vec<String>> {
        if changes.is_empty() {
            return Ok(Vec::new());
        }

        self.configure(req).await?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(changes.len());

        for change in changes {
            let id = change
                .id
                .clone()
                .unwrap_or_else(|| Ulid::new().to_string());
            let applied = change.applied.unwrap_or(now).to_rfc3339();

            let inserted = sqlx::query(
                r#"
                INSERT INTO migrations (id, name, file, path, extension, applied)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(&id)
            .bind(&change.name)
            .bind(change.file.to_string_lossy().as_ref())
            .bind(change.path.to_string_lossy().as_ref())
            .bind(&change.extension)
            .bind(&applied)
            .execute(&mut *tx)
            .await;

            if let Err(err) = inserted {
                tx.rollback().await?;

                return Err(SqliteError::Sqlx(err).into());
            }

            ids.push(id);
        }

        tx.commit().await?;

        Ok(ids)
    }

    async fn delete(&self, changes: &[Change], req: &Request) -> anyhow::Result<u64> {
        let ids: Vec<&String> = changes.iter().filter_map(|c| c.id.as_ref()).collect();

        if ids.is_empty() {
            return Ok(0);
        }

        self.configure(req).await?;

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("DELETE FROM migrations WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let result = builder.build().execute(&self.pool).await?;

        Ok(result.rows_affected())
    }

    async fn list(&self, req: &Request) -> anyhow::Result<Vec<Change>> {
        self.configure(req).await?;

        let rows = sqlx::query("SELECT id, name, file, path, extension, applied FROM migrations")
            .fetch_all(&self.pool)
            .await?;

        let mut changes = rows
            .iter()
            .map(Self::hydrate)
            .collect::<Result<Vec<Change>>>()?;
        sort_by_created(&mut changes);

        Ok(changes)
    }

    async fn last(&self, req: &Request) -> anyhow::Result<Option<Change>> {
        self.configure(req).await?;

        let row = sqlx::query(
            r#"
            SELECT id, name, file, path, extension, applied FROM migrations
            ORDER BY applied DESC, rowid DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(match row {
            Some(row) => Some(Self::hydrate(&row)?),
            None => None,
        })
    }

    async fn missing(&self, req: &Request) -> anyhow::Result<Vec<Change>> {
        let last = match self.last(req).await? {
            Some(last) => last,
            None => return Ok(Vec::new()),
        };

        let outcome = delta_core::scan::scan(
            req,
            |extension| self.accepts_extension(extension, req),
            |_| true,
        )
        .await?;

        let on_disk: Vec<(&Path, &str)> = outcome
            .accepted
            .iter()
            .chain(outcome.rejected.iter())
            .map(|change| (change.file.as_path(), change.name.as_str()))
            .collect();

        let missing = self
            .list(req)
            .await?
            .into_iter()
            .filter(|entry| entry.created <= last.created)
            .filter(|entry| {
                !on_disk
                    .iter()
                    .any(|(file, name)| *file == entry.file && *name == entry.name)
            })
            .collect();

        Ok(missing)
    }
}
