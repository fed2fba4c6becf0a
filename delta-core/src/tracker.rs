//! The applied-log contract and its shared set algebra.
//!
//! Backends implement the persistence operations (`add`, `delete`,
//! `list`, `last`, `missing`); the composed views (`info`, `available`,
//! `status`) are provided by the trait itself so every tracker shares one
//! scan pass and one ordering rule.

use async_trait::async_trait;
use serde::Serialize;

use crate::{
    change::Change,
    filter::Filter,
    request::Request,
    scan::{self, sort_by_created},
};

/// Composed view over the filesystem and the applied log.
///
/// The four list fields partition the union of the scan and the log:
/// `available` is eligible for commit, `applied` is already covered by the
/// log, `ignored` was dropped by the request filter, `missing` is in the
/// log but gone from disk. All lists are ordered by `created` ascending.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrackerInfo {
    pub filter: Option<Filter>,
    pub last: Option<Change>,
    pub available: Vec<Change>,
    pub applied: Vec<Change>,
    pub ignored: Vec<Change>,
    pub missing: Vec<Change>,
}

/// [`TrackerInfo`] projected onto artifact basenames for display.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusReport {
    pub last: Option<String>,
    pub available: Vec<String>,
    pub applied: Vec<String>,
    pub ignored: Vec<String>,
    pub missing: Vec<String>,
}

fn basenames(changes: &[Change]) -> Vec<String> {
    changes.iter().map(Change::basename).collect()
}

/// Durable log of applied migrations.
///
/// Implementations own the persistence; `configure` must be idempotent
/// and is invoked lazily by the other operations. `add` is
/// order-preserving, stamps `applied` on entries that lack it, and is
/// atomic per batch where the backend supports it.
#[async_trait]
pub trait Tracker: Send + Sync {
    /// Idempotent backend initialization.
    async fn configure(&self, req: &Request) -> anyhow::Result<()>;

    /// Appends a batch to the applied log, returning the inserted ids.
    async fn add(&self, changes: &[Change], req: &Request) -> anyhow::Result<Vec<String>>;

    /// Removes the entries matching each input's (`file`, `name`) pair,
    /// returning the count removed.
    async fn delete(&self, changes: &[Change], req: &Request) -> anyhow::Result<u64>;

    /// The entire applied log, ordered by `created` ascending.
    async fn list(&self, req: &Request) -> anyhow::Result<Vec<Change>>;

    /// Most recently applied change.
    async fn last(&self, req: &Request) -> anyhow::Result<Option<Change>>;

    /// Applied entries whose filesystem artifact is absent.
    async fn missing(&self, req: &Request) -> anyhow::Result<Vec<Change>> {
        let _ = req;
        Ok(Vec::new())
    }

    /// Extension gate applied before a scan entry becomes a [`Change`].
    fn accepts_extension(&self, extension: &str, req: &Request) -> bool {
        req.extension
            .as_deref()
            .map_or(true, |want| want.eq_ignore_ascii_case(extension))
    }

    /// Composes the scan and the log into a [`TrackerInfo`].
    async fn info(&self, req: &Request) -> anyhow::Result<TrackerInfo> {
        let last = self.last(req).await?;
        let filter = req.filter.clone().unwrap_or_default();
        let pattern = filter.pattern()?;

        let outcome = scan::scan(
            req,
            |extension| self.accepts_extension(extension, req),
            |change| {
                let newer = match (&last, change.created) {
                    (None, _) => true,
                    (Some(_), None) => false,
                    (Some(last), Some(created)) => match last.created {
                        Some(latest) => created > latest,
                        None => true,
                    },
                };

                newer && filter.accepts(change, pattern.as_ref())
            },
        )
        .await?;

        let applied = outcome.rejected;
        let (mut available, mut ignored) = filter.window(outcome.accepted, pattern.as_ref());

        if let Some(count) = filter.count {
            if available.len() > count {
                ignored.extend(available.split_off(count));
            }
        }
        sort_by_created(&mut ignored);

        let mut missing = self.missing(req).await?;
        sort_by_created(&mut missing);

        Ok(TrackerInfo {
            filter: req.filter.clone(),
            last,
            available,
            applied,
            ignored,
            missing,
        })
    }

    /// Filesystem changes eligible for commit.
    async fn available(&self, req: &Request) -> anyhow::Result<Vec<Change>> {
        Ok(self.info(req).await?.available)
    }

    /// [`Tracker::info`] rendered for human display.
    async fn status(&self, req: &Request) -> anyhow::Result<StatusReport> {
        let info = self.info(req).await?;

        Ok(StatusReport {
            last: info.last.as_ref().map(Change::basename),
            available: basenames(&info.available),
            applied: basenames(&info.applied),
            ignored: basenames(&info.ignored),
            missing: basenames(&info.missing),
        })
    }
}
